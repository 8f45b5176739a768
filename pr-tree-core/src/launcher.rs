//! Delegation to external `pr-tree-<name>` programs
//!
//! Any subcommand the binary does not know is handed to an external entry
//! point, git style. The launcher resolves the directory `pr-tree` is
//! installed in (following symlinks), looks for `pr-tree-<name>` there and
//! then on `PATH`, runs it with the caller's arguments untouched and reports
//! its exit code unchanged.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::{debug, info};

use crate::{Error, Result};

/// Prefix shared by every entry point program
pub const ENTRY_POINT_PREFIX: &str = "pr-tree-";

/// Variable exported to entry points pointing at the runtime directory
pub const INSTALL_DIR_ENV: &str = "PR_TREE_INSTALL_DIR";

/// Directory containing the running executable, with symlinks resolved
pub fn install_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let exe = exe.canonicalize()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::Launch(format!("{} has no parent directory", exe.display())))
}

/// A resolved program to delegate to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Subcommand name the user typed
    pub name: String,
    /// Absolute path of the program
    pub path: PathBuf,
}

/// Runs entry points out of a runtime directory
#[derive(Debug, Clone)]
pub struct Launcher {
    runtime_dir: PathBuf,
    search_path: Option<OsString>,
}

impl Launcher {
    /// Create a launcher for an explicit runtime directory
    pub fn new(runtime_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime_dir: runtime_dir.into(),
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Create a launcher rooted at the directory of the running executable
    pub fn from_install_dir() -> Result<Self> {
        Ok(Self::new(install_dir()?))
    }

    /// Replace the `PATH` used as fallback when resolving entry points
    pub fn with_search_path(mut self, path: Option<OsString>) -> Self {
        self.search_path = path;
        self
    }

    /// Find the program implementing subcommand `name`
    ///
    /// The runtime directory is searched first, then `PATH`.
    pub fn resolve(&self, name: &str) -> Result<EntryPoint> {
        if !self.runtime_dir.is_dir() {
            return Err(Error::Launch(format!(
                "runtime directory missing: {}",
                self.runtime_dir.display()
            )));
        }

        let program = format!("{}{}", ENTRY_POINT_PREFIX, name);
        let cwd = std::env::current_dir()?;

        let found = which::which_in(&program, Some(&self.runtime_dir), &cwd)
            .or_else(|_| which::which_in(&program, self.search_path.as_ref(), &cwd))
            .map_err(|_| Error::EntryPointNotFound {
                name: name.to_string(),
                searched: self.runtime_dir.clone(),
            })?;

        debug!(name, path = %found.display(), "Resolved entry point");

        Ok(EntryPoint {
            name: name.to_string(),
            path: found,
        })
    }

    /// Run an entry point with `args` passed through verbatim
    ///
    /// Stdio is inherited. Returns the program's exit code.
    pub async fn run<I, S>(&self, entry: &EntryPoint, args: I) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        info!(name = %entry.name, path = %entry.path.display(), "Delegating to entry point");

        let status = Command::new(&entry.path)
            .args(args)
            .env(INSTALL_DIR_ENV, &self.runtime_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| Error::Launch(format!("failed to start {}: {}", entry.path.display(), e)))?;

        let code = exit_code(status);
        debug!(name = %entry.name, code, "Entry point exited");
        Ok(code)
    }

    /// Resolve and run `pr-tree-<name>` in one step
    pub async fn launch<I, S>(&self, name: &str, args: I) -> Result<i32>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let entry = self.resolve(name)?;
        self.run(&entry, args).await
    }
}

/// Map an exit status to a shell-style exit code
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
