//! External subcommands - `pr-tree <name> ...` runs `pr-tree-<name> ...`

use std::ffi::OsString;

use anyhow::anyhow;
use pr_tree_core::{Error, Launcher};

/// Exit code used when no entry point exists, as shells do
pub const NOT_FOUND_EXIT: u8 = 127;

/// Run the entry point for `args[0]` with the remaining arguments
pub async fn execute(args: Vec<OsString>) -> anyhow::Result<u8> {
    let launcher = Launcher::from_install_dir()?;
    delegate(&launcher, args).await
}

/// Delegate through a given launcher, mapping the child's exit code
pub async fn delegate(launcher: &Launcher, args: Vec<OsString>) -> anyhow::Result<u8> {
    let mut args = args.into_iter();
    let name = args
        .next()
        .ok_or_else(|| anyhow!("No subcommand given"))?
        .into_string()
        .map_err(|raw| anyhow!("Subcommand name is not valid UTF-8: {:?}", raw))?;

    match launcher.launch(&name, args).await {
        Ok(code) => Ok(u8::try_from(code).unwrap_or(1)),
        Err(e @ Error::EntryPointNotFound { .. }) => {
            eprintln!("pr-tree: '{}' is not a pr-tree command. {}", name, e);
            Ok(NOT_FOUND_EXIT)
        }
        Err(e) => Err(e.into()),
    }
}
