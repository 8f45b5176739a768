//! Configuration management for pr-tree
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (PR_TREE_*)
//! 3. Config file (~/.config/pr-tree/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Default number of pull requests fetched concurrently
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Remote read when none is configured
pub const DEFAULT_REMOTE: &str = "origin";

/// GitHub-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Base URL of the GitHub API (GitHub Enterprise), `None` for github.com
    pub api_url: Option<String>,

    /// Git remote whose URL identifies the GitHub repository
    pub remote: String,

    /// Maximum number of pull requests fetched at the same time
    pub concurrency: usize,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            remote: DEFAULT_REMOTE.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Characters used to draw the tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    #[default]
    Unicode,
    Ascii,
}

/// Output-related configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Tree drawing characters
    pub charset: Charset,

    /// Append PR titles to each line
    pub titles: bool,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// GitHub configuration
    pub github: GitHubConfig,

    /// Display configuration
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading config file");
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/pr-tree/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pr-tree").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - PR_TREE_API_URL: GitHub API base URL
    /// - PR_TREE_REMOTE: git remote name
    /// - PR_TREE_CONCURRENCY: parallel PR fetches
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("PR_TREE_API_URL") {
            self.github.api_url = Some(url);
        }

        if let Some(remote) = lookup("PR_TREE_REMOTE") {
            self.github.remote = remote;
        }

        if let Some(raw) = lookup("PR_TREE_CONCURRENCY") {
            match raw.parse::<usize>() {
                Ok(n) => self.github.concurrency = n,
                Err(_) => warn!(value = %raw, "Ignoring invalid PR_TREE_CONCURRENCY"),
            }
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(url) = overrides.api_url {
            self.github.api_url = Some(url);
        }

        if let Some(remote) = overrides.remote {
            self.github.remote = remote;
        }

        if let Some(n) = overrides.concurrency {
            self.github.concurrency = n;
        }

        if overrides.ascii {
            self.display.charset = Charset::Ascii;
        }

        if overrides.titles {
            self.display.titles = true;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(overrides: CliOverrides) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(overrides)
            .normalized())
    }

    /// Concurrency is clamped to at least one in-flight request
    fn normalized(mut self) -> Self {
        self.github.concurrency = self.github.concurrency.max(1);
        self
    }
}

/// Values given on the command line that take precedence over everything else
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub remote: Option<String>,
    pub concurrency: Option<usize>,
    pub ascii: bool,
    pub titles: bool,
}
