//! Error types for pr-tree

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pr-tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pr-tree operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Git repository error
    #[error("Git error: {0}")]
    Git(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The launcher could not prepare or start a delegate
    #[error("Launch error: {0}")]
    Launch(String),

    /// No `pr-tree-<name>` program was found
    #[error("No entry point named '{name}' found (searched {searched} and PATH)")]
    EntryPointNotFound {
        /// Requested subcommand name
        name: String,
        /// Runtime directory that was searched first
        searched: PathBuf,
    },

    /// Pull request source error (GitHub or otherwise)
    #[error("{0}")]
    Source(String),
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::Git(err.message().to_string())
    }
}
