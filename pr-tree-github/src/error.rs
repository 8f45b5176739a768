//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API error
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// Authentication error
    #[error("GitHub authentication error: {0}")]
    Auth(String),

    /// Repository is missing or the token cannot see it
    #[error("Unable to find repo for {0} in your GitHub account")]
    RepoNotFound(String),

    /// Pull request not found
    #[error("Pull request #{0} not found")]
    PrNotFound(u64),

    /// Rate limit exceeded
    #[error("GitHub rate limit exceeded: {0}")]
    RateLimited(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<Error> for pr_tree_core::Error {
    fn from(err: Error) -> Self {
        pr_tree_core::Error::Source(err.to_string())
    }
}

/// Classify an octocrab error by the message GitHub sent back
pub(crate) fn classify(err: octocrab::Error) -> Error {
    let message = match &err {
        octocrab::Error::GitHub { source, .. } => source.message.clone(),
        _ => return Error::Api(err),
    };

    let lower = message.to_lowercase();
    if lower.contains("bad credentials") {
        Error::Auth("Invalid GitHub token".to_string())
    } else if lower.contains("rate limit") {
        Error::RateLimited(message)
    } else {
        Error::Api(err)
    }
}

/// Whether GitHub answered "Not Found"
pub(crate) fn is_not_found(err: &octocrab::Error) -> bool {
    matches!(err, octocrab::Error::GitHub { source, .. } if source.message.contains("Not Found"))
}
