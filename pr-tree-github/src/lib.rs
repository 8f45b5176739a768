//! pr-tree GitHub - GitHub integration for pr-tree
//!
//! This crate resolves a git remote to a GitHub repository and fetches the
//! open pull requests that make up the tree.

mod client;
mod error;
mod pulls;

pub use client::{parse_github_url, GitHubClient};
pub use error::{Error, Result};
