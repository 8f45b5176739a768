//! pr-tree core - Pull request tree building and rendering
//!
//! This crate turns a set of pull requests into a tree of branches (each PR
//! hangs below the PR whose head branch is its base) and renders it. It also
//! holds the configuration, secrets, git and launcher plumbing shared by the
//! `pr-tree` binary.

pub mod config;
pub mod error;
pub mod git;
pub mod launcher;
pub mod render;
pub mod secrets;
pub mod source;
pub mod tree;

pub use config::{Charset, CliOverrides, Config, DisplayConfig, GitHubConfig, DEFAULT_REMOTE};
pub use error::{Error, Result};
pub use git::{GitRepo, RemoteInfo};
pub use launcher::{install_dir, EntryPoint, Launcher};
pub use render::{render_json, RenderOptions, Renderer, SyncState};
pub use secrets::Secrets;
pub use source::{PrQuery, PullRequestSource};
pub use tree::{NodeId, PrInfo, PrTree, TreeNode};
