//! Git operations for pr-tree
//!
//! This module locates the enclosing repository, reads remote URLs and
//! resolves local branch heads.

mod repo;

pub use repo::{GitRepo, RemoteInfo};
