//! Abstraction over where pull requests come from

use async_trait::async_trait;

use crate::tree::PrInfo;
use crate::Result;

/// Which pull requests to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrQuery {
    /// Open PRs authored by the authenticated user
    #[default]
    Mine,
    /// Every open PR in the repository
    AllOpen,
}

/// A provider of open pull requests for one repository
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Human readable `owner/repo` of the repository being queried
    fn repository(&self) -> String;

    /// Fetch the pull requests selected by `query`
    async fn open_pull_requests(&self, query: PrQuery) -> Result<Vec<PrInfo>>;
}
