//! Fetching the pull requests that make up the tree

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use octocrab::models::pulls::PullRequest as OctocrabPR;
use pr_tree_core::{PrInfo, PrQuery, PullRequestSource};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::error::{classify, is_not_found};
use crate::{Error, GitHubClient, Result};

const PER_PAGE: u8 = 100;

/// Convert an octocrab pull request into the tree's view of it
fn pr_info(pr: OctocrabPR) -> PrInfo {
    PrInfo {
        number: pr.number,
        head_sha: Some(pr.head.sha).filter(|s| !s.is_empty()),
        head_branch: pr.head.ref_field,
        base_branch: pr.base.ref_field,
        title: pr.title.unwrap_or_default(),
        draft: pr.draft.unwrap_or(false),
    }
}

/// Search query selecting a user's open PRs in one repository
fn open_prs_query(login: &str, owner: &str, repo: &str) -> String {
    format!("is:pr is:open author:{} repo:{}/{}", login, owner, repo)
}

impl GitHubClient {
    /// Login of the user the token belongs to
    pub async fn current_login(&self) -> Result<String> {
        let user = self.client().current().user().await.map_err(classify)?;
        debug!(login = %user.login, "Authenticated as");
        Ok(user.login)
    }

    /// Numbers of the open PRs `login` authored in this repository
    pub async fn search_open_pr_numbers(&self, login: &str) -> Result<Vec<u64>> {
        let query = open_prs_query(login, self.owner(), self.repo());
        debug!(query = %query, "Searching pull requests");

        let page = self
            .client()
            .search()
            .issues_and_pull_requests(&query)
            .per_page(PER_PAGE)
            .send()
            .await
            .map_err(classify)?;
        let issues = self.client().all_pages(page).await.map_err(classify)?;

        let numbers: Vec<u64> = issues.into_iter().map(|issue| issue.number).collect();
        info!(count = numbers.len(), "Found open pull requests");
        Ok(numbers)
    }

    /// Fetch pull requests by number, at most `concurrency()` at a time
    ///
    /// Results come back in the order of `numbers`.
    pub async fn fetch_prs(&self, numbers: &[u64]) -> Result<Vec<PrInfo>> {
        let client = self.client().clone();
        let owner = self.owner().to_string();
        let repo = self.repo().to_string();

        fetch_bounded(numbers, self.concurrency(), |number| {
            let client = client.clone();
            let owner = owner.clone();
            let repo = repo.clone();
            async move { fetch_one(client, &owner, &repo, number).await }
        })
        .await
    }

    /// Every open pull request in the repository, whoever authored it
    pub async fn list_open_prs(&self) -> Result<Vec<PrInfo>> {
        debug!(owner = %self.owner(), repo = %self.repo(), "Listing open pull requests");

        let page = self
            .client()
            .pulls(self.owner(), self.repo())
            .list()
            .state(octocrab::params::State::Open)
            .per_page(PER_PAGE)
            .send()
            .await
            .map_err(classify)?;
        let prs = self.client().all_pages(page).await.map_err(classify)?;

        let result: Vec<PrInfo> = prs.into_iter().map(pr_info).collect();
        info!(count = result.len(), "Fetched pull requests");
        Ok(result)
    }

    /// Open pull requests authored by the token's user
    pub async fn my_open_prs(&self) -> Result<Vec<PrInfo>> {
        let login = self.current_login().await?;
        let numbers = self.search_open_pr_numbers(&login).await?;
        self.fetch_prs(&numbers).await
    }
}

/// Run `fetch` for every number with at most `concurrency` calls in flight
///
/// Output keeps the order of `numbers`. The first failure is returned and the
/// remaining fetches are aborted.
pub(crate) async fn fetch_bounded<T, F, Fut>(
    numbers: &[u64],
    concurrency: usize,
    fetch: F,
) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for (index, &number) in numbers.iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let pending = fetch(number);

        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| Error::Other(format!("Fetch pool closed: {}", e)))?;
            let item = pending.await?;
            Ok::<_, Error>((index, item))
        });
    }

    let mut fetched: Vec<Option<T>> = numbers.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (index, item) =
            joined.map_err(|e| Error::Other(format!("Pull request fetch failed: {}", e)))??;
        fetched[index] = Some(item);
    }

    Ok(fetched.into_iter().flatten().collect())
}

async fn fetch_one(
    client: octocrab::Octocrab,
    owner: &str,
    repo: &str,
    number: u64,
) -> Result<PrInfo> {
    debug!(number, "Fetching pull request");

    let pr = client.pulls(owner, repo).get(number).await.map_err(|e| {
        if is_not_found(&e) {
            Error::PrNotFound(number)
        } else {
            classify(e)
        }
    })?;

    Ok(pr_info(pr))
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    fn repository(&self) -> String {
        format!("{}/{}", self.owner(), self.repo())
    }

    async fn open_pull_requests(&self, query: PrQuery) -> pr_tree_core::Result<Vec<PrInfo>> {
        let prs = match query {
            PrQuery::Mine => self.my_open_prs().await?,
            PrQuery::AllOpen => self.list_open_prs().await?,
        };
        Ok(prs)
    }
}
