//! GitHub API client using octocrab

use crate::error::{classify, is_not_found};
use crate::{Error, Result};
use octocrab::Octocrab;
use pr_tree_core::config::DEFAULT_CONCURRENCY;
use tracing::{debug, info};

/// GitHub API client bound to one repository
#[derive(Clone)]
pub struct GitHubClient {
    client: Octocrab,
    owner: String,
    repo: String,
    concurrency: usize,
}

impl GitHubClient {
    /// Create a new GitHub client for the specified repository
    ///
    /// `api_url` selects a GitHub Enterprise API; `None` means github.com.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
        api_url: Option<&str>,
    ) -> Result<Self> {
        let owner = owner.into();
        let repo = repo.into();

        let mut builder = Octocrab::builder().personal_token(token.into());
        if let Some(url) = api_url {
            builder = builder
                .base_uri(url)
                .map_err(|e| Error::Parse(format!("Invalid GitHub API URL {}: {}", url, e)))?;
        }

        let client = builder
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        info!(owner = %owner, repo = %repo, "Created GitHub client");

        Ok(Self {
            client,
            owner,
            repo,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    /// Create a GitHub client from a git remote URL
    ///
    /// Supports formats:
    /// - owner/repo
    /// - https://github.com/owner/repo
    /// - git@github.com:owner/repo.git
    /// - ssh://git@github.com/owner/repo.git
    pub fn from_url(url: &str, token: impl Into<String>, api_url: Option<&str>) -> Result<Self> {
        let (owner, repo) = parse_github_url(url)?;
        Self::new(owner, repo, token, api_url)
    }

    /// Limit how many pull requests are fetched at the same time
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Get the repository owner
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repository name
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Maximum number of in-flight pull request fetches
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Get the underlying octocrab client
    pub fn client(&self) -> &Octocrab {
        &self.client
    }

    /// Check that the repository exists and the token can see it
    ///
    /// Returns the repository's full name as reported by GitHub.
    pub async fn verify_repository(&self) -> Result<String> {
        debug!(
            owner = %self.owner,
            repo = %self.repo,
            "Verifying GitHub repository"
        );

        let repository = self
            .client
            .repos(&self.owner, &self.repo)
            .get()
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    Error::RepoNotFound(format!("{}/{}", self.owner, self.repo))
                } else {
                    classify(e)
                }
            })?;

        let full_name = repository
            .full_name
            .unwrap_or_else(|| format!("{}/{}", self.owner, self.repo));

        info!(repository = %full_name, "GitHub repository found");
        Ok(full_name)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

/// Parse a GitHub remote URL into owner and repo
pub fn parse_github_url(url: &str) -> Result<(String, String)> {
    let url = url.trim();

    // Handle URLs with a scheme: https://, http://, ssh://, git://
    if url.contains("://") {
        let parsed = url::Url::parse(url).map_err(|e| Error::Parse(e.to_string()))?;
        return owner_repo(parsed.path())
            .ok_or_else(|| Error::Parse(format!("Invalid GitHub URL path: {}", parsed.path())));
    }

    // Handle scp-like SSH: git@github.com:owner/repo.git
    if let Some((host, path)) = url.split_once(':') {
        if !host.is_empty() && !host.contains('/') {
            return owner_repo(path)
                .ok_or_else(|| Error::Parse(format!("Invalid SSH URL: {}", url)));
        }
    }

    // Handle shorthand: owner/repo
    if url.contains('/') {
        return owner_repo(url).ok_or_else(|| {
            Error::Parse(format!(
                "Invalid repository format: {}. Expected owner/repo",
                url
            ))
        });
    }

    Err(Error::Parse(format!("Unrecognized URL format: {}", url)))
}

/// Split `owner/repo`, stripping outer slashes and one `.git` suffix
///
/// Anything other than exactly two non-empty segments is rejected.
fn owner_repo(path: &str) -> Option<(String, String)> {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, repo) = path.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}
