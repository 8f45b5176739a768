//! Tree command - fetch open pull requests and draw the branch tree

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context};
use clap::Args;
use pr_tree_core::{
    render_json, CliOverrides, Config, GitRepo, PrInfo, PrQuery, PrTree, PullRequestSource,
    RenderOptions, Renderer, Secrets, SyncState, DEFAULT_REMOTE,
};
use pr_tree_github::GitHubClient;

/// Options for drawing the pull request tree
#[derive(Args, Debug, Default)]
pub struct TreeArgs {
    /// GitHub token (needs to be able to read repositories)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Git remote that identifies the GitHub repository
    #[arg(long)]
    pub remote: Option<String>,

    /// Use this owner/repo (or URL) instead of reading a git remote
    #[arg(long)]
    pub repo: Option<String>,

    /// Show open PRs from every author, not just your own
    #[arg(long)]
    pub all_authors: bool,

    /// Mark branches whose local head differs from the PR (`*`) or is missing (`?`)
    #[arg(long)]
    pub status: bool,

    /// Draw the tree with ASCII characters only
    #[arg(long)]
    pub ascii: bool,

    /// Print the tree as JSON
    #[arg(long, conflicts_with_all = ["ascii", "status"])]
    pub json: bool,

    /// Append PR titles
    #[arg(long)]
    pub titles: bool,

    /// Number of pull requests fetched in parallel
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long)]
    pub api_url: Option<String>,
}

impl TreeArgs {
    /// Configuration overrides carried by these flags
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            api_url: self.api_url.clone(),
            remote: self.remote.clone(),
            concurrency: self.concurrency,
            ascii: self.ascii,
            titles: self.titles,
        }
    }

    fn query(&self) -> PrQuery {
        if self.all_authors {
            PrQuery::AllOpen
        } else {
            PrQuery::Mine
        }
    }

    /// Execute the tree command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let token = Secrets::resolve_token(self.github_token.as_deref())?
            .ok_or_else(|| {
                anyhow!(
                    "GitHub token not found. Pass --github-token, set GITHUB_TOKEN, \
                     or add it to ~/.config/pr-tree/secrets.toml"
                )
            })?;

        let git = if self.repo.is_none() || self.status {
            Some(GitRepo::open(std::env::current_dir()?)?)
        } else {
            None
        };

        let target = match (&self.repo, &git) {
            (Some(repo), _) => repo.clone(),
            (None, Some(git)) => self.remote_url(git, config)?,
            (None, None) => bail!("Not inside a git repository; pass --repo owner/repo"),
        };

        if verbose {
            tracing::info!(repo = %target, query = ?self.query(), "Resolving repository");
        }

        let client = GitHubClient::from_url(&target, token, config.github.api_url.as_deref())?
            .with_concurrency(config.github.concurrency);

        let full_name = client.verify_repository().await.map_err(|e| match e {
            pr_tree_github::Error::RepoNotFound(_) => {
                pr_tree_github::Error::RepoNotFound(target.clone())
            }
            other => other,
        })?;
        tracing::debug!(repository = %full_name, "Repository verified");

        let output = self
            .draw(&client, config, git.as_ref().filter(|_| self.status))
            .await?;
        print!("{}", output);

        Ok(())
    }

    fn remote_url(&self, git: &GitRepo, config: &Config) -> anyhow::Result<String> {
        let remote = match git.remote(&config.github.remote) {
            Ok(remote) => remote,
            // A clone without "origin" still works while the remote is left at its default
            Err(_) if config.github.remote == DEFAULT_REMOTE => git.default_remote()?,
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(remote = %remote.name, url = %remote.url, "Using git remote");
        Ok(remote.url)
    }

    /// Fetch pull requests from `source` and render them
    pub async fn draw(
        &self,
        source: &dyn PullRequestSource,
        config: &Config,
        git: Option<&GitRepo>,
    ) -> anyhow::Result<String> {
        let prs = source
            .open_pull_requests(self.query())
            .await
            .with_context(|| format!("Failed to fetch pull requests for {}", source.repository()))?;

        let tree = PrTree::build(&prs);
        for warning in cycle_warnings(&tree, &prs) {
            eprintln!("{}", warning);
        }

        if tree.is_empty() {
            tracing::info!(repository = %source.repository(), "No open pull requests");
        }

        if self.json {
            let mut json = render_json(&tree)?;
            json.push('\n');
            return Ok(json);
        }

        let sync = match git {
            Some(git) => sync_states(git, &prs)?,
            None => HashMap::new(),
        };

        let options = RenderOptions {
            charset: config.display.charset,
            titles: config.display.titles,
            sync,
        };
        Ok(Renderer::new(&tree, options).render())
    }
}

/// One line for every PR that a base branch cycle keeps out of the tree
fn cycle_warnings(tree: &PrTree, prs: &[PrInfo]) -> Vec<String> {
    tree.unreachable(prs)
        .into_iter()
        .map(|pr| {
            format!(
                "warning: #{} ({} -> {}) is part of a base branch cycle and is not shown",
                pr.number, pr.head_branch, pr.base_branch
            )
        })
        .collect()
}

/// Compare every PR head with the local branch of the same name
fn sync_states(git: &GitRepo, prs: &[PrInfo]) -> anyhow::Result<HashMap<String, SyncState>> {
    let mut states = HashMap::new();
    for pr in prs {
        if let Some(remote_sha) = &pr.head_sha {
            let local = git.local_sha(&pr.head_branch)?;
            states.insert(
                pr.head_branch.clone(),
                SyncState::compare(remote_sha, local.as_deref()),
            );
        }
    }
    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pr_tree_core::Charset;

    struct FakeSource {
        mine: Vec<PrInfo>,
        all: Vec<PrInfo>,
    }

    #[async_trait]
    impl PullRequestSource for FakeSource {
        fn repository(&self) -> String {
            "owner/repo".to_string()
        }

        async fn open_pull_requests(&self, query: PrQuery) -> pr_tree_core::Result<Vec<PrInfo>> {
            Ok(match query {
                PrQuery::Mine => self.mine.clone(),
                PrQuery::AllOpen => self.all.clone(),
            })
        }
    }

    struct FailingSource;

    #[async_trait]
    impl PullRequestSource for FailingSource {
        fn repository(&self) -> String {
            "owner/repo".to_string()
        }

        async fn open_pull_requests(&self, _query: PrQuery) -> pr_tree_core::Result<Vec<PrInfo>> {
            Err(pr_tree_core::Error::Source("Bad credentials".to_string()))
        }
    }

    fn source() -> FakeSource {
        FakeSource {
            mine: vec![
                PrInfo::new(10, "step-1", "main"),
                PrInfo::new(11, "step-2", "step-1"),
            ],
            all: vec![
                PrInfo::new(10, "step-1", "main"),
                PrInfo::new(11, "step-2", "step-1"),
                PrInfo::new(12, "someone-else", "main"),
            ],
        }
    }

    #[tokio::test]
    async fn test_draw_own_prs() {
        let out = TreeArgs::default()
            .draw(&source(), &Config::default(), None)
            .await
            .unwrap();
        assert_eq!(out, "─┬ main\n └┬ step-1 [10]\n  └─ step-2 [11]\n");
    }

    #[tokio::test]
    async fn test_draw_all_authors_ascii() {
        let args = TreeArgs {
            all_authors: true,
            ..Default::default()
        };
        let mut config = Config::default();
        config.display.charset = Charset::Ascii;

        let out = args.draw(&source(), &config, None).await.unwrap();
        assert_eq!(
            out,
            "-+ main\n |+ step-1 [10]\n |`- step-2 [11]\n `- someone-else [12]\n"
        );
    }

    #[tokio::test]
    async fn test_draw_json() {
        let args = TreeArgs {
            json: true,
            ..Default::default()
        };
        let out = args.draw(&source(), &Config::default(), None).await.unwrap();
        assert!(out.starts_with('['));
        assert!(out.contains("\"branch\": \"step-2\""));
    }

    #[tokio::test]
    async fn test_draw_reports_source_errors() {
        let err = TreeArgs::default()
            .draw(&FailingSource, &Config::default(), None)
            .await
            .unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("owner/repo"));
        assert!(message.contains("Bad credentials"));
    }

    #[tokio::test]
    async fn test_draw_with_status() {
        let dir = tempfile::tempdir().unwrap();
        let local_sha = repo_with_branch(dir.path(), "step-1");

        let mut step1 = PrInfo::new(10, "step-1", "main");
        step1.head_sha = Some(local_sha);
        let mut step2 = PrInfo::new(11, "step-2", "step-1");
        step2.head_sha = Some("0000000000000000000000000000000000000000".to_string());

        let fake = FakeSource {
            mine: vec![step1, step2],
            all: vec![],
        };
        let git = GitRepo::open(dir.path()).unwrap();
        let args = TreeArgs {
            status: true,
            ..Default::default()
        };

        let out = args
            .draw(&fake, &Config::default(), Some(&git))
            .await
            .unwrap();
        assert_eq!(out, "─┬ main\n └┬ step-1 [10]\n  └─ step-2 [11] ?\n");
    }

    #[test]
    fn test_overrides_from_flags() {
        let args = TreeArgs {
            remote: Some("upstream".to_string()),
            concurrency: Some(5),
            ascii: true,
            ..Default::default()
        };
        let config = Config::default().with_cli_overrides(args.overrides());
        assert_eq!(config.github.remote, "upstream");
        assert_eq!(config.github.concurrency, 5);
        assert_eq!(config.display.charset, Charset::Ascii);
    }

    #[tokio::test]
    async fn test_draw_skips_cycle() {
        let fake = FakeSource {
            mine: vec![
                PrInfo::new(10, "step-1", "main"),
                PrInfo::new(20, "loop-a", "loop-b"),
                PrInfo::new(21, "loop-b", "loop-a"),
            ],
            all: vec![],
        };
        let out = TreeArgs::default()
            .draw(&fake, &Config::default(), None)
            .await
            .unwrap();
        assert_eq!(out, "─┬ main\n └─ step-1 [10]\n");
    }

    #[test]
    fn test_cycle_warned_once_per_pr() {
        let prs = vec![
            PrInfo::new(10, "step-1", "main"),
            PrInfo::new(20, "loop-a", "loop-b"),
            PrInfo::new(21, "loop-b", "loop-a"),
        ];
        let tree = PrTree::build(&prs);
        let warnings = cycle_warnings(&tree, &prs);
        assert_eq!(
            warnings,
            vec![
                "warning: #20 (loop-a -> loop-b) is part of a base branch cycle and is not shown",
                "warning: #21 (loop-b -> loop-a) is part of a base branch cycle and is not shown",
            ]
        );
    }

    #[test]
    fn test_configured_remote_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        repo.remote("origin", "git@github.com:someone/else.git")
            .unwrap();
        let git = GitRepo::open(dir.path()).unwrap();

        let mut config = Config::default();
        config.github.remote = "upstream".to_string();

        let err = TreeArgs::default().remote_url(&git, &config).unwrap_err();
        assert!(err.to_string().contains("Remote 'upstream' not found"));
    }

    #[test]
    fn test_default_remote_falls_back_to_first() {
        let dir = tempfile::tempdir().unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        repo.remote("fork", "git@github.com:me/repo.git").unwrap();
        let git = GitRepo::open(dir.path()).unwrap();

        let url = TreeArgs::default()
            .remote_url(&git, &Config::default())
            .unwrap();
        assert_eq!(url, "git@github.com:me/repo.git");
    }

    /// Create a repository at `path` with one commit on `branch`, returning its SHA
    fn repo_with_branch(path: &std::path::Path, branch: &str) -> String {
        let repo = git2::Repository::init(path).unwrap();
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let refname = format!("refs/heads/{}", branch);
        repo.commit(Some(&refname), &sig, &sig, "initial", &tree, &[])
            .unwrap()
            .to_string()
    }
}
