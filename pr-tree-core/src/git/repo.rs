//! Git repository detection and operations

use std::path::Path;

use git2::Repository;
use tracing::debug;

use crate::{Error, Result};

/// Information about a git remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteInfo {
    /// Name of the remote (e.g., "origin")
    pub name: String,
    /// URL of the remote
    pub url: String,
}

/// A git repository wrapper providing the lookups pr-tree needs
pub struct GitRepo {
    /// The underlying git2 repository
    repo: Repository,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("path", &self.repo.path())
            .finish_non_exhaustive()
    }
}

impl GitRepo {
    /// Open a git repository at the given path
    ///
    /// This will search upward from the given path to find the repository root.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let repo = Repository::discover(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                Error::Git(format!(
                    "Not a git repository: {}. Run pr-tree from inside a clone of a GitHub repository.",
                    path.display()
                ))
            } else {
                Error::from(e)
            }
        })?;

        debug!(
            root = %repo.workdir().unwrap_or_else(|| repo.path()).display(),
            "Opened git repository"
        );

        Ok(Self { repo })
    }

    /// Get a remote by name
    pub fn remote(&self, name: &str) -> Result<RemoteInfo> {
        let remote = self.repo.find_remote(name).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                Error::Git(format!(
                    "Remote '{}' not found. Add it with 'git remote add {} <url>'",
                    name, name
                ))
            } else {
                Error::from(e)
            }
        })?;

        let url = remote
            .url()
            .ok_or_else(|| Error::Git(format!("Remote '{}' has no valid UTF-8 URL", name)))?;

        Ok(RemoteInfo {
            name: name.to_string(),
            url: url.trim().to_string(),
        })
    }

    /// Get the default remote (usually "origin")
    pub fn default_remote(&self) -> Result<RemoteInfo> {
        if let Ok(remote) = self.remote("origin") {
            return Ok(remote);
        }

        // Fall back to first available remote
        self.list_remotes()?.into_iter().next().ok_or_else(|| {
            Error::Git(
                "No remotes configured. Add a remote with 'git remote add origin <url>'"
                    .to_string(),
            )
        })
    }

    /// List all remotes
    pub fn list_remotes(&self) -> Result<Vec<RemoteInfo>> {
        let remotes = self.repo.remotes()?;

        let mut result = Vec::new();
        for remote_name in remotes.iter().flatten() {
            if let Ok(remote) = self.repo.find_remote(remote_name) {
                if let Some(url) = remote.url() {
                    result.push(RemoteInfo {
                        name: remote_name.to_string(),
                        url: url.to_string(),
                    });
                }
            }
        }

        Ok(result)
    }

    /// Get the commit SHA a local branch points at
    ///
    /// Returns `None` when no local branch of that name exists.
    pub fn local_sha(&self, branch: &str) -> Result<Option<String>> {
        let refname = format!("refs/heads/{}", branch);
        match self.repo.refname_to_id(&refname) {
            Ok(oid) => Ok(Some(oid.to_string())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn commit_on(repo: &Repository, branch: &str) -> git2::Oid {
        let sig = git2::Signature::now("Test", "test@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let refname = format!("refs/heads/{}", branch);
        repo.commit(Some(&refname), &sig, &sig, "initial", &tree, &[])
            .unwrap()
    }

    #[test]
    fn test_open_non_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = GitRepo::open(dir.path());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Not a git repository"));
    }

    #[test]
    fn test_open_discovers_from_subdir() {
        let (dir, _repo) = init_repo();
        let sub = dir.path().join("a").join("b");
        std::fs::create_dir_all(&sub).unwrap();

        let repo = GitRepo::open(&sub).unwrap();
        assert_eq!(
            repo.repo.workdir().unwrap().canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_remote_lookup() {
        let (dir, repo) = init_repo();
        repo.remote("origin", "git@github.com:owner/repo.git")
            .unwrap();
        repo.remote("upstream", "https://github.com/other/repo")
            .unwrap();

        let git = GitRepo::open(dir.path()).unwrap();
        let origin = git.remote("origin").unwrap();
        assert_eq!(origin.url, "git@github.com:owner/repo.git");

        let upstream = git.remote("upstream").unwrap();
        assert_eq!(upstream.url, "https://github.com/other/repo");

        assert_eq!(git.default_remote().unwrap().name, "origin");
        assert_eq!(git.list_remotes().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_remote() {
        let (dir, _repo) = init_repo();
        let git = GitRepo::open(dir.path()).unwrap();

        let err = git.remote("origin").unwrap_err();
        assert!(err.to_string().contains("Remote 'origin' not found"));
        assert!(git.default_remote().is_err());
    }

    #[test]
    fn test_default_remote_falls_back() {
        let (dir, repo) = init_repo();
        repo.remote("fork", "git@github.com:me/repo.git").unwrap();

        let git = GitRepo::open(dir.path()).unwrap();
        assert_eq!(git.default_remote().unwrap().name, "fork");
    }

    #[test]
    fn test_local_sha() {
        let (dir, repo) = init_repo();
        let oid = commit_on(&repo, "feature");

        let git = GitRepo::open(dir.path()).unwrap();
        assert_eq!(git.local_sha("feature").unwrap(), Some(oid.to_string()));
        assert_eq!(git.local_sha("nope").unwrap(), None);
    }
}
