//! Secrets management for pr-tree
//!
//! The GitHub token normally comes from `--github-token` or the
//! `GITHUB_TOKEN` environment variable. As a fallback it can be stored in
//! `~/.config/pr-tree/secrets.toml`, which must have restrictive permissions
//! (0600 on Unix).
//!
//! Loading priority:
//! 1. Explicit token (CLI flag)
//! 2. Environment variable (GITHUB_TOKEN)
//! 3. Secrets file (~/.config/pr-tree/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// GitHub configuration
    pub github: GitHubSecrets,
}

/// GitHub-related secrets
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubSecrets {
    /// GitHub Personal Access Token
    pub token: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_secrets_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = std::fs::metadata(path)?.permissions().mode();

            // Readable by group or others
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        if let Some(ref mut token) = secrets.github.token {
            *token = token.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/pr-tree/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pr-tree").join("secrets.toml"))
    }

    /// Resolve the GitHub token, preferring an explicitly supplied one
    ///
    /// Priority: explicit > GITHUB_TOKEN env var > secrets file. Blank values
    /// are skipped. The secrets file is only read when neither of the others
    /// yields a token.
    pub fn resolve_token(explicit: Option<&str>) -> Result<Option<String>> {
        let env = std::env::var("GITHUB_TOKEN").ok();
        Self::resolve_token_with(explicit, env.as_deref(), Self::load)
    }

    fn resolve_token_with(
        explicit: Option<&str>,
        env: Option<&str>,
        load: impl FnOnce() -> Result<Self>,
    ) -> Result<Option<String>> {
        if let Some(token) = non_blank(explicit) {
            debug!("Using GitHub token from command line");
            return Ok(Some(token));
        }

        if let Some(token) = non_blank(env) {
            debug!("Using GitHub token from GITHUB_TOKEN environment variable");
            return Ok(Some(token));
        }

        let token = non_blank(load()?.github.token.as_deref());
        if token.is_some() {
            debug!("Using GitHub token from secrets file");
        }
        Ok(token)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn with_file_token(token: &str) -> Secrets {
        Secrets {
            github: GitHubSecrets {
                token: Some(token.to_string()),
            },
        }
    }

    #[test]
    fn test_default_secrets() {
        let secrets = Secrets::default();
        assert!(secrets.github.token.is_none());
    }

    #[test]
    fn test_parse_secrets() {
        let toml = r#"
[github]
token = "ghp_xxxxxxxxxxxx"
"#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.github.token, Some("ghp_xxxxxxxxxxxx".to_string()));
    }

    #[test]
    fn test_explicit_token_wins() {
        let token = Secrets::resolve_token_with(Some("from_cli"), Some("from_env"), || {
            Ok(with_file_token("from_file"))
        })
        .unwrap();
        assert_eq!(token.as_deref(), Some("from_cli"));
    }

    #[test]
    fn test_env_token_beats_file() {
        let token = Secrets::resolve_token_with(None, Some("  from_env \n"), || {
            Ok(with_file_token("from_file"))
        })
        .unwrap();
        assert_eq!(token.as_deref(), Some("from_env"));
    }

    #[test]
    fn test_blank_values_fall_through() {
        let token = Secrets::resolve_token_with(Some("   "), Some(""), || {
            Ok(with_file_token("from_file"))
        })
        .unwrap();
        assert_eq!(token.as_deref(), Some("from_file"));
    }

    #[test]
    fn test_no_token_anywhere() {
        let token = Secrets::resolve_token_with(None, None, || Ok(Secrets::default())).unwrap();
        assert!(token.is_none());
    }

    #[test]
    fn test_secrets_file_not_read_when_token_given() {
        let failing =
            || -> Result<Secrets> { Err(Error::Config("secrets file was read".to_string())) };

        let token = Secrets::resolve_token_with(Some("from_cli"), None, failing).unwrap();
        assert_eq!(token.as_deref(), Some("from_cli"));

        let token = Secrets::resolve_token_with(None, Some("from_env"), failing).unwrap();
        assert_eq!(token.as_deref(), Some("from_env"));

        assert!(Secrets::resolve_token_with(None, None, failing).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_insecure_file_ignored_with_explicit_token() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[github]\ntoken = \"from_file\"").unwrap();
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        let load = || Secrets::load_from_file(file.path());
        let token = Secrets::resolve_token_with(Some("ghp_explicit"), None, load).unwrap();
        assert_eq!(token.as_deref(), Some("ghp_explicit"));

        let err = Secrets::resolve_token_with(None, None, load).unwrap_err();
        assert!(err.to_string().contains("insecure permissions"));
    }

    #[cfg(unix)]
    #[test]
    fn test_insecure_permissions_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[github]\ntoken = \"test\"").unwrap();

        let perms = std::fs::Permissions::from_mode(0o644);
        std::fs::set_permissions(file.path(), perms).unwrap();

        let result = Secrets::load_from_file(file.path());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("insecure permissions"));
    }

    #[cfg(unix)]
    #[test]
    fn test_secure_permissions_accepted() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[github]\ntoken = \"  ghp_test  \"").unwrap();

        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(file.path(), perms).unwrap();

        let secrets = Secrets::load_from_file(file.path()).unwrap();
        assert_eq!(secrets.github.token, Some("ghp_test".to_string()));
    }
}
