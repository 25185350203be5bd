//! Layered configuration: defaults, then the TOML file, then CLI/env overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::error::ConfigError;
use crate::utils::parse_repo_spec;

pub const DEFAULT_REPO: &str = "Cary0x/pond0x-issues";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository as `owner/name` or a GitHub URL.
    pub repo: String,
    pub token: Option<String>,
    pub per_page: u8,
    pub retries: u32,
    pub issues_stale_secs: u64,
    pub labels_stale_secs: u64,
    pub detail_stale_secs: u64,
    /// Background refresh interval for the issue list.
    pub refresh_secs: u64,
    pub cache_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo: DEFAULT_REPO.to_string(),
            token: None,
            per_page: 100,
            retries: 2,
            issues_stale_secs: 5 * 60,
            labels_stale_secs: 30 * 60,
            detail_stale_secs: 2 * 60,
            refresh_secs: 5 * 60,
            cache_path: None,
            log_level: "info".to_string(),
        }
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub repo: Option<String>,
    pub token: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("issuedeck").join("config.toml"))
    }

    /// Load the config file (if present) and apply `overrides` on top.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        // An explicit path must exist; the default one is optional
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Some(repo) = overrides.repo {
            config.repo = repo;
        }
        if let Some(token) = overrides.token {
            config.token = Some(token);
        }
        if let Some(level) = overrides.log_level {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_repo_spec(&self.repo).ok_or_else(|| ConfigError::InvalidRepo(self.repo.clone()))?;
        if self.per_page == 0 || self.per_page > 100 {
            return Err(ConfigError::InvalidValue(
                "per_page must be between 1 and 100".to_string(),
            ));
        }
        Ok(())
    }

    /// `(owner, name)` of the configured repository.
    pub fn repository(&self) -> (String, String) {
        parse_repo_spec(&self.repo).unwrap_or_else(|| {
            let (owner, name) = DEFAULT_REPO.split_once('/').unwrap_or(("", ""));
            (owner.to_string(), name.to_string())
        })
    }

    pub fn cache_path(&self) -> Option<PathBuf> {
        self.cache_path
            .clone()
            .or_else(crate::services::get_cache_path)
    }

    /// Configured token, falling back to the GitHub CLI's credentials.
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(gh_auth_token)
    }

    pub fn issues_max_age(&self) -> chrono::Duration {
        max_age(self.issues_stale_secs)
    }

    pub fn labels_max_age(&self) -> chrono::Duration {
        max_age(self.labels_stale_secs)
    }

    pub fn detail_max_age(&self) -> chrono::Duration {
        max_age(self.detail_stale_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(30))
    }
}

/// Staleness window in seconds; values past chrono's range saturate.
fn max_age(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::TimeDelta::try_seconds)
        .unwrap_or(chrono::TimeDelta::MAX)
}

fn gh_auth_token() -> Option<String> {
    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_keep_defaults() {
        let config = Config::from_toml("retries = 5\n").unwrap();
        assert_eq!(config.retries, 5);
        assert_eq!(config.repo, DEFAULT_REPO);
        assert_eq!(config.issues_stale_secs, 300);
        assert_eq!(config.labels_stale_secs, 1800);
    }

    #[test]
    fn overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "repo = \"octo/hello\"\nlog_level = \"warn\"\n").unwrap();

        let config = Config::load(
            Some(&path),
            Overrides {
                repo: Some("https://github.com/rust-lang/rust".to_string()),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(
            config.repository(),
            ("rust-lang".to_string(), "rust".to_string())
        );
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_repo = Config {
            repo: "nope".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            bad_repo.validate(),
            Err(ConfigError::InvalidRepo(_))
        ));

        let bad_page = Config {
            per_page: 0,
            ..Config::default()
        };
        assert!(bad_page.validate().is_err());
    }

    #[test]
    fn huge_staleness_windows_saturate() {
        let config = Config::from_toml("issues_stale_secs = 100000000000000000\n").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.issues_max_age(), chrono::TimeDelta::MAX);
        assert_eq!(config.detail_max_age(), chrono::Duration::minutes(2));

        let config = Config {
            labels_stale_secs: u64::MAX,
            ..Config::default()
        };
        assert_eq!(config.labels_max_age(), chrono::TimeDelta::MAX);
    }

    #[test]
    fn unparseable_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "retries = \"many\"").unwrap();
        let err = Config::load(Some(&path), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
