use thiserror::Error;

/// Failure while talking to GitHub.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GitHub API error: {0}")]
    Github(#[from] octocrab::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Fetch worker unavailable: {0}")]
    Runtime(String),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid repository '{0}', expected owner/name or a GitHub URL")]
    InvalidRepo(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
