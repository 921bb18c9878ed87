//! Process configuration, read once at start-up from the environment.

use std::path::PathBuf;
use tokio::net::TcpListener;

use crate::db::DbConfig;
use crate::publish::github::GitHubConfig;

/// Largest accepted request body. Shirt entries may carry inline images.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TEMPLATE_PATH: &str = "template.html";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub template_path: PathBuf,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// `None` runs on the in-memory store.
    pub database: Option<DbConfig>,
    /// `None` disables publishing.
    pub github: Option<GitHubConfig>,
}

/// Environment lookup that treats unset and non-unicode values alike.
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            template_path: get("TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_PATH)),
            allowed_origins,
            database: DbConfig::from_lookup(&lookup),
            github: GitHubConfig::from_lookup(&lookup),
        })
    }

    /// Binds `HOST:PORT`. `HOST` may be a hostname such as `localhost`;
    /// the first resolved address that accepts the bind wins.
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind((self.host.as_str(), self.port)).await
    }
}
