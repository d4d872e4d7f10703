//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve store path, API key, endpoint, default category and log level.
//! - Keep resolution a pure function over a lookup so it is testable.
//!
//! # Invariants
//! - A missing API key degrades to an empty string, never an error.
//! - The API key never appears in logs or `Debug` output.

use crate::fetch::coordinator::DEFAULT_CATEGORY;
use crate::fetch::source::parse_endpoint;
use crate::logging::{default_log_level, normalize_level};
use log::warn;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "QUOTEDAY_DB_PATH";
pub const ENV_API_KEY: &str = "QUOTEDAY_API_KEY";
pub const ENV_QUOTE_ENDPOINT: &str = "QUOTEDAY_QUOTE_ENDPOINT";
pub const ENV_CATEGORY: &str = "QUOTEDAY_CATEGORY";
pub const ENV_LOG_LEVEL: &str = "QUOTEDAY_LOG_LEVEL";

/// Upstream quote API used when no endpoint is configured.
pub const DEFAULT_QUOTE_ENDPOINT: &str = "https://api.api-ninjas.com/v1/quotes";
const DB_FILE_NAME: &str = "quoteday.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    InvalidEndpoint(String),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEndpoint(value) => {
                write!(f, "{ENV_QUOTE_ENDPOINT} must be an http(s) URL, got `{value}`")
            }
            Self::InvalidLogLevel(value) => write!(
                f,
                "{ENV_LOG_LEVEL} must be one of trace|debug|info|warn|error, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub api_key: String,
    pub quote_endpoint: String,
    pub category: String,
    pub log_level: &'static str,
}

impl Debug for CoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("db_path", &self.db_path)
            .field("api_key", &if self.api_key.is_empty() { "<empty>" } else { "<redacted>" })
            .field("quote_endpoint", &self.quote_endpoint)
            .field("category", &self.category)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            api_key: String::new(),
            quote_endpoint: DEFAULT_QUOTE_ENDPOINT.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            log_level: default_log_level(),
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }

        match value(ENV_API_KEY) {
            Some(key) => config.api_key = key,
            None => warn!(
                "event=config_resolve module=config status=degraded reason=missing_api_key"
            ),
        }

        if let Some(endpoint) = value(ENV_QUOTE_ENDPOINT) {
            parse_endpoint(&endpoint).map_err(|_| ConfigError::InvalidEndpoint(endpoint.clone()))?;
            config.quote_endpoint = endpoint;
        }

        if let Some(category) = value(ENV_CATEGORY) {
            config.category = category;
        }

        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level =
                normalize_level(&level).map_err(|_| ConfigError::InvalidLogLevel(level.clone()))?;
        }

        Ok(config)
    }
}

fn default_db_path() -> PathBuf {
    std::env::temp_dir().join(DB_FILE_NAME)
}
