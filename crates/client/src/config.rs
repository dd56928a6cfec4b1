//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `FOODCOURT_API_URL` - Backend origin (default: `http://localhost:8080`)
//! - `FOODCOURT_DATA_DIR` - Local cache directory (default: `.foodcourt`)
//! - `FOODCOURT_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `FOODCOURT_CATALOG_TTL_SECS` - Product cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_DATA_DIR: &str = ".foodcourt";
const DEFAULT_TIMEOUT_SECS: &str = "10";
const DEFAULT_CATALOG_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Ordering client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin; the REST API lives under `/api`
    pub api_url: Url,
    /// Directory holding the local cache files
    pub data_dir: PathBuf,
    /// Timeout applied to every request
    pub request_timeout: Duration,
    /// How long product listings stay cached
    pub catalog_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = get_or_default(&lookup, "FOODCOURT_API_URL", DEFAULT_API_URL);
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("FOODCOURT_API_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_url,
            data_dir: PathBuf::from(get_or_default(&lookup, "FOODCOURT_DATA_DIR", DEFAULT_DATA_DIR)),
            request_timeout: get_secs(&lookup, "FOODCOURT_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            catalog_ttl: get_secs(&lookup, "FOODCOURT_CATALOG_TTL_SECS", DEFAULT_CATALOG_TTL_SECS)?,
            sentry_dsn: get_optional(&lookup, "SENTRY_DSN"),
            sentry_environment: get_optional(&lookup, "SENTRY_ENVIRONMENT"),
        })
    }

    /// Defaults pointing at `api_url`, for tests and embedding.
    #[must_use]
    pub fn for_api_url(api_url: Url) -> Self {
        Self {
            api_url,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            request_timeout: Duration::from_secs(10),
            catalog_ttl: Duration::from_secs(300),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Root of the REST API, always ending in `/api/`.
    #[must_use]
    pub fn api_base(&self) -> Url {
        let mut base = self.api_url.clone();
        let path = format!("{}/api/", self.api_url.path().trim_end_matches('/'));
        base.set_path(&path);
        base
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable, treating empty values as unset.
fn get_optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Get a variable with a default value.
fn get_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Get a whole number of seconds.
fn get_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<Duration, ConfigError> {
    get_or_default(lookup, key, default)
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
