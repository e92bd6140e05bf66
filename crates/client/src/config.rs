//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `FEEDME_API_URL` - REST backend base URL
//!   (default: `https://feedme-backend-zeta.vercel.app/api`)
//! - `FEEDME_DIRECT_API_URL` - Base URL for the direct transport (default: `FEEDME_API_URL`)
//! - `FEEDME_SESSION_FILE` - Persisted session path
//!   (default: `$HOME/.config/feedme/session.json`)
//! - `FEEDME_CACHE_TTL_SECS` - Query cache TTL (default: 300)
//! - `FEEDME_CACHE_CAPACITY` - Query cache capacity (default: 1000)
//! - `FEEDME_HTTP_TIMEOUT_SECS` - Request timeout (default: none)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "https://feedme-backend-zeta.vercel.app/api";
const DEFAULT_CACHE_TTL_SECS: &str = "300";
const DEFAULT_CACHE_CAPACITY: &str = "1000";
const SESSION_FILE_NAME: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// REST client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the library-mediated transport. Always ends in `/`.
    pub api_url: Url,
    /// Base URL for the direct transport. Always ends in `/`.
    pub direct_api_url: Url,
    /// Where the session is persisted between runs.
    pub session_file: PathBuf,
    /// Query cache time-to-live.
    pub cache_ttl: Duration,
    /// Query cache capacity in entries.
    pub cache_capacity: u64,
    /// Per-request timeout; `None` keeps the HTTP client default.
    pub http_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_base_url(
            "FEEDME_API_URL",
            &get_env_or_default("FEEDME_API_URL", DEFAULT_API_URL),
        )?;
        let direct_api_url = match get_optional_env("FEEDME_DIRECT_API_URL") {
            Some(raw) => parse_base_url("FEEDME_DIRECT_API_URL", &raw)?,
            None => api_url.clone(),
        };
        let session_file = get_optional_env("FEEDME_SESSION_FILE")
            .map_or_else(default_session_file, PathBuf::from);
        let cache_ttl = Duration::from_secs(parse_env(
            "FEEDME_CACHE_TTL_SECS",
            &get_env_or_default("FEEDME_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
        )?);
        let cache_capacity = parse_env(
            "FEEDME_CACHE_CAPACITY",
            &get_env_or_default("FEEDME_CACHE_CAPACITY", DEFAULT_CACHE_CAPACITY),
        )?;
        let http_timeout = get_optional_env("FEEDME_HTTP_TIMEOUT_SECS")
            .map(|raw| parse_env("FEEDME_HTTP_TIMEOUT_SECS", &raw).map(Duration::from_secs))
            .transpose()?;

        Ok(Self {
            api_url,
            direct_api_url,
            session_file,
            cache_ttl,
            cache_capacity,
            http_timeout,
        })
    }

    /// Configuration pointing both transports at `base_url`, with default
    /// cache settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not a valid URL.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let api_url = parse_base_url("FEEDME_API_URL", base_url)?;
        Ok(Self {
            direct_api_url: api_url.clone(),
            api_url,
            session_file: default_session_file(),
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1000,
            http_timeout: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a base URL and make sure it ends in `/` so relative joins keep the
/// last path segment (`/api`).
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "not a base URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_session_file() -> PathBuf {
    std::env::var_os("HOME").map_or_else(
        || PathBuf::from(".feedme-session.json"),
        |home| {
            PathBuf::from(home)
                .join(".config")
                .join("feedme")
                .join(SESSION_FILE_NAME)
        },
    )
}
