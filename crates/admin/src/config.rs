//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `STOREHOUSE_API_URL` - REST API base URL (default: `http://localhost:5000`).
//!   A URL on a browser-blocked port falls back to the default.
//! - `STOREHOUSE_API_TIMEOUT_SECS` - Per-request API timeout (default: 15)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sampling (default: 1.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use storehouse_core::{ApiBaseUrl, ApiUrlError};
use thiserror::Error;

/// Default per-request timeout for API calls.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 15;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Remote REST API settings
    pub api: ApiConfig,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Where and how to reach the REST API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: ApiBaseUrl,
    pub timeout: Duration,
    /// Why the configured URL was replaced by the default, if it was
    pub rejected_url: Option<ApiUrlError>,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;

        let api = ApiConfig::from_values(
            get_optional_env("STOREHOUSE_API_URL").as_deref(),
            get_optional_env("STOREHOUSE_API_TIMEOUT_SECS").as_deref(),
        )?;

        let log_json =
            get_optional_env("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url,
            api,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the session cookie should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ApiConfig {
    /// Build from raw variable values. A rejected URL falls back to the
    /// default and is reported through `rejected_url`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for a non-numeric timeout.
    pub fn from_values(url: Option<&str>, timeout_secs: Option<&str>) -> Result<Self, ConfigError> {
        let (base_url, rejected_url) = ApiBaseUrl::resolve(url);
        let timeout_secs = match timeout_secs.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("STOREHOUSE_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_API_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            rejected_url,
        })
    }
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
