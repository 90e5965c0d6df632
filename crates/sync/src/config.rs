//! Sync service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TIENDITA_API_BASE_URL` - Base URL of the store REST API
//!   (e.g., `https://api.tiendita.example/api/v1`)
//!
//! ## Optional
//! - `TIENDITA_HTTP_TIMEOUT_SECS` - HTTP client timeout in seconds
//!   (default: 10)

use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Sync service configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the store REST API.
    pub api_base_url: Url,
    /// Timeout applied to every HTTP request.
    pub http_timeout: Duration,
}

impl SyncConfig {
    /// Create a configuration directly (useful for tests and embedding).
    #[must_use]
    pub const fn new(api_base_url: Url, http_timeout: Duration) -> Self {
        Self {
            api_base_url,
            http_timeout,
        }
    }

    /// Create a configuration with the default timeout.
    #[must_use]
    pub const fn with_base_url(api_base_url: Url) -> Self {
        Self::new(
            api_base_url,
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let raw_url = std::env::var("TIENDITA_API_BASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("TIENDITA_API_BASE_URL".to_string()))?;
        let api_base_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("TIENDITA_API_BASE_URL".to_string(), e.to_string())
        })?;

        let http_timeout = match std::env::var("TIENDITA_HTTP_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ConfigError::InvalidEnvVar(
                        "TIENDITA_HTTP_TIMEOUT_SECS".to_string(),
                        format!("expected an integer number of seconds, got {raw:?}"),
                    )
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            api_base_url,
            http_timeout,
        })
    }
}
