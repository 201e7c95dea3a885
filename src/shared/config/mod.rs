//! Application configuration module
//!
//! Provides the configuration shared by every chat client: where the REST
//! backend lives and how often the client refreshes and expires notices.
//!
//! Values can be built in code through [`AppConfigBuilder`] or read from a
//! TOML file:
//!
//! ```toml
//! server_url = "https://portal.example.edu"
//! api_prefix = "/api"
//! poll_interval_secs = 15
//! notice_ttl_secs = 5
//! request_timeout_secs = 20
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default API prefix prepended to every chat endpoint
pub const DEFAULT_API_PREFIX: &str = "/api";
/// Default contact polling interval
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
/// Default lifetime of a transient notice
pub const DEFAULT_NOTICE_TTL_SECS: u64 = 5;
/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server URL
    pub server_url: Option<String>,
    /// Path prefix of the REST API (e.g. `/api`)
    pub api_prefix: String,
    /// Seconds between background contact refreshes
    pub poll_interval_secs: u64,
    /// Seconds a notice stays visible
    pub notice_ttl_secs: u64,
    /// Seconds before an HTTP request is abandoned
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            notice_ttl_secs: DEFAULT_NOTICE_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.server_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "api_prefix",
                message: format!("must start with '/': {}", self.api_prefix),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Default location of the config file (`<config dir>/campus-chat/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("campus-chat").join("config.toml"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    api_prefix: Option<String>,
    poll_interval_secs: Option<u64>,
    notice_ttl_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Set the API prefix
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = Some(prefix.into());
        self
    }

    pub fn poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = Some(secs);
        self
    }

    pub fn notice_ttl_secs(mut self, secs: u64) -> Self {
        self.notice_ttl_secs = Some(secs);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            server_url: self.server_url,
            api_prefix: self.api_prefix.unwrap_or(defaults.api_prefix),
            poll_interval_secs: self.poll_interval_secs.unwrap_or(defaults.poll_interval_secs),
            notice_ttl_secs: self.notice_ttl_secs.unwrap_or(defaults.notice_ttl_secs),
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("failed to read config: {0}")]
    Io(String),
}
