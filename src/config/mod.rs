//! Configuration module for the console
//!
//! Provides layered configuration loading from files, environment variables,
//! and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`FLOWFORGE_CONSOLE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)

pub mod error;
pub mod logging;
pub mod poll;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use poll::PollConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the controller's HTTP API
    pub base_url: String,
    /// Optional bearer token sent with mutating actions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Polling cadence and timeouts
    pub poll: PollConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            api_key: None,
            poll: PollConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports FLOWFORGE_CONSOLE_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base) = std::env::var("FLOWFORGE_CONSOLE_API_BASE") {
            if !base.is_empty() {
                self.base_url = base;
            }
        }
        if let Ok(key) = std::env::var("FLOWFORGE_CONSOLE_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(level) = std::env::var("FLOWFORGE_CONSOLE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("FLOWFORGE_CONSOLE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }
        self
    }

    /// Validate values that would otherwise fail deep inside the controller
    /// loop (zero intervals spin, an empty base URL cannot form requests).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "base_url".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        let intervals = [
            ("poll.incidents_interval_seconds", self.poll.incidents_interval_seconds),
            ("poll.timeline_interval_seconds", self.poll.timeline_interval_seconds),
            ("poll.lifecycle_interval_seconds", self.poll.lifecycle_interval_seconds),
            ("poll.metrics_interval_seconds", self.poll.metrics_interval_seconds),
            ("poll.replay_interval_seconds", self.poll.replay_interval_seconds),
            ("poll.chain_interval_seconds", self.poll.chain_interval_seconds),
            ("poll.timeout_seconds", self.poll.timeout_seconds),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(ConfigError::Validation {
                    field: field.to_string(),
                    message: "must be at least 1 second".to_string(),
                });
            }
        }
        Ok(())
    }
}
