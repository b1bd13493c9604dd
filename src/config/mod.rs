//! Configuration management
//!
//! Loads, validates and merges the streaming pipeline and logging settings.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::core::streaming::sink::ClientFormat;
use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const ENV_CLIENT_FORMAT: &str = "GATEWAY_STREAM_CLIENT_FORMAT";
const ENV_SIMULATE_TOOL_CALLS: &str = "GATEWAY_STREAM_SIMULATE_TOOL_CALLS";
const ENV_CONNECT_TIMEOUT_SECS: &str = "GATEWAY_STREAM_CONNECT_TIMEOUT_SECS";
const ENV_AUDIT_ENABLED: &str = "GATEWAY_STREAM_AUDIT_ENABLED";
const ENV_LOG_LEVEL: &str = "GATEWAY_STREAM_LOG_LEVEL";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Streaming pipeline configuration
    #[serde(default)]
    pub streaming: StreamingConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// A `.env` file in the working directory is read first when present.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {:?}", path);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(format) = lookup(ENV_CLIENT_FORMAT) {
            config.streaming.client_format = format.parse::<ClientFormat>()?;
        }
        if let Some(flag) = lookup(ENV_SIMULATE_TOOL_CALLS) {
            config.streaming.simulate_tool_calls = parse_flag(ENV_SIMULATE_TOOL_CALLS, &flag)?;
        }
        if let Some(secs) = lookup(ENV_CONNECT_TIMEOUT_SECS) {
            config.streaming.connect_timeout_secs = secs.trim().parse().map_err(|e| {
                GatewayError::Config(format!("Invalid {}: {}", ENV_CONNECT_TIMEOUT_SECS, e))
            })?;
        }
        if let Some(flag) = lookup(ENV_AUDIT_ENABLED) {
            config.streaming.audit.enabled = parse_flag(ENV_AUDIT_ENABLED, &flag)?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Get streaming configuration
    pub fn streaming(&self) -> &StreamingConfig {
        &self.streaming
    }

    /// Get logging configuration
    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.streaming
            .validate()
            .map_err(|e| GatewayError::Config(format!("Streaming config error: {}", e)))?;

        self.logging
            .validate()
            .map_err(|e| GatewayError::Config(format!("Logging config error: {}", e)))?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.streaming = self.streaming.merge(other.streaming);
        self.logging = self.logging.merge(other.logging);
        self
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GatewayError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(GatewayError::Config(format!(
            "Invalid {}: expected a boolean, got {:?}",
            key, other
        ))),
    }
}
