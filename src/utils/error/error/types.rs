//! Error types for the streaming gateway

use crate::core::providers::unified_provider::ProviderError;
use thiserror::Error;

/// Result type alias for the gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream provider errors
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Network errors
    #[error("Network error: {0}")]
    Network(String),

    /// Parsing errors (malformed vendor events, tool-call grammar failures)
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// The client or the pipeline abandoned the stream
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Safety audit collaborator errors
    #[error("Audit error: {0}")]
    Audit(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}
