//! Unified upstream error handling
//!
//! Single error type for every upstream dialect the pipeline reads from.
//!
//! | Variant | Purpose | HTTP Status | Retryable |
//! |------|------|------------|--------|
//! | Network | Connection dropped / transport failure | 503 | Yes |
//! | Timeout | Upstream did not open or stalled | 503 | Yes |
//! | RateLimit | Upstream throttled the request | 429 | Yes |
//! | ApiError | Upstream answered with an error status | status | 429 / 5xx |
//! | ResponseParsing | Malformed vendor event | 502 | No |
//! | Streaming | Vendor reported an in-stream failure | 500 | Yes |
//! | ContentFiltered | Upstream safety system stopped the stream | 400 | No |
//! | Cancelled | Client went away | 499 | No |
//! | Other | Anything else | 500 | No |
//!
//! Retryability is informational only; no retries happen inside the streaming
//! pipeline.

/// Unified provider error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Network error for {provider}: {message}")]
    Network {
        provider: &'static str,
        message: String,
    },

    #[error("Timeout for {provider}: {message}")]
    Timeout {
        provider: &'static str,
        message: String,
    },

    #[error("Rate limit exceeded for {provider}: {message}")]
    RateLimit {
        provider: &'static str,
        message: String,
        retry_after: Option<u64>,
    },

    /// API error with status code
    #[error("API error for {provider} (status {status}): {message}")]
    ApiError {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Vendor event could not be decoded
    #[error("Failed to parse {provider} response: {message}")]
    ResponseParsing {
        provider: &'static str,
        message: String,
    },

    /// Error event delivered inside an open stream
    #[error("Streaming error for {provider}: {message}")]
    Streaming {
        provider: &'static str,
        /// Vendor error type (`overloaded_error`, `modelStreamErrorException`, ...)
        error_type: String,
        message: String,
    },

    /// Content filtered by upstream safety systems
    #[error("Content filtered by {provider} safety systems: {reason}")]
    ContentFiltered {
        provider: &'static str,
        reason: String,
    },

    #[error("Operation cancelled for {provider}: {reason}")]
    Cancelled {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} error: {message}")]
    Other {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    /// Create network error
    pub fn network(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Network {
            provider,
            message: message.into(),
        }
    }

    /// Create timeout error
    pub fn timeout(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Timeout {
            provider,
            message: message.into(),
        }
    }

    /// Create rate limit error
    pub fn rate_limit(provider: &'static str, message: impl Into<String>) -> Self {
        Self::RateLimit {
            provider,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create API error with status code
    pub fn api_error(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider,
            status,
            message: message.into(),
        }
    }

    /// Create response parsing error
    pub fn response_parsing(provider: &'static str, message: impl Into<String>) -> Self {
        Self::ResponseParsing {
            provider,
            message: message.into(),
        }
    }

    /// Create in-stream error
    pub fn streaming(
        provider: &'static str,
        error_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Streaming {
            provider,
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Create content filtered error
    pub fn content_filtered(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            provider,
            reason: reason.into(),
        }
    }

    /// Create cancellation error
    pub fn cancelled(provider: &'static str, reason: impl Into<String>) -> Self {
        Self::Cancelled {
            provider,
            reason: reason.into(),
        }
    }

    /// Create other/generic error
    pub fn other(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Other {
            provider,
            message: message.into(),
        }
    }

    /// Get the provider name that caused this error
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Network { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::RateLimit { provider, .. }
            | Self::ApiError { provider, .. }
            | Self::ResponseParsing { provider, .. }
            | Self::Streaming { provider, .. }
            | Self::ContentFiltered { provider, .. }
            | Self::Cancelled { provider, .. }
            | Self::Other { provider, .. } => provider,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::RateLimit { .. }
            | Self::Streaming { .. } => true,

            Self::ApiError { status, .. } => matches!(*status, 429 | 500..=599),

            Self::ResponseParsing { .. }
            | Self::ContentFiltered { .. }
            | Self::Cancelled { .. }
            | Self::Other { .. } => false,
        }
    }

    /// Get HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => 503,
            Self::RateLimit { .. } => 429,
            Self::ApiError { status, .. } => *status,
            Self::ResponseParsing { .. } => 502, // Bad Gateway (upstream response invalid)
            Self::Streaming { .. } => 500,
            Self::ContentFiltered { .. } => 400,
            Self::Cancelled { .. } => 499, // Client Closed Request
            Self::Other { .. } => 500,
        }
    }

    /// Short machine-readable error type used in client error deltas
    pub fn error_type(&self) -> &str {
        match self {
            Self::Network { .. } => "network_error",
            Self::Timeout { .. } => "timeout_error",
            Self::RateLimit { .. } => "rate_limit_error",
            Self::ApiError { .. } => "api_error",
            Self::ResponseParsing { .. } => "invalid_response_error",
            Self::Streaming { error_type, .. } => error_type.as_str(),
            Self::ContentFiltered { .. } => "content_filter_error",
            Self::Cancelled { .. } => "cancelled",
            Self::Other { .. } => "upstream_error",
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::response_parsing("unknown", err.to_string())
    }
}
