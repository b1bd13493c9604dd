//! Anthropic error mapping

use crate::core::providers::unified_provider::ProviderError;

pub(crate) const PROVIDER: &str = "anthropic";

/// Map an in-stream `error` event onto [`ProviderError`]
///
/// `provider` differs from `anthropic` when the same payloads arrive through
/// another host (Bedrock).
pub fn anthropic_stream_error(provider: &'static str, error_type: &str, message: &str) -> ProviderError {
    match error_type {
        "rate_limit_error" => ProviderError::rate_limit(provider, message),
        "invalid_request_error" => ProviderError::api_error(provider, 400, message),
        "authentication_error" => ProviderError::api_error(provider, 401, message),
        "permission_error" => ProviderError::api_error(provider, 403, message),
        "not_found_error" => ProviderError::api_error(provider, 404, message),
        "request_too_large" => ProviderError::api_error(provider, 413, message),
        "api_error" => ProviderError::api_error(provider, 500, message),
        // overloaded_error and anything newer keep the vendor's type
        other => ProviderError::streaming(provider, other, message),
    }
}
