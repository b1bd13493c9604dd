//! Client-facing error normalisation
//!
//! All failures are reduced to one [`ApiError`] shape before a client sees them,
//! both for synchronous HTTP failures and for the error delta of a stream.

use super::types::GatewayError;
use crate::core::types::responses::ApiError;
pub use crate::core::types::responses::ErrorResponse;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

impl GatewayError {
    /// HTTP status this error maps to
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::Provider(provider_error) => provider_error.http_status(),
            GatewayError::Validation(_) => 400,
            GatewayError::Timeout(_) => 504,
            GatewayError::Network(_) | GatewayError::Parsing(_) => 502,
            GatewayError::Cancelled(_) => 499,
            GatewayError::Config(_)
            | GatewayError::Serialization(_)
            | GatewayError::Yaml(_)
            | GatewayError::Io(_)
            | GatewayError::Audit(_)
            | GatewayError::Internal(_) => 500,
        }
    }

    /// Stable error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::Config(_) => "CONFIG_ERROR",
            GatewayError::Serialization(_) | GatewayError::Yaml(_) => "SERIALIZATION_ERROR",
            GatewayError::Io(_) => "IO_ERROR",
            GatewayError::Provider(_) => "PROVIDER_ERROR",
            GatewayError::Validation(_) => "VALIDATION_ERROR",
            GatewayError::Timeout(_) => "TIMEOUT",
            GatewayError::Network(_) => "NETWORK_ERROR",
            GatewayError::Parsing(_) => "PARSING_ERROR",
            GatewayError::Cancelled(_) => "CANCELLED",
            GatewayError::Audit(_) => "AUDIT_ERROR",
            GatewayError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Normalise into the single client-visible error shape
    pub fn to_api_error(&self) -> ApiError {
        let (error_type, message) = match self {
            GatewayError::Provider(provider_error) => (
                provider_error.error_type().to_string(),
                provider_error.to_string(),
            ),
            GatewayError::Validation(_) => ("invalid_request_error".to_string(), self.to_string()),
            GatewayError::Timeout(_) | GatewayError::Network(_) | GatewayError::Parsing(_) => {
                ("upstream_error".to_string(), self.to_string())
            }
            GatewayError::Cancelled(_) => ("cancelled".to_string(), self.to_string()),
            _ => (
                "internal_error".to_string(),
                "An internal error occurred".to_string(),
            ),
        };

        ApiError {
            message,
            error_type,
            param: None,
            code: Some(self.error_code().to_string()),
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_api_error(),
        })
    }
}
