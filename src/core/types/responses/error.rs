//! Client-visible error payload

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Error response wrapper, used for non-streaming failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
}

/// Normalised error carried by an error delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error message
    pub message: String,

    /// Error type; OpenAI-compatible upstreams sometimes omit it
    #[serde(rename = "type", default)]
    pub error_type: String,

    /// Parameter that caused the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,

    /// Error code, a string or an HTTP status number on the wire
    #[serde(
        default,
        deserialize_with = "code_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<String>,
}

impl ApiError {
    /// Best available error kind: `type`, then `code`, then a generic label
    pub fn kind(&self) -> &str {
        if !self.error_type.is_empty() {
            &self.error_type
        } else {
            self.code.as_deref().unwrap_or("upstream_error")
        }
    }
}

fn code_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(code)) => Some(code),
        Some(other) => Some(other.to_string()),
    })
}
