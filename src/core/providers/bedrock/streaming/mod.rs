//! Bedrock stream translation
//!
//! `chunk` events carry `{"bytes": "<base64>"}`; the decoded payload is an
//! Anthropic Messages event, optionally with an
//! `amazon-bedrock-invocationMetrics` block on the last one. Exceptions arrive
//! as their own message type.

mod event_stream;

pub use event_stream::{EventStreamDecoder, EventStreamMessage, HeaderValue};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::core::providers::anthropic::AnthropicTranslator;
use crate::core::providers::unified_provider::ProviderError;
use crate::core::providers::{StreamTranslator, Translation, Vendor};
use crate::core::streaming::types::{Event, VendorEvent};
use crate::core::types::responses::Usage;

const PROVIDER: &str = "bedrock";

/// Bedrock event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BedrockEvent {
    Chunk,
    InternalServer,
    ModelStreamError,
    ModelTimeout,
    Throttling,
    Validation,
    ServiceUnavailable,
    UnknownException,
    Unknown,
}

impl BedrockEvent {
    fn classify(event_type: Option<&str>) -> Self {
        match event_type {
            Some("chunk") => BedrockEvent::Chunk,
            Some("internalServerException") => BedrockEvent::InternalServer,
            Some("modelStreamErrorException") => BedrockEvent::ModelStreamError,
            Some("modelTimeoutException") => BedrockEvent::ModelTimeout,
            Some("throttlingException") => BedrockEvent::Throttling,
            Some("validationException") => BedrockEvent::Validation,
            Some("serviceUnavailableException") => BedrockEvent::ServiceUnavailable,
            Some(other) if other.ends_with("Exception") => BedrockEvent::UnknownException,
            _ => BedrockEvent::Unknown,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    bytes: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExceptionPayload {
    #[serde(default, alias = "Message")]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvocationMetrics {
    #[serde(default)]
    input_token_count: u32,
    #[serde(default)]
    output_token_count: u32,
}

/// Translator for `invoke-with-response-stream` on Anthropic models
pub struct BedrockTranslator {
    native: bool,
    inner: AnthropicTranslator,
}

impl BedrockTranslator {
    pub fn new(native: bool) -> Self {
        Self {
            native,
            // passthrough is handled here, on the decoded payload
            inner: AnthropicTranslator::for_provider(PROVIDER, false),
        }
    }

    fn exception(kind: BedrockEvent, event_type: &str, data: &str) -> ProviderError {
        let message = serde_json::from_str::<ExceptionPayload>(data)
            .map(|payload| payload.message)
            .unwrap_or_else(|_| data.to_string());
        match kind {
            BedrockEvent::Throttling => ProviderError::rate_limit(PROVIDER, message),
            BedrockEvent::Validation => ProviderError::api_error(PROVIDER, 400, message),
            BedrockEvent::InternalServer => ProviderError::api_error(PROVIDER, 500, message),
            BedrockEvent::ServiceUnavailable => ProviderError::api_error(PROVIDER, 503, message),
            BedrockEvent::ModelTimeout => ProviderError::timeout(PROVIDER, message),
            _ => ProviderError::streaming(PROVIDER, event_type, message),
        }
    }

    fn chunk(&mut self, data: &str) -> Result<Translation, ProviderError> {
        let payload: ChunkPayload = serde_json::from_str(data)
            .map_err(|e| ProviderError::response_parsing(PROVIDER, e.to_string()))?;
        let decoded = STANDARD
            .decode(payload.bytes.as_bytes())
            .map_err(|e| ProviderError::response_parsing(PROVIDER, format!("Invalid base64 chunk: {}", e)))?;
        let inner = String::from_utf8(decoded)
            .map_err(|e| ProviderError::response_parsing(PROVIDER, e.to_string()))?;

        let value: Value = serde_json::from_str(&inner)
            .map_err(|e| ProviderError::response_parsing(PROVIDER, e.to_string()))?;
        let metrics = value
            .get("amazon-bedrock-invocationMetrics")
            .cloned()
            .and_then(|metrics| serde_json::from_value::<InvocationMetrics>(metrics).ok());

        let mut translation = self.inner.translate_payload(&inner)?;

        if let Some(metrics) = metrics {
            debug!(
                input_tokens = metrics.input_token_count,
                output_tokens = metrics.output_token_count,
                "Bedrock invocation metrics"
            );
            let usage = Usage::new(metrics.input_token_count, metrics.output_token_count);
            match translation.delta.as_mut() {
                Some(chunk) => {
                    let merged = self.inner.usage_chunk(usage).usage;
                    chunk.usage = merged;
                }
                None => translation.delta = Some(self.inner.usage_chunk(usage)),
            }
        }

        if self.native {
            let event_type = value.get("type").and_then(Value::as_str);
            translation.native = Some(Event {
                event: event_type.map(str::to_string),
                data: inner,
            });
        }
        Ok(translation)
    }
}

impl StreamTranslator for BedrockTranslator {
    fn vendor(&self) -> Vendor {
        Vendor::Bedrock
    }

    fn on_vendor_event(&mut self, event: &VendorEvent) -> Result<Translation, ProviderError> {
        match BedrockEvent::classify(event.event_type()) {
            BedrockEvent::Chunk => self.chunk(&event.data),
            BedrockEvent::Unknown => {
                debug!(event_type = ?event.event_type(), "Ignoring unknown Bedrock event");
                Ok(Translation::skip().with_native(self.native, event))
            }
            kind => Err(Self::exception(
                kind,
                event.event_type().unwrap_or_default(),
                &event.data,
            )),
        }
    }
}
