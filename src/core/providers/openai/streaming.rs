//! OpenAI chat-completion chunk translation
//!
//! The canonical delta shape is the OpenAI chunk shape, so translation is a
//! parse plus the `[DONE]` marker and in-stream error objects.

use tracing::debug;

use crate::core::providers::unified_provider::ProviderError;
use crate::core::providers::{StreamTranslator, Translation, Vendor};
use crate::core::streaming::types::{DONE_MARKER, VendorEvent};
use crate::core::types::responses::ChatChunk;

const PROVIDER: &str = "openai";

/// Translator for OpenAI-compatible upstreams
///
/// Native passthrough is not distinguished: the canonical frames already are
/// the vendor's frames.
#[derive(Debug, Default)]
pub struct OpenAiTranslator {
    first_seen: bool,
}

impl OpenAiTranslator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamTranslator for OpenAiTranslator {
    fn vendor(&self) -> Vendor {
        Vendor::OpenAi
    }

    fn on_vendor_event(&mut self, event: &VendorEvent) -> Result<Translation, ProviderError> {
        let data = event.data.trim();
        if data == DONE_MARKER {
            return Ok(Translation::done());
        }
        if data.is_empty() {
            return Ok(Translation::skip());
        }

        let chunk: ChatChunk = serde_json::from_str(data)
            .map_err(|e| ProviderError::response_parsing(PROVIDER, e.to_string()))?;

        if let Some(error) = chunk.error.as_ref().filter(|_| chunk.choices.is_empty()) {
            return Err(ProviderError::streaming(
                PROVIDER,
                error.kind(),
                error.message.as_str(),
            ));
        }

        if !self.first_seen {
            self.first_seen = true;
            debug!(id = %chunk.id, model = %chunk.model, "First OpenAI chunk");
        }
        Ok(Translation::delta(chunk))
    }
}
