//! Upstream vendor dialects
//!
//! Each vendor gets a [`StreamTranslator`] that turns its deframed events into
//! canonical deltas, and optionally passes the original event through to the
//! client untouched.

pub mod anthropic;
pub mod bedrock;
pub mod openai;
pub mod unified_provider;

use crate::core::streaming::types::{Event, VendorEvent};
use crate::core::types::responses::ChatChunk;
use crate::utils::error::GatewayError;
pub use unified_provider::ProviderError;

/// Upstream vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    /// OpenAI and every OpenAI-compatible upstream
    #[serde(alias = "open_ai")]
    OpenAi,
    Anthropic,
    /// AWS Bedrock `invoke-with-response-stream`
    Bedrock,
}

impl Vendor {
    pub fn name(self) -> &'static str {
        match self {
            Vendor::OpenAi => "openai",
            Vendor::Anthropic => "anthropic",
            Vendor::Bedrock => "bedrock",
        }
    }

    /// Path of the vendor's own streaming endpoint
    pub fn native_endpoint(self) -> &'static str {
        match self {
            Vendor::OpenAi => "/v1/chat/completions",
            Vendor::Anthropic => "/v1/messages",
            Vendor::Bedrock => "/invoke-with-response-stream",
        }
    }

    /// Whether a client request path targets this vendor's native API
    ///
    /// Bedrock paths embed the model id (`/model/{id}/invoke-with-response-stream`),
    /// so only the suffix is compared.
    pub fn is_native_endpoint(self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path).trim_end_matches('/');
        match self {
            Vendor::Bedrock => path.ends_with(self.native_endpoint()),
            _ => path == self.native_endpoint(),
        }
    }

    /// Fresh per-request translator
    pub fn translator(self, native: bool) -> Box<dyn StreamTranslator> {
        match self {
            Vendor::OpenAi => Box::new(openai::OpenAiTranslator::new()),
            Vendor::Anthropic => Box::new(anthropic::AnthropicTranslator::new(native)),
            Vendor::Bedrock => Box::new(bedrock::BedrockTranslator::new(native)),
        }
    }
}

impl std::str::FromStr for Vendor {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Vendor::OpenAi),
            "anthropic" => Ok(Vendor::Anthropic),
            "bedrock" | "aws-bedrock" => Ok(Vendor::Bedrock),
            other => Err(GatewayError::config(format!("Unknown vendor: {}", other))),
        }
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of one vendor event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    /// Canonical delta for the pipeline, if the event carried one
    pub delta: Option<ChatChunk>,
    /// Original frame for native passthrough
    pub native: Option<Event>,
    /// Vendor signalled the end of the stream
    pub done: bool,
}

impl Translation {
    /// Event with nothing for the pipeline
    pub fn skip() -> Self {
        Self::default()
    }

    pub fn delta(chunk: ChatChunk) -> Self {
        Self {
            delta: Some(chunk),
            ..Self::default()
        }
    }

    pub fn done() -> Self {
        Self {
            done: true,
            ..Self::default()
        }
    }

    /// Attach the original frame when passthrough is on
    pub fn with_native(mut self, enabled: bool, event: &VendorEvent) -> Self {
        if enabled {
            self.native = Some(event.to_event());
        }
        self
    }
}

/// Per-request state machine for one vendor dialect
pub trait StreamTranslator: Send {
    fn vendor(&self) -> Vendor;

    /// Translate one deframed vendor event
    ///
    /// An in-stream vendor error is returned as `Err`.
    fn on_vendor_event(&mut self, event: &VendorEvent) -> Result<Translation, ProviderError>;
}
