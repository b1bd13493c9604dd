//! Client-facing sink and wire encoders
//!
//! The accumulator hands canonical deltas to a [`StreamSink`]; the sink's
//! [`ChunkEncoder`] decides what the client actually sees (OpenAI chunks,
//! an Anthropic envelope, or nothing when the vendor's own events are being
//! passed through).

use super::types::Event;
use crate::core::providers::anthropic::AnthropicEncoder;
use crate::core::types::responses::ChatChunk;
use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;

/// Wire dialect the client expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientFormat {
    /// Canonical `chat.completion.chunk` frames terminated by `[DONE]`
    #[default]
    #[serde(rename = "openai", alias = "open_ai")]
    OpenAi,
    /// Anthropic Messages envelope
    Anthropic,
    /// The upstream vendor's own events, unmodified
    Native,
}

impl ClientFormat {
    pub fn encoder(self) -> Box<dyn ChunkEncoder> {
        match self {
            ClientFormat::OpenAi => Box::new(OpenAiEncoder),
            ClientFormat::Anthropic => Box::new(AnthropicEncoder::new()),
            ClientFormat::Native => Box::new(PassthroughEncoder),
        }
    }
}

impl std::str::FromStr for ClientFormat {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(ClientFormat::OpenAi),
            "anthropic" => Ok(ClientFormat::Anthropic),
            "native" => Ok(ClientFormat::Native),
            other => Err(GatewayError::config(format!("Unknown client format: {}", other))),
        }
    }
}

/// Re-encodes canonical deltas into client frames
pub trait ChunkEncoder: Send {
    fn encode(&mut self, chunk: &ChatChunk) -> Result<Vec<Event>>;

    /// Frames that close the stream after a normal end
    fn finish(&mut self) -> Vec<Event>;
}

/// Canonical OpenAI-compatible chunks
#[derive(Debug, Default)]
pub struct OpenAiEncoder;

impl ChunkEncoder for OpenAiEncoder {
    fn encode(&mut self, chunk: &ChatChunk) -> Result<Vec<Event>> {
        Ok(vec![Event::json(chunk)?])
    }

    fn finish(&mut self) -> Vec<Event> {
        vec![Event::done()]
    }
}

/// Encoder for native passthrough
///
/// Model output already reached the client as the vendor's own frames, so only
/// pipeline side-channel payloads are emitted, as named events.
#[derive(Debug, Default)]
pub struct PassthroughEncoder;

impl ChunkEncoder for PassthroughEncoder {
    fn encode(&mut self, chunk: &ChatChunk) -> Result<Vec<Event>> {
        Ok(side_channel_events(chunk))
    }

    fn finish(&mut self) -> Vec<Event> {
        Vec::new()
    }
}

/// Named `risk` / `audit` / `error` events for the pipeline payloads a chunk carries
///
/// The error body uses the Anthropic error envelope, which OpenAI-style
/// clients also accept under a named event.
pub(crate) fn side_channel_events(chunk: &ChatChunk) -> Vec<Event> {
    let mut events = Vec::new();
    if let Some(risk) = &chunk.risk {
        events.push(Event::new().event("risk").data(&risk.to_string()));
    }
    if let Some(audit) = &chunk.audit {
        events.push(Event::new().event("audit").data(&audit.to_string()));
    }
    if let Some(error) = &chunk.error {
        let body = json!({
            "type": "error",
            "error": { "type": error.error_type, "message": error.message },
        });
        events.push(Event::new().event("error").data(&body.to_string()));
    }
    events
}

/// Destination of everything the client sees
pub trait StreamSink: Send {
    /// Encode and deliver one canonical delta
    fn send_chunk(&mut self, chunk: &ChatChunk) -> Result<()>;

    /// Deliver a vendor frame unmodified
    fn send_native(&mut self, event: Event) -> Result<()>;

    /// Deliver the terminal frames of a normally finished stream
    fn send_done(&mut self) -> Result<()>;
}

/// [`StreamSink`] writing SSE events into an unbounded channel
pub struct SseSink {
    tx: mpsc::UnboundedSender<Event>,
    encoder: Box<dyn ChunkEncoder>,
}

impl SseSink {
    pub fn new(tx: mpsc::UnboundedSender<Event>, encoder: Box<dyn ChunkEncoder>) -> Self {
        Self { tx, encoder }
    }

    /// Sink plus the receiving end the HTTP layer streams from
    pub fn channel(format: ClientFormat) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx, format.encoder()), rx)
    }

    /// Raw sender for vendor frames that bypass encoding
    pub fn native_sender(&self) -> NativeSender {
        NativeSender {
            tx: self.tx.clone(),
        }
    }

    fn push(&self, event: Event) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| GatewayError::cancelled("client disconnected"))
    }
}

impl StreamSink for SseSink {
    fn send_chunk(&mut self, chunk: &ChatChunk) -> Result<()> {
        for event in self.encoder.encode(chunk)? {
            self.push(event)?;
        }
        Ok(())
    }

    fn send_native(&mut self, event: Event) -> Result<()> {
        self.push(event)
    }

    fn send_done(&mut self) -> Result<()> {
        for event in self.encoder.finish() {
            self.push(event)?;
        }
        Ok(())
    }
}

/// Cloneable handle for forwarding vendor frames to the client
#[derive(Debug, Clone)]
pub struct NativeSender {
    tx: mpsc::UnboundedSender<Event>,
}

impl NativeSender {
    pub fn send(&self, event: Event) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| GatewayError::cancelled("client disconnected"))
    }

    /// Resolves once the client side has gone away
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
