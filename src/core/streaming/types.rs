//! Type definitions for streaming frames

use bytes::Bytes;
use serde::Serialize;

/// Literal payload of the terminal SSE frame
pub const DONE_MARKER: &str = "[DONE]";

/// Simple Event structure for SSE framing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Event type
    pub event: Option<String>,
    /// Event data
    pub data: String,
}

impl Event {
    /// Create a new empty event
    pub fn new() -> Self {
        Self {
            event: None,
            data: String::new(),
        }
    }

    /// Set the event type
    pub fn event(mut self, event: &str) -> Self {
        self.event = Some(event.to_string());
        self
    }

    /// Set the event data
    pub fn data(mut self, data: &str) -> Self {
        self.data = data.to_string();
        self
    }

    /// Event whose data is the JSON encoding of `value`
    pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Self {
            event: None,
            data: serde_json::to_string(value)?,
        })
    }

    /// The `data: [DONE]` terminal frame
    pub fn done() -> Self {
        Self::new().data(DONE_MARKER)
    }

    pub fn is_done(&self) -> bool {
        self.data.trim() == DONE_MARKER
    }

    /// Convert event to bytes for SSE transmission
    pub fn to_bytes(&self) -> Bytes {
        let mut result = String::with_capacity(self.data.len() + 16);
        if let Some(event) = &self.event {
            result.push_str("event: ");
            result.push_str(event);
            result.push('\n');
        }
        for line in self.data.split('\n') {
            result.push_str("data: ");
            result.push_str(line);
            result.push('\n');
        }
        result.push('\n');
        Bytes::from(result)
    }
}

/// One vendor-native event, already deframed from the wire
///
/// `event_type` is the SSE `event:` name or the AWS `:event-type` header;
/// `data` is the raw payload text (JSON for every dialect except the
/// OpenAI `[DONE]` marker).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorEvent {
    pub event_type: Option<String>,
    pub data: String,
}

impl VendorEvent {
    pub fn new(event_type: Option<&str>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.map(str::to_string),
            data: data.into(),
        }
    }

    /// Data-only event (OpenAI style)
    pub fn data(data: impl Into<String>) -> Self {
        Self::new(None, data)
    }

    /// Named event (Anthropic / AWS style)
    pub fn named(event_type: &str, data: impl Into<String>) -> Self {
        Self::new(Some(event_type), data)
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    /// The unmodified SSE frame for native passthrough
    pub fn to_event(&self) -> Event {
        Event {
            event: self.event_type.clone(),
            data: self.data.clone(),
        }
    }
}
