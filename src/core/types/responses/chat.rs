//! Chat response types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::super::message::{ChatMessage, MessageRole};
use super::delta::ChatDelta;
use super::error::ApiError;
use super::finish_reason::FinishReason;
use super::usage::Usage;

/// Object type of a streaming delta
pub const CHUNK_OBJECT: &str = "chat.completion.chunk";
/// Object type of an accumulated response
pub const RESPONSE_OBJECT: &str = "chat.completion";

/// Accumulated chat completion response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Response ID
    pub id: String,

    /// Object type
    pub object: String,

    /// Creation timestamp
    pub created: i64,

    /// Model used
    pub model: String,

    /// Choice list, ordered by index
    pub choices: Vec<ChatChoice>,

    /// Usage statistics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// System fingerprint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

/// Chat choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    /// Choice index
    pub index: u32,

    /// Response message
    pub message: ChatMessage,

    /// Completion reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl ChatResponse {
    /// Get first message content
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }

    /// Look a choice up by index
    pub fn choice(&self, index: u32) -> Option<&ChatChoice> {
        self.choices.iter().find(|choice| choice.index == index)
    }

    /// Check if response has tool calls
    pub fn has_tool_calls(&self) -> bool {
        self.choices
            .iter()
            .any(|choice| choice.message.tool_calls.is_some())
    }
}

/// Streaming chat chunk (one canonical delta)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChunk {
    /// Response ID
    #[serde(default)]
    pub id: String,

    /// Object type
    #[serde(default = "default_chunk_object")]
    pub object: String,

    /// Creation timestamp, stamped by the pipeline on arrival
    #[serde(default)]
    pub created: i64,

    /// Model used
    #[serde(default)]
    pub model: String,

    /// Choice list
    #[serde(default)]
    pub choices: Vec<ChatStreamChoice>,

    /// Usage (usually in last chunk)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// System fingerprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,

    /// Terminal error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// Safety-audit verdict (side-channel delta)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<Value>,

    /// Request risk payload, attached to the first delta only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<Value>,
}

fn default_chunk_object() -> String {
    CHUNK_OBJECT.to_string()
}

/// Streaming choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatStreamChoice {
    /// Choice index
    #[serde(default)]
    pub index: u32,

    /// Delta content
    #[serde(default)]
    pub delta: ChatDelta,

    /// Finish reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,

    /// Log probabilities
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Value>,
}

impl ChatStreamChoice {
    pub fn new(index: u32, delta: ChatDelta) -> Self {
        Self {
            index,
            delta,
            finish_reason: None,
            logprobs: None,
        }
    }
}

impl ChatChunk {
    /// Empty delta shell carrying only id and model
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: CHUNK_OBJECT.to_string(),
            created: 0,
            model: model.into(),
            choices: Vec::new(),
            usage: None,
            system_fingerprint: None,
            error: None,
            audit: None,
            risk: None,
        }
    }

    /// Shell with a single choice at index 0
    pub fn with_delta(id: impl Into<String>, model: impl Into<String>, delta: ChatDelta) -> Self {
        let mut chunk = Self::new(id, model);
        chunk.choices.push(ChatStreamChoice::new(0, delta));
        chunk
    }

    /// Copy of id/model/created with no choices, used as a template for synthesized deltas
    pub fn shell(&self) -> Self {
        let mut shell = Self::new(self.id.clone(), self.model.clone());
        shell.created = self.created;
        shell.system_fingerprint = self.system_fingerprint.clone();
        shell
    }

    pub fn first_choice(&self) -> Option<&ChatStreamChoice> {
        self.choices.first()
    }

    /// Delta of the 0th choice, if the chunk has any choices
    pub fn first_delta(&self) -> Option<&ChatDelta> {
        self.choices.first().map(|choice| &choice.delta)
    }

    /// Side-channel deltas carry pipeline metadata rather than model output
    pub fn is_side_channel(&self) -> bool {
        self.choices.is_empty() && (self.audit.is_some() || self.risk.is_some() || self.error.is_some())
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        if let Some(choice) = self.choices.first_mut() {
            choice.finish_reason = Some(reason);
        } else {
            let mut choice = ChatStreamChoice::new(0, ChatDelta::default());
            choice.finish_reason = Some(reason);
            self.choices.push(choice);
        }
        self
    }

    pub fn with_role(mut self, role: MessageRole) -> Self {
        if let Some(choice) = self.choices.first_mut() {
            choice.delta.role = Some(role);
        }
        self
    }
}
