//! Anthropic Messages stream translation
//!
//! `message_start` → `content_block_start` / `content_block_delta` ... →
//! `message_delta` → `message_stop`, plus `ping` and `error` at any point.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::error::{PROVIDER, anthropic_stream_error};
use crate::core::providers::unified_provider::ProviderError;
use crate::core::providers::{StreamTranslator, Translation, Vendor};
use crate::core::streaming::types::VendorEvent;
use crate::core::types::{
    message::MessageRole,
    responses::{ChatChunk, ChatDelta, ChatStreamChoice, FinishReason, ToolCallDelta, Usage},
};

/// Anthropic SSE events
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnthropicEvent {
    MessageStart {
        message: MessageStart,
    },
    ContentBlockStart {
        index: u32,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        index: u32,
        delta: BlockDelta,
    },
    ContentBlockStop {
        #[serde(default)]
        index: u32,
    },
    MessageDelta {
        delta: MessageDeltaBody,
        #[serde(default)]
        usage: Option<AnthropicUsage>,
    },
    MessageStop,
    Ping,
    Error {
        error: ErrorBody,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageStart {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub usage: Option<AnthropicUsage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDeltaBody {
    #[serde(default)]
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AnthropicUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

impl From<AnthropicUsage> for Usage {
    fn from(usage: AnthropicUsage) -> Self {
        Usage::new(usage.input_tokens, usage.output_tokens)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}

/// Translator for the Anthropic Messages stream
pub struct AnthropicTranslator {
    native: bool,
    provider: &'static str,
    first_seen: bool,
    response_id: String,
    model: String,
    usage: Option<Usage>,
    tool_call_index: u32,
    /// Anthropic content-block index → canonical tool-call index
    tool_blocks: HashMap<u32, u32>,
}

impl AnthropicTranslator {
    pub fn new(native: bool) -> Self {
        Self::for_provider(PROVIDER, native)
    }

    /// Same state machine for a host that relays Anthropic payloads
    pub(crate) fn for_provider(provider: &'static str, native: bool) -> Self {
        Self {
            native,
            provider,
            first_seen: false,
            response_id: String::new(),
            model: String::new(),
            usage: None,
            tool_call_index: 0,
            tool_blocks: HashMap::new(),
        }
    }

    /// Merge a late usage report and return it as a choice-less delta
    pub(crate) fn usage_chunk(&mut self, reported: Usage) -> ChatChunk {
        self.merge_usage(reported);
        let mut chunk = ChatChunk::new(self.response_id.clone(), self.model.clone());
        chunk.created = chrono::Utc::now().timestamp();
        chunk.usage = self.usage.clone();
        chunk
    }

    fn merge_usage(&mut self, reported: Usage) {
        match self.usage.as_mut() {
            Some(existing) => existing.merge(&reported),
            None => self.usage = Some(reported),
        }
    }

    /// Translate one JSON payload; native passthrough is left to the caller
    pub(crate) fn translate_payload(&mut self, data: &str) -> Result<Translation, ProviderError> {
        let event: AnthropicEvent = serde_json::from_str(data)
            .map_err(|e| ProviderError::response_parsing(self.provider, e.to_string()))?;
        self.translate(event)
    }

    fn translate(&mut self, event: AnthropicEvent) -> Result<Translation, ProviderError> {
        match event {
            AnthropicEvent::MessageStart { message } => {
                self.response_id = message.id;
                self.model = message.model;
                if let Some(usage) = message.usage {
                    self.usage = Some(usage.into());
                }
                Ok(Translation::skip())
            }
            AnthropicEvent::ContentBlockStart {
                index,
                content_block,
            } => Ok(self.block_start(index, content_block)),
            AnthropicEvent::ContentBlockDelta { index, delta } => {
                let delta = match delta {
                    BlockDelta::TextDelta { text } => ChatDelta::content(text),
                    BlockDelta::ThinkingDelta { thinking } => ChatDelta::reasoning(thinking),
                    BlockDelta::InputJsonDelta { partial_json } => {
                        let Some(tool_index) = self.tool_blocks.get(&index).copied() else {
                            debug!(provider = self.provider, index, "input_json_delta for unknown block");
                            return Ok(Translation::skip());
                        };
                        ChatDelta {
                            tool_calls: Some(vec![ToolCallDelta::arguments(tool_index, partial_json)]),
                            ..Default::default()
                        }
                    }
                    // signature deltas and anything newer carry no output
                    BlockDelta::Other => return Ok(Translation::skip()),
                };
                Ok(Translation::delta(self.chunk(delta, None)))
            }
            AnthropicEvent::ContentBlockStop { .. } | AnthropicEvent::Ping => Ok(Translation::skip()),
            AnthropicEvent::MessageDelta { delta, usage } => {
                if let Some(reported) = usage {
                    self.merge_usage(reported.into());
                }
                let finish_reason = delta.stop_reason.as_deref().map(FinishReason::from);
                Ok(Translation::delta(self.chunk(ChatDelta::default(), finish_reason)))
            }
            AnthropicEvent::MessageStop => Ok(Translation::done()),
            AnthropicEvent::Error { error } => Err(anthropic_stream_error(
                self.provider,
                &error.error_type,
                &error.message,
            )),
            AnthropicEvent::Unknown => {
                debug!(provider = self.provider, "Ignoring unknown event type");
                Ok(Translation::skip())
            }
        }
    }

    fn block_start(&mut self, index: u32, block: ContentBlock) -> Translation {
        let delta = match block {
            ContentBlock::Text { text } => ChatDelta {
                content: (!text.is_empty()).then_some(text),
                ..Default::default()
            },
            ContentBlock::Thinking { thinking } => ChatDelta {
                reasoning_content: (!thinking.is_empty()).then_some(thinking),
                ..Default::default()
            },
            ContentBlock::ToolUse { id, name, input } => {
                let tool_index = self.tool_call_index;
                self.tool_call_index += 1;
                self.tool_blocks.insert(index, tool_index);

                let mut call = ToolCallDelta::start(tool_index, id, name);
                // input normally streams as input_json_delta; a prefilled one is sent whole
                if input.as_object().is_some_and(|object| !object.is_empty()) {
                    if let Some(function) = call.function.as_mut() {
                        function.arguments = Some(input.to_string());
                    }
                }
                ChatDelta {
                    tool_calls: Some(vec![call]),
                    ..Default::default()
                }
            }
            ContentBlock::Other => return Translation::skip(),
        };
        Translation::delta(self.chunk(delta, None))
    }

    fn chunk(&mut self, mut delta: ChatDelta, finish_reason: Option<FinishReason>) -> ChatChunk {
        if !self.first_seen {
            self.first_seen = true;
            delta.role = Some(MessageRole::Assistant);
        }
        let mut choice = ChatStreamChoice::new(0, delta);
        choice.finish_reason = finish_reason;

        let mut chunk = ChatChunk::new(self.response_id.clone(), self.model.clone());
        chunk.created = chrono::Utc::now().timestamp();
        chunk.usage = self.usage.clone();
        chunk.choices.push(choice);
        chunk
    }
}

impl StreamTranslator for AnthropicTranslator {
    fn vendor(&self) -> Vendor {
        Vendor::Anthropic
    }

    fn on_vendor_event(&mut self, event: &VendorEvent) -> Result<Translation, ProviderError> {
        let translation = self.translate_payload(&event.data)?;
        Ok(translation.with_native(self.native, event))
    }
}
