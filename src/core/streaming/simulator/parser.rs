//! Function-call grammar contract and the default tagged grammar

use crate::utils::error::{GatewayError, Result};
use serde::Deserialize;
use serde_json::Value;

const OPEN_TAG: &str = "<tool_call>";
const CLOSE_TAG: &str = "</tool_call>";

/// One recognised piece of the model's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSegment {
    /// Plain text that is not part of a call
    Text(String),
    /// A complete call; `arguments` is a JSON string
    ToolCall { name: String, arguments: String },
}

/// Receives parser output
pub trait ParseListener {
    fn on_message(&mut self, segment: ParsedSegment);

    /// Parsing reached end of input
    fn on_finish(&mut self);
}

/// Incremental grammar recognising tool calls embedded in plain text
///
/// `feed` may be called any number of times with arbitrary text splits;
/// `finish` is called once, after the last `feed`, and must end with
/// `listener.on_finish()` on success.
///
/// `drain` replaces `finish` when the stream ends without a done signal:
/// everything still held back is emitted as plain text and `on_finish` is
/// not called.
pub trait FunctionCallParser: Send {
    fn feed(&mut self, text: &str, listener: &mut dyn ParseListener) -> Result<()>;

    fn finish(&mut self, listener: &mut dyn ParseListener) -> Result<()>;

    fn drain(&mut self, listener: &mut dyn ParseListener) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct TaggedCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// `<tool_call>{"name": "...", "arguments": {...}}</tool_call>` blocks
///
/// Text outside blocks is emitted as soon as it cannot be the start of an
/// opening tag.
#[derive(Debug, Default)]
pub struct TaggedCallParser {
    buffer: String,
    in_call: bool,
}

impl TaggedCallParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the longest suffix of `buffer` that is a proper prefix of `tag`
    fn partial_tag_len(buffer: &str, tag: &str) -> usize {
        (1..tag.len().min(buffer.len() + 1))
            .rev()
            .find(|&len| buffer.ends_with(&tag[..len]))
            .unwrap_or(0)
    }

    fn parse_call(body: &str) -> Result<ParsedSegment> {
        let call: TaggedCall = serde_json::from_str(body.trim())
            .map_err(|e| GatewayError::parsing(format!("Invalid tool call body: {}", e)))?;
        if call.name.is_empty() {
            return Err(GatewayError::parsing("Tool call without a name"));
        }
        let arguments = match call.arguments {
            Value::Null => "{}".to_string(),
            Value::String(raw) => raw,
            other => other.to_string(),
        };
        Ok(ParsedSegment::ToolCall {
            name: call.name,
            arguments,
        })
    }

    fn emit_text(listener: &mut dyn ParseListener, text: &str) {
        if !text.is_empty() {
            listener.on_message(ParsedSegment::Text(text.to_string()));
        }
    }
}

impl FunctionCallParser for TaggedCallParser {
    fn feed(&mut self, text: &str, listener: &mut dyn ParseListener) -> Result<()> {
        self.buffer.push_str(text);

        loop {
            if self.in_call {
                let Some(end) = self.buffer.find(CLOSE_TAG) else {
                    return Ok(());
                };
                let segment = Self::parse_call(&self.buffer[..end])?;
                self.buffer.drain(..end + CLOSE_TAG.len());
                self.in_call = false;
                listener.on_message(segment);
            } else if let Some(start) = self.buffer.find(OPEN_TAG) {
                Self::emit_text(listener, &self.buffer[..start]);
                self.buffer.drain(..start + OPEN_TAG.len());
                self.in_call = true;
            } else {
                let keep = Self::partial_tag_len(&self.buffer, OPEN_TAG);
                let emit_to = self.buffer.len() - keep;
                Self::emit_text(listener, &self.buffer[..emit_to]);
                self.buffer.drain(..emit_to);
                return Ok(());
            }
        }
    }

    fn finish(&mut self, listener: &mut dyn ParseListener) -> Result<()> {
        if self.in_call {
            return Err(GatewayError::parsing("Unterminated tool call at end of stream"));
        }
        let rest = std::mem::take(&mut self.buffer);
        Self::emit_text(listener, &rest);
        listener.on_finish();
        Ok(())
    }

    fn drain(&mut self, listener: &mut dyn ParseListener) -> Result<()> {
        let rest = std::mem::take(&mut self.buffer);
        if std::mem::take(&mut self.in_call) {
            Self::emit_text(listener, &format!("{}{}", OPEN_TAG, rest));
        } else {
            Self::emit_text(listener, &rest);
        }
        Ok(())
    }
}
