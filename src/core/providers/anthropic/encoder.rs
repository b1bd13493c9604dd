//! Canonical deltas re-encoded as an Anthropic Messages stream

use serde_json::{Value, json};
use std::collections::HashMap;

use crate::core::streaming::sink::{ChunkEncoder, side_channel_events};
use crate::core::streaming::types::Event;
use crate::core::types::responses::{ChatChunk, FinishReason, Usage};
use crate::utils::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Thinking,
    Text,
    ToolUse,
}

/// Encoder producing `message_start` … `message_stop` envelopes
#[derive(Debug, Default)]
pub struct AnthropicEncoder {
    started: bool,
    stopped: bool,
    current_block: Option<(BlockKind, u32)>,
    next_block: u32,
    /// Tool-call index to the `tool_use` block opened for it
    tool_blocks: HashMap<u32, u32>,
    usage: Usage,
}

impl AnthropicEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn envelope(name: &str, body: Value) -> Event {
        Event::new().event(name).data(&body.to_string())
    }

    fn stop_reason(reason: &FinishReason) -> &str {
        match reason {
            FinishReason::Stop => "end_turn",
            FinishReason::Length => "max_tokens",
            FinishReason::ToolCalls => "tool_use",
            FinishReason::ContentFilter => "refusal",
            FinishReason::Other(other) => other.as_str(),
        }
    }

    fn ensure_started(&mut self, chunk: Option<&ChatChunk>, events: &mut Vec<Event>) {
        if self.started {
            return;
        }
        self.started = true;
        let (id, model) = chunk
            .map(|chunk| (chunk.id.as_str(), chunk.model.as_str()))
            .unwrap_or(("", ""));
        events.push(Self::envelope(
            "message_start",
            json!({
                "type": "message_start",
                "message": {
                    "id": id,
                    "type": "message",
                    "role": "assistant",
                    "model": model,
                    "content": [],
                    "stop_reason": null,
                    "stop_sequence": null,
                    "usage": {
                        "input_tokens": self.usage.prompt_tokens,
                        "output_tokens": self.usage.completion_tokens,
                    },
                },
            }),
        ));
    }

    fn close_block(&mut self, events: &mut Vec<Event>) {
        if let Some((_, index)) = self.current_block.take() {
            events.push(Self::envelope(
                "content_block_stop",
                json!({ "type": "content_block_stop", "index": index }),
            ));
        }
    }

    /// Open a block of `kind` unless one is already open; returns its index
    fn open_block(&mut self, kind: BlockKind, content_block: Value, events: &mut Vec<Event>) -> u32 {
        if let Some((open, index)) = self.current_block {
            if open == kind && kind != BlockKind::ToolUse {
                return index;
            }
        }
        self.close_block(events);
        let index = self.next_block;
        self.next_block += 1;
        self.current_block = Some((kind, index));
        events.push(Self::envelope(
            "content_block_start",
            json!({ "type": "content_block_start", "index": index, "content_block": content_block }),
        ));
        index
    }

    fn block_delta(index: u32, delta: Value) -> Event {
        Self::envelope(
            "content_block_delta",
            json!({ "type": "content_block_delta", "index": index, "delta": delta }),
        )
    }
}

impl ChunkEncoder for AnthropicEncoder {
    fn encode(&mut self, chunk: &ChatChunk) -> Result<Vec<Event>> {
        let mut events = Vec::new();

        if let Some(usage) = &chunk.usage {
            self.usage.merge(usage);
        }

        if chunk.choices.is_empty() {
            // metadata only; errors may arrive before anything else
            events.extend(side_channel_events(chunk));
            return Ok(events);
        }

        self.ensure_started(Some(chunk), &mut events);
        events.extend(side_channel_events(chunk));

        // Anthropic streams have a single candidate
        let Some(choice) = chunk.choices.iter().find(|choice| choice.index == 0) else {
            return Ok(events);
        };
        let delta = &choice.delta;

        if delta.has_reasoning() {
            let index = self.open_block(
                BlockKind::Thinking,
                json!({ "type": "thinking", "thinking": "" }),
                &mut events,
            );
            events.push(Self::block_delta(
                index,
                json!({ "type": "thinking_delta", "thinking": delta.reasoning_text() }),
            ));
        }

        if delta.has_content() {
            let index = self.open_block(
                BlockKind::Text,
                json!({ "type": "text", "text": "" }),
                &mut events,
            );
            events.push(Self::block_delta(
                index,
                json!({ "type": "text_delta", "text": delta.content_text() }),
            ));
        }

        for call in delta.tool_calls.iter().flatten() {
            let function = call.function.as_ref();
            let index = match &call.id {
                Some(id) => {
                    let block = self.open_block(
                        BlockKind::ToolUse,
                        json!({
                            "type": "tool_use",
                            "id": id,
                            "name": function.and_then(|f| f.name.as_deref()).unwrap_or_default(),
                            "input": {},
                        }),
                        &mut events,
                    );
                    self.tool_blocks.insert(call.index, block);
                    block
                }
                None => match self.tool_blocks.get(&call.index) {
                    Some(&block) => block,
                    // argument fragment with no tool block to land in
                    None => continue,
                },
            };
            if let Some(arguments) = function
                .and_then(|f| f.arguments.as_deref())
                .filter(|arguments| !arguments.is_empty())
            {
                events.push(Self::block_delta(
                    index,
                    json!({ "type": "input_json_delta", "partial_json": arguments }),
                ));
            }
        }

        if let Some(reason) = &choice.finish_reason {
            self.close_block(&mut events);
            self.stopped = true;
            events.push(Self::envelope(
                "message_delta",
                json!({
                    "type": "message_delta",
                    "delta": { "stop_reason": Self::stop_reason(reason), "stop_sequence": null },
                    "usage": { "output_tokens": self.usage.completion_tokens },
                }),
            ));
        }

        Ok(events)
    }

    fn finish(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        self.ensure_started(None, &mut events);
        self.close_block(&mut events);
        if !self.stopped {
            self.stopped = true;
            events.push(Self::envelope(
                "message_delta",
                json!({
                    "type": "message_delta",
                    "delta": { "stop_reason": "end_turn", "stop_sequence": null },
                    "usage": { "output_tokens": self.usage.completion_tokens },
                }),
            ));
        }
        events.push(Self::envelope("message_stop", json!({ "type": "message_stop" })));
        events
    }
}
