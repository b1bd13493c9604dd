//! Wire-format fixtures
//!
//! Each builder returns the raw bytes an upstream would send, so tests go
//! through the same deframing as a live connection.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gateway_stream::core::providers::bedrock::EventStreamMessage;
use serde_json::{Value, json};

/// OpenAI-compatible SSE: one `data:` frame per chunk, then `[DONE]`
pub fn openai_sse(chunks: &[Value]) -> Vec<u8> {
    let mut wire = String::new();
    for chunk in chunks {
        wire.push_str(&format!("data: {}\n\n", chunk));
    }
    wire.push_str("data: [DONE]\n\n");
    wire.into_bytes()
}

/// One OpenAI chunk for choice 0
pub fn openai_chunk(delta: Value, finish_reason: Option<&str>) -> Value {
    json!({
        "id": "chatcmpl-fixture",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": "gpt-4o-mini",
        "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}]
    })
}

/// OpenAI content chunks followed by a `stop` chunk carrying usage
pub fn openai_text(parts: &[&str]) -> Vec<u8> {
    let mut chunks: Vec<Value> = parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i == 0 {
                openai_chunk(json!({"role": "assistant", "content": part}), None)
            } else {
                openai_chunk(json!({"content": part}), None)
            }
        })
        .collect();
    let mut last = openai_chunk(json!({}), Some("stop"));
    last["usage"] = json!({"prompt_tokens": 7, "completion_tokens": parts.len(), "total_tokens": 7 + parts.len()});
    chunks.push(last);
    openai_sse(&chunks)
}

/// Anthropic Messages SSE from raw event payloads
pub fn anthropic_sse(events: &[Value]) -> Vec<u8> {
    let mut wire = String::new();
    for event in events {
        let name = event["type"].as_str().unwrap_or("unknown");
        wire.push_str(&format!("event: {}\ndata: {}\n\n", name, event));
    }
    wire.into_bytes()
}

/// Payloads of a complete text-only Anthropic message
pub fn anthropic_text_events(parts: &[&str]) -> Vec<Value> {
    let mut events = vec![
        json!({
            "type": "message_start",
            "message": {
                "id": "msg_fixture", "type": "message", "role": "assistant",
                "model": "claude-sonnet-4", "content": [],
                "usage": {"input_tokens": 11, "output_tokens": 1}
            }
        }),
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        json!({"type": "ping"}),
    ];
    for part in parts {
        events.push(json!({
            "type": "content_block_delta", "index": 0,
            "delta": {"type": "text_delta", "text": part}
        }));
    }
    events.push(json!({"type": "content_block_stop", "index": 0}));
    events.push(json!({
        "type": "message_delta",
        "delta": {"stop_reason": "end_turn", "stop_sequence": null},
        "usage": {"output_tokens": 9}
    }));
    events.push(json!({"type": "message_stop"}));
    events
}

/// Bedrock event-stream: every payload wrapped in a base64 `chunk` event
pub fn bedrock_stream(payloads: &[Value]) -> Vec<u8> {
    let mut wire = Vec::new();
    for payload in payloads {
        let bytes = STANDARD.encode(payload.to_string());
        let body = json!({ "bytes": bytes }).to_string();
        wire.extend_from_slice(&EventStreamMessage::event("chunk", body).to_bytes());
    }
    wire
}

/// Bedrock exception frame
pub fn bedrock_exception(exception_type: &str, message: &str) -> Vec<u8> {
    let body = json!({ "message": message }).to_string();
    EventStreamMessage::exception(exception_type, body)
        .to_bytes()
        .to_vec()
}
