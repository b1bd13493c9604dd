//! Anthropic Messages upstream scenarios

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{anthropic_sse, anthropic_text_events};
    use crate::common::{ChatResponseAssertions, FrameAssertions, replay};
    use gateway_stream::config::StreamingConfig;
    use gateway_stream::core::providers::Vendor;
    use gateway_stream::core::streaming::PipelineBuilder;
    use gateway_stream::core::types::responses::{FinishReason, Usage};
    use serde_json::json;

    fn builder() -> PipelineBuilder {
        PipelineBuilder::new("req-anthropic", Vendor::Anthropic, StreamingConfig::default())
    }

    #[tokio::test]
    async fn test_canonical_output_for_openai_clients() {
        let wire = anthropic_sse(&anthropic_text_events(&["Bonjour", " le", " monde"]));
        let replay = replay(builder(), Vendor::Anthropic, wire, 7, None).await;

        assert!(replay.open.is_ok());
        let frames = replay.frames.as_slice();
        assert!(frames.event_names().is_empty());
        assert_eq!(frames.done_count(), 1);

        let chunks = frames.data_json();
        assert_eq!(chunks[0]["choices"][0]["delta"]["role"], "assistant");
        assert_eq!(chunks[0]["id"], "msg_fixture");
        assert_eq!(chunks.last().unwrap()["choices"][0]["finish_reason"], "stop");

        let record = replay.record();
        record.response.assert_content("Bonjour le monde");
        record.response.assert_finish_reason(FinishReason::Stop);
        assert_eq!(record.response.model, "claude-sonnet-4");
        assert_eq!(record.response.usage, Some(Usage::new(11, 9)));
    }

    #[tokio::test]
    async fn test_thinking_and_tool_use() {
        let events = vec![
            json!({"type": "message_start", "message": {"id": "msg_tools", "model": "claude-sonnet-4", "usage": {"input_tokens": 20, "output_tokens": 1}}}),
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "thinking", "thinking": ""}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "thinking_delta", "thinking": "Need the weather."}}),
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "signature_delta", "signature": "abc"}}),
            json!({"type": "content_block_stop", "index": 0}),
            json!({"type": "content_block_start", "index": 1, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {}}}),
            json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "{\"city\":"}}),
            json!({"type": "content_block_delta", "index": 1, "delta": {"type": "input_json_delta", "partial_json": "\"Paris\"}"}}),
            json!({"type": "content_block_stop", "index": 1}),
            json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}, "usage": {"output_tokens": 15}}),
            json!({"type": "message_stop"}),
        ];
        let replay = replay(builder(), Vendor::Anthropic, anthropic_sse(&events), 4096, None).await;

        let record = replay.record();
        let message = &record.response.choices[0].message;
        assert_eq!(message.reasoning_content.as_deref(), Some("Need the weather."));
        let calls = message.tool_calls.as_ref().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "toolu_1");
        assert_eq!(calls[0].function.name, "get_weather");
        assert_eq!(calls[0].function.arguments, r#"{"city":"Paris"}"#);
        record.response.assert_finish_reason(FinishReason::ToolCalls);
        assert_eq!(record.response.usage, Some(Usage::new(20, 15)));
    }

    #[tokio::test]
    async fn test_native_passthrough_forwards_vendor_frames() {
        let events = anthropic_text_events(&["Hi"]);
        let replay = replay(
            builder().request_path("/v1/messages"),
            Vendor::Anthropic,
            anthropic_sse(&events),
            11,
            None,
        )
        .await;

        let frames = replay.frames.as_slice();
        let expected: Vec<String> = events
            .iter()
            .map(|event| event["type"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(frames.event_names(), expected);
        assert_eq!(frames.done_count(), 0);
        let start: serde_json::Value = serde_json::from_str(&frames[0].data).unwrap();
        assert_eq!(start, events[0]);

        // the record is still built from canonical deltas
        replay.record().response.assert_content("Hi");
    }

    #[tokio::test]
    async fn test_overloaded_error_event() {
        let mut events = anthropic_text_events(&["Par"]);
        events.truncate(4);
        events.push(json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}));
        let replay = replay(builder(), Vendor::Anthropic, anthropic_sse(&events), 4096, None).await;

        let frames = replay.frames.as_slice();
        assert_eq!(frames.done_count(), 0);
        let last = frames.data_json().pop().unwrap();
        assert_eq!(last["error"]["type"], "overloaded_error");

        let record = replay.record();
        record.response.assert_content("Par");
        assert_eq!(record.error.as_ref().unwrap().error_type, "overloaded_error");
    }

    #[tokio::test]
    async fn test_error_before_any_output_still_opens() {
        let events = vec![json!({"type": "error", "error": {"type": "rate_limit_error", "message": "slow down"}})];
        let replay = replay(builder(), Vendor::Anthropic, anthropic_sse(&events), 4096, None).await;

        assert!(replay.open.is_ok());
        let record = replay.record();
        assert!(record.first_package_ms.is_none());
        assert_eq!(record.error.as_ref().unwrap().error_type, "rate_limit_error");
    }
}
