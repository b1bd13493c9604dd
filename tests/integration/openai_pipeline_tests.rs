//! OpenAI-compatible upstream scenarios

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{openai_chunk, openai_sse, openai_text};
    use crate::common::{ChatResponseAssertions, FrameAssertions, replay};
    use gateway_stream::config::StreamingConfig;
    use gateway_stream::core::providers::{ProviderError, Vendor};
    use gateway_stream::core::streaming::{ClientFormat, PipelineBuilder};
    use gateway_stream::core::types::responses::{FinishReason, Usage};
    use serde_json::json;

    fn builder(config: StreamingConfig) -> PipelineBuilder {
        PipelineBuilder::new("req-openai", Vendor::OpenAi, config)
    }

    #[tokio::test]
    async fn test_text_stream_split_into_tiny_reads() {
        let wire = openai_text(&["Hello", " wor", "ld"]);
        let replay = replay(builder(StreamingConfig::default()), Vendor::OpenAi, wire, 3, None).await;

        assert!(replay.open.is_ok());
        let frames = replay.frames.as_slice();
        assert_eq!(frames.data_json().len(), 4);
        assert_eq!(frames.done_count(), 1);
        assert!(frames.last().unwrap().is_done());

        let record = replay.record();
        record.response.assert_content("Hello world");
        record.response.assert_finish_reason(FinishReason::Stop);
        assert_eq!(record.response.usage, Some(Usage::new(7, 3)));
        assert_eq!(record.response.id, "chatcmpl-fixture");
        assert!(record.first_package_ms.is_some());
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn test_reasoning_then_content_accumulates_separately() {
        let wire = openai_sse(&[
            openai_chunk(json!({"role": "assistant", "reasoning_content": "Think "}), None),
            openai_chunk(json!({"reasoning_content": "hard."}), None),
            openai_chunk(json!({"content": "Answer."}), None),
            openai_chunk(json!({}), Some("stop")),
        ]);
        let replay = replay(builder(StreamingConfig::default()), Vendor::OpenAi, wire, 64, None).await;

        let message = &replay.record().response.choices[0].message;
        assert_eq!(message.reasoning_content.as_deref(), Some("Think hard."));
        assert_eq!(message.content.as_deref(), Some("Answer."));
    }

    #[tokio::test]
    async fn test_reencoded_for_anthropic_clients() {
        let config = StreamingConfig {
            client_format: ClientFormat::Anthropic,
            ..Default::default()
        };
        let wire = openai_text(&["Hi", "!"]);
        let replay = replay(builder(config), Vendor::OpenAi, wire, 16, None).await;

        let frames = replay.frames.as_slice();
        assert_eq!(
            frames.event_names(),
            vec![
                "message_start",
                "content_block_start",
                "content_block_delta",
                "content_block_delta",
                "content_block_stop",
                "message_delta",
                "message_stop",
            ]
        );
        assert_eq!(frames.done_count(), 0);
        let stop: serde_json::Value = serde_json::from_str(&frames[5].data).unwrap();
        assert_eq!(stop["delta"]["stop_reason"], "end_turn");
    }

    #[tokio::test]
    async fn test_transport_failure_mid_stream() {
        let mut wire = Vec::new();
        wire.extend_from_slice(format!("data: {}\n\n", openai_chunk(json!({"content": "Hal"}), None)).as_bytes());
        let replay = replay(
            builder(StreamingConfig::default()),
            Vendor::OpenAi,
            wire,
            1024,
            Some(ProviderError::network("openai", "connection reset by peer")),
        )
        .await;

        assert!(replay.open.is_ok());
        let frames = replay.frames.as_slice();
        assert_eq!(frames.done_count(), 0);
        let last = frames.data_json().pop().unwrap();
        assert_eq!(last["error"]["type"], "network_error");

        let record = replay.record();
        record.response.assert_content("Hal");
        let error = record.error.as_ref().unwrap();
        assert!(error.message.contains("connection reset by peer"));
    }

    #[tokio::test]
    async fn test_stream_without_done_marker_is_an_error() {
        let wire = format!("data: {}\n\n", openai_chunk(json!({"content": "cut"}), None)).into_bytes();
        let replay = replay(builder(StreamingConfig::default()), Vendor::OpenAi, wire, 1024, None).await;

        assert_eq!(replay.frames.as_slice().done_count(), 0);
        assert!(replay.record().error.is_some());
    }

    #[tokio::test]
    async fn test_in_stream_error_object() {
        let wire = openai_sse(&[
            openai_chunk(json!({"content": "partial"}), None),
            json!({"error": {"message": "The server had an error", "type": "server_error"}}),
        ]);
        let replay = replay(builder(StreamingConfig::default()), Vendor::OpenAi, wire, 1024, None).await;

        let frames = replay.frames.as_slice();
        assert_eq!(frames.done_count(), 0);
        let error = replay.record().error.clone().unwrap();
        assert_eq!(error.error_type, "server_error");
    }
}
