//! Bedrock event-stream upstream scenarios

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{anthropic_text_events, bedrock_exception, bedrock_stream};
    use crate::common::{ChatResponseAssertions, FrameAssertions, replay};
    use gateway_stream::config::StreamingConfig;
    use gateway_stream::core::providers::Vendor;
    use gateway_stream::core::streaming::PipelineBuilder;
    use gateway_stream::core::types::responses::{FinishReason, Usage};
    use serde_json::{Value, json};

    fn builder() -> PipelineBuilder {
        PipelineBuilder::new("req-bedrock", Vendor::Bedrock, StreamingConfig::default())
    }

    /// Text events with metrics on `message_stop`, as Bedrock reports them
    fn payloads(parts: &[&str]) -> Vec<Value> {
        let mut events = anthropic_text_events(parts);
        if let Some(stop) = events.last_mut() {
            stop["amazon-bedrock-invocationMetrics"] = json!({
                "inputTokenCount": 42,
                "outputTokenCount": 17,
                "invocationLatency": 812,
                "firstByteLatency": 301
            });
        }
        events
    }

    #[tokio::test]
    async fn test_invocation_metrics_become_final_usage() {
        let wire = bedrock_stream(&payloads(&["Hola", "!"]));
        let replay = replay(builder(), Vendor::Bedrock, wire, 5, None).await;

        assert!(replay.open.is_ok());
        let frames = replay.frames.as_slice();
        assert_eq!(frames.done_count(), 1);
        let usage_frame = frames
            .data_json()
            .into_iter()
            .rev()
            .find(|chunk| chunk.get("usage").is_some())
            .unwrap();
        assert_eq!(usage_frame["usage"]["prompt_tokens"], 42);

        let record = replay.record();
        record.response.assert_content("Hola!");
        record.response.assert_finish_reason(FinishReason::Stop);
        assert_eq!(record.response.usage, Some(Usage::new(42, 17)));
    }

    #[tokio::test]
    async fn test_throttling_exception_mid_stream() {
        let mut wire = bedrock_stream(&anthropic_text_events(&["Hol"])[..4]);
        wire.extend(bedrock_exception("throttlingException", "Too many requests, please wait."));
        let replay = replay(builder(), Vendor::Bedrock, wire, 64, None).await;

        let frames = replay.frames.as_slice();
        assert_eq!(frames.done_count(), 0);
        let last = frames.data_json().pop().unwrap();
        assert_eq!(last["error"]["type"], "rate_limit_error");

        let record = replay.record();
        record.response.assert_content("Hol");
        let error = record.error.as_ref().unwrap();
        assert!(error.message.contains("Too many requests"));
    }

    #[tokio::test]
    async fn test_native_passthrough_forwards_decoded_payloads() {
        let events = payloads(&["Hi"]);
        let replay = replay(
            builder().request_path("/model/anthropic.claude-sonnet-4/invoke-with-response-stream"),
            Vendor::Bedrock,
            bedrock_stream(&events),
            4096,
            None,
        )
        .await;

        let frames = replay.frames.as_slice();
        assert_eq!(frames.len(), events.len());
        assert_eq!(frames.done_count(), 0);
        for (frame, event) in frames.iter().zip(&events) {
            assert_eq!(frame.event.as_deref(), event["type"].as_str());
            let payload: Value = serde_json::from_str(&frame.data).unwrap();
            assert_eq!(&payload, event);
        }

        replay.record().response.assert_content("Hi");
        assert_eq!(replay.record().response.usage, Some(Usage::new(42, 17)));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_a_failure() {
        let mut wire = bedrock_stream(&anthropic_text_events(&["x"]));
        wire.truncate(wire.len() - 3);
        let replay = replay(builder(), Vendor::Bedrock, wire, 4096, None).await;

        assert_eq!(replay.frames.as_slice().done_count(), 0);
        assert!(replay.record().error.is_some());
    }
}
