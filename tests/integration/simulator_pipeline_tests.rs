//! Tool-call simulation over a text-only upstream

#[cfg(test)]
mod tests {
    use crate::common::fixtures::openai_text;
    use crate::common::{ChatResponseAssertions, FrameAssertions, replay};
    use gateway_stream::config::StreamingConfig;
    use gateway_stream::core::providers::Vendor;
    use gateway_stream::core::streaming::{ClientFormat, PipelineBuilder};
    use gateway_stream::core::types::responses::{FinishReason, Usage};

    fn simulating(format: ClientFormat) -> PipelineBuilder {
        let config = StreamingConfig {
            client_format: format,
            simulate_tool_calls: true,
            ..Default::default()
        };
        PipelineBuilder::new("req-sim", Vendor::OpenAi, config)
    }

    const CALL_TEXT: [&str; 3] = [
        "Let me check. <tool",
        "_call>{\"name\": \"get_weather\", \"arguments\": ",
        "{\"city\": \"Paris\"}}</tool_call>",
    ];

    #[tokio::test]
    async fn test_tagged_text_becomes_tool_call() {
        let replay = replay(
            simulating(ClientFormat::OpenAi),
            Vendor::OpenAi,
            openai_text(&CALL_TEXT),
            9,
            None,
        )
        .await;

        let frames = replay.frames.as_slice();
        assert_eq!(frames.done_count(), 1);
        assert!(frames.iter().all(|frame| !frame.data.contains("<tool")));

        let chunks = frames.data_json();
        let call = chunks
            .iter()
            .find_map(|chunk| chunk["choices"][0]["delta"]["tool_calls"][0].as_object().cloned())
            .unwrap();
        assert!(call["id"].as_str().unwrap().starts_with("call_"));
        assert_eq!(call["function"]["name"], "get_weather");

        let record = replay.record();
        record.response.assert_content("Let me check. ");
        record.response.assert_finish_reason(FinishReason::ToolCalls);
        let calls = record.response.choices[0].message.tool_calls.as_ref().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "get_weather");
        assert_eq!(calls[0].function.arguments, r#"{"city":"Paris"}"#);
        assert_eq!(record.response.usage, Some(Usage::new(7, 3)));
    }

    #[tokio::test]
    async fn test_plain_text_passes_through() {
        let replay = replay(
            simulating(ClientFormat::OpenAi),
            Vendor::OpenAi,
            openai_text(&["a < b", " and c > d"]),
            4096,
            None,
        )
        .await;

        let record = replay.record();
        record.response.assert_content("a < b and c > d");
        record.response.assert_finish_reason(FinishReason::Stop);
        assert!(record.response.choices[0].message.tool_calls.is_none());
    }

    #[tokio::test]
    async fn test_simulated_call_reencoded_for_anthropic_clients() {
        let replay = replay(
            simulating(ClientFormat::Anthropic),
            Vendor::OpenAi,
            openai_text(&CALL_TEXT),
            4096,
            None,
        )
        .await;

        let frames = replay.frames.as_slice();
        let names = frames.event_names();
        assert_eq!(names.first().map(String::as_str), Some("message_start"));
        assert_eq!(names.last().map(String::as_str), Some("message_stop"));

        let tool_start = frames
            .iter()
            .filter(|frame| frame.event.as_deref() == Some("content_block_start"))
            .map(|frame| serde_json::from_str::<serde_json::Value>(&frame.data).unwrap())
            .find(|body| body["content_block"]["type"] == "tool_use")
            .unwrap();
        assert_eq!(tool_start["content_block"]["name"], "get_weather");

        let stop = frames
            .iter()
            .find(|frame| frame.event.as_deref() == Some("message_delta"))
            .map(|frame| serde_json::from_str::<serde_json::Value>(&frame.data).unwrap())
            .unwrap();
        assert_eq!(stop["delta"]["stop_reason"], "tool_use");
    }

    #[tokio::test]
    async fn test_malformed_call_terminates_with_error() {
        let replay = replay(
            simulating(ClientFormat::OpenAi),
            Vendor::OpenAi,
            openai_text(&["<tool_call>not json</tool_call>"]),
            4096,
            None,
        )
        .await;

        assert_eq!(replay.frames.as_slice().done_count(), 0);
        assert!(replay.record().error.is_some());
    }

    #[tokio::test]
    async fn test_native_passthrough_disables_simulation() {
        let config = StreamingConfig {
            simulate_tool_calls: true,
            ..Default::default()
        };
        let builder = PipelineBuilder::new("req-sim-native", Vendor::Anthropic, config)
            .request_path("/v1/messages");
        let pipeline = builder.build();
        assert_eq!(pipeline.client_format, ClientFormat::Native);
    }
}
