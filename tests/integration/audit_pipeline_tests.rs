//! Safety-audit verdicts interleaved with model output

#[cfg(test)]
mod tests {
    use crate::common::fixtures::{anthropic_sse, anthropic_text_events, openai_text};
    use crate::common::{FrameAssertions, replay};
    use gateway_stream::config::{AuditConfig, StreamingConfig};
    use gateway_stream::core::providers::Vendor;
    use gateway_stream::core::streaming::{
        AuditRequest, AuditVerdict, ClientFormat, PipelineBuilder, SafetyAuditor,
    };
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Answers every submission immediately
    #[derive(Default)]
    struct EchoAuditor {
        fragments: Mutex<Vec<(String, bool)>>,
        ready: Mutex<VecDeque<AuditVerdict>>,
    }

    impl SafetyAuditor for EchoAuditor {
        fn submit(&self, request: AuditRequest) {
            self.fragments
                .lock()
                .push((request.fragment.clone(), request.final_pass));
            self.ready.lock().push_back(AuditVerdict {
                payload: json!({ "fragment": request.fragment, "final": request.final_pass }),
            });
        }

        fn poll(&self) -> Option<AuditVerdict> {
            self.ready.lock().pop_front()
        }
    }

    fn audit_frames(frames: &[gateway_stream::core::streaming::Event]) -> Vec<Value> {
        frames
            .data_json()
            .into_iter()
            .filter_map(|chunk| chunk.get("audit").cloned())
            .collect()
    }

    #[tokio::test]
    async fn test_verdicts_follow_sentences_and_drain_before_done() {
        let auditor = Arc::new(EchoAuditor::default());
        let builder = PipelineBuilder::new("req-audit", Vendor::OpenAi, StreamingConfig::default())
            .auditor(auditor.clone());
        let replay = replay(builder, Vendor::OpenAi, openai_text(&["First sentence.", " Second part"]), 4096, None).await;

        assert_eq!(
            *auditor.fragments.lock(),
            vec![
                ("First sentence.".to_string(), false),
                (" Second part".to_string(), true),
            ]
        );

        let frames = replay.frames.as_slice();
        let verdicts = audit_frames(frames);
        assert_eq!(verdicts.len(), 2);
        assert_eq!(verdicts[1]["final"], true);

        // the final verdict is the frame right before [DONE]
        let last_two = &frames[frames.len() - 2..];
        assert!(last_two[1].is_done());
        let before_done: Value = serde_json::from_str(&last_two[0].data).unwrap();
        assert_eq!(before_done["audit"]["fragment"], " Second part");
        assert!(before_done["choices"].as_array().is_none_or(|choices| choices.is_empty()));

        // verdicts never reach the accumulated response
        assert!(replay.record().response.first_content().unwrap().ends_with("Second part"));
    }

    #[tokio::test]
    async fn test_audit_disabled_by_config() {
        let auditor = Arc::new(EchoAuditor::default());
        let config = StreamingConfig {
            audit: AuditConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let builder = PipelineBuilder::new("req-audit-off", Vendor::OpenAi, config).auditor(auditor.clone());
        let replay = replay(builder, Vendor::OpenAi, openai_text(&["Hello."]), 4096, None).await;

        assert!(auditor.fragments.lock().is_empty());
        assert!(audit_frames(&replay.frames).is_empty());
    }

    #[tokio::test]
    async fn test_verdicts_as_named_events_for_native_clients() {
        let auditor = Arc::new(EchoAuditor::default());
        let builder = PipelineBuilder::new("req-audit-native", Vendor::Anthropic, StreamingConfig::default())
            .request_path("/v1/messages")
            .auditor(auditor);
        let wire = anthropic_sse(&anthropic_text_events(&["Fine.", " Done"]));
        let replay = replay(builder, Vendor::Anthropic, wire, 4096, None).await;

        let names = replay.frames.as_slice().event_names();
        assert_eq!(names.iter().filter(|name| *name == "audit").count(), 2);
        assert_eq!(names.last().map(String::as_str), Some("audit"));
    }

    #[tokio::test]
    async fn test_request_risk_rides_on_first_delta() {
        let config = StreamingConfig {
            client_format: ClientFormat::OpenAi,
            ..Default::default()
        };
        let builder = PipelineBuilder::new("req-risk", Vendor::OpenAi, config)
            .request_risk(json!({"level": "low"}));
        let replay = replay(builder, Vendor::OpenAi, openai_text(&["a", "b"]), 4096, None).await;

        let chunks = replay.frames.as_slice().data_json();
        assert_eq!(chunks[0]["risk"]["level"], "low");
        assert!(chunks[1..].iter().all(|chunk| chunk.get("risk").is_none()));
    }
}
