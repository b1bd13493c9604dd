//! Custom test assertions

use gateway_stream::core::streaming::Event;
use gateway_stream::core::types::responses::{ChatResponse, FinishReason};
use serde_json::Value;

/// Assertions for the accumulated response
pub trait ChatResponseAssertions {
    /// Assert choice 0 holds exactly `expected` as content
    fn assert_content(&self, expected: &str);

    /// Assert choice 0 finished with `reason`
    fn assert_finish_reason(&self, reason: FinishReason);
}

impl ChatResponseAssertions for ChatResponse {
    fn assert_content(&self, expected: &str) {
        assert_eq!(
            self.first_content(),
            Some(expected),
            "unexpected accumulated content in {:?}",
            self.choices
        );
    }

    fn assert_finish_reason(&self, reason: FinishReason) {
        let choice = self.choice(0).expect("Expected choice 0");
        assert_eq!(choice.finish_reason.as_ref(), Some(&reason));
    }
}

/// Assertions over the frames a client received
pub trait FrameAssertions {
    /// JSON payloads of data-only frames, `[DONE]` excluded
    fn data_json(&self) -> Vec<Value>;

    /// Names of named frames, in order
    fn event_names(&self) -> Vec<String>;

    /// Number of `[DONE]` frames
    fn done_count(&self) -> usize;
}

impl FrameAssertions for [Event] {
    fn data_json(&self) -> Vec<Value> {
        self.iter()
            .filter(|event| event.event.is_none() && !event.is_done())
            .map(|event| serde_json::from_str(&event.data).expect("frame is not JSON"))
            .collect()
    }

    fn event_names(&self) -> Vec<String> {
        self.iter().filter_map(|event| event.event.clone()).collect()
    }

    fn done_count(&self) -> usize {
        self.iter().filter(|event| event.is_done()).count()
    }
}
