//! Reasoning/content stage tracking

use serde::Serialize;

/// Where a response currently is between reasoning and content
///
/// Advances at most one step per delta that carries text:
/// `NotStarted -> Reasoning -> ReasoningContinuing -> ContentStarted -> Done`.
/// The numeric codes are what gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ThinkStage {
    #[default]
    NotStarted,
    Reasoning,
    ReasoningContinuing,
    ContentStarted,
    Done,
}

impl ThinkStage {
    pub fn code(self) -> i8 {
        match self {
            ThinkStage::NotStarted => 0,
            ThinkStage::Reasoning => 1,
            ThinkStage::ReasoningContinuing => 2,
            ThinkStage::ContentStarted => 3,
            ThinkStage::Done => -1,
        }
    }

    /// Next stage for a delta with the given reasoning / content text
    ///
    /// Content right after the first reasoning fragment also opens the content
    /// section; content with no reasoning before it leaves the stage untouched.
    pub fn advance(self, reasoning: &str, content: &str) -> ThinkStage {
        let has_reasoning = !reasoning.is_empty();
        let has_content = !content.is_empty();
        match self {
            ThinkStage::NotStarted if has_reasoning => ThinkStage::Reasoning,
            ThinkStage::Reasoning if has_content => ThinkStage::ContentStarted,
            ThinkStage::Reasoning if has_reasoning => ThinkStage::ReasoningContinuing,
            ThinkStage::ReasoningContinuing if has_content => ThinkStage::ContentStarted,
            ThinkStage::ContentStarted if has_content => ThinkStage::Done,
            stage => stage,
        }
    }

    /// Whether entering this stage starts a new semantic section
    pub fn starts_section(self) -> bool {
        matches!(self, ThinkStage::Reasoning | ThinkStage::ContentStarted)
    }

    /// Whether audits should read the reasoning text
    pub fn audits_reasoning(self) -> bool {
        self == ThinkStage::ReasoningContinuing
    }
}
