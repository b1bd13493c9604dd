//! Usage statistics types

use serde::{Deserialize, Serialize};

/// Usage statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt token count
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Completion token count
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total token count
    #[serde(default)]
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Overlay non-zero counts from a later report
    ///
    /// Vendors that report input tokens at stream start and output tokens at
    /// stream end rely on this to keep both halves.
    pub fn merge(&mut self, later: &Usage) {
        if later.prompt_tokens > 0 {
            self.prompt_tokens = later.prompt_tokens;
        }
        if later.completion_tokens > 0 {
            self.completion_tokens = later.completion_tokens;
        }
        self.total_tokens = self.prompt_tokens + self.completion_tokens;
    }
}
