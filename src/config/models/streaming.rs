//! Streaming pipeline configuration

use super::default_true;
use crate::core::streaming::sink::ClientFormat;
use serde::{Deserialize, Serialize};

/// Per-request pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Wire dialect sent to clients
    #[serde(default)]
    pub client_format: ClientFormat,
    /// Synthesize tool calls from model text
    #[serde(default)]
    pub simulate_tool_calls: bool,
    /// How long a caller waits for the upstream stream to open
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Safety audit settings
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            client_format: ClientFormat::default(),
            simulate_tool_calls: false,
            connect_timeout_secs: default_connect_timeout_secs(),
            audit: AuditConfig::default(),
        }
    }
}

impl StreamingConfig {
    pub fn connect_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.connect_timeout_secs)
    }

    /// Merge streaming configurations, with other taking precedence
    pub fn merge(mut self, other: Self) -> Self {
        if other.client_format != ClientFormat::default() {
            self.client_format = other.client_format;
        }
        if other.simulate_tool_calls {
            self.simulate_tool_calls = true;
        }
        if other.connect_timeout_secs != default_connect_timeout_secs() {
            self.connect_timeout_secs = other.connect_timeout_secs;
        }
        self.audit = self.audit.merge(other.audit);
        self
    }
}

/// Safety audit settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Verdicts drained per delta
    #[serde(default = "default_drain_limit")]
    pub drain_limit: usize,
    /// Characters that end an auditable fragment
    #[serde(default = "default_sentence_terminators")]
    pub sentence_terminators: String,
    /// Terms the built-in blocklist backend flags
    #[serde(default)]
    pub blocked_terms: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            drain_limit: default_drain_limit(),
            sentence_terminators: default_sentence_terminators(),
            blocked_terms: Vec::new(),
        }
    }
}

impl AuditConfig {
    /// Merge audit configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.enabled {
            self.enabled = false;
        }
        if other.drain_limit != default_drain_limit() {
            self.drain_limit = other.drain_limit;
        }
        if other.sentence_terminators != default_sentence_terminators() {
            self.sentence_terminators = other.sentence_terminators;
        }
        for term in other.blocked_terms {
            if !self.blocked_terms.contains(&term) {
                self.blocked_terms.push(term);
            }
        }
        self
    }
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_drain_limit() -> usize {
    9
}

fn default_sentence_terminators() -> String {
    "。！？；.!?;\n".to_string()
}
