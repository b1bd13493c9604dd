//! Streaming pipeline validators

use super::trait_def::Validate;
use crate::config::models::*;
use crate::core::streaming::sink::ClientFormat;
use tracing::debug;

/// Largest number of audit verdicts drained per delta
const MAX_DRAIN_LIMIT: usize = 64;

impl Validate for StreamingConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating streaming configuration");

        if self.connect_timeout_secs == 0 {
            return Err("connect_timeout_secs must be greater than 0".to_string());
        }

        // passthrough clients never see the synthesized tool calls
        if self.simulate_tool_calls && self.client_format == ClientFormat::Native {
            return Err(
                "simulate_tool_calls cannot be combined with client_format: native".to_string(),
            );
        }

        self.audit.validate()
    }
}

impl Validate for AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_DRAIN_LIMIT).contains(&self.drain_limit) {
            return Err(format!(
                "audit.drain_limit must be between 1 and {}, got {}",
                MAX_DRAIN_LIMIT, self.drain_limit
            ));
        }

        if self.sentence_terminators.is_empty() {
            return Err("audit.sentence_terminators cannot be empty".to_string());
        }

        if self.blocked_terms.iter().any(|term| term.trim().is_empty()) {
            return Err("audit.blocked_terms cannot contain empty terms".to_string());
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.level.trim().is_empty() {
            return Err("logging.level cannot be empty".to_string());
        }
        Ok(())
    }
}
