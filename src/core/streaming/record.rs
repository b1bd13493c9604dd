//! Final per-request record handed to the logging/billing collaborator

use crate::core::types::responses::{ApiError, ChatResponse};
use serde::Serialize;
use tracing::info;

/// One finalized response, produced exactly once per request
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRecord {
    pub request_id: String,
    /// Merged choices in index order
    pub response: ChatResponse,
    /// Time from request start to stream termination
    pub duration_ms: u64,
    /// Time from request start to the first delta, if one arrived
    pub first_package_ms: Option<u64>,
    /// Normalised error when the stream ended abnormally
    pub error: Option<ApiError>,
}

/// Logging/billing collaborator
pub trait CompletionLogger: Send + Sync {
    fn log(&self, record: CompletionRecord);
}

/// Default logger: one structured `tracing` event per request
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCompletionLogger;

impl CompletionLogger for TracingCompletionLogger {
    fn log(&self, record: CompletionRecord) {
        let finish_reasons: Vec<&str> = record
            .response
            .choices
            .iter()
            .filter_map(|choice| choice.finish_reason.as_ref().map(|reason| reason.as_str()))
            .collect();
        let usage = record.response.usage.clone().unwrap_or_default();

        info!(
            request_id = %record.request_id,
            model = %record.response.model,
            choices = record.response.choices.len(),
            finish_reasons = ?finish_reasons,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            duration_ms = record.duration_ms,
            first_package_ms = ?record.first_package_ms,
            error = ?record.error.as_ref().map(|e| e.message.as_str()),
            "Stream completed"
        );
    }
}
