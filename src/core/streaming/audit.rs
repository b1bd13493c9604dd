//! Safety-audit collaborator
//!
//! Submissions are fire-and-forget; verdicts come back through a pull queue
//! that the accumulator drains between client sends, so audit latency never
//! holds up delivery.

use crate::core::types::responses::ChatResponse;
use crate::utils::error::Result;
use async_trait::async_trait;
use crossbeam_queue::SegQueue;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// What one audit submission covers
#[derive(Debug, Clone)]
pub struct AuditRequest {
    pub request_id: String,
    /// One-choice snapshot of the accumulated response
    pub snapshot: ChatResponse,
    /// Text added since the previous submission
    pub fragment: String,
    /// Submitted from `on_done` rather than at a sentence boundary
    pub final_pass: bool,
}

/// Opaque audit result forwarded to the client as a side-channel delta
#[derive(Debug, Clone, PartialEq)]
pub struct AuditVerdict {
    pub payload: Value,
}

/// The audit collaborator as seen by the accumulator
pub trait SafetyAuditor: Send + Sync {
    /// Hand a snapshot over for asynchronous checking. Must not block.
    fn submit(&self, request: AuditRequest);

    /// Pop the oldest ready verdict, if any
    fn poll(&self) -> Option<AuditVerdict>;
}

/// Asynchronous content check behind [`QueuedAuditor`]
#[async_trait]
pub trait AuditBackend: Send + Sync {
    /// `Ok(None)` means nothing to report for this fragment
    async fn check(&self, request: &AuditRequest) -> Result<Option<Value>>;
}

/// [`SafetyAuditor`] that runs each check on the tokio runtime and queues results
pub struct QueuedAuditor {
    backend: Arc<dyn AuditBackend>,
    ready: Arc<SegQueue<AuditVerdict>>,
}

impl QueuedAuditor {
    pub fn new(backend: Arc<dyn AuditBackend>) -> Self {
        Self {
            backend,
            ready: Arc::new(SegQueue::new()),
        }
    }

    /// Number of verdicts waiting to be drained
    pub fn pending(&self) -> usize {
        self.ready.len()
    }
}

impl SafetyAuditor for QueuedAuditor {
    fn submit(&self, request: AuditRequest) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(request_id = %request.request_id, "No runtime available, audit submission dropped");
            return;
        };

        let backend = self.backend.clone();
        let ready = self.ready.clone();
        runtime.spawn(async move {
            match backend.check(&request).await {
                Ok(Some(payload)) => {
                    debug!(request_id = %request.request_id, "Audit verdict ready");
                    ready.push(AuditVerdict { payload });
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(request_id = %request.request_id, error = %e, "Audit check failed");
                }
            }
        });
    }

    fn poll(&self) -> Option<AuditVerdict> {
        self.ready.pop()
    }
}

/// Flags fragments containing any configured term (case-insensitive)
pub struct BlocklistBackend {
    terms: Vec<String>,
}

impl BlocklistBackend {
    pub fn new(terms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            terms: terms
                .into_iter()
                .map(|term| term.into().to_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }
}

#[async_trait]
impl AuditBackend for BlocklistBackend {
    async fn check(&self, request: &AuditRequest) -> Result<Option<Value>> {
        let fragment = request.fragment.to_lowercase();
        let hits: Vec<&str> = self
            .terms
            .iter()
            .filter(|term| fragment.contains(term.as_str()))
            .map(String::as_str)
            .collect();

        if hits.is_empty() {
            return Ok(None);
        }

        Ok(Some(json!({
            "flagged": true,
            "terms": hits,
            "final": request.final_pass,
        })))
    }
}
