//! Delta accumulator
//!
//! Terminal stage of the callback chain. Forwards every delta to the client
//! sink, merges it into a per-choice buffer for the final log record, tracks
//! the reasoning/content stage and interleaves safety audits.

use super::audit::{AuditRequest, SafetyAuditor};
use super::callback::StreamCallback;
use super::record::{CompletionLogger, CompletionRecord};
use super::sink::StreamSink;
use super::think::ThinkStage;
use crate::config::AuditConfig;
use crate::core::types::message::{ChatMessage, FunctionCall, MessageRole, ToolCall};
use crate::core::types::responses::{
    ChatChoice, ChatChunk, ChatDelta, ChatResponse, FinishReason, RESPONSE_OBJECT, ToolCallDelta,
};
use crate::utils::error::GatewayError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Merged state of one choice
#[derive(Debug, Default)]
struct ChoiceBuffer {
    role: Option<MessageRole>,
    content: String,
    reasoning: String,
    finish_reason: Option<FinishReason>,
    tool_calls: BTreeMap<u32, ToolCall>,
}

impl ChoiceBuffer {
    fn merge(&mut self, delta: &ChatDelta, finish_reason: Option<&FinishReason>) {
        if self.role.is_none() {
            self.role = delta.role.clone();
        }
        self.content.push_str(delta.content_text());
        self.reasoning.push_str(delta.reasoning_text());
        if let Some(fragments) = &delta.tool_calls {
            for fragment in fragments {
                self.merge_tool_call(fragment);
            }
        }
        if let Some(reason) = finish_reason {
            self.finish_reason = Some(reason.clone());
        }
    }

    /// First fragment of a tool call seeds id/name, later ones append arguments
    fn merge_tool_call(&mut self, fragment: &ToolCallDelta) {
        let call = self.tool_calls.entry(fragment.index).or_insert_with(|| ToolCall {
            id: String::new(),
            tool_type: "function".to_string(),
            function: FunctionCall {
                name: String::new(),
                arguments: String::new(),
            },
        });

        if let Some(id) = fragment.id.as_deref().filter(|id| !id.is_empty()) {
            if call.id.is_empty() {
                call.id = id.to_string();
            }
        }
        if let Some(tool_type) = &fragment.tool_type {
            call.tool_type = tool_type.clone();
        }
        if let Some(function) = &fragment.function {
            if let Some(name) = function.name.as_deref().filter(|name| !name.is_empty()) {
                if call.function.name.is_empty() {
                    call.function.name = name.to_string();
                }
            }
            if let Some(arguments) = &function.arguments {
                call.function.arguments.push_str(arguments);
            }
        }
    }

    fn to_choice(&self, index: u32) -> ChatChoice {
        let tool_calls: Vec<ToolCall> = self.tool_calls.values().cloned().collect();
        ChatChoice {
            index,
            message: ChatMessage {
                role: Some(self.role.clone().unwrap_or(MessageRole::Assistant)),
                content: (!self.content.is_empty()).then(|| self.content.clone()),
                reasoning_content: (!self.reasoning.is_empty()).then(|| self.reasoning.clone()),
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
            },
            finish_reason: self.finish_reason.clone(),
        }
    }
}

/// Audit settings captured from [`AuditConfig`]
struct AuditSettings {
    auditor: Arc<dyn SafetyAuditor>,
    drain_limit: usize,
    sentence_terminators: Vec<char>,
}

/// Terminal pipeline stage merging deltas into the final response
pub struct Accumulator {
    request_id: String,
    sink: Box<dyn StreamSink>,
    logger: Arc<dyn CompletionLogger>,
    audit: Option<AuditSettings>,
    pending_risk: Option<Value>,
    started_at: Instant,
    first_package_at: Option<Instant>,
    response: ChatResponse,
    choices: BTreeMap<u32, ChoiceBuffer>,
    stage: ThinkStage,
    audit_cursor: usize,
    /// Text the cursor points into: reasoning when set, content otherwise
    audit_on_reasoning: bool,
    dirty: bool,
    done: bool,
    terminated: bool,
}

impl Accumulator {
    pub fn new(
        request_id: impl Into<String>,
        sink: Box<dyn StreamSink>,
        logger: Arc<dyn CompletionLogger>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            sink,
            logger,
            audit: None,
            pending_risk: None,
            started_at: Instant::now(),
            first_package_at: None,
            response: ChatResponse::default(),
            choices: BTreeMap::new(),
            stage: ThinkStage::NotStarted,
            audit_cursor: 0,
            audit_on_reasoning: false,
            dirty: false,
            done: false,
            terminated: false,
        }
    }

    /// Enable safety auditing; a disabled config leaves auditing off
    pub fn with_auditor(mut self, auditor: Arc<dyn SafetyAuditor>, config: &AuditConfig) -> Self {
        if config.enabled {
            self.audit = Some(AuditSettings {
                auditor,
                drain_limit: config.drain_limit,
                sentence_terminators: config.sentence_terminators.chars().collect(),
            });
        }
        self
    }

    /// Risk payload delivered to the client once, on the first delta
    pub fn with_request_risk(mut self, risk: Value) -> Self {
        self.pending_risk = Some(risk);
        self
    }

    /// Request start used for duration and first-package timing
    pub fn with_start_time(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn think_stage(&self) -> ThinkStage {
        self.stage
    }

    pub fn audit_cursor(&self) -> usize {
        self.audit_cursor
    }

    /// Accumulated response with choices in index order
    pub fn accumulated(&self) -> ChatResponse {
        let mut response = self.response.clone();
        response.choices = self
            .choices
            .iter()
            .map(|(index, buffer)| buffer.to_choice(*index))
            .collect();
        response
    }

    fn send_to_client(&mut self, chunk: &ChatChunk) {
        if let Err(e) = self.sink.send_chunk(chunk) {
            warn!(request_id = %self.request_id, error = %e, "Dropped delta for client");
        }
    }

    /// First non-empty value wins for top-level scalars
    fn merge_top_level(&mut self, chunk: &ChatChunk) {
        if self.response.id.is_empty() && !chunk.id.is_empty() {
            self.response.id = chunk.id.clone();
        }
        if self.response.model.is_empty() && !chunk.model.is_empty() {
            self.response.model = chunk.model.clone();
        }
        if self.response.created == 0 {
            self.response.created = chunk.created;
        }
        if self.response.object.is_empty() {
            self.response.object = RESPONSE_OBJECT.to_string();
        }
        if self.response.system_fingerprint.is_none() {
            self.response.system_fingerprint = chunk.system_fingerprint.clone();
        }
        if let Some(usage) = &chunk.usage {
            match self.response.usage.as_mut() {
                Some(existing) => existing.merge(usage),
                None => self.response.usage = Some(usage.clone()),
            }
        }
    }

    fn side_channel_shell(&self) -> ChatChunk {
        let mut chunk = ChatChunk::new(self.response.id.clone(), self.response.model.clone());
        chunk.created = chrono::Utc::now().timestamp();
        chunk
    }

    /// Submit the unaudited tail of choice 0 when it ends a sentence (or always, on the final pass)
    fn maybe_audit(&mut self, final_pass: bool) {
        if !self.dirty {
            return;
        }
        let Some(settings) = &self.audit else {
            return;
        };
        let Some(buffer) = self.choices.get(&0) else {
            return;
        };

        let on_reasoning = self.stage.audits_reasoning();
        if on_reasoning != self.audit_on_reasoning {
            self.audit_on_reasoning = on_reasoning;
            self.audit_cursor = 0;
        }
        let text = if on_reasoning {
            &buffer.reasoning
        } else {
            &buffer.content
        };
        let suffix = text.get(self.audit_cursor..).unwrap_or(text.as_str());

        if !final_pass
            && !suffix
                .chars()
                .last()
                .is_some_and(|c| settings.sentence_terminators.contains(&c))
        {
            return;
        }

        let fragment = suffix.to_string();
        self.audit_cursor = text.len();
        self.dirty = false;
        if fragment.trim().is_empty() {
            return;
        }

        let mut snapshot = self.response.clone();
        snapshot.choices = vec![buffer.to_choice(0)];
        debug!(
            request_id = %self.request_id,
            stage = self.stage.code(),
            fragment_len = fragment.len(),
            final_pass,
            "Submitting audit"
        );
        settings.auditor.submit(AuditRequest {
            request_id: self.request_id.clone(),
            snapshot,
            fragment,
            final_pass,
        });
    }

    /// Forward up to `drain_limit` ready verdicts, oldest first; returns how many were sent
    fn drain_audits(&mut self) -> usize {
        let Some(settings) = &self.audit else {
            return 0;
        };
        let auditor = settings.auditor.clone();
        let limit = settings.drain_limit;

        let mut drained = 0;
        while drained < limit {
            let Some(verdict) = auditor.poll() else {
                break;
            };
            let mut chunk = self.side_channel_shell();
            chunk.audit = Some(verdict.payload);
            self.send_to_client(&chunk);
            drained += 1;
        }
        drained
    }

    fn build_record(&self, error: Option<&GatewayError>) -> CompletionRecord {
        let ended_at = Instant::now();
        CompletionRecord {
            request_id: self.request_id.clone(),
            response: self.accumulated(),
            duration_ms: ended_at.duration_since(self.started_at).as_millis() as u64,
            first_package_ms: self
                .first_package_at
                .map(|at| at.duration_since(self.started_at).as_millis() as u64),
            error: error.map(GatewayError::to_api_error),
        }
    }
}

impl StreamCallback for Accumulator {
    fn on_open(&mut self) {
        debug!(request_id = %self.request_id, "Upstream stream opened");
    }

    fn on_delta(&mut self, mut chunk: ChatChunk) {
        if self.terminated {
            return;
        }

        chunk.created = chrono::Utc::now().timestamp();
        if self.first_package_at.is_none() {
            self.first_package_at = Some(Instant::now());
            if let Some(risk) = self.pending_risk.take() {
                chunk.risk = Some(risk);
            }
        }

        self.send_to_client(&chunk);
        self.drain_audits();
        self.merge_top_level(&chunk);

        let Some(first) = chunk.choices.first() else {
            return;
        };

        let next_stage = self
            .stage
            .advance(first.delta.reasoning_text(), first.delta.content_text());
        if next_stage != self.stage {
            debug!(
                request_id = %self.request_id,
                from = self.stage.code(),
                to = next_stage.code(),
                "Think stage advanced"
            );
            self.stage = next_stage;
            if next_stage.starts_section() {
                self.audit_cursor = 0;
            }
        }

        for choice in &chunk.choices {
            self.choices
                .entry(choice.index)
                .or_default()
                .merge(&choice.delta, choice.finish_reason.as_ref());
        }

        let first = &chunk.choices[0].delta;
        if !first.content_text().trim().is_empty() || !first.reasoning_text().trim().is_empty() {
            self.dirty = true;
        }

        self.maybe_audit(false);
    }

    fn on_done(&mut self) {
        if self.done || self.terminated {
            return;
        }
        self.done = true;

        self.maybe_audit(true);
        while self.drain_audits() > 0 {}

        if let Err(e) = self.sink.send_done() {
            warn!(request_id = %self.request_id, error = %e, "Failed to deliver terminal frame");
        }
    }

    fn on_terminate(&mut self, error: Option<GatewayError>) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        if let Some(err) = &error {
            error!(request_id = %self.request_id, error = %err, "Stream terminated with error");
            let mut chunk = self.side_channel_shell();
            chunk.error = Some(err.to_api_error());
            self.send_to_client(&chunk);
        }

        self.logger.log(self.build_record(error.as_ref()));
    }
}
