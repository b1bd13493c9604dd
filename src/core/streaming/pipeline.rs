//! Per-request pipeline assembly
//!
//! ```text
//! vendor events -> translator -> [tool-call simulator] -> accumulator -> sink
//! ```

use super::accumulator::Accumulator;
use super::audit::{BlocklistBackend, QueuedAuditor, SafetyAuditor};
use super::callback::CallbackChain;
use super::handler::{OpenSignal, StreamListener, StreamingHandler, open_signal};
use super::record::{CompletionLogger, TracingCompletionLogger};
use super::sink::{ClientFormat, SseSink};
use super::simulator::{FunctionCallParser, TaggedCallParser, ToolCallSimulator};
use super::types::Event;
use crate::config::StreamingConfig;
use crate::core::providers::Vendor;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Everything one streaming request needs
pub struct StreamPipeline {
    /// Drives the upstream connection
    pub handler: StreamingHandler,
    /// Resolves once the upstream stream opened
    pub open: OpenSignal,
    /// Frames for the client, in order
    pub events: mpsc::UnboundedReceiver<Event>,
    /// Dialect the client receives
    pub client_format: ClientFormat,
}

/// Builder for [`StreamPipeline`]
pub struct PipelineBuilder {
    request_id: String,
    vendor: Vendor,
    config: StreamingConfig,
    request_path: Option<String>,
    logger: Arc<dyn CompletionLogger>,
    auditor: Option<Arc<dyn SafetyAuditor>>,
    parser: Option<Box<dyn FunctionCallParser>>,
    request_risk: Option<Value>,
    started_at: Instant,
}

impl PipelineBuilder {
    pub fn new(request_id: impl Into<String>, vendor: Vendor, config: StreamingConfig) -> Self {
        Self {
            request_id: request_id.into(),
            vendor,
            config,
            request_path: None,
            logger: Arc::new(TracingCompletionLogger),
            auditor: None,
            parser: None,
            request_risk: None,
            started_at: Instant::now(),
        }
    }

    /// Path the client called; a vendor-native path switches on passthrough
    pub fn request_path(mut self, path: impl Into<String>) -> Self {
        self.request_path = Some(path.into());
        self
    }

    pub fn logger(mut self, logger: Arc<dyn CompletionLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Use a custom auditor instead of the configured blocklist
    pub fn auditor(mut self, auditor: Arc<dyn SafetyAuditor>) -> Self {
        self.auditor = Some(auditor);
        self
    }

    /// Grammar for tool-call simulation; defaults to [`TaggedCallParser`]
    pub fn parser(mut self, parser: Box<dyn FunctionCallParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn request_risk(mut self, risk: Value) -> Self {
        self.request_risk = Some(risk);
        self
    }

    pub fn started_at(mut self, started_at: Instant) -> Self {
        self.started_at = started_at;
        self
    }

    /// Whether the client speaks the vendor's own protocol
    fn is_native(&self) -> bool {
        self.config.client_format == ClientFormat::Native
            || self
                .request_path
                .as_deref()
                .is_some_and(|path| self.vendor.is_native_endpoint(path))
    }

    /// Client dialect after native resolution
    ///
    /// OpenAI-compatible upstreams already speak the canonical format, so
    /// "native" there means canonical chunks.
    fn resolve_format(&self) -> ClientFormat {
        match (self.is_native(), self.vendor) {
            (true, Vendor::OpenAi) => ClientFormat::OpenAi,
            (true, _) => ClientFormat::Native,
            (false, _) => self.config.client_format,
        }
    }

    fn resolve_auditor(&mut self) -> Option<Arc<dyn SafetyAuditor>> {
        if !self.config.audit.enabled {
            return None;
        }
        if let Some(auditor) = self.auditor.take() {
            return Some(auditor);
        }
        if self.config.audit.blocked_terms.is_empty() {
            return None;
        }
        let backend = BlocklistBackend::new(self.config.audit.blocked_terms.iter().cloned());
        Some(Arc::new(QueuedAuditor::new(Arc::new(backend))))
    }

    pub fn build(mut self) -> StreamPipeline {
        let client_format = self.resolve_format();
        let passthrough = client_format == ClientFormat::Native;

        let simulate = self.config.simulate_tool_calls && !passthrough;
        if self.config.simulate_tool_calls && passthrough {
            warn!(
                request_id = %self.request_id,
                vendor = %self.vendor,
                "Tool-call simulation disabled for a native passthrough request"
            );
        }

        let (sink, events) = SseSink::channel(client_format);
        let native = sink.native_sender();

        let mut accumulator = Accumulator::new(self.request_id.clone(), Box::new(sink), self.logger.clone())
            .with_start_time(self.started_at);
        if let Some(auditor) = self.resolve_auditor() {
            accumulator = accumulator.with_auditor(auditor, &self.config.audit);
        }
        if let Some(risk) = self.request_risk.take() {
            accumulator = accumulator.with_request_risk(risk);
        }

        let parser = self
            .parser
            .take()
            .unwrap_or_else(|| Box::new(TaggedCallParser::new()));
        let head = CallbackChain::new(accumulator)
            .wrap_if(simulate, |next| ToolCallSimulator::new(true, parser, next))
            .into_head();

        debug!(
            request_id = %self.request_id,
            vendor = %self.vendor,
            client_format = ?client_format,
            simulate,
            "Stream pipeline assembled"
        );

        let (notifier, open) = open_signal();
        let listener = StreamListener::new(
            self.request_id,
            self.vendor.translator(passthrough),
            head,
            native,
            notifier,
        );

        StreamPipeline {
            handler: StreamingHandler::new(listener),
            open,
            events,
            client_format,
        }
    }
}
