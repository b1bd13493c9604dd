//! Tool-call simulation
//!
//! Some upstreams write tool calls as markup inside ordinary content. This
//! stage sits in front of the accumulator, feeds content text to a
//! [`FunctionCallParser`] and forwards plain text and structured `tool_calls`
//! deltas instead of the raw markup.
//!
//! When enabled, the network side only enqueues; a dedicated consumer task
//! owns the parser and the next stage, so every delta reaches the next stage
//! in arrival order and the parser's finish runs only after all buffered text
//! has been fed.

mod parser;

pub use parser::{FunctionCallParser, ParseListener, ParsedSegment, TaggedCallParser};

use super::callback::StreamCallback;
use crate::core::types::responses::{
    ChatChunk, ChatDelta, ChatStreamChoice, FinishReason, ToolCallDelta, Usage,
};
use crate::utils::error::GatewayError;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

/// What the network side hands to the consumer
enum SimulatorInput {
    Open,
    Delta(ChatChunk),
    Done,
    Terminate(Option<GatewayError>),
}

/// Tool-call simulator stage
pub struct ToolCallSimulator {
    mode: Mode,
}

enum Mode {
    Disabled(Box<dyn StreamCallback>),
    /// Consumer runs on its own task
    Spawned(mpsc::UnboundedSender<SimulatorInput>),
    /// No runtime available; the consumer runs on the caller's thread
    Inline(Consumer),
}

impl ToolCallSimulator {
    pub fn new(
        enabled: bool,
        parser: Box<dyn FunctionCallParser>,
        next: Box<dyn StreamCallback>,
    ) -> Self {
        if !enabled {
            return Self {
                mode: Mode::Disabled(next),
            };
        }

        let consumer = Consumer::new(parser, next);
        let mode = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let (tx, rx) = mpsc::unbounded_channel();
                runtime.spawn(consumer.run(rx));
                Mode::Spawned(tx)
            }
            Err(_) => {
                debug!("No runtime available, tool-call simulation runs inline");
                Mode::Inline(consumer)
            }
        };
        Self { mode }
    }

    /// Simulator with the default tagged grammar
    pub fn tagged(enabled: bool, next: Box<dyn StreamCallback>) -> Self {
        Self::new(enabled, Box::new(TaggedCallParser::new()), next)
    }

    fn dispatch(&mut self, input: SimulatorInput) {
        match &mut self.mode {
            Mode::Disabled(next) => match input {
                SimulatorInput::Open => next.on_open(),
                SimulatorInput::Delta(chunk) => next.on_delta(chunk),
                SimulatorInput::Done => next.on_done(),
                SimulatorInput::Terminate(error) => next.on_terminate(error),
            },
            Mode::Spawned(tx) => {
                if tx.send(input).is_err() {
                    debug!("Simulator consumer already finished, input dropped");
                }
            }
            Mode::Inline(consumer) => consumer.handle(input),
        }
    }
}

impl StreamCallback for ToolCallSimulator {
    fn on_open(&mut self) {
        self.dispatch(SimulatorInput::Open);
    }

    fn on_delta(&mut self, chunk: ChatChunk) {
        self.dispatch(SimulatorInput::Delta(chunk));
    }

    fn on_done(&mut self) {
        self.dispatch(SimulatorInput::Done);
    }

    fn on_terminate(&mut self, error: Option<GatewayError>) {
        self.dispatch(SimulatorInput::Terminate(error));
    }
}

/// Consumer side: parser plus everything it emits into
struct Consumer {
    parser: Box<dyn FunctionCallParser>,
    emitter: Emitter,
    closed: bool,
}

impl Consumer {
    fn new(parser: Box<dyn FunctionCallParser>, next: Box<dyn StreamCallback>) -> Self {
        Self {
            parser,
            emitter: Emitter::new(next),
            closed: false,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SimulatorInput>) {
        while let Some(input) = rx.recv().await {
            self.handle(input);
        }
        if !self.closed {
            warn!("Simulator input dropped before the stream terminated");
            self.emitter
                .terminate(Some(GatewayError::cancelled("stream pipeline dropped")));
        }
    }

    fn handle(&mut self, input: SimulatorInput) {
        if self.closed {
            return;
        }
        match input {
            SimulatorInput::Open => self.emitter.next.on_open(),
            SimulatorInput::Delta(chunk) => self.handle_delta(chunk),
            SimulatorInput::Done => self.finish(),
            SimulatorInput::Terminate(error) => {
                // stream ended without a done signal
                if let Err(e) = self.parser.drain(&mut self.emitter) {
                    warn!(error = %e, "Failed to release text held by the tool-call parser");
                }
                self.emitter.flush();
                self.emitter.terminate(error);
                self.closed = true;
            }
        }
    }

    fn handle_delta(&mut self, mut chunk: ChatChunk) {
        // only choice 0 is simulated
        if chunk.first_choice().is_none_or(|choice| choice.index != 0) {
            self.emitter.forward(chunk);
            return;
        }
        let first = &mut chunk.choices[0];

        if let Some(reason) = first.finish_reason.take() {
            self.emitter.finish_reason = Some(reason);
        }
        let content = first.delta.content.take().filter(|text| !text.is_empty());

        if content.is_some() {
            self.emitter.template = Some(chunk.shell());
            if let Some(usage) = chunk.usage.take() {
                self.emitter.usage = Some(usage);
            }
        }

        // Everything that is not content (reasoning, role, usage, stray
        // fragments) keeps flowing, ahead of text still inside the parser.
        if has_payload(&chunk) {
            self.emitter.forward(chunk);
        }

        if let Some(text) = content {
            if let Err(e) = self.parser.feed(&text, &mut self.emitter) {
                self.fail(e);
            }
        }
    }

    fn finish(&mut self) {
        match self.parser.finish(&mut self.emitter) {
            Ok(()) => {
                if !self.emitter.finished {
                    self.emitter.on_finish();
                }
                self.closed = true;
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, error: GatewayError) {
        warn!(error = %error, "Tool-call parsing failed");
        self.emitter.terminate(Some(error));
        self.closed = true;
    }
}

/// Whether a chunk still carries anything worth forwarding
fn has_payload(chunk: &ChatChunk) -> bool {
    chunk.usage.is_some()
        || chunk.is_side_channel()
        || chunk.choices.iter().any(|choice| {
            let delta = &choice.delta;
            delta.role.is_some()
                || delta.has_reasoning()
                || delta.has_tool_calls()
                || choice.finish_reason.is_some()
        })
}

/// Listener turning parser output into deltas for the next stage
///
/// The most recent synthesized delta is held back so the finish reason and
/// usage can ride on it when parsing finishes.
struct Emitter {
    next: Box<dyn StreamCallback>,
    template: Option<ChatChunk>,
    pending: Option<ChatChunk>,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
    tool_call_index: u32,
    finished: bool,
    terminated: bool,
}

impl Emitter {
    fn new(next: Box<dyn StreamCallback>) -> Self {
        Self {
            next,
            template: None,
            pending: None,
            finish_reason: None,
            usage: None,
            tool_call_index: 0,
            finished: false,
            terminated: false,
        }
    }

    fn forward(&mut self, chunk: ChatChunk) {
        self.flush();
        self.next.on_delta(chunk);
    }

    fn flush(&mut self) {
        if let Some(chunk) = self.pending.take() {
            self.next.on_delta(chunk);
        }
    }

    fn produce(&mut self, delta: ChatDelta) {
        let mut chunk = self
            .template
            .as_ref()
            .map(ChatChunk::shell)
            .unwrap_or_else(|| ChatChunk::new("", ""));
        chunk.choices.push(ChatStreamChoice::new(0, delta));
        if let Some(previous) = self.pending.replace(chunk) {
            self.next.on_delta(previous);
        }
    }

    fn terminate(&mut self, error: Option<GatewayError>) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.next.on_terminate(error);
    }
}

impl ParseListener for Emitter {
    fn on_message(&mut self, segment: ParsedSegment) {
        match segment {
            ParsedSegment::Text(text) => {
                if !text.is_empty() {
                    self.produce(ChatDelta::content(text));
                }
            }
            ParsedSegment::ToolCall { name, arguments } => {
                let index = self.tool_call_index;
                self.tool_call_index += 1;
                debug!(tool = %name, index, "Simulated tool call");

                let mut call =
                    ToolCallDelta::start(index, format!("call_{}", Uuid::new_v4().simple()), name);
                if let Some(function) = call.function.as_mut() {
                    function.arguments = Some(arguments);
                }
                self.produce(ChatDelta {
                    tool_calls: Some(vec![call]),
                    ..Default::default()
                });
            }
        }
    }

    fn on_finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let reason = if self.tool_call_index > 0 {
            Some(FinishReason::ToolCalls)
        } else {
            self.finish_reason.take()
        };
        let usage = self.usage.take();

        if reason.is_some() || usage.is_some() {
            if self.pending.is_none() {
                self.produce(ChatDelta::default());
            }
            if let Some(chunk) = self.pending.as_mut() {
                if let Some(choice) = chunk.choices.first_mut() {
                    choice.finish_reason = reason;
                }
                if usage.is_some() {
                    chunk.usage = usage;
                }
            }
        }

        self.flush();
        self.next.on_done();
        self.terminate(None);
    }
}
