//! Stream callback chain
//!
//! Every pipeline stage implements [`StreamCallback`] and owns the next stage.
//! A stage that has nothing to do for a call forwards it unchanged, so optional
//! stages (tool-call simulation, redaction) slot in front of the accumulator
//! without either side knowing.

use crate::core::types::responses::ChatChunk;
use crate::utils::error::GatewayError;

/// One stage of the streaming pipeline
pub trait StreamCallback: Send {
    /// Upstream connection confirmed open
    fn on_open(&mut self) {}

    /// One canonical delta, in arrival order
    fn on_delta(&mut self, chunk: ChatChunk);

    /// Upstream signalled normal end of stream
    fn on_done(&mut self);

    /// Connection closed. Called once per request; later calls are no-ops.
    fn on_terminate(&mut self, error: Option<GatewayError>);
}

impl<T: StreamCallback + ?Sized> StreamCallback for Box<T> {
    fn on_open(&mut self) {
        (**self).on_open()
    }

    fn on_delta(&mut self, chunk: ChatChunk) {
        (**self).on_delta(chunk)
    }

    fn on_done(&mut self) {
        (**self).on_done()
    }

    fn on_terminate(&mut self, error: Option<GatewayError>) {
        (**self).on_terminate(error)
    }
}

/// Builder composing stages from the innermost (terminal) one outwards
pub struct CallbackChain {
    head: Box<dyn StreamCallback>,
}

impl CallbackChain {
    /// Start the chain with its terminal stage
    pub fn new(terminal: impl StreamCallback + 'static) -> Self {
        Self {
            head: Box::new(terminal),
        }
    }

    /// Put `stage` in front of everything built so far
    pub fn wrap<F, S>(self, stage: F) -> Self
    where
        F: FnOnce(Box<dyn StreamCallback>) -> S,
        S: StreamCallback + 'static,
    {
        Self {
            head: Box::new(stage(self.head)),
        }
    }

    /// Wrap only when `enabled`
    pub fn wrap_if<F, S>(self, enabled: bool, stage: F) -> Self
    where
        F: FnOnce(Box<dyn StreamCallback>) -> S,
        S: StreamCallback + 'static,
    {
        if enabled { self.wrap(stage) } else { self }
    }

    pub fn into_head(self) -> Box<dyn StreamCallback> {
        self.head
    }
}
