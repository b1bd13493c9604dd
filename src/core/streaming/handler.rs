//! Drives one upstream connection through the pipeline
//!
//! [`StreamListener`] reacts to transport callbacks (open, event, failure,
//! close) by running each vendor event through the translator and into the
//! callback chain. [`StreamingHandler`] owns the read loop around it and stops
//! reading when the client goes away.

use super::callback::StreamCallback;
use super::sink::NativeSender;
use super::types::VendorEvent;
use crate::core::providers::unified_provider::ProviderError;
use crate::core::providers::{StreamTranslator, Vendor};
use crate::utils::error::{GatewayError, Result};
use futures::{Stream, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

/// Create a connected notifier / signal pair
pub fn open_signal() -> (OpenNotifier, OpenSignal) {
    let (tx, rx) = oneshot::channel();
    (OpenNotifier { tx: Some(tx) }, OpenSignal { rx })
}

/// Listener side of the open signal; the first call wins
#[derive(Debug)]
pub struct OpenNotifier {
    tx: Option<oneshot::Sender<Result<()>>>,
}

impl OpenNotifier {
    pub fn opened(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Ok(()));
        }
    }

    pub fn fail(&mut self, err: GatewayError) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Err(err));
        }
    }

    pub fn is_settled(&self) -> bool {
        self.tx.is_none()
    }
}

/// Caller side: resolves once the upstream stream is open, or with the
/// failure that prevented it
#[derive(Debug)]
pub struct OpenSignal {
    rx: oneshot::Receiver<Result<()>>,
}

impl OpenSignal {
    pub async fn wait(self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(GatewayError::internal(
                "stream handler dropped before the upstream opened",
            )),
            Err(_) => Err(GatewayError::timeout(format!(
                "upstream did not open within {}s",
                timeout.as_secs()
            ))),
        }
    }
}

/// Per-request vendor event listener
pub struct StreamListener {
    request_id: String,
    translator: Box<dyn StreamTranslator>,
    head: Box<dyn StreamCallback>,
    native: NativeSender,
    notifier: OpenNotifier,
    opened: bool,
    done: bool,
    terminated: bool,
}

impl StreamListener {
    pub fn new(
        request_id: impl Into<String>,
        translator: Box<dyn StreamTranslator>,
        head: Box<dyn StreamCallback>,
        native: NativeSender,
        notifier: OpenNotifier,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            translator,
            head,
            native,
            notifier,
            opened: false,
            done: false,
            terminated: false,
        }
    }

    pub fn vendor(&self) -> Vendor {
        self.translator.vendor()
    }

    /// Stream reached a terminal state; further events are ignored
    pub fn is_finished(&self) -> bool {
        self.done || self.terminated
    }

    pub fn on_open(&mut self) {
        if self.opened || self.terminated {
            return;
        }
        self.opened = true;
        debug!(request_id = %self.request_id, vendor = %self.vendor(), "Upstream stream opened");
        self.notifier.opened();
        self.head.on_open();
    }

    /// Translate and forward one vendor event
    pub fn on_event(&mut self, event: &VendorEvent) {
        if self.is_finished() {
            debug!(request_id = %self.request_id, "Ignoring event after end of stream");
            return;
        }

        let translation = match self.translator.on_vendor_event(event) {
            Ok(translation) => translation,
            Err(e) => {
                self.on_failure(e);
                return;
            }
        };

        if let Some(frame) = translation.native {
            if let Err(e) = self.native.send(frame) {
                self.terminate(Some(e));
                return;
            }
        }
        if let Some(chunk) = translation.delta {
            self.head.on_delta(chunk);
        }
        if translation.done {
            self.done = true;
            self.head.on_done();
            self.terminate(None);
        }
    }

    /// Transport or vendor failure
    ///
    /// Before open the open signal fails too, so the caller sees the error
    /// synchronously instead of an empty stream.
    pub fn on_failure(&mut self, err: ProviderError) {
        if self.terminated {
            return;
        }
        error!(
            request_id = %self.request_id,
            vendor = %self.vendor(),
            error_type = err.error_type(),
            "Upstream stream failed: {}", err
        );
        if !self.opened {
            self.notifier.fail(err.clone().into());
        }
        self.terminate(Some(err.into()));
    }

    /// Transport ended
    pub fn on_close(&mut self) {
        if self.is_finished() {
            return;
        }
        let vendor = self.vendor().name();
        self.on_failure(ProviderError::network(
            vendor,
            "upstream closed the stream before it completed",
        ));
    }

    /// The client went away; stop without a `[DONE]`
    pub fn on_cancel(&mut self) {
        if self.terminated {
            return;
        }
        info!(request_id = %self.request_id, "Client disconnected, cancelling stream");
        if !self.opened {
            self.notifier.fail(GatewayError::cancelled("client disconnected"));
        }
        self.terminate(Some(GatewayError::cancelled("client disconnected")));
    }

    fn terminate(&mut self, error: Option<GatewayError>) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        self.head.on_terminate(error);
    }
}

/// Read loop around a [`StreamListener`]
pub struct StreamingHandler {
    listener: StreamListener,
}

impl StreamingHandler {
    pub fn new(listener: StreamListener) -> Self {
        Self { listener }
    }

    pub fn request_id(&self) -> &str {
        &self.listener.request_id
    }

    /// Connect, then pump vendor events until the stream ends
    ///
    /// A client disconnect at any point drops the upstream connection.
    pub async fn run<F, S>(mut self, connect: F)
    where
        F: Future<Output = std::result::Result<S, ProviderError>>,
        S: Stream<Item = std::result::Result<VendorEvent, ProviderError>>,
    {
        // the listener's sender doubles as the disconnect signal
        let client = self.listener.native.clone();

        let events = tokio::select! {
            biased;
            _ = client.closed() => {
                self.listener.on_cancel();
                return;
            }
            connected = connect => match connected {
                Ok(events) => events,
                Err(e) => {
                    self.listener.on_failure(e);
                    return;
                }
            },
        };

        self.listener.on_open();
        futures::pin_mut!(events);

        while !self.listener.is_finished() {
            tokio::select! {
                biased;
                _ = client.closed() => {
                    self.listener.on_cancel();
                    break;
                }
                next = events.next() => match next {
                    Some(Ok(event)) => self.listener.on_event(&event),
                    Some(Err(e)) => self.listener.on_failure(e),
                    None => self.listener.on_close(),
                },
            }
        }
    }
}
