//! Wire deframing

use super::types::VendorEvent;
use crate::core::providers::Vendor;
use crate::core::providers::bedrock::EventStreamDecoder;
use crate::core::providers::unified_provider::ProviderError;
use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Turns transport byte chunks into deframed vendor events
pub trait FrameDecoder: Send {
    /// Feed one chunk; returns every event it completed
    fn decode(&mut self, bytes: &[u8]) -> Result<Vec<VendorEvent>, ProviderError>;

    /// Transport ended; flush or reject whatever is still buffered
    fn finish(&mut self) -> Result<Vec<VendorEvent>, ProviderError>;
}

impl Vendor {
    /// Deframer for this vendor's wire format
    pub fn decoder(self) -> Box<dyn FrameDecoder> {
        match self {
            Vendor::OpenAi | Vendor::Anthropic => Box::new(SseDecoder::new()),
            Vendor::Bedrock => Box::new(EventStreamDecoder::new()),
        }
    }
}

/// Incremental `text/event-stream` parser
///
/// Handles lines split across chunks, CRLF endings, comments, multi-line
/// `data:` fields and a final event with no trailing blank line.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event_type: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn process_line(&mut self, line: &str) -> Option<VendorEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(pos) => {
                let value = &line[pos + 1..];
                (&line[..pos], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };

        match field {
            "event" => self.event_type = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id / retry carry nothing the pipeline uses
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<VendorEvent> {
        let event_type = self.event_type.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(VendorEvent::new(event_type.as_deref(), data))
    }
}

impl FrameDecoder for SseDecoder {
    fn decode(&mut self, bytes: &[u8]) -> Result<Vec<VendorEvent>, ProviderError> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        // split on raw bytes so a multi-byte character cut between chunks survives
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]).into_owned();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        Ok(events)
    }

    fn finish(&mut self) -> Result<Vec<VendorEvent>, ProviderError> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned();
            if let Some(event) = self.process_line(&rest) {
                events.push(event);
            }
        }
        events.extend(self.dispatch());
        Ok(events)
    }
}

impl FrameDecoder for EventStreamDecoder {
    fn decode(&mut self, bytes: &[u8]) -> Result<Vec<VendorEvent>, ProviderError> {
        Ok(self
            .push(bytes)?
            .iter()
            .map(|message| message.to_vendor_event())
            .collect())
    }

    fn finish(&mut self) -> Result<Vec<VendorEvent>, ProviderError> {
        EventStreamDecoder::finish(self)?;
        Ok(Vec::new())
    }
}

pin_project! {
    /// Vendor events deframed from a byte stream
    pub struct VendorEventStream {
        #[pin]
        inner: Pin<Box<dyn Stream<Item = Result<VendorEvent, ProviderError>> + Send>>,
    }
}

impl VendorEventStream {
    /// Deframe `bytes` with `decoder`; stops after the first error
    pub fn new<S, B>(bytes: S, mut decoder: Box<dyn FrameDecoder>) -> Self
    where
        S: Stream<Item = Result<B, ProviderError>> + Send + 'static,
        B: AsRef<[u8]> + Send,
    {
        let stream = async_stream::stream! {
            futures::pin_mut!(bytes);
            while let Some(chunk) = bytes.next().await {
                let decoded = chunk.and_then(|chunk| decoder.decode(chunk.as_ref()));
                match decoded {
                    Ok(events) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
            match decoder.finish() {
                Ok(events) => {
                    for event in events {
                        yield Ok(event);
                    }
                }
                Err(e) => yield Err(e),
            }
        };

        Self {
            inner: Box::pin(stream),
        }
    }
}

impl Stream for VendorEventStream {
    type Item = Result<VendorEvent, ProviderError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}
