//! Replay harness: drive a full pipeline over captured wire bytes

use gateway_stream::Result;
use gateway_stream::core::providers::{ProviderError, Vendor};
use gateway_stream::core::streaming::{
    CompletionLogger, CompletionRecord, Event, PipelineBuilder, VendorEventStream,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Logger that keeps every record
#[derive(Default)]
pub struct CollectingLogger {
    records: Mutex<Vec<CompletionRecord>>,
}

impl CollectingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn records(&self) -> Vec<CompletionRecord> {
        self.records.lock().clone()
    }
}

impl CompletionLogger for CollectingLogger {
    fn log(&self, record: CompletionRecord) {
        self.records.lock().push(record);
    }
}

/// Everything observable about one replayed request
pub struct Replay {
    /// Result of waiting for the upstream to open
    pub open: Result<()>,
    /// Frames the client received, in order
    pub frames: Vec<Event>,
    /// Completion records handed to the logger
    pub records: Vec<CompletionRecord>,
}

impl Replay {
    /// The single completion record
    pub fn record(&self) -> &CompletionRecord {
        assert_eq!(self.records.len(), 1, "expected exactly one completion record");
        &self.records[0]
    }
}

/// Replay `wire` through `builder`'s pipeline, `chunk_size` bytes per read
///
/// `transport_error` simulates a connection failure after the capture.
pub async fn replay(
    builder: PipelineBuilder,
    vendor: Vendor,
    wire: Vec<u8>,
    chunk_size: usize,
    transport_error: Option<ProviderError>,
) -> Replay {
    let logger = CollectingLogger::new();
    let mut pipeline = builder.logger(logger.clone()).build();

    let mut reads: Vec<std::result::Result<Vec<u8>, ProviderError>> = wire
        .chunks(chunk_size.max(1))
        .map(|chunk| Ok(chunk.to_vec()))
        .collect();
    if let Some(error) = transport_error {
        reads.push(Err(error));
    }
    let events = VendorEventStream::new(futures::stream::iter(reads), vendor.decoder());
    let connect = async move { Ok::<_, ProviderError>(events) };

    let handler = tokio::spawn(pipeline.handler.run(connect));
    let open = pipeline.open.wait(Duration::from_secs(5)).await;

    let mut frames = Vec::new();
    while let Some(frame) = tokio::time::timeout(Duration::from_secs(5), pipeline.events.recv())
        .await
        .expect("pipeline stalled")
    {
        frames.push(frame);
    }
    handler.await.expect("stream handler panicked");

    Replay {
        open,
        frames,
        records: logger.records(),
    }
}
