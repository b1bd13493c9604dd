//! Streaming response pipeline
//!
//! Vendor events are translated into canonical deltas, optionally run through
//! the tool-call simulator, merged by the accumulator and delivered to the
//! client as Server-Sent Events.

use crate::core::providers::unified_provider::ProviderError;
use crate::utils::error::Result;
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{HttpResponse, web};
use futures::stream::{Stream, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;

pub mod accumulator;
pub mod audit;
pub mod callback;
pub mod handler;
pub mod pipeline;
pub mod record;
pub mod simulator;
pub mod sink;
pub mod think;
pub mod types;
pub mod utils;

pub use accumulator::Accumulator;
pub use audit::{AuditBackend, AuditRequest, AuditVerdict, BlocklistBackend, QueuedAuditor, SafetyAuditor};
pub use callback::{CallbackChain, StreamCallback};
pub use handler::{OpenNotifier, OpenSignal, StreamListener, StreamingHandler, open_signal};
pub use pipeline::{PipelineBuilder, StreamPipeline};
pub use record::{CompletionLogger, CompletionRecord, TracingCompletionLogger};
pub use simulator::{FunctionCallParser, TaggedCallParser, ToolCallSimulator};
pub use sink::{ChunkEncoder, ClientFormat, NativeSender, SseSink, StreamSink};
pub use think::ThinkStage;
pub use types::{DONE_MARKER, Event, VendorEvent};
pub use utils::{FrameDecoder, SseDecoder, VendorEventStream};

/// Create a Server-Sent Events response for Actix-web
pub fn create_sse_response<S>(stream: S) -> HttpResponse
where
    S: Stream<Item = Result<web::Bytes>> + Send + 'static,
{
    HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .insert_header(("Connection", "keep-alive"))
        .streaming(stream)
}

/// Encoded SSE bytes for the client frames a pipeline produces
pub fn sse_body(events: mpsc::UnboundedReceiver<Event>) -> impl Stream<Item = Result<web::Bytes>> {
    UnboundedReceiverStream::new(events).map(|event| Ok(event.to_bytes()))
}

/// Start `pipeline` on `connect` and answer once the upstream has opened
///
/// A failure before open comes back as `Err`, so the HTTP layer can answer
/// with a plain error status instead of an empty event stream.
pub async fn stream_response<F, S>(
    pipeline: StreamPipeline,
    connect: F,
    open_timeout: Duration,
) -> Result<HttpResponse>
where
    F: Future<Output = std::result::Result<S, ProviderError>> + Send + 'static,
    S: Stream<Item = std::result::Result<VendorEvent, ProviderError>> + Send + 'static,
{
    let StreamPipeline {
        handler,
        open,
        events,
        ..
    } = pipeline;
    let request_id = handler.request_id().to_string();

    tokio::spawn(handler.run(connect));

    if let Err(e) = open.wait(open_timeout).await {
        warn!(request_id = %request_id, "Stream failed before open: {}", e);
        return Err(e);
    }
    Ok(create_sse_response(sse_body(events)))
}
