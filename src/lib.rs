//! # gateway-stream
//!
//! Streaming response pipeline for a multi-provider AI gateway.
//!
//! Vendor event streams (OpenAI-compatible SSE, Anthropic Messages SSE, AWS
//! Bedrock event-stream) are translated into one canonical delta model,
//! optionally run through a tool-call simulator, merged into a final response
//! for logging, interleaved with asynchronous safety-audit verdicts, and
//! re-encoded for the client in real time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gateway_stream::core::providers::Vendor;
//! use gateway_stream::core::streaming::{PipelineBuilder, VendorEventStream, stream_response};
//! use gateway_stream::Config;
//!
//! # async fn handle(upstream: impl futures::Stream<Item = Result<bytes::Bytes, gateway_stream::ProviderError>> + Send + 'static) -> gateway_stream::Result<actix_web::HttpResponse> {
//! let config = Config::from_env()?;
//! let pipeline = PipelineBuilder::new("req-1", Vendor::Anthropic, config.streaming.clone())
//!     .request_path("/v1/chat/completions")
//!     .build();
//! let events = VendorEventStream::new(upstream, Vendor::Anthropic.decoder());
//! let connect = async move { Ok::<_, gateway_stream::ProviderError>(events) };
//! stream_response(pipeline, connect, config.streaming.connect_timeout()).await
//! # }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use utils::error::{GatewayError, Result};

pub use core::providers::{ProviderError, StreamTranslator, Translation, Vendor};
pub use core::streaming::{
    Accumulator, CallbackChain, ClientFormat, PipelineBuilder, StreamCallback, StreamPipeline,
    StreamingHandler, ThinkStage, ToolCallSimulator,
};
pub use core::types::{ChatChunk, ChatDelta, ChatResponse, FinishReason, Usage};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version number
    pub version: &'static str,
    /// Rust version the crate targets
    pub rust_version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: VERSION,
            rust_version: env!("CARGO_PKG_RUST_VERSION"),
        }
    }
}

/// Build
pub fn build_info() -> BuildInfo {
    BuildInfo::default()
}
