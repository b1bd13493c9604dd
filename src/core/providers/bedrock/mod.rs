//! AWS Bedrock `invoke-with-response-stream` dialect
//!
//! Responses arrive in the binary `application/vnd.amazon.eventstream`
//! framing; each `chunk` event wraps a base64 encoded model payload.

pub mod streaming;

pub use streaming::{BedrockTranslator, EventStreamDecoder, EventStreamMessage, HeaderValue};
