//! Response types
//!
//! Canonical streaming deltas and the accumulated response built from them.

mod chat;
mod delta;
mod error;
mod finish_reason;
mod usage;

pub use chat::{CHUNK_OBJECT, ChatChoice, ChatChunk, ChatResponse, ChatStreamChoice, RESPONSE_OBJECT};
pub use delta::{ChatDelta, FunctionCallDelta, ToolCallDelta};
pub use error::{ApiError, ErrorResponse};
pub use finish_reason::FinishReason;
pub use usage::Usage;
