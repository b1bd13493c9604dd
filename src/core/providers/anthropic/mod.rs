//! Anthropic Messages streaming dialect

mod encoder;
pub mod error;
pub mod streaming;

pub use encoder::AnthropicEncoder;
pub use error::anthropic_stream_error;
pub use streaming::AnthropicTranslator;
