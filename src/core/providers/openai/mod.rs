//! OpenAI-compatible streaming dialect

pub mod streaming;

pub use streaming::OpenAiTranslator;
