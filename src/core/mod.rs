//! Core pipeline
//!
//! - `types`: canonical chunk and response model
//! - `providers`: upstream dialects and their stream translators
//! - `streaming`: accumulator, simulator, audit interleaving and client sinks

pub mod providers;
pub mod streaming;
pub mod types;
