//! Error handling utilities
//!
//! Every failure inside the streaming pipeline is normalised to [`GatewayError`]
//! before it reaches a client.

pub mod error;

pub use error::*;
