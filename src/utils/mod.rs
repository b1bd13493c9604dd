//! Utility modules
//!
//! - **error**: gateway error type and client-facing error shape
//! - **logging**: `tracing` subscriber setup

pub mod error;
pub mod logging;

pub use logging::init_logging;
