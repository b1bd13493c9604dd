//! Error handling for the streaming gateway
//!
//! This module defines all error types used throughout the pipeline.

#![allow(missing_docs)]

mod conversions;
mod helpers;
mod response;
mod types;

pub use response::ErrorResponse;
pub use types::{GatewayError, Result};
