//! Core type definition module
//!
//! The canonical response model shared by every pipeline stage.

pub mod message;
pub mod responses;

pub use message::*;
pub use responses::*;
