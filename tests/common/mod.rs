//! Common test utilities for gateway-stream

pub mod assertions;
pub mod fixtures;
pub mod harness;

pub use assertions::{ChatResponseAssertions, FrameAssertions};
pub use harness::{CollectingLogger, Replay, replay};
