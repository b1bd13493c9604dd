//! Configuration data models

pub mod logging;
pub mod streaming;

pub use logging::*;
pub use streaming::*;

/// Default for boolean flags that start enabled
pub fn default_true() -> bool {
    true
}
