//! Validation trait definition

/// Section-level check run after loading and before use
///
/// The error is a human-readable reason; [`crate::config::Config::validate`]
/// prefixes it with the section name.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}
