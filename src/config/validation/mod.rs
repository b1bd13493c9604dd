//! Configuration validation
//!
//! - `trait_def`: the [`Validate`] trait
//! - `streaming_validators`: pipeline, audit and logging validators
//! - `tests`: validator test suite

mod streaming_validators;
mod trait_def;

pub use trait_def::Validate;
