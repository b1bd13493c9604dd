//! Integration tests for gateway-stream
//!
//! Each test replays vendor wire bytes through a complete pipeline and checks
//! what the client received and what was logged.

pub mod anthropic_pipeline_tests;
pub mod audit_pipeline_tests;
pub mod bedrock_pipeline_tests;
pub mod config_validation_tests;
pub mod error_handling_tests;
pub mod openai_pipeline_tests;
pub mod simulator_pipeline_tests;
