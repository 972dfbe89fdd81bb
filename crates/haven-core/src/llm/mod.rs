//! LLM provider abstractions for the AI assistant.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: object-safe wrapper for runtime provider selection

pub mod box_provider;
pub mod provider;
