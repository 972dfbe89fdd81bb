//! LlmProvider trait definition.

use haven_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for completion backends (OpenAI-compatible HTTP, canned replies).
///
/// The endpoint is opaque: message history in, generated text out.
/// Implementations live in haven-infra.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai_compatible", "canned").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
