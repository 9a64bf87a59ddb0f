//! ChatBackend trait definition.
//!
//! This is the uniform "chat completion capability" every LLM vendor
//! implements. Uses native async fn in traits (RPITIT, Rust 2024 edition);
//! implementations live in parley-infra (e.g. `AnthropicBackend`).

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for chat completion backends (Anthropic, OpenAI-compatible, ...).
///
/// One call, one full response. Streaming is deliberately not part of the
/// contract. Retry policy, if any, belongs to the implementation; the
/// orchestrators never retry a failed call.
pub trait ChatBackend: Send + Sync {
    /// Registry name of this backend (the request's vendor identifier).
    fn name(&self) -> &str;

    /// Model used when a request does not name one.
    fn default_model(&self) -> &str;

    /// Send a message list and receive the full completion.
    fn send_message(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
