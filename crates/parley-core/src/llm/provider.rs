//! LlmProvider trait definition.
//!
//! This is the core abstraction that every language-model backend implements.
//! Uses RPITIT for `complete`; the session service only needs whole replies.

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (OpenAI-compatible APIs, offline stand-in).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in parley-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai", "offline").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
