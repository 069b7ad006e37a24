//! BoxLlmProvider -- object-safe dynamic dispatch wrapper for LlmProvider.
//!
//! Same blanket-impl pattern as `BoxDocumentStore`:
//! 1. Define an object-safe `LlmProviderDyn` trait with boxed futures
//! 2. Blanket-impl `LlmProviderDyn` for all `T: LlmProvider`
//! 3. `BoxLlmProvider` wraps `Box<dyn LlmProviderDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::provider::LlmProvider;

/// Object-safe version of [`LlmProvider`] with boxed futures.
///
/// This trait exists solely to enable dynamic dispatch (`dyn LlmProviderDyn`).
/// A blanket implementation is provided for all types implementing `LlmProvider`.
pub trait LlmProviderDyn: Send + Sync {
    fn provider_name(&self) -> &str;

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;
}

/// Blanket implementation: any `LlmProvider` automatically implements `LlmProviderDyn`.
impl<T: LlmProvider> LlmProviderDyn for T {
    fn provider_name(&self) -> &str {
        LlmProvider::name(self)
    }

    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }
}

/// Type-erased LLM provider for runtime provider selection.
///
/// Wraps any `LlmProvider` implementation behind dynamic dispatch, so the
/// application can choose between a real backend and the offline stand-in
/// at startup. Itself implements `LlmProvider`, so services stay generic.
pub struct BoxLlmProvider {
    inner: Box<dyn LlmProviderDyn + Send + Sync>,
}

impl BoxLlmProvider {
    /// Wrap a concrete `LlmProvider` in a type-erased box.
    pub fn new<T: LlmProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }
}

impl LlmProvider for BoxLlmProvider {
    fn name(&self) -> &str {
        self.inner.provider_name()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.inner.complete_boxed(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::llm::{Message, StopReason, Usage};

    struct EchoProvider;

    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(CompletionResponse {
                id: "resp-echo".to_string(),
                content: last,
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    #[tokio::test]
    async fn test_box_provider_delegates() {
        let provider = BoxLlmProvider::new(EchoProvider);
        assert_eq!(provider.name(), "echo");

        let request = CompletionRequest {
            model: "m".to_string(),
            messages: vec![Message::user("ping")],
            max_tokens: 16,
            temperature: None,
        };
        let response = provider.complete(&request).await.unwrap();
        assert_eq!(response.content, "ping");
        assert_eq!(response.model, "m");
    }
}
