//! BoxChatBackend -- object-safe dynamic dispatch wrapper for ChatBackend.
//!
//! `ChatBackend` uses RPITIT and so cannot be a trait object directly.
//! The usual three-step pattern applies:
//! 1. Define an object-safe `ChatBackendDyn` trait with a boxed future
//! 2. Blanket-impl `ChatBackendDyn` for all `T: ChatBackend`
//! 3. `BoxChatBackend` wraps `Box<dyn ChatBackendDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::backend::ChatBackend;

/// Object-safe version of [`ChatBackend`] with a boxed future.
///
/// Exists solely to enable dynamic dispatch; a blanket implementation
/// covers every `ChatBackend`.
pub trait ChatBackendDyn: Send + Sync {
    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    fn send_message_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;
}

impl<T: ChatBackend> ChatBackendDyn for T {
    fn name(&self) -> &str {
        ChatBackend::name(self)
    }

    fn default_model(&self) -> &str {
        ChatBackend::default_model(self)
    }

    fn send_message_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.send_message(request))
    }
}

/// Type-erased chat backend for runtime vendor selection.
pub struct BoxChatBackend {
    inner: Box<dyn ChatBackendDyn + Send + Sync>,
}

impl std::fmt::Debug for BoxChatBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxChatBackend")
            .field("name", &self.inner.name())
            .finish()
    }
}

impl BoxChatBackend {
    /// Wrap a concrete `ChatBackend` in a type-erased box.
    pub fn new<T: ChatBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    /// Registry name of the wrapped backend.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Model used when a request does not name one.
    pub fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    /// Send a message list and receive the full completion.
    pub async fn send_message(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.inner.send_message_boxed(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::llm::Message;

    struct Echo;

    impl ChatBackend for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn default_model(&self) -> &str {
            "echo-1"
        }

        async fn send_message(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: request
                    .messages
                    .last()
                    .map(|m| m.content.clone())
                    .unwrap_or_default(),
                model: request.model.clone(),
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn test_boxed_backend_delegates() {
        let backend = BoxChatBackend::new(Echo);
        assert_eq!(backend.name(), "echo");

        let request = CompletionRequest {
            model: "m".to_string(),
            messages: vec![Message::user("hello")],
            max_tokens: 16,
            disable_search: false,
            temperature: None,
        };
        let response = backend.send_message(&request).await.unwrap();
        assert_eq!(response.content, "hello");
        assert_eq!(response.model, "m");
    }
}
