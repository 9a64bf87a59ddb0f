//! AnthropicBackend -- concrete [`ChatBackend`] for the Anthropic Messages
//! API (`/v1/messages`).
//!
//! The API key is wrapped in [`secrecy::SecretString`] and only exposed
//! when building request headers; it never appears in Debug output or logs.
//! Anthropic has no search toggle, so `disable_search` is ignored here.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::backend::ChatBackend;
use parley_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, MessageRole, TokenUsage,
};

use super::types::{AnthropicContentBlock, AnthropicMessage, AnthropicRequest, AnthropicResponse};

/// Anthropic Claude chat backend.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl AnthropicBackend {
    /// The Anthropic API version header value.
    const API_VERSION: &'static str = "2023-06-01";

    pub fn new(api_key: SecretString, model: String) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
            model,
        })
    }

    /// Override the base URL (testing, proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

/// Split a generic message list into Anthropic's shape: system entries are
/// joined into the top-level `system` field, user/assistant turns become
/// the `messages` array.
fn to_anthropic_request(request: &CompletionRequest) -> AnthropicRequest {
    let system_parts: Vec<&str> = request
        .messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.content.as_str())
        .collect();

    let messages = request
        .messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| AnthropicMessage {
            role: m.role.to_string(),
            content: m.content.clone(),
        })
        .collect();

    AnthropicRequest {
        model: request.model.clone(),
        max_tokens: request.max_tokens,
        messages,
        system: if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        },
        temperature: request.temperature,
    }
}

// No Debug derive: the SecretString field already guards the key, but
// omitting Debug entirely removes the temptation to log the client.

impl ChatBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let body = to_anthropic_request(request);
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", Self::API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited,
                400 => LlmError::InvalidRequest(error_body),
                _ => LlmError::Http {
                    status: status.as_u16(),
                    body: error_body,
                },
            });
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let content = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text.as_str()),
                AnthropicContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        let usage = parsed.usage.map(|u| TokenUsage {
            prompt_tokens: Some(u.input_tokens),
            completion_tokens: Some(u.output_tokens),
            total_tokens: Some(u.input_tokens + u.output_tokens),
            cost: None,
        });

        Ok(CompletionResponse {
            content,
            model: parsed.model,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::llm::Message;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            messages: vec![
                Message::system("Be brief."),
                Message::system("[COMPRESSED_HISTORY] older turns"),
                Message::user("hello"),
                Message::assistant("hi"),
                Message::user("more"),
            ],
            max_tokens: 256,
            disable_search: false,
            temperature: Some(0.5),
        }
    }

    #[test]
    fn test_system_entries_fold_into_system_field() {
        let body = to_anthropic_request(&request());
        let system = body.system.unwrap();
        assert!(system.starts_with("Be brief."));
        assert!(system.contains("[COMPRESSED_HISTORY]"));
        assert_eq!(body.messages.len(), 3);
        assert_eq!(body.messages[0].role, "user");
        assert_eq!(body.messages[1].role, "assistant");
    }

    #[test]
    fn test_no_system_entries_means_no_system_field() {
        let req = CompletionRequest {
            model: "m".to_string(),
            messages: vec![Message::user("q")],
            max_tokens: 10,
            disable_search: true,
            temperature: None,
        };
        let body = to_anthropic_request(&req);
        assert!(body.system.is_none());
        assert_eq!(body.max_tokens, 10);
    }
}
