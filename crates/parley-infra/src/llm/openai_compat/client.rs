//! OpenAiCompatBackend -- [`ChatBackend`] for any vendor speaking the
//! OpenAI `/chat/completions` protocol.
//!
//! One implementation serves multiple vendors via a configurable name,
//! base URL, and default model. Vendors that bundle a web search get it
//! switched off through the nonstandard `enable_search` flag when the
//! request asks for `disable_search`.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::backend::ChatBackend;
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, TokenUsage};

use super::types::{ChatCompletionsRequest, ChatCompletionsResponse, ChatMessage};

/// Chat backend for OpenAI-compatible APIs.
pub struct OpenAiCompatBackend {
    client: reqwest::Client,
    api_key: SecretString,
    name: String,
    base_url: String,
    model: String,
}

impl OpenAiCompatBackend {
    pub fn new(
        name: String,
        api_key: SecretString,
        base_url: String,
        model: String,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            api_key,
            name,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }
}

fn to_wire_request(request: &CompletionRequest) -> ChatCompletionsRequest {
    ChatCompletionsRequest {
        model: request.model.clone(),
        messages: request
            .messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
            })
            .collect(),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        enable_search: request.disable_search.then_some(false),
    }
}

// No Debug derive, same reasoning as AnthropicBackend.

impl ChatBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        let body = to_wire_request(request);
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
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

        let parsed: ChatCompletionsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| {
                LlmError::Deserialization("response contained no choices".to_string())
            })?;

        let usage = parsed.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
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

    #[test]
    fn test_disable_search_maps_to_enable_search_false() {
        let req = CompletionRequest {
            model: "qwen-max".to_string(),
            messages: vec![Message::user("q")],
            max_tokens: 32,
            disable_search: true,
            temperature: None,
        };
        let wire = to_wire_request(&req);
        assert_eq!(wire.enable_search, Some(false));
    }

    #[test]
    fn test_search_flag_absent_by_default() {
        let req = CompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![Message::system("s"), Message::user("q")],
            max_tokens: 32,
            disable_search: false,
            temperature: Some(0.7),
        };
        let wire = to_wire_request(&req);
        assert_eq!(wire.enable_search, None);
        // System entries travel in the message list, unlike Anthropic.
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages.len(), 2);
    }
}
