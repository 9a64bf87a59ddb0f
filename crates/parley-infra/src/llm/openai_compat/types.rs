//! OpenAI chat-completions wire types.
//!
//! Shared by every OpenAI-compatible vendor (OpenAI, DeepSeek, Qwen,
//! self-hosted gateways). Some of these vendors accept a nonstandard
//! `enable_search` flag; it is serialized only when explicitly set.

use serde::{Deserialize, Serialize};

/// Request body for `/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionsRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Vendor extension: some OpenAI-compatible providers bundle a web
    /// search the caller may need to switch off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_search: Option<bool>,
}

/// One message in OpenAI wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Response body for a non-streaming `/chat/completions` call.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionsResponse {
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// Token usage as reported by OpenAI-compatible vendors.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}
