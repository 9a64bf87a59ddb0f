//! Request and response types for the orchestration entry points.
//!
//! These are the serde-facing DTOs shared between parley-core's
//! orchestrators and the HTTP layer in parley-api.

use serde::{Deserialize, Serialize};

use crate::llm::TokenUsage;
use crate::tool::ToolInvocation;

/// Structured output formats a dialog request may demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// The response must be a single valid JSON object.
    Json,
}

/// One multi-round dialog request.
///
/// `model`, `max_tokens`, and `disable_search` default from configuration
/// when absent. On an existing session they are ignored entirely; session
/// parameters are fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogRequest {
    pub message: String,
    /// Vendor identifier resolving to a registered chat backend.
    pub vendor: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub disable_search: Option<bool>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub output_format: Option<OutputFormat>,
    /// JSON schema text folded into the system prompt when `output_format`
    /// is set.
    #[serde(default)]
    pub output_schema: Option<String>,
    #[serde(default)]
    pub max_rounds: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Compress once the user/assistant message count reaches this value.
    /// Mutually exclusive with `compression_tokens_threshold`.
    #[serde(default)]
    pub compression_messages_threshold: Option<u32>,
    /// Compress once the accumulated token total reaches this value.
    /// Mutually exclusive with `compression_messages_threshold`.
    #[serde(default)]
    pub compression_tokens_threshold: Option<u64>,
    /// Session key; defaults to the well-known single-tenant key.
    #[serde(default)]
    pub session_key: Option<String>,
}

impl DialogRequest {
    /// Minimal request used as a test fixture base.
    pub fn new(message: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            vendor: vendor.into(),
            model: None,
            max_tokens: None,
            disable_search: None,
            system_prompt: None,
            output_format: None,
            output_schema: None,
            max_rounds: None,
            temperature: None,
            compression_messages_threshold: None,
            compression_tokens_threshold: None,
            session_key: None,
        }
    }
}

/// Outcome of one dialog round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogResponse {
    pub content: String,
    /// Model the backend reported actually serving the request.
    pub model: String,
    pub is_complete: bool,
    pub current_round: u32,
    pub max_rounds: u32,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    /// Character count of everything sent to the backend this round.
    pub chars_sent: usize,
}

/// One tool-augmented request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub message: String,
    pub vendor: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tool_iterations: Option<u32>,
}

impl AgentRequest {
    pub fn new(message: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            vendor: vendor.into(),
            model: None,
            max_tokens: None,
            temperature: None,
            max_tool_iterations: None,
        }
    }
}

/// Outcome of one agent-loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub content: String,
    pub model: String,
    /// Backend calls made, including the one that produced the final answer.
    pub total_tool_iterations: u32,
    pub tool_invocations: Vec<ToolInvocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
    pub duration_ms: u64,
    /// True when the iteration budget ran out before a final answer.
    pub degraded: bool,
}
