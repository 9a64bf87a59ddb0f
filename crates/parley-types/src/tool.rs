//! Tool protocol types.
//!
//! Shapes shared between the agent loop (parley-core) and the MCP
//! JSON-RPC client (parley-infra): tool descriptors as reported by
//! `tools/list`, per-invocation records, and the tool protocol error enum.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A callable tool as advertised by a tool server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema for the tool's arguments, when the server provides one.
    #[serde(rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// Record of one tool invocation made during an agent loop run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the tool server that owned the tool.
    pub server: String,
    pub tool: String,
    pub arguments: Value,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Errors from tool protocol (MCP) operations.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// The server returned a JSON-RPC error object.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The server returned a non-2xx HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Network-level failure (connect, timeout, read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the protocol (bad JSON, missing
    /// result, unexpected SSE framing).
    #[error("protocol error: {0}")]
    Protocol(String),
}
