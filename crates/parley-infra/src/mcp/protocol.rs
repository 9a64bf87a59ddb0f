//! JSON-RPC 2.0 envelope and body decoding for the MCP HTTP transport.
//!
//! Streamable-HTTP MCP servers may answer a POST either with a plain JSON
//! body or with a Server-Sent-Events stream whose last `data:` line holds
//! the JSON-RPC response. The decoding helpers here are pure functions so
//! both shapes stay unit-tested without a server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use parley_types::tool::McpError;

/// MCP protocol revision sent in the `initialize` handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// A JSON-RPC 2.0 request or notification.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// Absent for notifications, which expect no response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: i64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    #[allow(dead_code)]
    pub id: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<JsonRpcError>,
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[allow(dead_code)]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Unwrap the response into its result, mapping a remote error.
    pub fn into_result(self) -> Result<Value, McpError> {
        if let Some(error) = self.error {
            return Err(McpError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        self.result
            .ok_or_else(|| McpError::Protocol("response carried neither result nor error".to_string()))
    }
}

/// Decode a response body that may be plain JSON or SSE-framed.
pub fn decode_body(content_type: Option<&str>, body: &str) -> Result<JsonRpcResponse, McpError> {
    let is_sse = content_type
        .map(|ct| ct.contains("text/event-stream"))
        .unwrap_or(false)
        || body.trim_start().starts_with("event:")
        || body.trim_start().starts_with("data:");

    let json = if is_sse {
        extract_sse_data(body)
            .ok_or_else(|| McpError::Protocol("SSE body carried no data line".to_string()))?
    } else {
        body
    };

    serde_json::from_str(json)
        .map_err(|err| McpError::Protocol(format!("invalid JSON-RPC body: {err}")))
}

/// The payload of the last `data:` line in an SSE body.
fn extract_sse_data(body: &str) -> Option<&str> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .filter(|payload| !payload.is_empty())
        .next_back()
}

/// Extract the textual tool result from the shapes servers actually use:
/// `content` as a string, as an array whose first element has a `text`
/// field, or as an object with a `text` field. Falls back to stringifying
/// the whole result.
pub fn extract_tool_text(result: &Value) -> String {
    match result.get("content") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| result.to_string()),
        Some(Value::Object(object)) => object
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| result.to_string()),
        _ => result.to_string(),
    }
}

/// Whether a response indicates the remote MCP session expired.
pub fn session_expired(status: u16, has_session: bool) -> bool {
    status == 404 && has_session
}
