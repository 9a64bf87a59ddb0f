//! McpClient -- JSON-RPC 2.0 client for one MCP tool server over HTTP.
//!
//! Handshake per the streamable-HTTP transport: `initialize`, then a
//! best-effort `notifications/initialized` (servers answer 202). The server
//! may hand out an `Mcp-Session-Id` header on the first response; every
//! subsequent request echoes it back. A 404 that arrives while we hold a
//! session id means the remote session expired: local state is cleared and
//! the next call re-runs the handshake.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use parley_core::agent::tool_server::ToolServer;
use parley_types::tool::{McpError, ToolDescriptor};

use super::protocol::{
    decode_body, extract_tool_text, session_expired, JsonRpcRequest, PROTOCOL_VERSION,
};

const SESSION_HEADER: &str = "Mcp-Session-Id";

#[derive(Default)]
struct SessionState {
    initialized: bool,
    session_id: Option<String>,
}

struct RawResponse {
    status: u16,
    session_id: Option<String>,
    content_type: Option<String>,
    body: String,
}

/// JSON-RPC client bound to one MCP server URL.
pub struct McpClient {
    http: reqwest::Client,
    name: String,
    url: String,
    next_id: AtomicI64,
    session: Mutex<SessionState>,
}

impl McpClient {
    pub fn new(name: String, url: String) -> Result<Self, McpError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| McpError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            name,
            url,
            next_id: AtomicI64::new(1),
            session: Mutex::new(SessionState::default()),
        })
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn post(
        &self,
        request: &JsonRpcRequest,
        session_id: Option<&str>,
    ) -> Result<RawResponse, McpError> {
        let mut builder = self
            .http
            .post(&self.url)
            .header("content-type", "application/json")
            .header("accept", "application/json, text/event-stream")
            .json(request);
        if let Some(id) = session_id {
            builder = builder.header(SESSION_HEADER, id);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| McpError::Transport(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status().as_u16();
        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| McpError::Transport(format!("failed to read body: {e}")))?;

        Ok(RawResponse {
            status,
            session_id,
            content_type,
            body,
        })
    }

    /// Run the capability handshake once; later calls are no-ops.
    pub async fn initialize(&self) -> Result<(), McpError> {
        let mut state = self.session.lock().await;
        if state.initialized {
            return Ok(());
        }

        let request = JsonRpcRequest::new(
            self.next_id(),
            "initialize",
            Some(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "parley",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            })),
        );
        let raw = self.post(&request, None).await?;
        if !(200..300).contains(&raw.status) {
            return Err(McpError::Http {
                status: raw.status,
                body: raw.body,
            });
        }
        decode_body(raw.content_type.as_deref(), &raw.body)?.into_result()?;

        state.session_id = raw.session_id;
        state.initialized = true;
        tracing::debug!(server = %self.name, "MCP handshake complete");

        // Best effort; some servers do not require it.
        let notification = JsonRpcRequest::notification("notifications/initialized", None);
        if let Err(err) = self.post(&notification, state.session_id.as_deref()).await {
            tracing::debug!(server = %self.name, error = %err, "initialized notification failed");
        }
        Ok(())
    }

    /// Send one request, mapping remote errors and expired sessions.
    async fn rpc_call(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        self.initialize().await?;

        let session_id = self.session.lock().await.session_id.clone();
        let request = JsonRpcRequest::new(self.next_id(), method, params);
        let raw = self.post(&request, session_id.as_deref()).await?;

        if session_expired(raw.status, session_id.is_some()) {
            tracing::warn!(server = %self.name, "MCP session expired, will reinitialize");
            let mut state = self.session.lock().await;
            state.initialized = false;
            state.session_id = None;
            return Err(McpError::Http {
                status: raw.status,
                body: raw.body,
            });
        }
        if !(200..300).contains(&raw.status) {
            return Err(McpError::Http {
                status: raw.status,
                body: raw.body,
            });
        }

        decode_body(raw.content_type.as_deref(), &raw.body)?.into_result()
    }
}

impl ToolServer for McpClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        let result = self.rpc_call("tools/list", None).await?;
        let tools = result
            .get("tools")
            .cloned()
            .ok_or_else(|| McpError::Protocol("tools/list result had no tools field".to_string()))?;
        serde_json::from_value(tools)
            .map_err(|err| McpError::Protocol(format!("invalid tool descriptor: {err}")))
    }

    async fn call_tool(&self, name: &str, arguments: &Value) -> Result<String, McpError> {
        let result = self
            .rpc_call(
                "tools/call",
                Some(json!({"name": name, "arguments": arguments})),
            )
            .await?;
        Ok(extract_tool_text(&result))
    }
}
