//! ToolServer trait definition and its dynamic-dispatch wrapper.
//!
//! A tool server exposes callable tools to the agent loop. The concrete
//! JSON-RPC client lives in parley-infra (`McpClient`); tests use in-process
//! fakes. Same RPITIT-plus-box pattern as `ChatBackend`.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use parley_types::tool::{McpError, ToolDescriptor};

/// A remote (or faked) server exposing callable tools.
pub trait ToolServer: Send + Sync {
    /// Configured name of this server, used to attribute tool invocations.
    fn name(&self) -> &str;

    /// List the tools this server exposes.
    fn list_tools(
        &self,
    ) -> impl Future<Output = Result<Vec<ToolDescriptor>, McpError>> + Send;

    /// Invoke a tool and return its textual result.
    fn call_tool(
        &self,
        name: &str,
        arguments: &Value,
    ) -> impl Future<Output = Result<String, McpError>> + Send;
}

/// Object-safe version of [`ToolServer`] with boxed futures.
pub trait ToolServerDyn: Send + Sync {
    fn name(&self) -> &str;

    fn list_tools_boxed<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ToolDescriptor>, McpError>> + Send + 'a>>;

    fn call_tool_boxed<'a>(
        &'a self,
        name: &'a str,
        arguments: &'a Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, McpError>> + Send + 'a>>;
}

impl<T: ToolServer> ToolServerDyn for T {
    fn name(&self) -> &str {
        ToolServer::name(self)
    }

    fn list_tools_boxed<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ToolDescriptor>, McpError>> + Send + 'a>> {
        Box::pin(self.list_tools())
    }

    fn call_tool_boxed<'a>(
        &'a self,
        name: &'a str,
        arguments: &'a Value,
    ) -> Pin<Box<dyn Future<Output = Result<String, McpError>> + Send + 'a>> {
        Box::pin(self.call_tool(name, arguments))
    }
}

/// Type-erased tool server.
pub struct BoxToolServer {
    inner: Box<dyn ToolServerDyn + Send + Sync>,
}

impl BoxToolServer {
    pub fn new<T: ToolServer + 'static>(server: T) -> Self {
        Self {
            inner: Box::new(server),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        self.inner.list_tools_boxed().await
    }

    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<String, McpError> {
        self.inner.call_tool_boxed(name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct SingleTool;

    impl ToolServer for SingleTool {
        fn name(&self) -> &str {
            "single"
        }

        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
            Ok(vec![ToolDescriptor {
                name: "greet".to_string(),
                description: Some("Say hello".to_string()),
                input_schema: None,
            }])
        }

        async fn call_tool(&self, name: &str, arguments: &Value) -> Result<String, McpError> {
            Ok(format!("{name}({arguments})"))
        }
    }

    #[tokio::test]
    async fn test_boxed_server_delegates() {
        let server = BoxToolServer::new(SingleTool);
        assert_eq!(server.name(), "single");

        let tools = server.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "greet");

        let result = server.call_tool("greet", &json!({"to": "you"})).await.unwrap();
        assert_eq!(result, r#"greet({"to":"you"})"#);
    }
}
