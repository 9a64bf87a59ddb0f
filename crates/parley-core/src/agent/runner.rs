//! The tool-calling agent loop.
//!
//! Stateless per request: discover tools across the configured servers,
//! instruct the model to answer in a strict one-JSON-object format, then
//! iterate model call / tool call until the model emits a final answer or
//! the iteration budget runs out. Tool calls are strictly sequential; each
//! iteration depends on the model's previous instruction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parley_types::api::{AgentRequest, AgentResponse};
use parley_types::config::OrchestrationDefaults;
use parley_types::error::AgentError;
use parley_types::llm::{CompletionRequest, Message, TokenUsage};
use parley_types::tool::{ToolDescriptor, ToolInvocation};

use crate::llm::registry::BackendRegistry;

use super::directive::{parse_directive, ModelDirective};
use super::tool_server::BoxToolServer;

/// A tool plus the server that advertises it.
struct DiscoveredTool {
    server_index: usize,
    descriptor: ToolDescriptor,
}

/// The tool-calling orchestrator.
pub struct AgentLoop {
    registry: Arc<BackendRegistry>,
    servers: Vec<BoxToolServer>,
    defaults: OrchestrationDefaults,
}

impl AgentLoop {
    pub fn new(
        registry: Arc<BackendRegistry>,
        servers: Vec<BoxToolServer>,
        defaults: OrchestrationDefaults,
    ) -> Self {
        Self {
            registry,
            servers,
            defaults,
        }
    }

    /// Run one tool-augmented request to completion.
    #[tracing::instrument(skip(self, request), fields(vendor = %request.vendor))]
    pub async fn run(&self, request: AgentRequest) -> Result<AgentResponse, AgentError> {
        let started = Instant::now();

        let user_message = request.message.trim();
        if user_message.is_empty() {
            return Err(AgentError::EmptyMessage);
        }
        let max_iterations = request
            .max_tool_iterations
            .unwrap_or(self.defaults.max_tool_iterations);
        if max_iterations < 1 {
            return Err(AgentError::InvalidMaxIterations(max_iterations));
        }
        let backend = self
            .registry
            .get(&request.vendor)
            .ok_or_else(|| AgentError::UnknownVendor(request.vendor.clone()))?;

        let tools = self.discover_tools().await?;
        let tool_index: HashMap<&str, usize> = tools
            .iter()
            .map(|t| (t.descriptor.name.as_str(), t.server_index))
            .collect();

        let model = request
            .model
            .clone()
            .unwrap_or_else(|| backend.default_model().to_string());
        let max_tokens = request.max_tokens.unwrap_or(self.defaults.max_tokens);

        let mut messages = vec![
            Message::system(self.tool_system_prompt(&tools)),
            Message::user(user_message),
        ];
        let mut invocations: Vec<ToolInvocation> = Vec::new();
        let mut usage: Option<TokenUsage> = None;
        let mut last_reply = String::new();
        let mut resolved_model = model.clone();

        for iteration in 1..=max_iterations {
            let completion = CompletionRequest {
                model: model.clone(),
                messages: messages.clone(),
                max_tokens,
                disable_search: false,
                temperature: request.temperature,
            };
            let response = backend.send_message(&completion).await?;
            resolved_model = response.model.clone();
            if let Some(reported) = &response.usage {
                match usage.as_mut() {
                    Some(total) => total.absorb(reported),
                    None => usage = Some(reported.clone()),
                }
            }
            last_reply = response.content.clone();

            match parse_directive(&response.content) {
                ModelDirective::ToolCall { name, args } => {
                    let Some(&server_index) = tool_index.get(name.as_str()) else {
                        tracing::warn!(tool = %name, "model requested unknown tool");
                        messages.push(Message::assistant(&response.content));
                        messages.push(Message::user(format!(
                            "Error: there is no tool named \"{name}\". Available tools: {}. \
                             Call one of them, or reply with {{\"final\": ...}}.",
                            tool_names(&tools)
                        )));
                        continue;
                    };
                    let server = &self.servers[server_index];

                    tracing::info!(tool = %name, server = %server.name(), iteration, "invoking tool");
                    let turn = match server.call_tool(&name, &args).await {
                        Ok(result) => {
                            invocations.push(ToolInvocation {
                                server: server.name().to_string(),
                                tool: name.clone(),
                                arguments: args,
                                success: true,
                                result: Some(result.clone()),
                                error: None,
                            });
                            format!(
                                "Tool \"{name}\" returned:\n{result}\n\n\
                                 Call another tool if needed, or reply with {{\"final\": ...}}."
                            )
                        }
                        Err(err) => {
                            tracing::warn!(tool = %name, error = %err, "tool invocation failed");
                            invocations.push(ToolInvocation {
                                server: server.name().to_string(),
                                tool: name.clone(),
                                arguments: args,
                                success: false,
                                result: None,
                                error: Some(err.to_string()),
                            });
                            format!(
                                "Tool \"{name}\" failed: {err}\n\n\
                                 Try a different approach, or reply with {{\"final\": ...}}."
                            )
                        }
                    };
                    messages.push(Message::assistant(&response.content));
                    messages.push(Message::user(turn));
                }
                ModelDirective::FinalAnswer { text } => {
                    return Ok(self.finish(
                        text,
                        resolved_model,
                        iteration,
                        invocations,
                        usage,
                        started,
                        false,
                    ));
                }
                ModelDirective::Unparsable => {
                    // No structured directive; the raw reply is the answer.
                    return Ok(self.finish(
                        response.content,
                        resolved_model,
                        iteration,
                        invocations,
                        usage,
                        started,
                        false,
                    ));
                }
            }
        }

        tracing::warn!(max_iterations, "iteration budget exhausted without a final answer");
        Ok(self.finish(
            last_reply,
            resolved_model,
            max_iterations,
            invocations,
            usage,
            started,
            true,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        content: String,
        model: String,
        iterations: u32,
        invocations: Vec<ToolInvocation>,
        usage: Option<TokenUsage>,
        started: Instant,
        degraded: bool,
    ) -> AgentResponse {
        AgentResponse {
            content,
            model,
            total_tool_iterations: iterations,
            tool_invocations: invocations,
            usage,
            duration_ms: started.elapsed().as_millis() as u64,
            degraded,
        }
    }

    /// Query every configured server for its tool list.
    ///
    /// A server that fails to answer is skipped with a warning; the request
    /// only fails when no tools are available at all.
    async fn discover_tools(&self) -> Result<Vec<DiscoveredTool>, AgentError> {
        let mut tools = Vec::new();
        for (server_index, server) in self.servers.iter().enumerate() {
            match server.list_tools().await {
                Ok(descriptors) => {
                    tracing::debug!(server = %server.name(), count = descriptors.len(), "listed tools");
                    tools.extend(descriptors.into_iter().map(|descriptor| DiscoveredTool {
                        server_index,
                        descriptor,
                    }));
                }
                Err(err) => {
                    tracing::warn!(server = %server.name(), error = %err, "tool listing failed");
                }
            }
        }
        if tools.is_empty() {
            return Err(AgentError::NoToolsAvailable);
        }
        Ok(tools)
    }

    /// System prompt enumerating the tools and the strict reply format.
    fn tool_system_prompt(&self, tools: &[DiscoveredTool]) -> String {
        let mut prompt = String::from("You can call external tools. Available tools:\n");
        for tool in tools {
            let server = self.servers[tool.server_index].name();
            prompt.push_str(&format!("\n- {} (server: {server})", tool.descriptor.name));
            if let Some(description) = &tool.descriptor.description {
                prompt.push_str(&format!(": {description}"));
            }
            if let Some(schema) = &tool.descriptor.input_schema {
                prompt.push_str(&format!("\n  Arguments schema: {schema}"));
            }
        }
        prompt.push_str(
            "\n\nReply with exactly ONE JSON object and nothing else:\n\
             - To call a tool: {\"tool\": \"<name>\", \"args\": {...}}\n\
             - To give your final answer: {\"final\": \"<answer>\"}\n\
             No markdown fences, no text outside the JSON object.",
        );
        prompt
    }
}

fn tool_names(tools: &[DiscoveredTool]) -> String {
    tools
        .iter()
        .map(|t| t.descriptor.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use parley_types::llm::{CompletionResponse, LlmError};
    use parley_types::tool::McpError;

    use crate::agent::tool_server::ToolServer;
    use crate::llm::backend::ChatBackend;
    use crate::llm::box_backend::BoxChatBackend;

    #[derive(Default)]
    struct ScriptedState {
        replies: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[derive(Clone, Default)]
    struct Scripted {
        state: Arc<ScriptedState>,
    }

    impl Scripted {
        fn push_reply(&self, content: &str) {
            self.state
                .replies
                .lock()
                .unwrap()
                .push_back(content.to_string());
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.state.requests.lock().unwrap().clone()
        }
    }

    impl ChatBackend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn default_model(&self) -> &str {
            "scripted-model"
        }

        async fn send_message(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.state.requests.lock().unwrap().push(request.clone());
            let content = self
                .state
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| r#"{"tool": "echo", "args": {}}"#.to_string());
            Ok(CompletionResponse {
                content,
                model: "scripted-model".to_string(),
                usage: Some(TokenUsage {
                    total_tokens: Some(7),
                    ..Default::default()
                }),
            })
        }
    }

    struct EchoServer;

    impl ToolServer for EchoServer {
        fn name(&self) -> &str {
            "local"
        }

        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
            Ok(vec![ToolDescriptor {
                name: "echo".to_string(),
                description: Some("Echoes its arguments".to_string()),
                input_schema: Some(json!({"type": "object"})),
            }])
        }

        async fn call_tool(&self, _name: &str, arguments: &Value) -> Result<String, McpError> {
            Ok(format!("echoed {arguments}"))
        }
    }

    struct DeadServer;

    impl ToolServer for DeadServer {
        fn name(&self) -> &str {
            "dead"
        }

        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
            Err(McpError::Transport("connection refused".to_string()))
        }

        async fn call_tool(&self, _name: &str, _arguments: &Value) -> Result<String, McpError> {
            unreachable!("dead server never lists tools")
        }
    }

    fn agent(backend: Scripted, servers: Vec<BoxToolServer>) -> AgentLoop {
        let mut registry = BackendRegistry::new();
        registry.register("scripted", BoxChatBackend::new(backend));
        AgentLoop::new(
            Arc::new(registry),
            servers,
            OrchestrationDefaults::default(),
        )
    }

    #[tokio::test]
    async fn test_tool_then_final() {
        let backend = Scripted::default();
        backend.push_reply(r#"{"tool": "echo", "args": {"x": "1"}}"#);
        backend.push_reply(r#"{"final": "done"}"#);
        let agent = agent(backend.clone(), vec![BoxToolServer::new(EchoServer)]);

        let resp = agent.run(AgentRequest::new("do it", "scripted")).await.unwrap();

        assert_eq!(resp.content, "done");
        assert_eq!(resp.total_tool_iterations, 2);
        assert!(!resp.degraded);
        assert_eq!(resp.tool_invocations.len(), 1);
        let invocation = &resp.tool_invocations[0];
        assert_eq!(invocation.tool, "echo");
        assert_eq!(invocation.server, "local");
        assert!(invocation.success);
        assert_eq!(invocation.result.as_deref(), Some(r#"echoed {"x":"1"}"#));

        // Tokens summed across both iterations.
        assert_eq!(resp.usage.unwrap().total_tokens, Some(14));

        // The tool result was fed back as a user turn.
        let second = &backend.requests()[1];
        let last_turn = second.messages.last().unwrap();
        assert!(last_turn.content.contains("echoed"));
    }

    #[tokio::test]
    async fn test_budget_exhaustion_returns_degraded_result() {
        let backend = Scripted::default();
        // Default reply always requests a tool.
        let agent = agent(backend.clone(), vec![BoxToolServer::new(EchoServer)]);

        let mut req = AgentRequest::new("loop forever", "scripted");
        req.max_tool_iterations = Some(1);
        let resp = agent.run(req).await.unwrap();

        assert!(resp.degraded);
        assert_eq!(resp.total_tool_iterations, 1);
        assert_eq!(resp.content, r#"{"tool": "echo", "args": {}}"#);
        assert_eq!(resp.tool_invocations.len(), 1);
    }

    #[tokio::test]
    async fn test_no_tools_available_fails_before_backend() {
        let backend = Scripted::default();
        let agent = agent(backend.clone(), vec![BoxToolServer::new(DeadServer)]);

        let err = agent
            .run(AgentRequest::new("anything", "scripted"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "NO_TOOLS_AVAILABLE");
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_partial_server_failure_still_runs() {
        let backend = Scripted::default();
        backend.push_reply(r#"{"final": "ok"}"#);
        let agent = agent(
            backend,
            vec![BoxToolServer::new(DeadServer), BoxToolServer::new(EchoServer)],
        );

        let resp = agent.run(AgentRequest::new("go", "scripted")).await.unwrap();
        assert_eq!(resp.content, "ok");
    }

    #[tokio::test]
    async fn test_unknown_tool_gets_error_turn_and_continues() {
        let backend = Scripted::default();
        backend.push_reply(r#"{"tool": "nope", "args": {}}"#);
        backend.push_reply(r#"{"final": "recovered"}"#);
        let agent = agent(backend.clone(), vec![BoxToolServer::new(EchoServer)]);

        let resp = agent.run(AgentRequest::new("go", "scripted")).await.unwrap();

        assert_eq!(resp.content, "recovered");
        assert!(resp.tool_invocations.is_empty());
        let second = &backend.requests()[1];
        assert!(second.messages.last().unwrap().content.contains("no tool named"));
    }

    #[tokio::test]
    async fn test_unparsable_reply_is_final_answer() {
        let backend = Scripted::default();
        backend.push_reply("Just plain prose, no JSON.");
        let agent = agent(backend, vec![BoxToolServer::new(EchoServer)]);

        let resp = agent.run(AgentRequest::new("go", "scripted")).await.unwrap();

        assert_eq!(resp.content, "Just plain prose, no JSON.");
        assert_eq!(resp.total_tool_iterations, 1);
        assert!(!resp.degraded);
    }

    #[tokio::test]
    async fn test_system_prompt_enumerates_tools() {
        let backend = Scripted::default();
        backend.push_reply(r#"{"final": "ok"}"#);
        let agent = agent(backend.clone(), vec![BoxToolServer::new(EchoServer)]);

        agent.run(AgentRequest::new("go", "scripted")).await.unwrap();

        let system = &backend.requests()[0].messages[0];
        assert!(system.content.contains("echo"));
        assert!(system.content.contains("Echoes its arguments"));
        assert!(system.content.contains(r#"{"tool": "<name>", "args": {...}}"#));
    }

    #[tokio::test]
    async fn test_zero_iteration_budget_rejected() {
        let backend = Scripted::default();
        let agent = agent(backend.clone(), vec![BoxToolServer::new(EchoServer)]);

        let mut req = AgentRequest::new("go", "scripted");
        req.max_tool_iterations = Some(0);
        let err = agent.run(req).await.unwrap_err();

        assert_eq!(err.code(), "INVALID_MAX_ITERATIONS");
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let backend = Scripted::default();
        let agent = agent(backend, vec![BoxToolServer::new(EchoServer)]);
        let err = agent.run(AgentRequest::new("  ", "scripted")).await.unwrap_err();
        assert_eq!(err.code(), "EMPTY_MESSAGE");
    }
}
