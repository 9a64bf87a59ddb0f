//! Application configuration structs.
//!
//! Deserialized from `{data_dir}/config.toml` by parley-infra. Missing
//! sections fall back to defaults so a bare deployment can start with an
//! empty file.

use serde::{Deserialize, Serialize};

use crate::llm::ProviderKind;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat backend vendors, keyed in the registry by `name`.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    /// Remote MCP tool servers available to the agent loop.
    #[serde(default)]
    pub tool_servers: Vec<ToolServerConfig>,

    #[serde(default)]
    pub defaults: OrchestrationDefaults,
}

/// Configuration for one chat backend vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registry name, used as the request's vendor identifier.
    pub name: String,
    pub kind: ProviderKind,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Override the vendor's default base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Default model when a request does not specify one.
    pub model: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Configuration for one remote MCP tool server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolServerConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Defaults applied when a request omits orchestration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationDefaults {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Iteration budget for the tool-calling agent loop.
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: u32,
}

impl Default for OrchestrationDefaults {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            max_rounds: default_max_rounds(),
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_rounds() -> u32 {
    1
}

fn default_max_tool_iterations() -> u32 {
    5
}
