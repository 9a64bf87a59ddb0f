//! Application state: wires configuration to concrete backends and stores.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use secrecy::SecretString;

use parley_core::agent::{AgentLoop, BoxToolServer};
use parley_core::dialog::DialogService;
use parley_core::llm::{BackendRegistry, BoxChatBackend};
use parley_infra::config::{load_config, resolve_data_dir};
use parley_infra::llm::{AnthropicBackend, OpenAiCompatBackend};
use parley_infra::mcp::McpClient;
use parley_infra::store::FileSessionStore;
use parley_types::config::AppConfig;
use parley_types::llm::ProviderKind;

/// Shared application state, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub dialog: Arc<DialogService<FileSessionStore>>,
    pub agent: Arc<AgentLoop>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Build state from `{data_dir}/config.toml`.
    ///
    /// Providers with a missing API key env var are skipped with a warning
    /// rather than failing startup; an empty registry only errors at
    /// request time (`UNKNOWN_VENDOR`).
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;
        let config = load_config(&data_dir).await;

        let registry = Arc::new(build_registry(&config)?);
        if registry.is_empty() {
            tracing::warn!("no chat backends configured, every request will fail");
        } else {
            tracing::info!(vendors = ?registry.list_names(), "chat backends registered");
        }

        let servers = build_tool_servers(&config)?;
        tracing::info!(count = servers.len(), "tool servers configured");

        let dialog = DialogService::new(
            Arc::clone(&registry),
            FileSessionStore::new(&data_dir),
            config.defaults.clone(),
        );
        let agent = AgentLoop::new(registry, servers, config.defaults.clone());

        Ok(Self {
            dialog: Arc::new(dialog),
            agent: Arc::new(agent),
            data_dir,
        })
    }
}

fn build_registry(config: &AppConfig) -> anyhow::Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    for provider in config.providers.iter().filter(|p| p.enabled) {
        let api_key = match std::env::var(&provider.api_key_env) {
            Ok(key) if !key.trim().is_empty() => SecretString::from(key),
            _ => {
                tracing::warn!(
                    provider = %provider.name,
                    env = %provider.api_key_env,
                    "API key env var unset, skipping provider"
                );
                continue;
            }
        };

        let backend = match provider.kind {
            ProviderKind::Anthropic => {
                let mut client = AnthropicBackend::new(api_key, provider.model.clone())
                    .with_context(|| format!("building provider {}", provider.name))?;
                if let Some(base_url) = &provider.base_url {
                    client = client.with_base_url(base_url.clone());
                }
                BoxChatBackend::new(client)
            }
            ProviderKind::OpenAiCompatible => {
                let base_url = provider
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
                BoxChatBackend::new(
                    OpenAiCompatBackend::new(
                        provider.name.clone(),
                        api_key,
                        base_url,
                        provider.model.clone(),
                    )
                    .with_context(|| format!("building provider {}", provider.name))?,
                )
            }
        };
        registry.register(provider.name.clone(), backend);
    }
    Ok(registry)
}

fn build_tool_servers(config: &AppConfig) -> anyhow::Result<Vec<BoxToolServer>> {
    config
        .tool_servers
        .iter()
        .filter(|s| s.enabled)
        .map(|s| {
            McpClient::new(s.name.clone(), s.url.clone())
                .map(BoxToolServer::new)
                .map_err(|err| anyhow::anyhow!("building tool server {}: {err}", s.name))
        })
        .collect()
}
