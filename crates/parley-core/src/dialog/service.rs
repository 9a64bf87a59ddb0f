//! Multi-round dialog orchestrator.
//!
//! Per-request entry point that combines request validation, session
//! lifecycle, compression triggering, prompt assembly, and the backend
//! call. The session is only mutated and persisted after the backend call
//! fully succeeds, so no partial state survives a failure.

use std::sync::Arc;
use std::time::Instant;

use parley_types::api::{DialogRequest, DialogResponse, OutputFormat};
use parley_types::config::OrchestrationDefaults;
use parley_types::dialog::DialogSession;
use parley_types::error::DialogError;
use parley_types::llm::CompletionRequest;

use crate::compress::HistoryCompressor;
use crate::llm::box_backend::BoxChatBackend;
use crate::llm::registry::BackendRegistry;
use crate::session::store::{SessionStore, DEFAULT_SESSION_KEY};

use super::prompt;

/// The multi-round dialog orchestrator.
pub struct DialogService<S: SessionStore> {
    registry: Arc<BackendRegistry>,
    store: S,
    defaults: OrchestrationDefaults,
}

impl<S: SessionStore> DialogService<S> {
    pub fn new(registry: Arc<BackendRegistry>, store: S, defaults: OrchestrationDefaults) -> Self {
        Self {
            registry,
            store,
            defaults,
        }
    }

    /// Process one dialog request.
    #[tracing::instrument(skip(self, request), fields(vendor = %request.vendor))]
    pub async fn process(&self, request: DialogRequest) -> Result<DialogResponse, DialogError> {
        let started = Instant::now();

        let message = request.message.trim();
        if message.is_empty() {
            return Err(DialogError::EmptyMessage);
        }
        let max_rounds = request.max_rounds.unwrap_or(self.defaults.max_rounds);
        if max_rounds < 1 {
            return Err(DialogError::InvalidMaxRounds(max_rounds));
        }
        if request.compression_messages_threshold.is_some()
            && request.compression_tokens_threshold.is_some()
        {
            return Err(DialogError::BothCompressionThresholdsSet);
        }
        let backend = self.registry.resolve(&request.vendor)?;

        let key = request.session_key.as_deref().unwrap_or(DEFAULT_SESSION_KEY);
        let mut session = self.resolve_session(key, &request, max_rounds, backend).await?;

        let (model, max_tokens, disable_search) = match &session {
            Some(s) => (s.model.clone(), s.max_tokens, s.disable_search),
            None => (
                request
                    .model
                    .clone()
                    .unwrap_or_else(|| backend.default_model().to_string()),
                request.max_tokens.unwrap_or(self.defaults.max_tokens),
                request.disable_search.unwrap_or(false),
            ),
        };

        if let Some(s) = session.as_mut() {
            self.maybe_compress(key, s, &request, backend, &model).await?;
        }

        let base_prompt = match &session {
            Some(s) => s.system_prompt.as_deref(),
            None => request.system_prompt.as_deref(),
        };
        let round = session.as_ref().map(|s| prompt::RoundPosition {
            current_round: s.current_round,
            max_rounds: s.max_rounds,
            is_last_round: s.is_last_round(),
        });
        let initial = session
            .as_ref()
            .map(|s| s.initial_user_message.as_str())
            .unwrap_or(message);
        let system_prompt = prompt::compose_system_prompt(
            base_prompt,
            round,
            initial,
            request.output_format,
            request.output_schema.as_deref(),
        );

        let outgoing =
            prompt::build_outgoing_messages(session.as_ref(), system_prompt.as_deref(), message);
        let chars_sent = prompt::chars_sent(&outgoing);

        let completion = CompletionRequest {
            model,
            messages: outgoing,
            max_tokens,
            disable_search,
            temperature: request.temperature,
        };
        let response = backend.send_message(&completion).await?;

        if request.output_format == Some(OutputFormat::Json) {
            match serde_json::from_str::<serde_json::Value>(&response.content) {
                Ok(serde_json::Value::Object(_)) => {}
                _ => {
                    return Err(DialogError::OutputFormatViolation(
                        "backend did not return a JSON object".to_string(),
                    ));
                }
            }
        }

        let (current_round, session_max_rounds, is_complete) = match session.as_mut() {
            Some(s) => {
                s.record_exchange(message, &response.content, response.usage.as_ref());
                self.store.save(key, s).await?;
                (s.current_round, s.max_rounds, s.is_complete)
            }
            None => (1, 1, true),
        };

        tracing::info!(
            round = current_round,
            complete = is_complete,
            chars_sent,
            "dialog round finished"
        );

        Ok(DialogResponse {
            content: response.content,
            model: response.model,
            is_complete,
            current_round,
            max_rounds: session_max_rounds,
            duration_ms: started.elapsed().as_millis() as u64,
            usage: response.usage,
            chars_sent,
        })
    }

    /// Load the session stored under `key`, if any.
    pub async fn session(&self, key: &str) -> Result<Option<DialogSession>, DialogError> {
        Ok(self.store.load(key).await?)
    }

    /// Remove the session stored under `key`.
    pub async fn clear_session(&self, key: &str) -> Result<(), DialogError> {
        Ok(self.store.clear(key).await?)
    }

    /// Reuse or create the session for a multi-round request.
    ///
    /// Single-round requests (`max_rounds == 1`) run sessionless.
    async fn resolve_session(
        &self,
        key: &str,
        request: &DialogRequest,
        max_rounds: u32,
        backend: &BoxChatBackend,
    ) -> Result<Option<DialogSession>, DialogError> {
        if max_rounds <= 1 {
            return Ok(None);
        }
        match self.store.load(key).await? {
            Some(existing) if existing.is_complete => {
                Err(DialogError::DialogCompleted(existing.current_round))
            }
            Some(mut existing) if existing.current_round >= existing.max_rounds => {
                existing.is_complete = true;
                self.store.save(key, &existing).await?;
                Err(DialogError::MaxRoundsExceeded {
                    current: existing.current_round,
                    max: existing.max_rounds,
                })
            }
            Some(existing) => Ok(Some(existing)),
            None => Ok(Some(DialogSession::new(
                request.system_prompt.clone(),
                request
                    .model
                    .clone()
                    .unwrap_or_else(|| backend.default_model().to_string()),
                request.max_tokens.unwrap_or(self.defaults.max_tokens),
                request.disable_search.unwrap_or(false),
                max_rounds,
                request.message.trim().to_string(),
            ))),
        }
    }

    /// Run a compression pass when a configured threshold has tripped.
    ///
    /// Failures are logged and swallowed; the round proceeds uncompressed.
    async fn maybe_compress(
        &self,
        key: &str,
        session: &mut DialogSession,
        request: &DialogRequest,
        backend: &BoxChatBackend,
        model: &str,
    ) -> Result<(), DialogError> {
        if let Some(threshold) = request.compression_messages_threshold {
            if HistoryCompressor::should_compress_by_messages(session, threshold) {
                match HistoryCompressor::compress_by_messages(backend, session, model, threshold)
                    .await
                {
                    Ok(_) => self.store.save(key, session).await?,
                    Err(err) => {
                        tracing::warn!(error = %err, "history compression failed, continuing uncompressed");
                    }
                }
            }
        } else if let Some(threshold) = request.compression_tokens_threshold {
            if HistoryCompressor::should_compress_by_tokens(session, threshold) {
                match HistoryCompressor::compress_by_tokens(backend, session, model, threshold)
                    .await
                {
                    Ok(_) => self.store.save(key, session).await?,
                    Err(err) => {
                        tracing::warn!(error = %err, "history compression failed, continuing uncompressed");
                    }
                }
            }
        }
        Ok(())
    }
}
