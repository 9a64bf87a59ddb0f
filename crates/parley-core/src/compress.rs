//! History compression engine.
//!
//! Keeps a session's prompt size bounded by replacing older user/assistant
//! turns with an LLM-generated summary, stored as a
//! `[COMPRESSED_HISTORY]`-tagged system entry on the session. Two triggers
//! exist: a message-count threshold and an accumulated-token threshold. A
//! request may configure at most one of them.
//!
//! Compression failures are non-fatal; the dialog orchestrator logs and
//! proceeds with the uncompressed history.

use parley_types::dialog::DialogSession;
use parley_types::llm::{
    CompletionRequest, LlmError, Message, MessageRole, TokenUsage,
};

use crate::llm::box_backend::BoxChatBackend;

/// System prompt for the summarization call.
const SUMMARY_SYSTEM_PROMPT: &str = r#"Summarize the following conversation segment concisely. Preserve:
1. Key decisions and conclusions
2. Important facts mentioned
3. The user's current goals and context
4. Any unresolved questions

Keep the summary under 500 words. Write in third person (e.g., "The user asked about..." "The assistant replied...")."#;

/// Output cap for the summarization call.
const SUMMARY_MAX_TOKENS: u32 = 1024;

/// Result of one compression pass.
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    /// User/assistant messages removed from the session.
    pub messages_removed: usize,
    /// Token usage of the summarization call, when reported.
    pub usage: Option<TokenUsage>,
}

/// Stateless history compression engine.
pub struct HistoryCompressor;

impl HistoryCompressor {
    /// True iff the count of user/assistant messages has reached `threshold`.
    pub fn should_compress_by_messages(session: &DialogSession, threshold: u32) -> bool {
        session.dialog_message_count() >= threshold as usize
    }

    /// True iff the session's accumulated token total has reached `threshold`.
    pub fn should_compress_by_tokens(session: &DialogSession, threshold: u64) -> bool {
        session.accumulated_total_tokens >= threshold
    }

    /// Compress the first `threshold` user/assistant messages into a summary.
    ///
    /// The window is extended by one message when the boundary falls on a
    /// user message immediately followed by its assistant reply, so a reply
    /// is never orphaned from its question.
    #[tracing::instrument(skip(backend, session), fields(model = %model, threshold))]
    pub async fn compress_by_messages(
        backend: &BoxChatBackend,
        session: &mut DialogSession,
        model: &str,
        threshold: u32,
    ) -> Result<CompressionOutcome, LlmError> {
        let turns: Vec<&Message> = session.conversation_turns().collect();
        let window = message_window(&turns, threshold as usize);
        Self::compress_window(backend, session, model, window).await
    }

    /// Compress all but the last two messages into a summary.
    ///
    /// Additionally debits the session's token total by the summarization
    /// call's own tokens plus half the threshold, floored at zero, so the
    /// trigger does not fire again on the very next round.
    #[tracing::instrument(skip(backend, session), fields(model = %model, threshold))]
    pub async fn compress_by_tokens(
        backend: &BoxChatBackend,
        session: &mut DialogSession,
        model: &str,
        threshold: u64,
    ) -> Result<CompressionOutcome, LlmError> {
        let window = session.dialog_message_count().saturating_sub(2);
        let outcome = Self::compress_window(backend, session, model, window).await?;

        let summary_tokens = outcome
            .usage
            .as_ref()
            .map(|u| u.effective_total())
            .unwrap_or(0);
        session.debit_tokens(summary_tokens + threshold / 2);

        Ok(outcome)
    }

    /// Summarize the first `window` user/assistant messages and replace them
    /// with a merged `[COMPRESSED_HISTORY]` entry.
    async fn compress_window(
        backend: &BoxChatBackend,
        session: &mut DialogSession,
        model: &str,
        window: usize,
    ) -> Result<CompressionOutcome, LlmError> {
        if window == 0 {
            return Ok(CompressionOutcome {
                messages_removed: 0,
                usage: None,
            });
        }

        let to_summarize: Vec<Message> = session
            .conversation_turns()
            .take(window)
            .cloned()
            .collect();

        let conversation_text: String = to_summarize
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let request = CompletionRequest {
            model: model.to_string(),
            messages: vec![
                Message::system(SUMMARY_SYSTEM_PROMPT),
                Message::user(format!(
                    "Please summarize this conversation:\n\n<conversation>\n{conversation_text}\n</conversation>"
                )),
            ],
            max_tokens: SUMMARY_MAX_TOKENS,
            disable_search: true,
            temperature: Some(0.0),
        };

        let response = backend.send_message(&request).await?;

        remove_leading_turns(session, window);
        session.merge_summary(response.content.trim());

        tracing::info!(
            removed = window,
            remaining = session.dialog_message_count(),
            "compressed dialog history"
        );

        Ok(CompressionOutcome {
            messages_removed: window,
            usage: response.usage,
        })
    }
}

/// Number of leading turns to compress for a message-count threshold.
///
/// Takes the first `threshold` turns, extended by one when the last selected
/// turn is a user message whose assistant reply is the next turn.
fn message_window(turns: &[&Message], threshold: usize) -> usize {
    let mut window = threshold.min(turns.len());
    if window > 0
        && window < turns.len()
        && turns[window - 1].role == MessageRole::User
        && turns[window].role == MessageRole::Assistant
    {
        window += 1;
    }
    window
}

/// Remove the first `n` user/assistant messages, keeping system entries.
fn remove_leading_turns(session: &mut DialogSession, n: usize) {
    let mut remaining = n;
    session.messages.retain(|m| {
        if m.role != MessageRole::System && remaining > 0 {
            remaining -= 1;
            false
        } else {
            true
        }
    });
}
