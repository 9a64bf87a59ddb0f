//! The dialog session entity.
//!
//! A [`DialogSession`] is the persistent state of one bounded multi-round
//! conversation: the accumulated message history, round counters, the
//! parameters fixed at creation, and the running token total that drives
//! token-based history compression.
//!
//! The session is a plain serde value; lifecycle rules (when a session is
//! created, reused, compressed, or rejected) live in parley-core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{Message, MessageRole, TokenUsage};

/// Prefix tagging synthetic system entries that hold compressed history.
pub const COMPRESSED_HISTORY_TAG: &str = "[COMPRESSED_HISTORY]";

/// Persistent state of one bounded multi-round dialog.
///
/// `model`, `max_tokens`, `disable_search`, and `max_rounds` are fixed at
/// creation and reused every round. `messages` interleaves user/assistant
/// turns with optional `[COMPRESSED_HISTORY]`-tagged system entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogSession {
    pub system_prompt: Option<String>,
    pub messages: Vec<Message>,
    pub current_round: u32,
    pub max_rounds: u32,
    pub model: String,
    pub max_tokens: u32,
    pub disable_search: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    /// First user message, restated on the last round to remind the model
    /// of the original goal.
    pub initial_user_message: String,
    pub is_complete: bool,
    /// Running token sum across rounds; drives token-based compression.
    pub accumulated_total_tokens: u64,
}

impl DialogSession {
    /// Create a fresh session at round 0.
    pub fn new(
        system_prompt: Option<String>,
        model: String,
        max_tokens: u32,
        disable_search: bool,
        max_rounds: u32,
        initial_user_message: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            system_prompt,
            messages: Vec::new(),
            current_round: 0,
            max_rounds,
            model,
            max_tokens,
            disable_search,
            created_at: now,
            last_activity_at: now,
            initial_user_message,
            is_complete: false,
            accumulated_total_tokens: 0,
        }
    }

    /// Number of user/assistant messages (summary entries excluded).
    ///
    /// Compressed-history summaries carry the system role, so filtering on
    /// role is sufficient.
    pub fn dialog_message_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .count()
    }

    /// The user/assistant turns in conversation order.
    pub fn conversation_turns(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
    }

    /// The `[COMPRESSED_HISTORY]`-tagged system entries, if any.
    pub fn summary_entries(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| {
            m.role == MessageRole::System && m.content.starts_with(COMPRESSED_HISTORY_TAG)
        })
    }

    /// Whether the round about to be processed is the final one.
    pub fn is_last_round(&self) -> bool {
        self.current_round + 1 >= self.max_rounds
    }

    /// Record one successful user/assistant exchange.
    ///
    /// Appends both turns, advances the round counter, refreshes
    /// `last_activity_at`, accumulates token usage, and recomputes
    /// `is_complete`. Once complete a session stays complete.
    pub fn record_exchange(
        &mut self,
        user_content: impl Into<String>,
        assistant_content: impl Into<String>,
        usage: Option<&TokenUsage>,
    ) {
        self.messages.push(Message::user(user_content));
        self.messages.push(Message::assistant(assistant_content));
        self.current_round += 1;
        self.last_activity_at = Utc::now();
        if let Some(usage) = usage {
            self.accumulated_total_tokens += usage.effective_total();
        }
        if self.current_round >= self.max_rounds {
            self.is_complete = true;
        }
    }

    /// Merge a new summary into the session's compressed-history entry.
    ///
    /// A single tagged system entry is kept at the front of `messages`;
    /// later summaries are appended to it, paragraph-separated.
    pub fn merge_summary(&mut self, summary: &str) {
        if let Some(existing) = self.messages.iter_mut().find(|m| {
            m.role == MessageRole::System && m.content.starts_with(COMPRESSED_HISTORY_TAG)
        }) {
            existing.content.push_str("\n\n");
            existing.content.push_str(summary);
        } else {
            self.messages.insert(
                0,
                Message::system(format!("{COMPRESSED_HISTORY_TAG} {summary}")),
            );
        }
    }

    /// Debit the accumulated token total, saturating at zero.
    pub fn debit_tokens(&mut self, amount: u64) {
        self.accumulated_total_tokens = self.accumulated_total_tokens.saturating_sub(amount);
    }
}
