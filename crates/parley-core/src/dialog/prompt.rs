//! Prompt assembly for the multi-round orchestrator.
//!
//! Pure functions that compose the outgoing system prompt and message list
//! for one dialog round. Keeping these free of I/O lets the round-3
//! last-round behavior and output-format folding be tested directly.

use parley_types::api::OutputFormat;
use parley_types::dialog::DialogSession;
use parley_types::llm::{Message, MessageRole};

/// Round position of the request being built.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RoundPosition {
    pub current_round: u32,
    pub max_rounds: u32,
    pub is_last_round: bool,
}

/// Compose the system prompt for one round.
///
/// Order: base prompt, round instruction (last-round block or one-line
/// counter), output-format instructions. Returns `None` when every part is
/// absent.
pub(crate) fn compose_system_prompt(
    base: Option<&str>,
    round: Option<RoundPosition>,
    initial_user_message: &str,
    output_format: Option<OutputFormat>,
    output_schema: Option<&str>,
) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    if let Some(base) = base {
        if !base.trim().is_empty() {
            parts.push(base.trim().to_string());
        }
    }

    if let Some(round) = round {
        if round.is_last_round {
            parts.push(last_round_block(initial_user_message));
        } else {
            parts.push(format!(
                "This is round {} of {} in an ongoing dialog.",
                round.current_round + 1,
                round.max_rounds
            ));
        }
    }

    if let Some(format) = output_format {
        parts.push(output_format_block(format, output_schema));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

/// Instruction block sent on the final round of a bounded dialog.
fn last_round_block(initial_user_message: &str) -> String {
    format!(
        "This is the FINAL round of this dialog. The user's original request was:\n\n\
         \"{initial_user_message}\"\n\n\
         Produce one complete, self-contained answer using everything gathered \
         in the rounds so far. Do not ask any further questions."
    )
}

/// Output-format instructions folded into the system prompt.
fn output_format_block(format: OutputFormat, schema: Option<&str>) -> String {
    match format {
        OutputFormat::Json => {
            let mut block = String::from(
                "Respond with a single valid JSON object and nothing else. \
                 No markdown fences, no surrounding prose.",
            );
            if let Some(schema) = schema {
                block.push_str("\nThe object must conform to this JSON schema:\n");
                block.push_str(schema);
            }
            block
        }
    }
}

/// Build the full outgoing message list for one round.
///
/// With a session: system prompt, any compressed-history entries, the
/// session's prior user/assistant turns, then the new user message. A
/// leading assistant turn (left orphaned by compression) is dropped so the
/// user/assistant alternation starts with user. Without a session the list
/// is just the system prompt and the new user message.
pub(crate) fn build_outgoing_messages(
    session: Option<&DialogSession>,
    system_prompt: Option<&str>,
    user_message: &str,
) -> Vec<Message> {
    let mut messages = Vec::new();

    if let Some(prompt) = system_prompt {
        messages.push(Message::system(prompt));
    }

    if let Some(session) = session {
        messages.extend(session.summary_entries().cloned());

        let mut turns = session.conversation_turns().peekable();
        if turns
            .peek()
            .is_some_and(|m| m.role == MessageRole::Assistant)
        {
            turns.next();
        }
        messages.extend(turns.cloned());
    }

    messages.push(Message::user(user_message));
    messages
}

/// Total characters sent to the backend across all messages.
pub(crate) fn chars_sent(messages: &[Message]) -> usize {
    messages.iter().map(|m| m.content.chars().count()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::dialog::COMPRESSED_HISTORY_TAG;

    fn session_with_history() -> DialogSession {
        let mut s = DialogSession::new(
            Some("Be helpful.".to_string()),
            "test-model".to_string(),
            512,
            false,
            3,
            "plan my trip".to_string(),
        );
        s.record_exchange("plan my trip", "what city?", None);
        s
    }

    #[test]
    fn test_last_round_prompt_restates_initial_message() {
        let prompt = compose_system_prompt(
            Some("Be helpful."),
            Some(RoundPosition {
                current_round: 2,
                max_rounds: 3,
                is_last_round: true,
            }),
            "plan my trip",
            None,
            None,
        )
        .unwrap();

        assert!(prompt.starts_with("Be helpful."));
        assert!(prompt.contains("FINAL round"));
        assert!(prompt.contains("plan my trip"));
        assert!(prompt.contains("Do not ask any further questions"));
    }

    #[test]
    fn test_intermediate_round_gets_counter_line() {
        let prompt = compose_system_prompt(
            None,
            Some(RoundPosition {
                current_round: 0,
                max_rounds: 3,
                is_last_round: false,
            }),
            "plan my trip",
            None,
            None,
        )
        .unwrap();

        assert_eq!(prompt, "This is round 1 of 3 in an ongoing dialog.");
        assert!(!prompt.contains("plan my trip"));
    }

    #[test]
    fn test_json_format_instructions_with_schema() {
        let prompt = compose_system_prompt(
            Some("Base."),
            None,
            "",
            Some(OutputFormat::Json),
            Some(r#"{"type": "object"}"#),
        )
        .unwrap();

        assert!(prompt.contains("single valid JSON object"));
        assert!(prompt.contains(r#"{"type": "object"}"#));
    }

    #[test]
    fn test_no_parts_yields_none() {
        assert!(compose_system_prompt(None, None, "", None, None).is_none());
        assert!(compose_system_prompt(Some("  "), None, "", None, None).is_none());
    }

    #[test]
    fn test_outgoing_messages_without_session() {
        let messages = build_outgoing_messages(None, Some("sys"), "hello");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].content, "hello");
    }

    #[test]
    fn test_outgoing_messages_include_history_and_summary() {
        let mut s = session_with_history();
        s.merge_summary("earlier turns condensed");

        let messages = build_outgoing_messages(Some(&s), Some("sys"), "Paris");

        assert_eq!(messages[0].content, "sys");
        assert!(messages[1].content.starts_with(COMPRESSED_HISTORY_TAG));
        assert_eq!(messages[2].content, "plan my trip");
        assert_eq!(messages[3].content, "what city?");
        assert_eq!(messages[4].content, "Paris");
    }

    #[test]
    fn test_orphaned_leading_assistant_turn_is_dropped() {
        let mut s = session_with_history();
        // Simulate compression removing the user half of the first exchange.
        s.messages.remove(0);
        assert_eq!(s.conversation_turns().next().unwrap().role, MessageRole::Assistant);

        let messages = build_outgoing_messages(Some(&s), None, "Paris");

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "Paris");
    }

    #[test]
    fn test_chars_sent_counts_all_contents() {
        let messages = vec![Message::system("abc"), Message::user("de")];
        assert_eq!(chars_sent(&messages), 5);
    }
}
