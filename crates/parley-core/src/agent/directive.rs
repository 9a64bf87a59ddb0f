//! Parsing of the model's tool-loop replies.
//!
//! The agent loop instructs the model to answer with exactly one JSON
//! object, either `{"tool": name, "args": {...}}` or `{"final": answer}`.
//! Models decorate that object with markdown fences and stray prose, so
//! extraction is a best-effort heuristic: strip fences, take the first `{`
//! through the last `}`, parse. The heuristic is implemented once here as a
//! pure function so its edge cases stay unit-tested.

use serde_json::Value;

/// What the model's reply asks the loop to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelDirective {
    /// Invoke the named tool with the given arguments.
    ToolCall { name: String, args: Value },
    /// Stop and return this text as the final answer.
    FinalAnswer { text: String },
    /// No JSON object could be extracted; the caller treats the raw reply
    /// as the final answer.
    Unparsable,
}

/// Parse one model reply into a directive.
pub fn parse_directive(reply: &str) -> ModelDirective {
    let Some(object) = extract_json_object(reply) else {
        return ModelDirective::Unparsable;
    };

    if let Some(tool) = object.get("tool").and_then(Value::as_str) {
        let args = object.get("args").cloned().unwrap_or(Value::Object(Default::default()));
        return ModelDirective::ToolCall {
            name: tool.to_string(),
            args,
        };
    }

    if let Some(final_value) = object.get("final") {
        let text = match final_value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return ModelDirective::FinalAnswer { text };
    }

    ModelDirective::Unparsable
}

/// Extract the outermost JSON object from free-form model output.
fn extract_json_object(reply: &str) -> Option<Value> {
    let stripped = strip_code_fences(reply);
    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<Value>(&stripped[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Drop markdown code fences, keeping the fenced body.
fn strip_code_fences(reply: &str) -> String {
    reply
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}
