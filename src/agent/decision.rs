//! Textual convention between the reasoning loop and the language model.
//!
//! A reply that asks for a tool looks like:
//!
//! ```text
//! Action: fetch_transcript
//! Action Input: {"video_id": "dQw4w9WgXcQ"}
//! ```
//!
//! A reply that ends the request looks like:
//!
//! ```text
//! Final Answer: The video explains ...
//! ```
//!
//! Markers are matched at the start of a line, ignoring leading whitespace, and the
//! earliest marker in the reply wins. Free text containing neither marker is a final
//! answer. `Action Input` extends to the end of the reply or to a line starting with
//! `Observation:`, which models sometimes hallucinate. A missing input means `{}`;
//! input that is not JSON is kept as a JSON string so schema validation rejects it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker introducing a tool name.
pub const ACTION_MARKER: &str = "Action:";
/// Marker introducing tool arguments.
pub const ACTION_INPUT_MARKER: &str = "Action Input:";
/// Marker introducing the final answer.
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";
/// Marker prefixing tool results fed back to the model.
pub const OBSERVATION_MARKER: &str = "Observation:";

/// What the model wants to do next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum AgentDecision {
    /// End the request with this answer.
    Stop(String),
    /// Call a registered tool.
    Invoke { tool_name: String, arguments: Value },
}

impl AgentDecision {
    /// Shorthand for an invoke decision.
    pub fn invoke(tool_name: &str, arguments: Value) -> Self {
        AgentDecision::Invoke {
            tool_name: tool_name.to_string(),
            arguments,
        }
    }

    /// Render the decision in the canonical textual form.
    pub fn render(&self) -> String {
        match self {
            AgentDecision::Stop(text) => format!("{} {}", FINAL_ANSWER_MARKER, text),
            AgentDecision::Invoke {
                tool_name,
                arguments,
            } => format!(
                "{} {}\n{} {}",
                ACTION_MARKER, tool_name, ACTION_INPUT_MARKER, arguments
            ),
        }
    }

    /// Parse a model reply. Never fails: unrecognised text is a final answer.
    pub fn parse(reply: &str) -> Self {
        let reply = reply.replace("\r\n", "\n");
        let lines: Vec<&str> = reply.lines().collect();

        for (index, line) in lines.iter().enumerate() {
            let trimmed = line.trim_start();

            if let Some(rest) = trimmed.strip_prefix(FINAL_ANSWER_MARKER) {
                let mut answer = rest.trim_start().to_string();
                for following in &lines[index + 1..] {
                    answer.push('\n');
                    answer.push_str(following);
                }
                return AgentDecision::Stop(answer.trim().to_string());
            }

            if let Some(rest) = trimmed.strip_prefix(ACTION_MARKER) {
                let tool_name = rest.trim().trim_matches('`').trim().to_string();
                let arguments = parse_action_input(&lines[index + 1..]);
                return AgentDecision::Invoke {
                    tool_name,
                    arguments,
                };
            }
        }

        AgentDecision::Stop(reply.trim().to_string())
    }
}

impl std::fmt::Display for AgentDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Collect and decode the `Action Input` block following an `Action` line.
fn parse_action_input(lines: &[&str]) -> Value {
    let Some(start) = lines
        .iter()
        .position(|l| l.trim_start().starts_with(ACTION_INPUT_MARKER))
    else {
        return Value::Object(Default::default());
    };

    let first = lines[start]
        .trim_start()
        .trim_start_matches(ACTION_INPUT_MARKER);
    let mut raw = first.to_string();
    for line in &lines[start + 1..] {
        if line.trim_start().starts_with(OBSERVATION_MARKER) {
            break;
        }
        raw.push('\n');
        raw.push_str(line);
    }

    let raw = strip_code_fence(raw.trim());
    if raw.is_empty() {
        return Value::Object(Default::default());
    }

    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Remove a surrounding ```json fence if the model added one.
fn strip_code_fence(raw: &str) -> &str {
    let Some(inner) = raw.strip_prefix("```") else {
        return raw;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim()
}
