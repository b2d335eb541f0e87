//! Conversation history owned by a single agent run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::gateway::Prompt;

/// One atomic unit of conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Turn {
    UserMessage {
        text: String,
    },
    ToolCall {
        tool_name: String,
        arguments: Value,
    },
    ToolResult {
        tool_name: String,
        output: String,
        is_error: bool,
    },
    AgentMessage {
        text: String,
        is_final: bool,
    },
}

/// Ordered turns plus the system preamble they are sent with.
///
/// A tool call can only be appended together with its result, so every
/// `ToolCall` is immediately followed by the matching `ToolResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    preamble: String,
    turns: Vec<Turn>,
}

impl Conversation {
    /// Start a conversation with the system preamble and the user's request.
    pub fn new(preamble: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            preamble: preamble.into(),
            turns: vec![Turn::UserMessage {
                text: user_text.into(),
            }],
        }
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// View used to build the next model request.
    pub fn prompt(&self) -> Prompt<'_> {
        Prompt {
            preamble: &self.preamble,
            turns: &self.turns,
        }
    }

    /// Append a tool call and its outcome. `Err` carries an error description.
    pub fn record_tool_exchange(
        &mut self,
        tool_name: &str,
        arguments: Value,
        outcome: std::result::Result<String, String>,
    ) {
        let (output, is_error) = match outcome {
            Ok(output) => (output, false),
            Err(message) => (message, true),
        };

        self.turns.push(Turn::ToolCall {
            tool_name: tool_name.to_string(),
            arguments,
        });
        self.turns.push(Turn::ToolResult {
            tool_name: tool_name.to_string(),
            output,
            is_error,
        });
    }

    /// Append an agent message.
    pub fn push_agent_message(&mut self, text: impl Into<String>, is_final: bool) {
        self.turns.push(Turn::AgentMessage {
            text: text.into(),
            is_final,
        });
    }

    /// Text of the final agent message, if the conversation has ended.
    pub fn final_answer(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|turn| match turn {
            Turn::AgentMessage {
                text,
                is_final: true,
            } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Tool results in order, as `(tool_name, output, is_error)`.
    pub fn tool_results(&self) -> impl Iterator<Item = (&str, &str, bool)> {
        self.turns.iter().filter_map(|turn| match turn {
            Turn::ToolResult {
                tool_name,
                output,
                is_error,
            } => Some((tool_name.as_str(), output.as_str(), *is_error)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_is_followed_by_result() {
        let mut conversation = Conversation::new("system", "Summarize abc");
        conversation.record_tool_exchange(
            "fetch_transcript",
            json!({"video_id": "abc"}),
            Err("No captions available for video abc".to_string()),
        );

        let turns = conversation.turns();
        assert_eq!(turns.len(), 3);
        assert!(matches!(&turns[1], Turn::ToolCall { tool_name, .. } if tool_name == "fetch_transcript"));
        assert!(matches!(
            &turns[2],
            Turn::ToolResult { tool_name, is_error: true, .. } if tool_name == "fetch_transcript"
        ));
    }

    #[test]
    fn test_final_answer() {
        let mut conversation = Conversation::new("system", "hi");
        assert_eq!(conversation.final_answer(), None);

        conversation.push_agent_message("thinking", false);
        assert_eq!(conversation.final_answer(), None);

        conversation.push_agent_message("done", true);
        assert_eq!(conversation.final_answer(), Some("done"));
    }

    #[test]
    fn test_turn_serialization_is_tagged() {
        let turn = Turn::UserMessage {
            text: "hello".to_string(),
        };
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value, json!({"kind": "user_message", "text": "hello"}));
    }
}
