//! Boundary to the language model.
//!
//! [`ChatModel`] is the raw capability (messages in, text out). [`ModelGateway`] is
//! what the reasoning loop talks to: it turns the conversation into messages and
//! parses the reply into an [`AgentDecision`].

mod openai_chat;

pub use openai_chat::OpenAiChatModel;

use crate::agent::{AgentDecision, Turn, OBSERVATION_MARKER};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Borrowed view of a conversation, ready to send.
#[derive(Debug, Clone, Copy)]
pub struct Prompt<'a> {
    pub preamble: &'a str,
    pub turns: &'a [Turn],
}

/// Chat role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Sequences at which generation stops.
    pub stop: Vec<String>,
}

impl CompletionRequest {
    /// Single user message, no stop sequences.
    pub fn from_user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(content)],
            stop: Vec::new(),
        }
    }
}

/// Raw text generation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Return the model's reply. Fails with `GatewayUnavailable` when the model
    /// cannot be reached.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Next-step decisions for the reasoning loop.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Ask the model for its next decision. Does not mutate the conversation.
    async fn generate(&self, prompt: &Prompt<'_>) -> Result<AgentDecision>;
}

/// Gateway that speaks the textual decision convention over a [`ChatModel`].
pub struct DecisionGateway {
    model: Arc<dyn ChatModel>,
}

impl DecisionGateway {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl ModelGateway for DecisionGateway {
    async fn generate(&self, prompt: &Prompt<'_>) -> Result<AgentDecision> {
        let request = CompletionRequest {
            messages: prompt_messages(prompt),
            stop: vec![OBSERVATION_MARKER.to_string()],
        };

        let reply = self.model.complete(&request).await?;
        debug!("Model reply: {}", reply);

        Ok(AgentDecision::parse(&reply))
    }
}

/// Convert a conversation into chat messages.
///
/// Tool calls are replayed as the assistant's own `Action` text and tool results
/// come back as user `Observation` messages.
pub fn prompt_messages(prompt: &Prompt<'_>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(prompt.turns.len() + 1);
    messages.push(ChatMessage::system(prompt.preamble));

    for turn in prompt.turns {
        let message = match turn {
            Turn::UserMessage { text } => ChatMessage::user(text.as_str()),
            Turn::ToolCall {
                tool_name,
                arguments,
            } => ChatMessage::assistant(
                AgentDecision::Invoke {
                    tool_name: tool_name.clone(),
                    arguments: arguments.clone(),
                }
                .render(),
            ),
            Turn::ToolResult {
                output, is_error, ..
            } => {
                if *is_error {
                    ChatMessage::user(format!("{} Error: {}", OBSERVATION_MARKER, output))
                } else {
                    ChatMessage::user(format!("{} {}", OBSERVATION_MARKER, output))
                }
            }
            Turn::AgentMessage { text, is_final } => {
                if *is_final {
                    ChatMessage::assistant(AgentDecision::Stop(text.clone()).render())
                } else {
                    ChatMessage::assistant(text.as_str())
                }
            }
        };
        messages.push(message);
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Conversation;
    use serde_json::json;
    use std::sync::Mutex;

    /// Model that replays canned replies and records requests.
    struct CannedModel {
        replies: Mutex<Vec<String>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.replies.lock().unwrap().remove(0))
        }
    }

    #[test]
    fn test_prompt_messages_layout() {
        let mut conversation = Conversation::new("You are helpful.", "Summarize abc");
        conversation.record_tool_exchange(
            "fetch_transcript",
            json!({"video_id": "abc"}),
            Err("No captions available for video abc".to_string()),
        );

        let messages = prompt_messages(&conversation.prompt());
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatMessage::system("You are helpful."));
        assert_eq!(messages[1], ChatMessage::user("Summarize abc"));
        assert_eq!(
            messages[2],
            ChatMessage::assistant("Action: fetch_transcript\nAction Input: {\"video_id\":\"abc\"}")
        );
        assert_eq!(
            messages[3],
            ChatMessage::user("Observation: Error: No captions available for video abc")
        );
    }

    #[tokio::test]
    async fn test_decision_gateway_parses_reply() {
        let model = Arc::new(CannedModel {
            replies: Mutex::new(vec![
                "Action: summarize\nAction Input: {\"transcript_text\": \"t\"}".to_string(),
            ]),
            requests: Mutex::new(Vec::new()),
        });
        let gateway = DecisionGateway::new(model.clone());
        let conversation = Conversation::new("system", "task");

        let decision = gateway.generate(&conversation.prompt()).await.unwrap();
        assert_eq!(
            decision,
            AgentDecision::invoke("summarize", json!({"transcript_text": "t"}))
        );

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].stop, vec!["Observation:".to_string()]);
    }
}
