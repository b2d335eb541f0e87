//! Chat model backed by an OpenAI-compatible endpoint (Ollama by default).

use super::{ChatMessage, ChatModel, CompletionRequest, Role};
use crate::config::ModelSettings;
use crate::error::{GistError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, Stop,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Chat completions against a local or hosted OpenAI-compatible server.
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiChatModel {
    /// Create a model client from settings.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.name.clone(),
            temperature: settings.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    #[instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len()))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let messages = request
            .messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(self.temperature);
        if !request.stop.is_empty() {
            args.stop(Stop::StringArray(request.stop.clone()));
        }
        let api_request = args
            .build()
            .map_err(|e| GistError::Config(format!("Invalid chat request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(|e| GistError::GatewayUnavailable(format!("{}: {}", self.model, e)))?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| GistError::GatewayUnavailable("No response from model".to_string()))?;

        debug!("Received {} characters", content.len());
        Ok(content)
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| GistError::Config(e.to_string()))?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| GistError::Config(e.to_string()))?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map_err(|e| GistError::Config(e.to_string()))?
            .into(),
    };
    Ok(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(endpoint: &str) -> ModelSettings {
        ModelSettings {
            endpoint: endpoint.to_string(),
            name: "llama3".to_string(),
            api_key: Some("test-key".to_string()),
            temperature: 0.0,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_complete_happy_path() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("\"model\":\"llama3\""))
            .and(body_string_contains("Observation:"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "created": 1700000000,
                "model": "llama3",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Final Answer: done"},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = OpenAiChatModel::from_settings(&settings_for(&format!("{}/v1", server.uri())))
            .unwrap();
        let request = CompletionRequest {
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            stop: vec!["Observation:".to_string()],
        };

        let reply = model.complete(&request).await.unwrap();
        assert_eq!(reply, "Final Answer: done");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_gateway_unavailable() {
        // Nothing listens on the discard port.
        let model = OpenAiChatModel::from_settings(&settings_for("http://127.0.0.1:9/v1")).unwrap();
        let err = model
            .complete(&CompletionRequest::from_user("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, GistError::GatewayUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_choices_is_gateway_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-2",
                "object": "chat.completion",
                "created": 1700000000,
                "model": "llama3",
                "choices": []
            })))
            .mount(&server)
            .await;

        let model = OpenAiChatModel::from_settings(&settings_for(&server.uri())).unwrap();
        let err = model
            .complete(&CompletionRequest::from_user("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, GistError::GatewayUnavailable(msg) if msg.contains("No response")));
    }
}
