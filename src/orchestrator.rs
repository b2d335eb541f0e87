//! Wiring for Tubegist.
//!
//! Builds the model client, transcript source, tool registry and agent from
//! settings, and offers direct tool invocation for the CLI.

use crate::agent::{Agent, AgentResponse, ToolRegistry};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::gateway::{ChatModel, DecisionGateway, OpenAiChatModel};
use crate::tools::default_registry;
use crate::transcript::{Transcript, TranscriptSource, YoutubeTranscripts};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

/// Owns the shared components of a run.
pub struct Orchestrator {
    settings: Settings,
    prompts: Arc<Prompts>,
    source: Arc<dyn TranscriptSource>,
    model: Arc<dyn ChatModel>,
    registry: Arc<ToolRegistry>,
}

impl Orchestrator {
    /// Create an orchestrator backed by yt-dlp and the configured model endpoint.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let model = OpenAiChatModel::from_settings(&settings.model)?;
        info!(
            "Using model {} at {}",
            model.model(),
            settings.model.endpoint
        );

        let source = Arc::new(YoutubeTranscripts::from_settings(&settings));

        Self::with_components(settings, prompts, source, Arc::new(model))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        source: Arc<dyn TranscriptSource>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let prompts = Arc::new(prompts);
        let registry = default_registry(source.clone(), model.clone(), &settings, prompts.clone())?;

        Ok(Self {
            settings,
            prompts,
            source,
            model,
            registry: Arc::new(registry),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Build an agent over the shared registry.
    pub fn agent(&self, max_steps: Option<usize>) -> Agent {
        let gateway = Arc::new(DecisionGateway::new(self.model.clone()));
        Agent::new(gateway, self.registry.clone())
            .with_max_steps(max_steps.unwrap_or(self.settings.agent.max_steps))
            .with_prompts(self.prompts.clone())
    }

    /// Answer a request with the agent, optionally about a specific video.
    #[instrument(skip(self, request))]
    pub async fn ask(
        &self,
        request: &str,
        video: Option<&str>,
        max_steps: Option<usize>,
    ) -> Result<AgentResponse> {
        let context = video.map(|v| format!("The request is about the YouTube video: {}", v));
        self.agent(max_steps).run(request, context.as_deref()).await
    }

    /// Fetch a transcript without going through the agent.
    pub async fn fetch_transcript(&self, video: &str) -> Result<Transcript> {
        self.source.fetch(video).await
    }

    /// Validate arguments and invoke a registered tool directly.
    pub async fn invoke_tool(&self, name: &str, arguments: &Value) -> Result<Value> {
        let spec = self.registry.validate(name, arguments)?;
        spec.invoke.invoke(arguments).await
    }
}
