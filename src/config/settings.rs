//! Configuration settings for Tubegist.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub agent: AgentSettings,
    pub transcript: TranscriptSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files (subtitle downloads).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/tubegist".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Language model endpoint settings.
///
/// Any OpenAI-compatible chat endpoint works. The default points at a local
/// Ollama instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Base URL of the OpenAI-compatible API.
    pub endpoint: String,
    /// Model name passed to the endpoint.
    pub name: String,
    /// API key. Local runtimes ignore it; falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request deadline in seconds. Expiry is reported as an unavailable gateway.
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/v1".to_string(),
            name: "llama3".to_string(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: 300,
        }
    }
}

impl ModelSettings {
    /// Resolve the API key from config, then environment, then a placeholder.
    pub fn resolved_api_key(&self) -> String {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()))
            .unwrap_or_else(|| "ollama".to_string())
    }
}

/// Reasoning loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum number of model invocations per request.
    pub max_steps: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self { max_steps: 10 }
    }
}

/// Transcript retrieval and chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Preferred caption language.
    pub language: String,
    /// Approximate characters per chunk sent to the model.
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks.
    pub chunk_overlap: usize,
    /// Minimum spacing in seconds between `[MM:SS]` markers in rendered transcripts.
    pub marker_interval_seconds: u32,
    /// Maximum chunks processed concurrently by the summary tools.
    pub max_concurrent_chunks: usize,
    /// Path or name of the yt-dlp executable.
    pub ytdlp_path: String,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            chunk_size: 1000,
            chunk_overlap: 100,
            marker_interval_seconds: 30,
            max_concurrent_chunks: 1,
            ytdlp_path: "yt-dlp".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject values the agent cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::GistError;

        if self.agent.max_steps == 0 {
            return Err(GistError::Config("agent.max_steps must be at least 1".to_string()));
        }
        if self.transcript.chunk_size == 0 {
            return Err(GistError::Config("transcript.chunk_size must be at least 1".to_string()));
        }
        if self.transcript.chunk_overlap >= self.transcript.chunk_size {
            return Err(GistError::Config(format!(
                "transcript.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.transcript.chunk_overlap, self.transcript.chunk_size
            )));
        }
        url::Url::parse(&self.model.endpoint).map_err(|e| {
            GistError::Config(format!("model.endpoint '{}' is not a URL: {}", self.model.endpoint, e))
        })?;
        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::GistError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubegist")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}
