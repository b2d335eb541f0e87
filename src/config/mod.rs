//! Configuration module for Tubegist.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts, ToolPrompts};
pub use settings::{
    AgentSettings, GeneralSettings, ModelSettings, PromptSettings, Settings, TranscriptSettings,
};
