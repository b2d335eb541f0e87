//! CLI command implementations.

mod analyze;
mod ask;
mod config;
mod doctor;
mod tools;
mod transcript;

pub use analyze::{run_ideas, run_quotes, run_summary};
pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use tools::run_tools;
pub use transcript::run_transcript;

use crate::config::Settings;

/// Apply a `--model` override to the loaded settings.
pub(crate) fn with_model(mut settings: Settings, model: Option<String>) -> Settings {
    if let Some(model) = model {
        settings.model.name = model;
    }
    settings
}
