//! OpenAI-compatible client configuration for local and hosted models.

use crate::config::ModelSettings;
use crate::error::{GistError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured endpoint with the configured timeout.
pub fn create_client(settings: &ModelSettings) -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(settings, Duration::from_secs(settings.timeout_secs))
}

/// Create a client with a custom timeout.
pub fn create_client_with_timeout(
    settings: &ModelSettings,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GistError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(settings.endpoint.trim_end_matches('/'))
        .with_api_key(settings.resolved_api_key());

    Ok(Client::with_config(config).with_http_client(http_client))
}
