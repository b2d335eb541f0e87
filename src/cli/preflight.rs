//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{GistError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching transcripts requires yt-dlp.
    Transcript,
    /// Agent runs need a valid model endpoint, and yt-dlp for the transcript tool.
    Ask,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Transcript => {
            check_tool(&settings.transcript.ytdlp_path)?;
        }
        Operation::Ask => {
            check_endpoint(&settings.model.endpoint)?;
            check_tool(&settings.transcript.ytdlp_path)?;
        }
    }
    Ok(())
}

/// Check that the model endpoint is a usable URL.
fn check_endpoint(endpoint: &str) -> Result<()> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| GistError::Config(format!("Invalid model endpoint '{}': {}", endpoint, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(GistError::Config(format!(
            "Model endpoint must use http or https, not '{}'",
            other
        ))),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(GistError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(GistError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(GistError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
