//! Direct tool commands: summary, ideas and quotes.
//!
//! These run the same tools the agent uses, without the reasoning loop.

use super::with_model;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::tools::{Quote, EXTRACT_KEY_IDEAS, EXTRACT_QUOTES, FETCH_TRANSCRIPT, SUMMARIZE};
use anyhow::{Context, Result};
use serde_json::{json, Value};

/// Run the summary command.
pub async fn run_summary(video: &str, model: Option<String>, settings: Settings) -> Result<()> {
    let output = run_on_transcript(video, SUMMARIZE, "Summarizing...", model, settings).await?;
    println!("\n{}\n", output.as_str().unwrap_or_default());
    Ok(())
}

/// Run the ideas command.
pub async fn run_ideas(video: &str, model: Option<String>, settings: Settings) -> Result<()> {
    let output = run_on_transcript(
        video,
        EXTRACT_KEY_IDEAS,
        "Extracting key ideas...",
        model,
        settings,
    )
    .await?;
    let ideas: Vec<String> = serde_json::from_value(output)?;

    Output::header(&format!("Key ideas ({})", ideas.len()));
    for idea in &ideas {
        Output::list_item(idea);
    }
    Ok(())
}

/// Run the quotes command.
pub async fn run_quotes(video: &str, model: Option<String>, settings: Settings) -> Result<()> {
    let output = run_on_transcript(
        video,
        EXTRACT_QUOTES,
        "Extracting quotes...",
        model,
        settings,
    )
    .await?;
    let quotes: Vec<Quote> = serde_json::from_value(output)?;

    Output::header(&format!("Quotes ({})", quotes.len()));
    for quote in &quotes {
        Output::quote(&quote.quote, quote.timestamp.as_deref());
    }
    Ok(())
}

/// Fetch the transcript, then run `tool` on it.
async fn run_on_transcript(
    video: &str,
    tool: &str,
    message: &str,
    model: Option<String>,
    settings: Settings,
) -> Result<Value> {
    if let Err(e) = preflight::check(Operation::Transcript, &settings) {
        Output::info("Run 'tubegist doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(with_model(settings, model))?;

    let spinner = Output::spinner("Fetching captions...");
    let transcript = orchestrator
        .invoke_tool(FETCH_TRANSCRIPT, &json!({ "video_id": video }))
        .await;
    let transcript = match transcript {
        Ok(text) => text,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(anyhow::Error::new(e).context("Failed to fetch transcript"));
        }
    };

    spinner.set_message(message.to_string());
    let result = orchestrator
        .invoke_tool(tool, &json!({ "transcript_text": transcript }))
        .await;
    spinner.finish_and_clear();

    result.with_context(|| format!("{} failed", tool))
}
