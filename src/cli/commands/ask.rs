//! Ask command implementation.

use super::with_model;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    request: &str,
    video: Option<String>,
    model: Option<String>,
    max_steps: Option<usize>,
    settings: Settings,
) -> Result<()> {
    // Tool failures are recoverable inside the loop, so only warn here
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::warning(&format!("{}", e));
        Output::info("Run 'tubegist doctor' for detailed diagnostics.");
    }

    let orchestrator = Orchestrator::new(with_model(settings, model))?;

    let spinner = Output::spinner("Agent working...");
    let result = orchestrator.ask(request, video.as_deref(), max_steps).await;
    spinner.finish_and_clear();

    let response = match result {
        Ok(response) => response,
        Err(e) => return Err(anyhow::Error::new(e).context("Agent failed")),
    };

    println!("\n{}\n", response.content);

    if !response.tool_calls.is_empty() {
        Output::header(&format!("Tool calls ({})", response.tool_calls.len()));
        for call in &response.tool_calls {
            Output::tool_call(&call.name, &call.arguments, &call.result, call.is_error);
        }
        println!();
    }

    if response.completed {
        Output::info(&format!("Completed in {} step(s)", response.steps));
    } else {
        Output::warning(&format!(
            "Stopped after {} step(s) without a final answer",
            response.steps
        ));
    }

    Ok(())
}
