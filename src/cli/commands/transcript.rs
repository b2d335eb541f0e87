//! Transcript command implementation.

use crate::cli::output::format_duration;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::{format_transcript, OutputFormat, TranscriptSource, YoutubeTranscripts};
use anyhow::Result;

/// Run the transcript command.
pub async fn run_transcript(
    video: &str,
    output: Option<String>,
    format: &str,
    settings: Settings,
) -> Result<()> {
    let output_format: OutputFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    if let Err(e) = preflight::check(Operation::Transcript, &settings) {
        Output::info("Run 'tubegist doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let source = YoutubeTranscripts::from_settings(&settings);

    let spinner = Output::spinner("Fetching captions...");
    let result = source.fetch(video).await;
    spinner.finish_and_clear();

    let transcript = match result {
        Ok(transcript) => transcript,
        Err(e) => return Err(anyhow::Error::new(e).context("Failed to fetch transcript")),
    };

    let rendered = format_transcript(
        &transcript,
        output_format,
        settings.transcript.marker_interval_seconds,
    );

    match output.as_deref() {
        None | Some("-") => println!("{}", rendered),
        Some(path) => {
            std::fs::write(path, &rendered)?;
            Output::success(&format!(
                "Transcript saved to {} ({} segments, {})",
                path,
                transcript.segments.len(),
                format_duration(transcript.duration_seconds)
            ));
        }
    }

    Ok(())
}
