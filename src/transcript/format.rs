//! Transcript output formatting (text, JSON, SRT, VTT).

use super::Transcript;
use serde::Serialize;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    /// `[MM:SS] text` lines, as fed to the model.
    Text,
    Json,
    Srt,
    Vtt,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" | "webvtt" => Ok(OutputFormat::Vtt),
            _ => Err(format!("Unknown format: {}. Use text, json, srt, or vtt.", s)),
        }
    }
}

/// JSON-serializable transcript for export.
#[derive(Debug, Serialize)]
pub struct TranscriptExport {
    pub video_id: String,
    pub duration_seconds: f64,
    pub segments: Vec<SegmentExport>,
}

#[derive(Debug, Serialize)]
pub struct SegmentExport {
    pub text: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl From<&Transcript> for TranscriptExport {
    fn from(transcript: &Transcript) -> Self {
        Self {
            video_id: transcript.video_id.clone(),
            duration_seconds: transcript.duration_seconds,
            segments: transcript
                .segments
                .iter()
                .map(|s| SegmentExport {
                    text: s.text.clone(),
                    start_seconds: s.start_seconds,
                    end_seconds: s.end_seconds,
                })
                .collect(),
        }
    }
}

/// Format a transcript for output.
pub fn format_transcript(
    transcript: &Transcript,
    format: OutputFormat,
    marker_interval_seconds: u32,
) -> String {
    match format {
        OutputFormat::Text => transcript.to_marked_text(marker_interval_seconds),
        OutputFormat::Json => format_json(transcript),
        OutputFormat::Srt => format_srt(transcript),
        OutputFormat::Vtt => format_vtt(transcript),
    }
}

fn format_json(transcript: &Transcript) -> String {
    let export = TranscriptExport::from(transcript);
    serde_json::to_string_pretty(&export).unwrap_or_else(|_| "{}".to_string())
}

fn format_srt(transcript: &Transcript) -> String {
    let mut output = String::new();

    for (i, segment) in transcript.segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_clock(segment.start_seconds, ','),
            format_clock(segment.end_seconds, ',')
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

fn format_vtt(transcript: &Transcript) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for segment in &transcript.segments {
        output.push_str(&format!(
            "{} --> {}\n",
            format_clock(segment.start_seconds, '.'),
            format_clock(segment.end_seconds, '.')
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

/// `HH:MM:SS<sep>mmm`
fn format_clock(seconds: f64, millis_separator: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, secs, millis_separator, ms
    )
}
