//! Transcript retrieval and text preparation.
//!
//! Transcripts come from YouTube captions via yt-dlp. They are rendered to plain
//! text with `[MM:SS]` markers so the language model, and the quote tool, can
//! refer back to positions in the video.

mod chunking;
mod format;
mod vtt;
mod youtube;

pub use chunking::TextSplitter;
pub use format::{format_transcript, OutputFormat, SegmentExport, TranscriptExport};
pub use vtt::parse_vtt;
pub use youtube::{extract_video_id, YoutubeTranscripts};

use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A segment of transcribed text with timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Caption text.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text,
        }
    }
}

/// A complete transcript with segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video ID this transcript belongs to.
    pub video_id: String,
    /// Individual transcript segments with timestamps.
    pub segments: Vec<TranscriptSegment>,
    /// Total duration in seconds.
    pub duration_seconds: f64,
}

impl Transcript {
    /// Create a new transcript from segments.
    pub fn new(video_id: String, segments: Vec<TranscriptSegment>) -> Self {
        let duration_seconds = segments.last().map(|s| s.end_seconds).unwrap_or(0.0);

        Self {
            video_id,
            segments,
            duration_seconds,
        }
    }

    /// Render as lines of `[MM:SS] text`, starting a new line once at least
    /// `interval_seconds` have passed since the previous marker.
    pub fn to_marked_text(&self, interval_seconds: u32) -> String {
        let interval = interval_seconds as f64;
        let mut lines: Vec<(f64, Vec<&str>)> = Vec::new();

        for segment in &self.segments {
            match lines.last_mut() {
                Some((start, texts)) if segment.start_seconds - *start < interval => {
                    texts.push(&segment.text);
                }
                _ => lines.push((segment.start_seconds, vec![&segment.text])),
            }
        }

        lines
            .into_iter()
            .map(|(start, texts)| format!("[{}] {}", format_timestamp(start), texts.join(" ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Source of video transcripts.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript for a video ID or URL.
    ///
    /// Fails with `TranscriptUnavailable` when the video has no captions.
    async fn fetch(&self, video: &str) -> Result<Transcript>;
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"^\s*\[((?:\d{1,2}:)?\d{1,2}:\d{2})\]\s*").expect("marker regex is valid")
    })
}

/// Split a `[MM:SS] text` line into its marker and text.
pub fn split_marker(line: &str) -> Option<(&str, &str)> {
    let caps = marker_regex().captures(line)?;
    let whole = caps.get(0)?;
    let marker = caps.get(1)?;
    Some((marker.as_str(), &line[whole.end()..]))
}
