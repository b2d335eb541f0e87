use super::{required_str, FETCH_TRANSCRIPT};
use crate::agent::Tool;
use crate::error::Result;
use crate::transcript::TranscriptSource;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Fetches captions and renders them as `[MM:SS]`-marked text.
pub struct FetchTranscriptTool {
    source: Arc<dyn TranscriptSource>,
    marker_interval_seconds: u32,
}

impl FetchTranscriptTool {
    pub fn new(source: Arc<dyn TranscriptSource>, marker_interval_seconds: u32) -> Self {
        Self {
            source,
            marker_interval_seconds,
        }
    }
}

#[async_trait]
impl Tool for FetchTranscriptTool {
    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let video = required_str(arguments, "video_id", FETCH_TRANSCRIPT)?;
        let transcript = self.source.fetch(video).await?;
        info!(
            "Transcript for {}: {} segments, {:.0}s",
            transcript.video_id,
            transcript.segments.len(),
            transcript.duration_seconds
        );
        Ok(Value::String(
            transcript.to_marked_text(self.marker_interval_seconds),
        ))
    }
}
