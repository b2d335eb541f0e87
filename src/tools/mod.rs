//! Transcript tools exposed to the agent.
//!
//! - `fetch_transcript`: captions for a video, as `[MM:SS]`-marked text
//! - `summarize`: map-reduce summary of a transcript
//! - `extract_key_ideas`: deduplicated topic list
//! - `extract_quotes`: notable quotes with timestamps when they can be located
//!
//! The last three split the transcript into overlapping chunks and run one model
//! call per chunk.

mod fetch;
mod key_ideas;
mod quotes;
mod summarize;

pub use fetch::FetchTranscriptTool;
pub use key_ideas::{merge_ideas, KeyIdeasTool};
pub use quotes::{locate_timestamp, Quote, QuotesTool};
pub use summarize::SummarizeTool;

use crate::agent::{ToolRegistry, ToolSpec};
use crate::config::{Prompts, Settings};
use crate::error::{GistError, Result};
use crate::gateway::{ChatModel, CompletionRequest};
use crate::transcript::{TextSplitter, TranscriptSource};
use futures::{StreamExt, TryStreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub const FETCH_TRANSCRIPT: &str = "fetch_transcript";
pub const SUMMARIZE: &str = "summarize";
pub const EXTRACT_KEY_IDEAS: &str = "extract_key_ideas";
pub const EXTRACT_QUOTES: &str = "extract_quotes";

/// Build the registry with all four transcript tools.
pub fn default_registry(
    source: Arc<dyn TranscriptSource>,
    model: Arc<dyn ChatModel>,
    settings: &Settings,
    prompts: Arc<Prompts>,
) -> Result<ToolRegistry> {
    let chunks = ChunkMapper::new(
        model,
        TextSplitter::new(settings.transcript.chunk_size, settings.transcript.chunk_overlap),
        settings.transcript.max_concurrent_chunks,
    );

    let mut registry = ToolRegistry::new();

    registry.register(ToolSpec::new(
        FETCH_TRANSCRIPT,
        "Fetch the transcript of a YouTube video. Returns the caption text with [MM:SS] markers.",
        json!({
            "type": "object",
            "properties": {
                "video_id": {
                    "type": "string",
                    "description": "The YouTube video ID or URL"
                }
            },
            "required": ["video_id"]
        }),
        Arc::new(FetchTranscriptTool::new(
            source,
            settings.transcript.marker_interval_seconds,
        )),
    ))?;

    registry.register(ToolSpec::new(
        SUMMARIZE,
        "Generate a detailed summary of a transcript.",
        transcript_schema(),
        Arc::new(SummarizeTool::new(chunks.clone(), prompts.clone())),
    ))?;

    registry.register(ToolSpec::new(
        EXTRACT_KEY_IDEAS,
        "Extract the main topics and key ideas of a transcript, in order of appearance.",
        transcript_schema(),
        Arc::new(KeyIdeasTool::new(chunks.clone(), prompts.clone())),
    ))?;

    registry.register(ToolSpec::new(
        EXTRACT_QUOTES,
        "Extract important quotes from a transcript, with timestamps when available.",
        transcript_schema(),
        Arc::new(QuotesTool::new(chunks, prompts)),
    ))?;

    Ok(registry)
}

fn transcript_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "transcript_text": {
                "type": "string",
                "description": "Transcript text as returned by fetch_transcript"
            }
        },
        "required": ["transcript_text"]
    })
}

/// Read a required string argument.
pub(crate) fn required_str<'a>(arguments: &'a Value, field: &str, tool: &str) -> Result<&'a str> {
    arguments
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| GistError::InvalidArguments {
            tool: tool.to_string(),
            message: format!("missing '{}' argument", field),
        })
}

/// Runs one prompt per transcript chunk, keeping chunk order.
#[derive(Clone)]
pub struct ChunkMapper {
    model: Arc<dyn ChatModel>,
    splitter: TextSplitter,
    max_concurrent: usize,
}

impl ChunkMapper {
    pub fn new(model: Arc<dyn ChatModel>, splitter: TextSplitter, max_concurrent: usize) -> Self {
        Self {
            model,
            splitter,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Ask the model a single question.
    pub async fn ask(&self, prompt: String) -> Result<String> {
        let reply = self
            .model
            .complete(&CompletionRequest::from_user(prompt))
            .await?;
        Ok(reply.trim().to_string())
    }

    /// Split `text` and run `render(chunk)` through the model for every chunk.
    pub async fn map<F>(&self, text: &str, render: F) -> Result<Vec<String>>
    where
        F: Fn(&str) -> String,
    {
        let chunks = self.splitter.split(text);
        debug!("Processing {} chunks", chunks.len());

        futures::stream::iter(chunks.into_iter().map(|chunk| self.ask(render(&chunk))))
            .buffered(self.max_concurrent)
            .try_collect()
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FnModel;
    use super::*;
    use crate::transcript::Transcript;
    use async_trait::async_trait;

    struct NoSource;

    #[async_trait]
    impl TranscriptSource for NoSource {
        async fn fetch(&self, video: &str) -> Result<Transcript> {
            Err(GistError::TranscriptUnavailable(video.to_string()))
        }
    }

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry(
            Arc::new(NoSource),
            Arc::new(FnModel::new(|_: &str| String::new())),
            &Settings::default(),
            Arc::new(Prompts::default()),
        )
        .unwrap();

        let names: Vec<_> = registry.list().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![FETCH_TRANSCRIPT, SUMMARIZE, EXTRACT_KEY_IDEAS, EXTRACT_QUOTES]
        );
        assert!(registry
            .validate(SUMMARIZE, &json!({"video_id": "abc"}))
            .is_err());
    }

    #[tokio::test]
    async fn test_map_keeps_chunk_order() {
        let model = Arc::new(FnModel::new(|prompt: &str| prompt.to_uppercase()));
        let mapper = ChunkMapper::new(model, TextSplitter::new(6, 0), 3);

        let replies = mapper
            .map("one two three four", |chunk| format!("<{}>", chunk))
            .await
            .unwrap();
        assert_eq!(replies, vec!["<ONE>", "<TWO>", "<THREE>", "<FOUR>"]);
    }

    #[test]
    fn test_required_str() {
        let args = json!({"video_id": "abc", "n": 1});
        assert_eq!(required_str(&args, "video_id", "t").unwrap(), "abc");
        assert!(required_str(&args, "n", "t").is_err());
        assert!(required_str(&args, "missing", "t").is_err());
    }
}
