use super::{required_str, ChunkMapper, SUMMARIZE};
use crate::agent::Tool;
use crate::config::Prompts;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Map-reduce summary: one summary per chunk, then a combined summary.
pub struct SummarizeTool {
    chunks: ChunkMapper,
    prompts: Arc<Prompts>,
}

impl SummarizeTool {
    pub fn new(chunks: ChunkMapper, prompts: Arc<Prompts>) -> Self {
        Self { chunks, prompts }
    }

    pub async fn summarize(&self, text: &str) -> Result<String> {
        let template = &self.prompts.tools.summarize_chunk;
        let partials = self
            .chunks
            .map(text, |chunk| self.prompts.render_one(template, "text", chunk))
            .await?;

        match partials.len() {
            0 => Ok(String::new()),
            1 => Ok(partials.into_iter().next().unwrap_or_default()),
            n => {
                debug!("Combining {} partial summaries", n);
                let combined = partials.join("\n\n");
                let prompt = self.prompts.render_one(
                    &self.prompts.tools.summarize_combine,
                    "summaries",
                    &combined,
                );
                self.chunks.ask(prompt).await
            }
        }
    }
}

#[async_trait]
impl Tool for SummarizeTool {
    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let text = required_str(arguments, "transcript_text", SUMMARIZE)?;
        Ok(Value::String(self.summarize(text).await?))
    }
}
