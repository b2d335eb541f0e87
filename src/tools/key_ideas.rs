use super::{required_str, ChunkMapper, EXTRACT_KEY_IDEAS};
use crate::agent::Tool;
use crate::config::Prompts;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Lists the topics of each chunk and merges them.
pub struct KeyIdeasTool {
    chunks: ChunkMapper,
    prompts: Arc<Prompts>,
}

impl KeyIdeasTool {
    pub fn new(chunks: ChunkMapper, prompts: Arc<Prompts>) -> Self {
        Self { chunks, prompts }
    }

    pub async fn extract(&self, text: &str) -> Result<Vec<String>> {
        let template = &self.prompts.tools.key_ideas;
        let replies = self
            .chunks
            .map(text, |chunk| self.prompts.render_one(template, "text", chunk))
            .await?;
        Ok(merge_ideas(&replies))
    }
}

/// Split comma-separated replies into ideas, keeping first-seen order and
/// dropping case-insensitive duplicates.
pub fn merge_ideas(replies: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ideas = Vec::new();

    for reply in replies {
        for raw in reply.split([',', '\n']) {
            let idea = raw
                .trim()
                .trim_start_matches(['-', '*', '•'])
                .trim()
                .trim_end_matches('.')
                .trim();
            if idea.is_empty() {
                continue;
            }
            if seen.insert(idea.to_lowercase()) {
                ideas.push(idea.to_string());
            }
        }
    }

    ideas
}

#[async_trait]
impl Tool for KeyIdeasTool {
    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let text = required_str(arguments, "transcript_text", EXTRACT_KEY_IDEAS)?;
        let ideas = self.extract(text).await?;
        Ok(Value::Array(ideas.into_iter().map(Value::String).collect()))
    }
}
