use super::{required_str, ChunkMapper, EXTRACT_QUOTES};
use crate::agent::Tool;
use crate::config::Prompts;
use crate::error::Result;
use crate::transcript::split_marker;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Words of a quote used to find it in the transcript.
const LOCATE_PREFIX_WORDS: usize = 8;

/// A quote, with the marker of the transcript line where it starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub quote: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Picks the most important quote of each chunk.
pub struct QuotesTool {
    chunks: ChunkMapper,
    prompts: Arc<Prompts>,
}

impl QuotesTool {
    pub fn new(chunks: ChunkMapper, prompts: Arc<Prompts>) -> Self {
        Self { chunks, prompts }
    }

    pub async fn extract(&self, text: &str) -> Result<Vec<Quote>> {
        let template = &self.prompts.tools.quotes;
        let replies = self
            .chunks
            .map(text, |chunk| self.prompts.render_one(template, "text", chunk))
            .await?;

        let mut seen = HashSet::new();
        let mut quotes = Vec::new();
        for reply in replies {
            let quote = clean_quote(&reply);
            let key = normalize(&quote);
            if key.is_empty() || !seen.insert(key) {
                continue;
            }
            let timestamp = locate_timestamp(text, &quote);
            quotes.push(Quote { quote, timestamp });
        }
        Ok(quotes)
    }
}

/// Drop a leading marker and surrounding quote marks from a model reply.
fn clean_quote(reply: &str) -> String {
    let reply = reply.trim();
    let reply = split_marker(reply).map(|(_, rest)| rest).unwrap_or(reply);
    reply
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '“' | '”' | '‘' | '’'))
        .trim()
        .to_string()
}

/// Lowercase words without punctuation, joined by single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find the `[MM:SS]` marker of the transcript line where `quote` begins.
///
/// Matching ignores case and punctuation and may span line breaks. Returns
/// `None` when the quote does not occur in the text.
pub fn locate_timestamp(transcript_text: &str, quote: &str) -> Option<String> {
    let needle = normalize(quote)
        .split(' ')
        .take(LOCATE_PREFIX_WORDS)
        .collect::<Vec<_>>()
        .join(" ");
    if needle.is_empty() {
        return None;
    }

    let mut haystack = String::new();
    let mut starts: Vec<(usize, Option<&str>)> = Vec::new();
    for line in transcript_text.lines() {
        let (marker, text) = match split_marker(line) {
            Some((marker, rest)) => (Some(marker), rest),
            None => (None, line),
        };
        let normalized = normalize(text);
        if normalized.is_empty() {
            continue;
        }
        if !haystack.is_empty() {
            haystack.push(' ');
        }
        starts.push((haystack.len(), marker));
        haystack.push_str(&normalized);
    }

    let position = find_words(&haystack, &needle)?;
    starts
        .iter()
        .rev()
        .find(|(start, _)| *start <= position)
        .and_then(|(_, marker)| marker.map(str::to_string))
}

/// Byte offset of `needle` in `haystack`, matching whole words only.
fn find_words(haystack: &str, needle: &str) -> Option<usize> {
    format!(" {} ", haystack).find(&format!(" {} ", needle))
}

#[async_trait]
impl Tool for QuotesTool {
    async fn invoke(&self, arguments: &Value) -> Result<Value> {
        let text = required_str(arguments, "transcript_text", EXTRACT_QUOTES)?;
        let quotes = self.extract(text).await?;
        Ok(serde_json::to_value(quotes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{mapper, FnModel};
    use serde_json::json;

    const TRANSCRIPT: &str = "[00:00] Welcome back everyone.\n\
[00:31] Memory safety without garbage collection is the whole point.\n\
[01:02] If it compiles, it usually works. That is what people say.";

    #[test]
    fn test_locate_timestamp() {
        assert_eq!(
            locate_timestamp(TRANSCRIPT, "\"Memory safety without garbage collection\""),
            Some("00:31".to_string())
        );
        assert_eq!(
            locate_timestamp(TRANSCRIPT, "if it COMPILES it usually works"),
            Some("01:02".to_string())
        );
        assert_eq!(locate_timestamp(TRANSCRIPT, "never said this"), None);
        assert_eq!(locate_timestamp(TRANSCRIPT, "..."), None);
    }

    #[test]
    fn test_locate_across_lines() {
        assert_eq!(
            locate_timestamp(TRANSCRIPT, "the whole point. If it compiles"),
            Some("00:31".to_string())
        );
    }

    #[test]
    fn test_locate_matches_whole_words() {
        let transcript = "[00:00] Right at the start of the talk.\n[00:30] The art of naming things.";
        assert_eq!(locate_timestamp(transcript, "art of"), Some("00:30".to_string()));
        assert_eq!(locate_timestamp(transcript, "tart"), None);
        assert_eq!(find_words("start of art of", "art of"), Some(9));
        assert_eq!(find_words("ba a a", "a a"), Some(3));
    }

    #[test]
    fn test_clean_quote() {
        assert_eq!(clean_quote("  “It just works.”  "), "It just works.");
        assert_eq!(clean_quote("[01:02] \"If it compiles\""), "If it compiles");
    }

    #[tokio::test]
    async fn test_quotes_are_deduped_and_timestamped() {
        // One chunk per line
        let model = Arc::new(FnModel::new(|prompt: &str| {
            if prompt.contains("Welcome") {
                "\"Memory safety without garbage collection is the whole point.\"".to_string()
            } else if prompt.contains("Memory safety") {
                "memory safety without garbage collection is the whole point".to_string()
            } else {
                "If it compiles, it usually works.".to_string()
            }
        }));
        let tool = QuotesTool::new(mapper(model.clone(), 70), Arc::new(Prompts::default()));

        let output = tool
            .invoke(&json!({ "transcript_text": TRANSCRIPT }))
            .await
            .unwrap();

        assert_eq!(model.prompts().len(), 3);
        assert_eq!(
            output,
            json!([
                {
                    "quote": "Memory safety without garbage collection is the whole point.",
                    "timestamp": "00:31"
                },
                {"quote": "If it compiles, it usually works.", "timestamp": "01:02"}
            ])
        );
    }

    #[tokio::test]
    async fn test_unlocated_quote_has_no_timestamp() {
        let model = Arc::new(FnModel::new(|_: &str| "Something nobody said".to_string()));
        let tool = QuotesTool::new(mapper(model, 1000), Arc::new(Prompts::default()));

        let output = tool
            .invoke(&json!({ "transcript_text": TRANSCRIPT }))
            .await
            .unwrap();
        assert_eq!(output, json!([{"quote": "Something nobody said"}]));
    }
}
