//! Tubegist - ask questions about YouTube videos
//!
//! A local-first CLI agent that fetches video transcripts and answers requests
//! with summaries, key ideas and quotes.
//!
//! # Overview
//!
//! Tubegist allows you to:
//! - Fetch YouTube captions as timestamped text
//! - Summarize long transcripts with a map-reduce pass over chunks
//! - Extract key ideas and notable quotes
//! - Ask free-form questions and let an agent pick the tools
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `transcript` - Caption download, parsing and chunking
//! - `gateway` - Language model access and the decision convention
//! - `agent` - Tool registry and the bounded reasoning loop
//! - `tools` - The transcript tools exposed to the agent
//! - `orchestrator` - Component wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use tubegist::config::Settings;
//! use tubegist::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let response = orchestrator
//!         .ask("Summarize this video", Some("dQw4w9WgXcQ"), None)
//!         .await?;
//!     println!("{}", response.content);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod openai;
pub mod orchestrator;
pub mod tools;
pub mod transcript;

pub use error::{GistError, Result};
