//! CLI module for Tubegist.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Tubegist - ask questions about YouTube videos
///
/// An agent that reads video transcripts and answers with summaries, key ideas
/// and quotes, using a local or hosted OpenAI-compatible model.
#[derive(Parser, Debug)]
#[command(name = "tubegist")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TUBEGIST_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the agent about one or more videos
    Ask {
        /// The request (e.g., "Summarize https://youtu.be/dQw4w9WgXcQ")
        request: String,

        /// Video the request is about (URL or ID)
        #[arg(long)]
        video: Option<String>,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum number of model calls
        #[arg(long)]
        max_steps: Option<usize>,
    },

    /// Print the transcript of a video
    Transcript {
        /// YouTube URL or video ID
        video: String,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (text, json, srt, vtt)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Summarize a video
    Summary {
        /// YouTube URL or video ID
        video: String,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the key ideas of a video
    Ideas {
        /// YouTube URL or video ID
        video: String,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Extract notable quotes from a video
    Quotes {
        /// YouTube URL or video ID
        video: String,

        /// Model to use instead of the configured one
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the tools available to the agent
    Tools,

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
