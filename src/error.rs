//! Error types for Tubegist.

use thiserror::Error;

/// Library-level error type for Tubegist operations.
#[derive(Error, Debug)]
pub enum GistError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Model gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("No captions available for video {0}")]
    TranscriptUnavailable(String),

    #[error("Media source error: {0}")]
    VideoSource(String),

    #[error("Media not found: {0}")]
    VideoNotFound(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Tubegist operations.
pub type Result<T> = std::result::Result<T, GistError>;
