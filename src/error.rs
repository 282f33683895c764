//! Error types for Teksting.

use thiserror::Error;

/// Library-level error type for Teksting operations.
#[derive(Error, Debug)]
pub enum TekstingError {
    /// Malformed or empty word timeline. Aborts a synchronization run.
    #[error("Invalid word timeline: {0}")]
    Input(String),

    /// Translation failure for a single request (network, quota, timeout).
    #[error("Translation adapter error: {0}")]
    Adapter(String),

    /// Unsupported or unparsable subtitle format.
    #[error("Subtitle format error: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Teksting operations.
pub type Result<T> = std::result::Result<T, TekstingError>;
