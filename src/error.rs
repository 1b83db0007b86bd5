//! Error types for Stroke Flux

use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Stroke {stroke_id} has no points")]
    EmptyStroke { stroke_id: String },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse session payload: {0}")]
    ParseError(String),

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
