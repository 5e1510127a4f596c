//! Error types for devpulse

use thiserror::Error;

/// Errors that can occur at the parse and encode boundaries.
///
/// The segmentation and aggregation functions themselves are total and never
/// return these.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
