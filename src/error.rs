//! Error types for Cadence

use thiserror::Error;

/// Errors that can occur while reading input or producing reports.
///
/// The scoring computation itself never fails; these cover the JSON boundary
/// and configuration.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse engine input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid desired frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
