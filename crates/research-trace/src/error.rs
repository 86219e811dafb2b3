//! Error types for run tracing

use thiserror::Error;

/// Result type for tracing operations
pub type Result<T> = std::result::Result<T, TraceError>;

/// Errors raised by a tracing backend
#[derive(Error, Debug)]
pub enum TraceError {
    /// Tracing is not configured (no API key)
    #[error("Tracing not configured: {0}")]
    NotConfigured(String),

    /// Backend answered with a non-success status
    #[error("Tracing API returned {status}: {body}")]
    Api { status: u16, body: String },

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Update for a run that was never created
    #[error("Unknown run: {0}")]
    UnknownRun(uuid::Uuid),

    /// Backend refused the call
    #[error("Tracer rejected run: {0}")]
    Rejected(String),
}
