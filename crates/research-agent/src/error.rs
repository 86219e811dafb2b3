//! Error types for research operations

use std::time::Duration;
use thiserror::Error;

/// Research specific errors
///
/// Only [`ResearchError::Validation`] ever leaves
/// [`crate::ResearchAgent::research`]; every other kind is captured per stage
/// and stored as a failure reason inside the returned result.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// Malformed research request
    #[error("Validation error: {0}")]
    Validation(String),

    /// A source answered with something unusable
    #[error("{source_name} request failed: {reason}")]
    Transport { source_name: String, reason: String },

    /// A stage exceeded its time budget
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: String, after: Duration },

    /// Language model call failed
    #[error("Model error: {0}")]
    Model(#[from] research_llm::LLMError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResearchError {
    /// Shorthand for a transport failure
    pub fn transport(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Whether trying again could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } | Self::Network(_) => true,
            Self::Model(e) => matches!(
                e,
                research_llm::LLMError::RateLimitExceeded(_)
                    | research_llm::LLMError::RequestFailed(_)
                    | research_llm::LLMError::HttpError(_)
            ),
            Self::Validation(_) | Self::Config(_) | Self::Json(_) => false,
        }
    }
}

/// Result type alias for research operations
pub type Result<T> = std::result::Result<T, ResearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ResearchError::transport("Tavily", "HTTP 500: down");
        assert_eq!(err.to_string(), "Tavily request failed: HTTP 500: down");

        let err = ResearchError::Timeout {
            stage: "Academic Research".to_string(),
            after: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "Academic Research timed out after 10s");

        let err = ResearchError::Timeout {
            stage: "Web Search".to_string(),
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Web Search timed out after 250ms");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ResearchError::transport("arXiv", "503").is_retryable());
        assert!(
            ResearchError::Timeout {
                stage: "x".to_string(),
                after: Duration::from_secs(1)
            }
            .is_retryable()
        );
        assert!(!ResearchError::Validation("empty".to_string()).is_retryable());
        assert!(!ResearchError::Config("bad".to_string()).is_retryable());
        assert!(
            !ResearchError::Model(research_llm::LLMError::AuthenticationFailed).is_retryable()
        );
        assert!(
            ResearchError::Model(research_llm::LLMError::RateLimitExceeded("slow".to_string()))
                .is_retryable()
        );
    }
}
