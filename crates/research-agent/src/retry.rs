//! Retry logic with exponential backoff
//!
//! Source calls are attempted `max_attempts` times. Only errors for which
//! [`ResearchError::is_retryable`] holds are tried again.

use crate::config::ResearchConfig;
use crate::error::{ResearchError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Backoff before the first retry
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    /// Policy described by a research configuration
    pub fn from_config(config: &ResearchConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.retry_backoff_base,
            config.request_timeout,
        )
    }

    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Calculate backoff duration before the given retry (1-based)
    fn backoff_duration(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let backoff = self
            .initial_backoff
            .saturating_mul(2_u32.saturating_pow(retry - 1));

        backoff.min(self.max_backoff)
    }

    /// Execute an async operation with retry logic
    ///
    /// Returns the first success, the first non-retryable error, or the last
    /// error once every attempt has failed.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 1;

        loop {
            debug!(
                "Attempt {}/{} for operation: {}",
                attempt, self.max_attempts, operation_name
            );

            let error = match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(
                            "Operation '{}' succeeded after {} retries",
                            operation_name,
                            attempt - 1
                        );
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            if !error.is_retryable() {
                debug!("Operation '{operation_name}' failed with non-retryable error");
                return Err(error);
            }

            if attempt >= self.max_attempts {
                if self.max_attempts > 1 {
                    warn!(
                        "Operation '{}' failed after {} attempts: {}",
                        operation_name, self.max_attempts, error
                    );
                }
                return Err(error);
            }

            let backoff = self.backoff_duration(attempt);
            warn!(
                "Operation '{}' failed (attempt {}/{}): {}. Retrying in {:?}",
                operation_name, attempt, self.max_attempts, error, backoff
            );
            sleep(backoff).await;
            attempt += 1;
        }
    }
}

/// Attach a time budget to a stage
///
/// Elapsed budgets surface as [`ResearchError::Timeout`] naming the stage.
pub async fn with_timeout<T, Fut>(stage: &str, budget: Duration, fut: Fut) -> Result<T>
where
    Fut: std::future::Future<Output = Result<T>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result,
        Err(_) => Err(ResearchError::Timeout {
            stage: stage.to_string(),
            after: budget,
        }),
    }
}
