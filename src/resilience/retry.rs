//! # Retry-Guarded Calls
//!
//! Bounded retry with linear backoff for best-effort upstream calls.
//!
//! Errors are classified first:
//!
//! | Class        | Behavior                                   |
//! |--------------|--------------------------------------------|
//! | `FatalInput` | propagate immediately, no delay            |
//! | `Fatal`      | propagate immediately, no delay            |
//! | `Retryable`  | retry, waiting `attempt * backoff_step`    |
//!
//! When every attempt failed with a retryable error the call resolves to a
//! placeholder value instead of an error.

use crate::config::RetryConfig;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself is malformed; retrying cannot help
    FatalInput,
    /// Transient network-level failure
    Retryable,
    /// Anything else
    Fatal,
}

/// Errors that know how they should be retried
pub trait Classify {
    fn classify(&self) -> ErrorClass;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(5),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_step: config.backoff_step(),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// Run `op` under `policy`
///
/// Returns the first success, propagates the first non-retryable error, and
/// yields `placeholder` once retryable failures exhaust the attempts.
pub async fn call_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    placeholder: T,
    mut op: F,
) -> Result<T, E>
where
    E: Classify + fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let error = match op().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation = operation, attempt = attempt, "✅ Succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        match error.classify() {
            ErrorClass::FatalInput | ErrorClass::Fatal => {
                warn!(
                    operation = operation,
                    attempt = attempt,
                    error = %error,
                    "❌ Non-retryable failure"
                );
                return Err(error);
            }
            ErrorClass::Retryable if attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    operation = operation,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_seconds = delay.as_secs(),
                    error = %error,
                    "Retryable failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            ErrorClass::Retryable => {
                warn!(
                    operation = operation,
                    attempts = max_attempts,
                    error = %error,
                    "⚠️ Retries exhausted, using placeholder"
                );
            }
        }
    }

    Ok(placeholder)
}
