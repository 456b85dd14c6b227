//! Fixed-backoff retry decisions for driver failures
//!
//! Only transient driver errors are retried, with the same pause before every attempt.

use crate::driver::DriverError;
use std::time::Duration;

/// Decision on whether to repeat a failed driver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Repeat after `delay`; `attempt` is the 1-based number of the next attempt
    Retry { delay: Duration, attempt: u32 },

    /// Give up
    DoNotRetry { reason: String },
}

/// Retry budget with a fixed pause between attempts
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    retries: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy allowing `retries` attempts after the first one
    pub fn new(retries: u32, backoff: Duration) -> Self {
        Self { retries, backoff }
    }

    /// Maximum number of attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Decides whether to retry after `attempt` (1-based) failed with `error`
    pub fn should_retry(&self, error: &DriverError, attempt: u32) -> RetryDecision {
        if !error.is_transient() {
            return RetryDecision::DoNotRetry {
                reason: format!("not retryable: {}", error),
            };
        }

        if attempt >= self.max_attempts() {
            return RetryDecision::DoNotRetry {
                reason: format!("gave up after {} attempt(s): {}", attempt, error),
            };
        }

        RetryDecision::Retry {
            delay: self.backoff,
            attempt: attempt + 1,
        }
    }
}
