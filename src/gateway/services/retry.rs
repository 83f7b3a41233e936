//! Retry policy for provider submissions.

use crate::gateway::ports::ProviderError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded exponential backoff for retryable provider failures.
///
/// `max_attempts` counts the first try, so `1` disables retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total submission attempts.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_backoff_ms: u64,
    /// Factor applied to the delay after each retry.
    pub multiplier: u32,
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            multiplier: 1,
        }
    }

    /// Returns the delay before retry number `retry`, starting at 1.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = u64::from(self.multiplier)
            .checked_pow(retry.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let delay = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }

    /// Returns whether a failure on attempt `attempt` (starting at 1)
    /// should be retried.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32, error: &ProviderError) -> bool {
        attempt < self.max_attempts && error.is_retryable()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 8_000,
            multiplier: 2,
        }
    }
}
