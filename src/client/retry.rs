//! Exponential backoff schedule for the customer source.
//!
//! The delay before retry `n` (1-based) is `initial_delay * 2^(n-1)`,
//! optionally capped at `max_delay`. With the defaults (10 retries, 1s
//! initial delay, no cap) the worst case waits 1+2+...+512 = 1023s in total.

use std::time::Duration;

/// Retries after the initial attempt
pub const DEFAULT_MAX_RETRIES: usize = 10;

/// Delay before the first retry
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Retry policy configuration for exponential backoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries, not counting the initial attempt
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Optional ceiling on a single delay
    pub max_delay: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::backoff(DEFAULT_MAX_RETRIES, DEFAULT_INITIAL_DELAY)
    }
}

impl RetryPolicy {
    /// Doubling backoff with no cap
    pub fn backoff(max_retries: usize, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            max_delay: None,
        }
    }

    /// A single attempt, no retries
    pub fn none() -> Self {
        Self::backoff(0, Duration::ZERO)
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Whether another attempt is allowed after `failures` failed attempts
    pub fn should_retry(&self, failures: usize) -> bool {
        failures <= self.max_retries
    }

    /// Delay before retry number `retry` (1-based); zero for `retry == 0`
    pub fn delay_for_retry(&self, retry: usize) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let exponent = (retry - 1).min(31) as u32;
        let delay = self.initial_delay.saturating_mul(1u32 << exponent);

        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Sum of all delays when every retry is used
    pub fn total_backoff(&self) -> Duration {
        (1..=self.max_retries)
            .map(|retry| self.delay_for_retry(retry))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}
