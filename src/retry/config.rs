use std::time::Duration;

use crate::constants::{DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS, MAX_RETRY_ATTEMPTS};

/// Bounded exponential backoff schedule shared by every external call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first call. At most [`MAX_RETRY_ATTEMPTS`].
    pub max_attempts: u32,

    pub base_delay: Duration,

    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRY_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
        }
    }

    /// Single attempt, no backoff.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.max_attempts > MAX_RETRY_ATTEMPTS {
            return Err(format!(
                "max_attempts must be at most {MAX_RETRY_ATTEMPTS}, got {}",
                self.max_attempts
            ));
        }
        if self.max_delay < self.base_delay {
            return Err(format!(
                "max_delay ({:?}) must not be below base_delay ({:?})",
                self.max_delay, self.base_delay
            ));
        }
        Ok(())
    }

    /// Wait before retry number `retry` (1-based): `base * 2^(retry-1)`, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Worst-case total sleep across all retries.
    pub fn max_total_wait(&self) -> Duration {
        (1..self.max_attempts)
            .map(|n| self.delay_for(n))
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_attempts = std::env::var("SIFT_RETRY_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.max_attempts);

        let base_delay = std::env::var("SIFT_RETRY_BASE_DELAY_MS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.base_delay);

        let max_delay = std::env::var("SIFT_RETRY_MAX_DELAY_MS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.max_delay);

        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }
}
