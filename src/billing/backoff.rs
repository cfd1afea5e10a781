//! Exponential backoff pacing for charge retries.

use std::time::Duration;

/// A bounded cursor over retry attempts with exponential delays.
///
/// Each call to [`next`](BackoffPolicy::next) sleeps for
/// `base_delay * 2^(attempt - 1)` and then yields the 1-based attempt
/// number. Once `max_attempts` attempts have been handed out,
/// [`has_next`](BackoffPolicy::has_next) turns false — exhaustion is the
/// signal to stop retrying, the policy itself never errors.
///
/// One policy instance belongs to exactly one in-flight retry loop; it is
/// never shared between invoices.
#[derive(Debug)]
pub struct BackoffPolicy {
    max_attempts: u32,
    base_delay: Duration,
    attempt: u32,
}

impl BackoffPolicy {
    /// Create a policy offering `max_attempts` attempts paced from `base_delay`.
    ///
    /// Both arguments must be positive; a zero `max_attempts` would make the
    /// charge loop a no-op and a zero delay would hammer the provider.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        debug_assert!(max_attempts > 0, "max_attempts must be positive");
        debug_assert!(!base_delay.is_zero(), "base_delay must be positive");
        Self {
            max_attempts,
            base_delay,
            attempt: 1,
        }
    }

    /// True while another attempt is available.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.attempt <= self.max_attempts
    }

    /// Sleep for the current attempt's delay, then return its number.
    ///
    /// Attempt numbers are 1-based. Callers must check [`has_next`] first;
    /// calling past exhaustion keeps growing the delay but the charge loop
    /// never does so.
    pub async fn next(&mut self) -> u32 {
        tokio::time::sleep(self.delay_for(self.attempt)).await;
        let attempt = self.attempt;
        self.attempt += 1;
        attempt
    }

    /// Delay applied before the given 1-based attempt.
    ///
    /// Strictly exponential, no jitter, no cap: the bound comes from
    /// `max_attempts` staying single-digit, not from clamping.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.pow(attempt.saturating_sub(1))
    }

    /// The configured attempt limit.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}
