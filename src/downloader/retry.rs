//! Backoff decisions between transfer attempts.

use std::time::Duration;

/// Longest backoff, in units.
pub const MAX_BACKOFF_UNITS: u64 = 30;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then try again.
    RetryAfter(Duration),
    /// Give up; the task ends in error.
    Exhausted,
}

/// Exponential backoff capped at [`MAX_BACKOFF_UNITS`].
///
/// The cause of a failure is deliberately not an input: every failed attempt
/// is retried until the budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Length of one backoff unit.
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    /// Decides what follows failed attempt number `attempt`.
    ///
    /// `attempt` counts retries starting at 1; the initial attempt is 0 and
    /// is never delayed. Retrying continues while `attempt <= max_retries`.
    pub fn decide(&self, attempt: u32, max_retries: u32) -> RetryDecision {
        if attempt > max_retries {
            return RetryDecision::Exhausted;
        }
        RetryDecision::RetryAfter(self.backoff(attempt))
    }

    /// `min(2^attempt, 30)` units.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let units = 2u64
            .checked_pow(attempt)
            .map_or(MAX_BACKOFF_UNITS, |units| units.min(MAX_BACKOFF_UNITS));
        self.unit.saturating_mul(units as u32)
    }
}
