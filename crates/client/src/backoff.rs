//! Bounded exponential backoff between fetch attempts.

use std::time::Duration;

pub const DEFAULT_STARTING_DELAY: Duration = Duration::from_millis(300);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(5000);
pub const DEFAULT_ATTEMPTS: u32 = 4;
pub const DEFAULT_FACTOR: u32 = 2;

/// Delay schedule for retried fetches.
///
/// The delay after the first failed attempt is `starting_delay`; each later delay is
/// multiplied by `factor` and capped at `max_delay`. At most `attempts` requests are made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub starting_delay: Duration,
    pub max_delay: Duration,
    pub attempts: u32,
    pub factor: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            starting_delay: DEFAULT_STARTING_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            attempts: DEFAULT_ATTEMPTS,
            factor: DEFAULT_FACTOR,
        }
    }
}

impl BackoffPolicy {
    /// Default schedule with a different attempt limit. Zero is treated as one attempt.
    pub fn with_attempts(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
            ..Self::default()
        }
    }

    /// Delay to wait after the given 1-based failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let multiplier = self.factor.saturating_pow(exponent);
        self.starting_delay
            .saturating_mul(multiplier)
            .min(self.max_delay)
    }
}
