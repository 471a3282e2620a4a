//! Bounded retry with exponential backoff.

use std::time::Duration;

use rand::Rng;

/// Retry policy mapping an attempt number to a delay.
///
/// The delay is `base * 2^(attempt + 1)` plus 1–2 s of jitter, so repeated
/// pollers don't fall into lockstep against the same endpoint.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    max_attempts: u32,
    base: Duration,
}

impl Backoff {
    pub fn new(max_attempts: u32, base: Duration) -> Self {
        Self { max_attempts, base }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retrying after the given zero-based attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential = self.base * 2u32.saturating_pow(attempt + 1);
        let jitter = rand::thread_rng().gen_range(1.0..2.0);
        exponential + Duration::from_secs_f64(jitter)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(4, Duration::from_secs(1))
    }
}
