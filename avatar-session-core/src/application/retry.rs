use std::time::Duration;

/// Exponential backoff with jitter, capped at `max_delay`.
///
/// Attempts are numbered from 1; attempt `n` waits
/// `min(2^n / 4 + jitter, max_delay)` seconds before retrying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, max_delay: Duration) -> Self {
        Self {
            max_retries,
            max_delay,
        }
    }

    /// Transport-level retries for REST calls
    pub fn http() -> Self {
        Self::new(3, Duration::from_secs(4))
    }

    /// Status polling while knowledge documents are processed
    pub fn polling() -> Self {
        Self::new(5, Duration::from_secs(10))
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    /// Backoff before retry `attempt`; `jitter` is clamped to `[0, 1)`
    pub fn delay(&self, attempt: u32, jitter: f64) -> Duration {
        let jitter = jitter.clamp(0.0, 0.999);
        let base = 2f64.powi(attempt.min(30) as i32) / 4.0;
        let secs = (base + jitter).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::http()
    }
}
