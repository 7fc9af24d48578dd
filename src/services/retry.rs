//! Polling with exponential backoff
//!
//! Used while waiting for a freshly launched application to show its windows.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay after the first failed probe
    pub initial_delay: Duration,
    /// Upper bound for a single delay
    pub max_delay: Duration,
    /// Total time budget including probes
    pub timeout: Duration,
    /// Give up after this many probes
    pub max_attempts: Option<u32>,
}

impl BackoffPolicy {
    pub fn new(initial_delay: Duration, max_delay: Duration, timeout: Duration) -> Self {
        Self {
            initial_delay,
            max_delay,
            timeout,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    /// Delay before probe number `attempt + 1`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(1), Duration::from_secs(5))
    }
}

/// Call `probe` until it yields a value, the policy's timeout elapses or
/// its attempt budget runs out. The probe always runs at least once.
pub async fn poll_with_backoff<T, F, Fut>(policy: BackoffPolicy, mut probe: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut attempt = 0;

    loop {
        if let Some(value) = probe().await {
            return Some(value);
        }

        let now = Instant::now();
        let exhausted = policy.max_attempts.is_some_and(|max| attempt + 1 >= max);
        if now >= deadline || exhausted {
            trace!(attempts = attempt + 1, "Polling gave up");
            return None;
        }
        let delay = policy.delay_for(attempt).min(deadline - now);
        trace!(attempt, ?delay, "Polling again after backoff");
        sleep(delay).await;
        attempt += 1;
    }
}
