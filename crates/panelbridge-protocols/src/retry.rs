//! Retry policy shared by the selector-only retries inside an extraction
//! and the panel's whole-request retries.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// How many times to try and how long to wait in between.
///
/// `backoff[i]` is the delay before attempt `i + 2`; the last entry repeats
/// when there are more attempts than delays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Vec<Duration>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_millis(max_attempts: u32, backoff_ms: &[u64]) -> Self {
        Self::new(
            max_attempts,
            backoff_ms.iter().copied().map(Duration::from_millis).collect(),
        )
    }

    /// A single attempt, no retries.
    pub fn once() -> Self {
        Self::new(1, Vec::new())
    }

    /// Delay before the retry following the zero-based `failed_attempt`.
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let idx = failed_attempt as usize;
        self.backoff
            .get(idx)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Run `op` until it succeeds, `should_retry` rejects the error, or the
    /// attempts run out. The last error is returned.
    pub async fn run<T, E, F, Fut>(&self, should_retry: impl Fn(&E) -> bool, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 < self.max_attempts && should_retry(&e) => {
                    let delay = self.delay_after(attempt);
                    debug!(attempt = attempt + 1, ?delay, "Attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_repeats_last_entry() {
        let policy = RetryPolicy::from_millis(5, &[100, 200]);
        assert_eq!(policy.delay_after(0), Duration::from_millis(100));
        assert_eq!(policy.delay_after(1), Duration::from_millis(200));
        assert_eq!(policy.delay_after(4), Duration::from_millis(200));
    }

    #[test]
    fn test_empty_backoff_is_zero() {
        assert_eq!(RetryPolicy::new(3, vec![]).delay_after(2), Duration::ZERO);
        assert_eq!(RetryPolicy::new(0, vec![]).max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::from_millis(3, &[10]);
        let result: Result<u32, &str> = policy
            .run(
                |_| true,
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { if attempt < 2 { Err("not yet") } else { Ok(attempt) } }
                },
            )
            .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_fatal_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::from_millis(5, &[10]);
        let result: Result<(), &str> = policy
            .run(
                |e| *e != "fatal",
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("fatal") }
                },
            )
            .await;
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::from_millis(2, &[10]);
        let result: Result<(), &str> = policy
            .run(|_| true, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("again") }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
