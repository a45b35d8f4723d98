//! Retry with exponential backoff.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Backoff configuration for [`with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (not additional retries).
    pub attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
        }
    }
}

/// Calls `op` until it succeeds or the policy is exhausted.
///
/// After the i-th failure (0-based) the helper sleeps
/// `base_delay * 2^i` before trying again; the last error is returned
/// when all attempts fail. There is no jitter, and every error is retried
/// identically - callers that care about fatal-vs-transient inspect the
/// final error themselves.
pub async fn with_retry<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = policy.attempts.max(1);
    let mut failed = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                failed += 1;
                if failed >= attempts {
                    return Err(err);
                }
                sleep(policy.base_delay * 2u32.pow(failed - 1)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn flaky(
        calls: Arc<AtomicU32>,
        succeed_on: u32,
    ) -> impl FnMut() -> std::pin::Pin<Box<dyn Future<Output = Result<u32, String>>>> {
        move || {
            let calls = calls.clone();
            Box::pin(async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt >= succeed_on {
                    Ok(attempt)
                } else {
                    Err(format!("attempt {attempt} failed"))
                }
            })
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = with_retry(RetryPolicy::default(), flaky(calls.clone(), 1)).await;
        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_attempt_k_calls_k_times_with_doubling_delays() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result = with_retry(RetryPolicy::default(), flaky(calls.clone(), 3)).await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second.
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = with_retry(RetryPolicy::default(), flaky(calls.clone(), 10)).await;

        assert_eq!(result, Err("attempt 3 failed".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_attempt_policy_still_runs_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        let result = with_retry(policy, flaky(calls.clone(), 1)).await;

        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
