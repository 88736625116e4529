use std::future::Future;
use std::time::Duration;

use tgt_core::{Error, Result};
use tracing::warn;

/// How many attempts a rate-limited call gets before giving up.
pub const DEFAULT_ATTEMPTS: usize = 3;

/// Wait applied when the provider signals a flood without a duration.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Retries operations that fail with [`Error::FloodWait`].
///
/// Every remote call in the engine goes through [`RateLimitedExecutor::run`].
/// A flood signal sleeps for the server-specified duration (or
/// [`DEFAULT_BACKOFF`]) and retries; any other error propagates immediately.
/// After the attempt budget is spent the call fails with
/// [`Error::RateLimitExceeded`].
#[derive(Clone, Copy, Debug)]
pub struct RateLimitedExecutor {
    attempts: usize,
}

impl Default for RateLimitedExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS)
    }
}

impl RateLimitedExecutor {
    pub fn new(attempts: usize) -> Self {
        Self {
            attempts: attempts.max(1),
        }
    }

    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        for attempt in 1..=self.attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(Error::FloodWait { retry_after }) => {
                    let wait = retry_after.unwrap_or(DEFAULT_BACKOFF);
                    warn!(
                        attempt,
                        of = self.attempts,
                        wait_ms = wait.as_millis() as u64,
                        "rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(other) => return Err(other),
            }
        }
        Err(Error::RateLimitExceeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn flood() -> Error {
        Error::flood_wait(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn succeeds_after_two_floods() {
        let calls = AtomicUsize::new(0);
        let executor = RateLimitedExecutor::default();

        let result = executor
            .run(|| async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(flood())
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempt_budget() {
        let calls = AtomicUsize::new(0);
        let executor = RateLimitedExecutor::default();

        let result: Result<()> = executor
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(flood())
            })
            .await;

        assert!(matches!(result, Err(Error::RateLimitExceeded)));
        assert_eq!(calls.load(Ordering::SeqCst), DEFAULT_ATTEMPTS);
    }

    #[tokio::test]
    async fn other_errors_propagate_without_retry() {
        let calls = AtomicUsize::new(0);
        let executor = RateLimitedExecutor::default();

        let result: Result<()> = executor
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::Transfer("boom".to_string()))
            })
            .await;

        assert!(matches!(result, Err(Error::Transfer(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unspecified_flood_uses_default_backoff() {
        let calls = AtomicUsize::new(0);
        let executor = RateLimitedExecutor::default();

        let start = tokio::time::Instant::now();
        let result: Result<()> = executor
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::flood_wait_unspecified())
            })
            .await;

        assert!(matches!(result, Err(Error::RateLimitExceeded)));
        assert!(start.elapsed() >= DEFAULT_BACKOFF * (DEFAULT_ATTEMPTS as u32));
    }
}
