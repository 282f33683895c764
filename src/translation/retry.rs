//! Bounded retries with per-attempt timeouts.

use crate::config::SyncSettings;
use crate::error::TekstingError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on the wait between two attempts.
const MAX_DELAY: Duration = Duration::from_secs(10);

/// How a fallible adapter call is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retry_limit: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Limit for a single attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&SyncSettings::default())
    }
}

impl From<&SyncSettings> for RetryPolicy {
    fn from(settings: &SyncSettings) -> Self {
        Self {
            retry_limit: settings.retry_limit,
            base_delay: Duration::from_millis(settings.retry_base_delay_ms),
            max_delay: MAX_DELAY,
            timeout: Duration::from_secs(settings.translate_timeout_secs),
        }
    }
}

/// Result of running an operation under a [`RetryPolicy`].
#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32 },
    Failed { attempts: u32, last_error: TekstingError },
}

impl<T> RetryOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. } | RetryOutcome::Failed { attempts, .. } => *attempts,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.retry_limit.saturating_add(1)
    }

    /// Wait before retry number `retry` (0-based): base * 2^retry, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.min(16));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// An attempt that outlives `timeout` counts as an adapter failure.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = crate::Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match tokio::time::timeout(self.timeout, op()).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", label, attempt);
                    }
                    return RetryOutcome::Succeeded { value, attempts: attempt };
                }
                Ok(Err(e)) => e,
                Err(_) => TekstingError::Adapter(format!("timed out after {:?}", self.timeout)),
            };

            if attempt >= self.max_attempts() {
                warn!("{} failed after {} attempts: {}", label, attempt, error);
                return RetryOutcome::Failed { attempts: attempt, last_error: error };
            }

            let delay = self.delay_for(attempt - 1);
            warn!(
                "{} attempt {}/{} failed: {}; retrying in {:?}",
                label,
                attempt,
                self.max_attempts(),
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(retry_limit: u32) -> RetryPolicy {
        RetryPolicy {
            retry_limit,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_defaults_from_settings() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(10), MAX_DELAY);
        assert_eq!(policy.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let outcome = fast_policy(2)
            .run("test", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TekstingError::Adapter("flaky".into()))
                } else {
                    Ok("done")
                }
            })
            .await;

        match outcome {
            RetryOutcome::Succeeded { value, attempts } => {
                assert_eq!(value, "done");
                assert_eq!(attempts, 3);
            }
            RetryOutcome::Failed { .. } => panic!("expected success"),
        }
    }

    #[tokio::test]
    async fn test_gives_up_after_limit() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let outcome: RetryOutcome<()> = fast_policy(2)
            .run("test", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TekstingError::Adapter("down".into()))
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(matches!(
            outcome,
            RetryOutcome::Failed { attempts: 3, last_error: TekstingError::Adapter(_) }
        ));
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let outcome: RetryOutcome<()> = fast_policy(0)
            .run("slow", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        match outcome {
            RetryOutcome::Failed { attempts, last_error } => {
                assert_eq!(attempts, 1);
                assert!(last_error.to_string().contains("timed out"));
            }
            RetryOutcome::Succeeded { .. } => panic!("expected timeout"),
        }
    }
}
