//! Breaker-aware retry loop

use super::backoff::BackoffPolicy;
use crate::breaker::CircuitBreaker;
use crate::classify::classify;
use crate::error::{RelayError, RelayResult};
use std::future::Future;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Retry behavior for provider operations
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay schedule between attempts
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl RetryPolicy {
    /// Set the attempt cap
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the backoff schedule
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Run an operation with retries, re-checking the breaker before each attempt
///
/// Retries happen only when the classified failure recommends them. The
/// wait between attempts honors a server-supplied delay (rate limits)
/// when present, capped by the backoff policy's maximum; otherwise the
/// exponential schedule applies. Cancellation aborts promptly, between
/// attempts and during waits.
pub async fn retry_with_breaker<T, F, Fut>(
    policy: &RetryPolicy,
    breaker: &CircuitBreaker,
    cancel: &CancellationToken,
    mut operation: F,
) -> RelayResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = RelayResult<T>>,
{
    let mut last_error = RelayError::other("no attempts were made");

    for attempt in 0..policy.max_attempts.max(1) {
        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled);
        }
        if !breaker.allow() {
            return Err(RelayError::unavailable(
                breaker.name(),
                "circuit breaker is open",
            ));
        }

        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let classification = classify(&error);
                let attempts_left = attempt + 1 < policy.max_attempts;

                if !classification.retry_recommended || !attempts_left {
                    return Err(error);
                }

                let backoff_delay = policy.backoff.delay_for_attempt(attempt);
                let delay = classification
                    .retry_delay
                    .map(|d| d.min(policy.backoff.max_delay))
                    .unwrap_or(backoff_delay);

                warn!(
                    provider = %breaker.name(),
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrying after transient failure"
                );
                last_error = error;

                tokio::select! {
                    _ = cancel.cancelled() => return Err(RelayError::Cancelled),
                    _ = sleep(delay) => {}
                }
            }
        }
    }

    debug!(provider = %breaker.name(), "retry budget exhausted");
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::{BreakerConfig, CircuitBreaker};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::default().with_backoff(
            BackoffPolicy::default()
                .with_initial_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(5))
                .with_jitter(false),
        )
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let breaker = CircuitBreaker::new("mock");
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result = retry_with_breaker(&fast_policy(), &breaker, &cancel, |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(RelayError::network("mock", "connection reset"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failures_not_retried() {
        let breaker = CircuitBreaker::new("mock");
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result: RelayResult<u32> =
            retry_with_breaker(&fast_policy(), &breaker, &cancel, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RelayError::authentication("mock", "bad key")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_breaker_checked_before_every_attempt() {
        let config = BreakerConfig::default().with_failure_threshold(2);
        let breaker = CircuitBreaker::with_config("mock", config);
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        // Each failed attempt trips the breaker a bit further; once it
        // opens mid-loop, the next attempt must be rejected without
        // running the operation.
        let result: RelayResult<u32> =
            retry_with_breaker(&fast_policy(), &breaker, &cancel, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                breaker.record_qualifying_failure();
                async { Err(RelayError::network("mock", "connection reset")) }
            })
            .await;

        assert!(matches!(result, Err(RelayError::Unavailable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancellation_stops_retrying() {
        let breaker = CircuitBreaker::new("mock");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: RelayResult<u32> =
            retry_with_breaker(&fast_policy(), &breaker, &cancel, |_| async {
                Ok(1)
            })
            .await;

        assert!(matches!(result, Err(RelayError::Cancelled)));
    }
}
