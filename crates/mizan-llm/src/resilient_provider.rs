//! Resilient LLM provider wrapper: per-attempt timeouts and bounded retries
//!
//! Generation and verse lookups are network-bound; a slow or flaky backend
//! must either succeed within the policy or surface an error, never hang a
//! debate or hand back empty text.

use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::{LlmError, LlmProvider, LlmRequest, LlmResponse};

/// Timeout and retry settings for one class of external call
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
    /// Delay before the first retry; doubles on each further retry
    pub initial_backoff: Duration,
    /// Upper bound for the backoff delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::generation()
    }
}

impl RetryPolicy {
    /// Settings for text generation (long-running completions)
    pub fn generation() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(120),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }

    /// Settings for verse lookups (short JSON requests)
    pub fn lookup() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(30),
            ..Self::generation()
        }
    }

    /// A single attempt, no retries
    pub fn no_retry(attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            attempt_timeout,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `op` under this policy.
    ///
    /// `is_transient` decides whether an error is worth another attempt and
    /// `on_timeout` builds the error reported when an attempt overruns.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        is_transient: impl Fn(&E) -> bool,
        on_timeout: impl Fn(Duration) -> E,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let outcome = match tokio::time::timeout(self.attempt_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(on_timeout(self.attempt_timeout)),
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts && is_transient(&err) => {
                    let delay = self.backoff_for(attempt);
                    tracing::warn!(
                        call = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Resilient LLM provider that wraps any provider with timeouts and retries
#[derive(Debug)]
pub struct ResilientProvider<P: LlmProvider> {
    inner: P,
    policy: RetryPolicy,
    total_requests: AtomicU64,
    total_failures: AtomicU64,
}

impl<P: LlmProvider> ResilientProvider<P> {
    /// Create a resilient wrapper around an LLM provider
    pub fn new(provider: P, policy: RetryPolicy) -> Self {
        Self {
            inner: provider,
            policy,
            total_requests: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
        }
    }

    /// Wrap with the default generation policy
    pub fn wrap(provider: P) -> Self {
        Self::new(provider, RetryPolicy::generation())
    }

    /// The wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// (requests, failed requests) seen so far
    pub fn stats(&self) -> (u64, u64) {
        (
            self.total_requests.load(Ordering::Relaxed),
            self.total_failures.load(Ordering::Relaxed),
        )
    }
}

#[async_trait]
impl<P: LlmProvider + 'static> LlmProvider for ResilientProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn is_available(&self) -> bool {
        self.inner.is_available().await
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        let result = self
            .policy
            .run(
                self.inner.name(),
                LlmError::is_transient,
                |limit| LlmError::Timeout(limit.as_secs()),
                || self.inner.complete(request.clone()),
            )
            .await;

        if result.is_err() {
            self.total_failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            attempt_timeout: Duration::from_secs(5),
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::generation();
        assert_eq!(policy.backoff_for(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(1));
        assert_eq!(policy.backoff_for(3), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(10), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_resilient_provider_passes_through() {
        let resilient = ResilientProvider::new(MockProvider::constant("ok"), fast_policy(3));

        let result = resilient.ask("test").await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(resilient.stats(), (1, 0));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let flaky = MockProvider::constant("recovered").failing_first(2);
        let resilient = ResilientProvider::new(flaky, fast_policy(3));

        let result = resilient.ask("test").await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(resilient.inner().call_count(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let flaky = MockProvider::constant("never").failing_first(5);
        let resilient = ResilientProvider::new(flaky, fast_policy(2));

        let err = resilient.ask("test").await.unwrap_err();
        assert!(matches!(err, LlmError::ConnectionFailed(_)));
        assert_eq!(resilient.inner().call_count(), 2);
        assert_eq!(resilient.stats(), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempt_times_out() {
        let slow = MockProvider::constant("late").with_latency(Duration::from_secs(60));
        let policy = RetryPolicy::no_retry(Duration::from_secs(1));

        let err = ResilientProvider::new(slow, policy).ask("test").await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(1)));
    }
}
