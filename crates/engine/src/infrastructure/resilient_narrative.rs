//! Resilient narrative client wrapper.
//!
//! Wraps any NarrativePort implementation with a bounded timeout and a
//! single retry for transient failures. A turn waits on at most two provider
//! attempts before it is rejected.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::ports::{
    NarrativeOutcome, NarrativePort, NarrativeRequest, ProviderError,
};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries, just the initial attempt).
    pub max_retries: u32,
    /// Delay in milliseconds before the retry.
    pub retry_delay_ms: u64,
    /// Jitter factor (0.0-1.0) for randomizing the delay.
    pub jitter_factor: f64,
    /// Overall per-attempt timeout in milliseconds.
    pub attempt_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            retry_delay_ms: 1000,
            jitter_factor: 0.2,
            attempt_timeout_ms: 60_000,
        }
    }
}

/// Wrapper that adds timeout and retry to any narrative client.
pub struct ResilientNarrativeClient {
    inner: Arc<dyn NarrativePort>,
    config: RetryConfig,
}

impl ResilientNarrativeClient {
    pub fn new(inner: Arc<dyn NarrativePort>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    fn retry_delay(&self) -> u64 {
        let base = self.config.retry_delay_ms;
        let jitter_range = (base as f64 * self.config.jitter_factor) as i64;
        if jitter_range > 0 {
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (base as i64 + jitter).max(0) as u64
        } else {
            base
        }
    }

    /// Determine if an error is worth a retry.
    fn is_retryable(error: &ProviderError) -> bool {
        match error {
            ProviderError::Timeout(_) => true,
            ProviderError::RequestFailed(msg) => {
                // Don't retry on auth errors or bad requests
                !msg.contains("401") && !msg.contains("403") && !msg.contains("400")
            }
            // A malformed payload may be a transient generation glitch.
            ProviderError::InvalidResponse(_) => true,
        }
    }

    async fn attempt(&self, request: NarrativeRequest) -> Result<NarrativeOutcome, ProviderError> {
        let timeout = Duration::from_millis(self.config.attempt_timeout_ms);
        match tokio::time::timeout(timeout, self.inner.next_scene(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.config.attempt_timeout_ms)),
        }
    }
}

#[async_trait]
impl NarrativePort for ResilientNarrativeClient {
    async fn next_scene(
        &self,
        request: NarrativeRequest,
    ) -> Result<NarrativeOutcome, ProviderError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.attempt(request.clone()).await {
                Ok(outcome) => {
                    if attempt > 0 {
                        tracing::info!(
                            attempt = attempt + 1,
                            "Provider request succeeded after retry"
                        );
                    }
                    return Ok(outcome);
                }
                Err(e) => {
                    let retryable = Self::is_retryable(&e);

                    if attempt < self.config.max_retries && retryable {
                        let delay = self.retry_delay();
                        tracing::warn!(
                            attempt = attempt + 1,
                            delay_ms = delay,
                            error = %e,
                            "Provider request failed, retrying..."
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    } else if !retryable {
                        tracing::error!(error = %e, "Provider request failed with non-retryable error");
                        return Err(e);
                    }

                    last_error = Some(e);
                }
            }
        }

        let error = last_error
            .unwrap_or_else(|| ProviderError::RequestFailed("unknown error".to_string()));
        tracing::error!(
            attempts = self.config.max_retries + 1,
            error = %error,
            "Provider request failed after all attempts"
        );
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use vigil_domain::{ActionType, ChosenAction, NarrativeDelta};

    /// Mock provider that fails a configurable number of times before succeeding.
    struct FailingMockProvider {
        failures_remaining: AtomicU32,
        error: ProviderError,
    }

    impl FailingMockProvider {
        fn new(failure_count: u32, error: ProviderError) -> Self {
            Self {
                failures_remaining: AtomicU32::new(failure_count),
                error,
            }
        }
    }

    #[async_trait]
    impl NarrativePort for FailingMockProvider {
        async fn next_scene(
            &self,
            _request: NarrativeRequest,
        ) -> Result<NarrativeOutcome, ProviderError> {
            let remaining = self.failures_remaining.fetch_sub(1, Ordering::SeqCst);
            if remaining > 0 {
                Err(self.error.clone())
            } else {
                Ok(NarrativeOutcome {
                    delta: NarrativeDelta {
                        narrative: "ok".to_string(),
                        ..NarrativeDelta::default()
                    },
                    raw: serde_json::json!({}),
                })
            }
        }
    }

    fn request() -> NarrativeRequest {
        NarrativeRequest {
            history: vec![],
            action: ChosenAction {
                id: "a".to_string(),
                text: "wait".to_string(),
                action_type: ActionType::Wait,
            },
            known_rules: vec![],
            inventory: vec![],
            sanity: 100,
            location: "entrance".to_string(),
            turn: 1,
            temperature: 0.8,
        }
    }

    fn fast_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            retry_delay_ms: 1,
            jitter_factor: 0.0,
            attempt_timeout_ms: 1000,
        }
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let mock = Arc::new(FailingMockProvider::new(
            0,
            ProviderError::RequestFailed("test".into()),
        ));
        let client = ResilientNarrativeClient::new(mock, fast_config(1));

        let outcome = client.next_scene(request()).await.expect("success");
        assert_eq!(outcome.delta.narrative, "ok");
    }

    #[tokio::test]
    async fn succeeds_after_single_retry() {
        let mock = Arc::new(FailingMockProvider::new(
            1,
            ProviderError::RequestFailed("transient".into()),
        ));
        let client = ResilientNarrativeClient::new(mock, fast_config(1));

        assert!(client.next_scene(request()).await.is_ok());
    }

    #[tokio::test]
    async fn fails_when_both_attempts_fail() {
        let mock = Arc::new(FailingMockProvider::new(
            10,
            ProviderError::RequestFailed("persistent".into()),
        ));
        let mock_ref = Arc::clone(&mock);
        let client = ResilientNarrativeClient::new(mock, fast_config(1));

        assert!(client.next_scene(request()).await.is_err());
        // One initial attempt + exactly one retry.
        assert_eq!(mock_ref.failures_remaining.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn no_retry_on_auth_error() {
        let mock = Arc::new(FailingMockProvider::new(
            10,
            ProviderError::RequestFailed("401 Unauthorized".into()),
        ));
        let mock_ref = Arc::clone(&mock);
        let client = ResilientNarrativeClient::new(mock, fast_config(3));

        assert!(client.next_scene(request()).await.is_err());
        assert_eq!(
            mock_ref.failures_remaining.load(Ordering::SeqCst),
            9,
            "auth error should fail after a single attempt"
        );
    }

    #[tokio::test]
    async fn slow_attempt_times_out() {
        struct SlowProvider;

        #[async_trait]
        impl NarrativePort for SlowProvider {
            async fn next_scene(
                &self,
                _request: NarrativeRequest,
            ) -> Result<NarrativeOutcome, ProviderError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                unreachable!("timeout should fire first")
            }
        }

        let config = RetryConfig {
            max_retries: 0,
            retry_delay_ms: 1,
            jitter_factor: 0.0,
            attempt_timeout_ms: 20,
        };
        let client = ResilientNarrativeClient::new(Arc::new(SlowProvider), config);

        let err = client.next_scene(request()).await.expect_err("timeout");
        assert!(matches!(err, ProviderError::Timeout(_)));
    }
}
