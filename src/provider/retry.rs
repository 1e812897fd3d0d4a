// src/provider/retry.rs — Retry with exponential backoff for model providers
//
// Wraps any ModelProvider with automatic retry on transient failures.
// Retries: rate limits (429), server errors (5xx), timeouts, connection resets.
// Does NOT retry: bad request (400), auth errors (401, 403), parse failures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{ChatRequest, ChatResponse, ModelProvider};
use crate::infra::config::RetryTomlConfig;
use crate::infra::errors::CaseforgeError;

/// Default retry configuration.
const MAX_RETRIES: u32 = 3;
const INITIAL_DELAY_MS: u64 = 1_000;
const BACKOFF_FACTOR: f64 = 2.0;
const MAX_DELAY_MS: u64 = 30_000;
const JITTER_FRACTION: f64 = 0.2;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_delay: Duration::from_millis(INITIAL_DELAY_MS),
            backoff_factor: BACKOFF_FACTOR,
            max_delay: Duration::from_millis(MAX_DELAY_MS),
            jitter_fraction: JITTER_FRACTION,
        }
    }
}

impl From<&RetryTomlConfig> for RetryConfig {
    fn from(toml: &RetryTomlConfig) -> Self {
        Self {
            max_retries: toml.max_retries,
            initial_delay: Duration::from_millis(toml.initial_delay_ms),
            backoff_factor: toml.backoff_factor,
            max_delay: Duration::from_millis(toml.max_delay_ms),
            jitter_fraction: JITTER_FRACTION,
        }
    }
}

/// A provider wrapper that adds retry with exponential backoff.
///
/// Delegates both trait methods to the inner provider, retrying on
/// transient errors.
pub struct RetryProvider {
    inner: Arc<dyn ModelProvider>,
    config: RetryConfig,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn ModelProvider>) -> Self {
        Self {
            inner,
            config: RetryConfig::default(),
        }
    }

    pub fn with_config(inner: Arc<dyn ModelProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Calculate the delay for a given retry attempt (0-indexed).
    fn delay_for_attempt(&self, attempt: u32, rate_limit_delay: Option<Duration>) -> Duration {
        // If the server told us how long to wait, use that (with a small buffer).
        if let Some(rl_delay) = rate_limit_delay {
            return rl_delay + Duration::from_millis(100);
        }

        let base_ms = self.config.initial_delay.as_millis() as f64
            * self.config.backoff_factor.powi(attempt as i32);
        let capped_ms = base_ms.min(self.config.max_delay.as_millis() as f64);

        // Add jitter: random between [1 - jitter, 1 + jitter] * capped_ms
        let jitter = deterministic_jitter(attempt, self.config.jitter_fraction);
        let final_ms = (capped_ms * jitter).max(100.0);

        Duration::from_millis(final_ms as u64)
    }
}

/// Determine if an error should be retried.
fn should_retry(error: &CaseforgeError) -> bool {
    match error {
        CaseforgeError::RateLimited { .. } => true,
        CaseforgeError::Provider { retriable, .. } => *retriable,
        // Everything else (parse failures, config, IO): don't retry
        _ => false,
    }
}

/// Extract rate-limit retry delay from the error, if available.
fn rate_limit_delay(error: &CaseforgeError) -> Option<Duration> {
    match error {
        CaseforgeError::RateLimited { retry_after_ms, .. } if *retry_after_ms > 0 => {
            Some(Duration::from_millis(*retry_after_ms))
        }
        _ => None,
    }
}

/// Deterministic jitter for a given attempt to keep retries reproducible in tests.
/// Returns a multiplier in [1 - fraction, 1 + fraction].
fn deterministic_jitter(attempt: u32, fraction: f64) -> f64 {
    // Simple hash-based jitter — not cryptographic, just varied enough
    let hash = (attempt.wrapping_mul(2654435761)) as f64 / u32::MAX as f64; // 0.0..1.0
    1.0 + fraction * (2.0 * hash - 1.0) // [1-fraction, 1+fraction]
}

#[async_trait]
impl ModelProvider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, CaseforgeError> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.inner.chat(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if !should_retry(&e) || attempt == self.config.max_retries {
                        return Err(e);
                    }

                    let rl_delay = rate_limit_delay(&e);
                    let delay = self.delay_for_attempt(attempt, rl_delay);

                    tracing::warn!(
                        provider = self.inner.name(),
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after error: {}",
                        e
                    );

                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(CaseforgeError::Provider {
            provider: self.inner.name().to_string(),
            message: "All retries exhausted".into(),
            retriable: false,
        }))
    }

    async fn embed(&self, model: &str, texts: &[&str]) -> Result<Vec<Vec<f32>>, CaseforgeError> {
        // Embedding is idempotent, and corpus builds issue many batched
        // calls in a row, so rate-limit hints are honored here too.
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.inner.embed(model, texts).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !should_retry(&e) || attempt == self.config.max_retries {
                        return Err(e);
                    }

                    let rl_delay = rate_limit_delay(&e);
                    let delay = self.delay_for_attempt(attempt, rl_delay);

                    tracing::warn!(
                        provider = self.inner.name(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying embed after error: {}",
                        e
                    );

                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(CaseforgeError::Provider {
            provider: self.inner.name().to_string(),
            message: "All retries exhausted".into(),
            retriable: false,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_retry_rate_limited() {
        let err = CaseforgeError::RateLimited {
            provider: "test".into(),
            retry_after_ms: 5000,
        };
        assert!(should_retry(&err));
    }

    #[test]
    fn test_should_retry_retriable_provider() {
        let err = CaseforgeError::Provider {
            provider: "test".into(),
            message: "HTTP 500".into(),
            retriable: true,
        };
        assert!(should_retry(&err));
    }

    #[test]
    fn test_should_not_retry_non_retriable_provider() {
        let err = CaseforgeError::Provider {
            provider: "test".into(),
            message: "HTTP 400 bad request".into(),
            retriable: false,
        };
        assert!(!should_retry(&err));
    }

    #[test]
    fn test_should_not_retry_config_error() {
        assert!(!should_retry(&CaseforgeError::Config("no key".into())));
    }

    #[test]
    fn test_should_not_retry_generation_error() {
        assert!(!should_retry(&CaseforgeError::Generation(
            "not JSON".into()
        )));
    }

    #[test]
    fn test_rate_limit_delay_extraction() {
        let err = CaseforgeError::RateLimited {
            provider: "test".into(),
            retry_after_ms: 3000,
        };
        let delay = rate_limit_delay(&err);
        assert_eq!(delay, Some(Duration::from_millis(3000)));
    }

    #[test]
    fn test_rate_limit_delay_zero() {
        let err = CaseforgeError::RateLimited {
            provider: "test".into(),
            retry_after_ms: 0,
        };
        assert!(rate_limit_delay(&err).is_none());
    }

    #[test]
    fn test_rate_limit_delay_non_rate_limit_error() {
        let err = CaseforgeError::Provider {
            provider: "test".into(),
            message: "server error".into(),
            retriable: true,
        };
        assert!(rate_limit_delay(&err).is_none());
    }

    #[test]
    fn test_delay_for_attempt_exponential() {
        let provider = RetryProvider::new(Arc::new(DummyProvider));
        let d0 = provider.delay_for_attempt(0, None);
        let d1 = provider.delay_for_attempt(1, None);
        let d2 = provider.delay_for_attempt(2, None);

        // Each delay should be roughly 2x the previous (within jitter bounds)
        // d0 ≈ 1000ms, d1 ≈ 2000ms, d2 ≈ 4000ms
        assert!(d0.as_millis() >= 750 && d0.as_millis() <= 1250);
        assert!(d1.as_millis() >= 1500 && d1.as_millis() <= 2500);
        assert!(d2.as_millis() >= 3000 && d2.as_millis() <= 5000);
    }

    #[test]
    fn test_delay_capped_at_max() {
        let provider = RetryProvider::new(Arc::new(DummyProvider));
        // Attempt 10: 1000 * 2^10 = 1,024,000ms but max is 30,000ms
        let d = provider.delay_for_attempt(10, None);
        assert!(d.as_millis() <= 36_000); // max + jitter margin
    }

    #[test]
    fn test_delay_uses_rate_limit_hint() {
        let provider = RetryProvider::new(Arc::new(DummyProvider));
        let d = provider.delay_for_attempt(0, Some(Duration::from_millis(10_000)));
        // Should be the rate limit delay + 100ms buffer, NOT the exponential delay
        assert_eq!(d.as_millis(), 10_100);
    }

    #[test]
    fn test_deterministic_jitter_range() {
        for attempt in 0..20 {
            let j = deterministic_jitter(attempt, 0.2);
            assert!(
                j >= 0.8 && j <= 1.2,
                "jitter {} out of range for attempt {}",
                j,
                attempt
            );
        }
    }

    #[test]
    fn test_deterministic_jitter_reproducible() {
        assert_eq!(deterministic_jitter(5, 0.2), deterministic_jitter(5, 0.2));
    }

    #[test]
    fn test_default_config() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.initial_delay, Duration::from_millis(1000));
        assert_eq!(cfg.backoff_factor, 2.0);
        assert_eq!(cfg.max_delay, Duration::from_millis(30000));
        assert_eq!(cfg.jitter_fraction, 0.2);
    }

    #[test]
    fn test_config_from_toml() {
        let toml = RetryTomlConfig {
            max_retries: 5,
            initial_delay_ms: 500,
            backoff_factor: 3.0,
            max_delay_ms: 10_000,
        };
        let cfg = RetryConfig::from(&toml);
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.initial_delay, Duration::from_millis(500));
        assert_eq!(cfg.backoff_factor, 3.0);
        assert_eq!(cfg.max_delay, Duration::from_millis(10_000));
    }

    // Dummy provider for test construction
    struct DummyProvider;

    #[async_trait]
    impl ModelProvider for DummyProvider {
        fn name(&self) -> &str {
            "dummy"
        }
        async fn chat(&self, _req: ChatRequest) -> Result<ChatResponse, CaseforgeError> {
            Err(CaseforgeError::Config("dummy provider".into()))
        }
        async fn embed(
            &self,
            _model: &str,
            _texts: &[&str],
        ) -> Result<Vec<Vec<f32>>, CaseforgeError> {
            Err(CaseforgeError::Config("dummy provider".into()))
        }
    }
}
