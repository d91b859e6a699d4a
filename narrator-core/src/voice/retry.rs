use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{info, warn};

use super::provider::TextToSpeech;
use super::types::{SynthesisParameters, Voice};
use crate::error::Result;

/// Bounded retry with capped exponential backoff. `max_attempts` counts the
/// first try, so the default of 1 never retries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    8_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff_ms as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis(base.min(self.max_backoff_ms as f64) as u64)
    }
}

/// Wraps a client and re-issues retryable failures according to a
/// [`RetryPolicy`].
pub struct RetryingClient<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T: TextToSpeech> RetryingClient<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    async fn run<R, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(operation, attempt, "Request succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !error.is_retryable() || attempt + 1 >= max_attempts {
                        return Err(error);
                    }

                    let backoff = self.policy.backoff(attempt);
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %error,
                        "Request failed, retrying after backoff"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[async_trait]
impl<T: TextToSpeech> TextToSpeech for RetryingClient<T> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        self.run("list_voices", || self.inner.list_voices()).await
    }

    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        params: &SynthesisParameters,
    ) -> Result<Vec<u8>> {
        self.run("synthesize", || self.inner.synthesize(voice_id, text, params))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NarratorError;
    use crate::voice::mock::{MockBehavior, MockClient};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            multiplier: 2.0,
        }
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 1_000,
            multiplier: 2.0,
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(10), Duration::from_millis(1_000));
    }

    #[tokio::test]
    async fn test_default_policy_does_not_retry() {
        let mock = MockClient::new(MockBehavior::ServiceErrorThenSuccess {
            remaining_errors: 1,
            status: 503,
        });
        let client = RetryingClient::new(mock.clone(), RetryPolicy::none());

        let result = client
            .synthesize("v1", "Hello", &SynthesisParameters::default())
            .await;
        assert!(result.is_err());
        assert_eq!(mock.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_retryable_error_then_success() {
        let mock = MockClient::new(MockBehavior::ServiceErrorThenSuccess {
            remaining_errors: 2,
            status: 429,
        });
        let client = RetryingClient::new(mock.clone(), fast_policy(3));

        let result = client
            .synthesize("v1", "Hello", &SynthesisParameters::default())
            .await;
        assert!(result.is_ok());
        assert_eq!(mock.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_terminal_error_not_retried() {
        let mock = MockClient::new(MockBehavior::AlwaysServiceError { status: 401 });
        let client = RetryingClient::new(mock.clone(), fast_policy(5));

        let result = client
            .synthesize("v1", "Hello", &SynthesisParameters::default())
            .await;
        assert!(matches!(
            result,
            Err(NarratorError::Service { status: 401, .. })
        ));
        assert_eq!(mock.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let mock = MockClient::new(MockBehavior::AlwaysNetworkError);
        let client = RetryingClient::new(mock.clone(), fast_policy(4));

        let result = client
            .synthesize("v1", "Hello", &SynthesisParameters::default())
            .await;
        assert!(matches!(result, Err(NarratorError::Network(_))));
        assert_eq!(mock.get_call_count(), 4);
    }
}
