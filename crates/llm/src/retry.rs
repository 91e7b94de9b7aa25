use async_trait::async_trait;
use copilot_common::{CopilotError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::client::{LlmClient, LlmRequest, LlmResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_delay_ms: 250,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No delay between attempts. Used by tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
        }
    }
}

/// Retries `Transient` failures of the wrapped client. `Rejected` and
/// `MalformedResponse` are returned on the first occurrence.
pub struct RetryingClient<T: LlmClient> {
    inner: T,
    config: RetryConfig,
}

impl<T: LlmClient> RetryingClient<T> {
    pub fn new(inner: T, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Wait before the retry numbered `attempt` (zero based). A server hint
    /// wins over the backoff schedule; both are capped at `max_delay_ms`.
    fn delay_for(&self, attempt: u32, error: &CopilotError) -> Duration {
        let cap = Duration::from_millis(self.config.max_delay_ms);
        error
            .retry_after()
            .unwrap_or_else(|| self.backoff(attempt))
            .min(cap)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let scale = self.config.backoff_multiplier.max(1.0).powi(attempt as i32);
        let base_ms = self.config.initial_delay_ms as f64 * scale;
        // Up to 10% spread, stable per attempt so tests stay deterministic.
        let spread = f64::from(attempt.wrapping_mul(7919) % 11) / 100.0;
        Duration::from_millis((base_ms * (1.0 + spread)) as u64)
    }
}

#[async_trait]
impl<T: LlmClient> LlmClient for RetryingClient<T> {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let mut attempt = 0;

        loop {
            let error = match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if attempt >= self.config.max_retries || !error.is_transient() {
                return Err(error);
            }

            let delay = self.delay_for(attempt, &error);
            warn!(
                model = self.inner.model_name(),
                retry = attempt + 1,
                of = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Completion failed, retrying"
            );

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
