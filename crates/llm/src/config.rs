use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use copilot_common::{CopilotError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::openai::OpenAiClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "azure"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model name, or deployment name for Azure
    #[serde(default = "default_model")]
    pub model: String,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_provider() -> String {
    "openai".into()
}

fn default_model() -> String {
    "llama3.2".into()
}

fn default_api_version() -> String {
    "2024-02-15-preview".into()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_timeout_ms() -> u64 {
    60_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_url: None,
            api_version: default_api_version(),
            max_concurrent_requests: default_max_concurrent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl LlmConfig {
    /// Explicit key first, then the provider's environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }

        let env_var = match self.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            "azure" => "AZURE_OPENAI_API_KEY",
            _ => return None,
        };

        std::env::var(env_var).ok().filter(|k| !k.is_empty())
    }
}

/// Caps the number of completions in flight across every agent.
pub struct SemaphoredClient {
    inner: Arc<dyn LlmClient>,
    semaphore: Arc<tokio::sync::Semaphore>,
}

impl SemaphoredClient {
    pub fn new(inner: Arc<dyn LlmClient>, max_concurrent: usize) -> Self {
        Self {
            inner,
            semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent.max(1))),
        }
    }
}

#[async_trait]
impl LlmClient for SemaphoredClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| CopilotError::Transient(format!("Semaphore acquire failed: {e}")))?;
        self.inner.complete(request).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Build the shared completion client. Retry policy is applied by each agent.
pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let api_key = config.resolve_api_key();
    let timeout = Duration::from_millis(config.timeout_ms);

    let base_client: Arc<dyn LlmClient> = match config.provider.as_str() {
        "openai" => Arc::new(
            OpenAiClient::new(config.api_url.clone(), config.model.clone(), api_key)
                .with_timeout(timeout)?,
        ),
        "azure" => {
            let endpoint = config.api_url.clone().ok_or_else(|| {
                CopilotError::Config("Azure OpenAI requires api_url".to_string())
            })?;
            Arc::new(
                OpenAiClient::azure(
                    endpoint,
                    config.model.clone(),
                    api_key,
                    config.api_version.clone(),
                )
                .with_timeout(timeout)?,
            )
        }
        other => {
            return Err(CopilotError::Config(format!(
                "Unknown LLM provider: {other}"
            )));
        }
    };

    info!(
        provider = %config.provider,
        model = %config.model,
        max_concurrent = config.max_concurrent_requests,
        "Completion client ready"
    );

    Ok(Arc::new(SemaphoredClient::new(
        base_client,
        config.max_concurrent_requests,
    )))
}
