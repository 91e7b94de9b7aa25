//! Core agent trait and shared agent configuration.

use async_trait::async_trait;
use copilot_common::{AgentOutcome, AgentRole, AnalysisInput, Result};
use copilot_llm::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// One analysis role over a decoded request.
///
/// Implementors provide [`Agent::execute`]; [`Agent::run`] bounds it by a
/// timeout and folds the result into an [`AgentOutcome`]. An agent never
/// touches report state, it only hands its outcome back.
#[async_trait]
pub trait Agent: Send + Sync {
    type Output: Send + 'static;

    fn role(&self) -> AgentRole;

    /// Produce this agent's result, propagating collaborator errors.
    async fn execute(&self, input: &AnalysisInput) -> Result<Self::Output>;

    /// Run to a terminal outcome within `timeout`.
    async fn run(&self, input: &AnalysisInput, timeout: Duration) -> AgentOutcome<Self::Output> {
        let role = self.role();
        let started = Instant::now();

        match tokio::time::timeout(timeout, self.execute(input)).await {
            Ok(Ok(value)) => {
                debug!(
                    agent = %role,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Agent succeeded"
                );
                AgentOutcome::Success(value)
            }
            Ok(Err(e)) => {
                error!(
                    agent = %role,
                    kind = %e.kind(),
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Agent failed"
                );
                AgentOutcome::failure(e.kind(), e.to_string())
            }
            Err(_) => {
                warn!(
                    agent = %role,
                    timeout_ms = timeout.as_millis() as u64,
                    "Agent timed out"
                );
                AgentOutcome::TimedOut
            }
        }
    }
}

/// Sampling and retry settings for the completion-backed agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Temperature for completions
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens for completions
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    800
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            retry: RetryConfig::default(),
        }
    }
}
