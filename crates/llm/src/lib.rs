//! Completion client contract for the analysis agents.
//!
//! [`OpenAiClient`] talks to OpenAI-compatible and Azure OpenAI endpoints,
//! [`RetryingClient`] retries transient failures, and [`SemaphoredClient`]
//! bounds how many completions run at once.

pub mod client;
pub mod config;
pub mod openai;
pub mod retry;

pub use client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};
pub use config::{LlmConfig, SemaphoredClient, build_llm_client};
pub use openai::{ApiFlavor, OpenAiClient};
pub use retry::{RetryConfig, RetryingClient};
