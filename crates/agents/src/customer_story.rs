//! Customer story agent: narrative, sentiment, and follow-ups.

use crate::parse::{clean_list, parse_enum, parse_json};
use crate::prompts::{CUSTOMER_STORY_PROMPT, render_input};
use crate::traits::{Agent, AgentsConfig};
use async_trait::async_trait;
use copilot_common::{AgentRole, AnalysisInput, CustomerStory, Result, or_unknown};
use copilot_llm::{LlmClient, LlmRequest, RetryingClient};
use copilot_retrieval::{ContextBuilder, Retriever};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Characters of transcript folded into the retrieval query.
const QUERY_TRANSCRIPT_CHARS: usize = 100;

const DEFAULT_CONTEXT_TOKENS: usize = 1024;

#[derive(Deserialize)]
struct RawStory {
    #[serde(default)]
    customer_background: Option<String>,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    action_items: Vec<String>,
    summary: String,
}

/// Parse a completion into [`CustomerStory`].
pub fn parse_story(content: &str) -> Result<CustomerStory> {
    let raw: RawStory = parse_json(content)?;

    Ok(CustomerStory {
        customer_background: or_unknown(raw.customer_background.as_deref()),
        key_points: clean_list(raw.key_points),
        sentiment: parse_enum("sentiment", raw.sentiment.as_deref())?,
        action_items: clean_list(raw.action_items),
        summary: raw.summary.trim().to_string(),
    })
}

/// The retrieval query for one request.
pub fn retrieval_query(input: &AnalysisInput) -> String {
    let head: String = input.transcript.chars().take(QUERY_TRANSCRIPT_CHARS).collect();
    format!("customer interaction {} {}", input.record_id, head)
}

pub struct CustomerStoryAgent {
    client: RetryingClient<Arc<dyn LlmClient>>,
    retriever: Option<Arc<dyn Retriever>>,
    context: ContextBuilder,
    temperature: f32,
    max_tokens: u32,
}

impl CustomerStoryAgent {
    pub fn new(client: Arc<dyn LlmClient>, config: &AgentsConfig) -> Self {
        Self {
            client: RetryingClient::new(client, config.retry.clone()),
            retriever: None,
            context: ContextBuilder::new(DEFAULT_CONTEXT_TOKENS),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Attach a knowledge retriever whose passages are rendered within
    /// `max_context_tokens`.
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>, max_context_tokens: usize) -> Self {
        self.retriever = Some(retriever);
        self.context = ContextBuilder::new(max_context_tokens);
        self
    }

    /// Best effort: any retrieval failure yields an empty context.
    async fn retrieve_context(&self, input: &AnalysisInput) -> String {
        let Some(ref retriever) = self.retriever else {
            return String::new();
        };

        match retriever.query(&retrieval_query(input)).await {
            Ok(passages) => {
                debug!(agent = %self.role(), passages = passages.len(), "Retrieved context");
                self.context.build(&passages)
            }
            Err(e) => {
                warn!(
                    agent = %self.role(),
                    error = %e,
                    "Retrieval failed, continuing without context"
                );
                String::new()
            }
        }
    }
}

#[async_trait]
impl Agent for CustomerStoryAgent {
    type Output = CustomerStory;

    fn role(&self) -> AgentRole {
        AgentRole::CustomerStory
    }

    async fn execute(&self, input: &AnalysisInput) -> Result<CustomerStory> {
        let context = self.retrieve_context(input).await;

        let request = LlmRequest::prompt(CUSTOMER_STORY_PROMPT, render_input(input, &context))
            .with_sampling(Some(self.temperature), Some(self.max_tokens))
            .json();

        let response = self.client.complete(request).await?;
        debug!(
            agent = %self.role(),
            model = %response.model,
            response_len = response.content.len(),
            "Received completion"
        );

        parse_story(&response.content)
    }
}
