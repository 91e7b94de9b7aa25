//! Engineer feedback agent: technical insights for the engineering team.

use crate::parse::{clean_list, parse_enum, parse_json};
use crate::prompts::{ENGINEER_FEEDBACK_PROMPT, render_input};
use crate::traits::{Agent, AgentsConfig};
use async_trait::async_trait;
use copilot_common::{
    AgentRole, AnalysisInput, EngineerFeedback, Recommendation, Result, TechnicalIssue,
};
use copilot_llm::{LlmClient, LlmRequest, RetryingClient};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Deserialize)]
struct RawFeedback {
    feedback: String,
    #[serde(default)]
    action_items: Vec<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    technical_issues: Vec<RawIssue>,
    #[serde(default)]
    engineering_insights: Vec<String>,
    #[serde(default)]
    recommendations: Vec<RawRecommendation>,
    #[serde(default)]
    systemic_patterns: Vec<String>,
    #[serde(default)]
    best_practices: Vec<String>,
}

#[derive(Deserialize)]
struct RawIssue {
    issue: String,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    impact: String,
}

#[derive(Deserialize)]
struct RawRecommendation {
    action: String,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    rationale: String,
}

/// Parse a completion into [`EngineerFeedback`].
pub fn parse_feedback(content: &str) -> Result<EngineerFeedback> {
    let raw: RawFeedback = parse_json(content)?;

    let technical_issues = raw
        .technical_issues
        .into_iter()
        .map(|i| {
            Ok(TechnicalIssue {
                issue: i.issue.trim().to_string(),
                severity: parse_enum("severity", i.severity.as_deref())?,
                impact: i.impact.trim().to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let recommendations = raw
        .recommendations
        .into_iter()
        .filter(|r| !r.action.trim().is_empty())
        .map(|r| {
            Ok(Recommendation {
                action: r.action.trim().to_string(),
                priority: parse_enum("recommendation priority", r.priority.as_deref())?,
                rationale: r.rationale.trim().to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(EngineerFeedback {
        feedback: raw.feedback.trim().to_string(),
        action_items: clean_list(raw.action_items),
        priority: parse_enum("priority", raw.priority.as_deref())?,
        technical_issues,
        engineering_insights: clean_list(raw.engineering_insights),
        recommendations,
        systemic_patterns: clean_list(raw.systemic_patterns),
        best_practices: clean_list(raw.best_practices),
    })
}

pub struct EngineerFeedbackAgent {
    client: RetryingClient<Arc<dyn LlmClient>>,
    temperature: f32,
    max_tokens: u32,
}

impl EngineerFeedbackAgent {
    pub fn new(client: Arc<dyn LlmClient>, config: &AgentsConfig) -> Self {
        Self {
            client: RetryingClient::new(client, config.retry.clone()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl Agent for EngineerFeedbackAgent {
    type Output = EngineerFeedback;

    fn role(&self) -> AgentRole {
        AgentRole::EngineerFeedback
    }

    async fn execute(&self, input: &AnalysisInput) -> Result<EngineerFeedback> {
        let request = LlmRequest::prompt(ENGINEER_FEEDBACK_PROMPT, render_input(input, ""))
            .with_sampling(Some(self.temperature), Some(self.max_tokens))
            .json();

        let response = self.client.complete(request).await?;
        debug!(
            agent = %self.role(),
            model = %response.model,
            response_len = response.content.len(),
            "Received completion"
        );

        parse_feedback(&response.content)
    }
}
