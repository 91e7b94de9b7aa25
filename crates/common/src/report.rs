//! Agent result shapes and the aggregated report.

use crate::outcome::{AgentOutcome, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel used for absent profile fields.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(format!("unknown sentiment '{other}'")),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        })
    }
}

/// A single technical issue raised in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIssue {
    pub issue: String,
    pub severity: Priority,
    #[serde(default)]
    pub impact: String,
}

/// A recommended engineering action and why it matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub action: String,
    pub priority: Priority,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineerFeedback {
    pub feedback: String,
    #[serde(default)]
    pub action_items: Vec<String>,
    pub priority: Priority,
    #[serde(default)]
    pub technical_issues: Vec<TechnicalIssue>,
    #[serde(default)]
    pub engineering_insights: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    /// Issues that recur across customers rather than one account
    #[serde(default)]
    pub systemic_patterns: Vec<String>,
    #[serde(default)]
    pub best_practices: Vec<String>,
}

impl Default for EngineerFeedback {
    fn default() -> Self {
        Self {
            feedback: UNKNOWN.into(),
            action_items: Vec::new(),
            priority: Priority::default(),
            technical_issues: Vec::new(),
            engineering_insights: Vec::new(),
            recommendations: Vec::new(),
            systemic_patterns: Vec::new(),
            best_practices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerStory {
    pub customer_background: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl Default for CustomerStory {
    fn default() -> Self {
        Self {
            customer_background: UNKNOWN.into(),
            key_points: Vec::new(),
            sentiment: Sentiment::default(),
            action_items: Vec::new(),
            summary: String::new(),
        }
    }
}

/// Normalized employee/account profile. Text fields are never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmInfo {
    pub name: String,
    pub title: String,
    pub department: String,
    pub email: String,
    pub tenure: String,
    /// Topics inferred from the public profile
    #[serde(default)]
    pub expertise: Vec<String>,
    /// Public profile text
    pub summary: String,
}

impl Default for CrmInfo {
    fn default() -> Self {
        Self {
            name: UNKNOWN.into(),
            title: UNKNOWN.into(),
            department: UNKNOWN.into(),
            email: UNKNOWN.into(),
            tenure: UNKNOWN.into(),
            expertise: Vec::new(),
            summary: UNKNOWN.into(),
        }
    }
}

impl CrmInfo {
    /// Whether every field still holds the sentinel.
    pub fn is_unknown(&self) -> bool {
        *self == Self::default()
    }
}

/// Fill a profile field, falling back to the sentinel for blank input.
pub fn or_unknown(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Final aggregate of one analysis request. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub request_id: String,
    /// Unix millis
    pub completed_at: u64,
    pub crm_info: AgentOutcome<CrmInfo>,
    pub customer_story: AgentOutcome<CustomerStory>,
    pub engineer_feedback: AgentOutcome<EngineerFeedback>,
}

impl Report {
    pub fn new(
        request_id: impl Into<String>,
        crm_info: AgentOutcome<CrmInfo>,
        customer_story: AgentOutcome<CustomerStory>,
        engineer_feedback: AgentOutcome<EngineerFeedback>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            completed_at: now_millis(),
            crm_info,
            customer_story,
            engineer_feedback,
        }
    }

    /// Number of slots that produced a value.
    pub fn success_count(&self) -> usize {
        [
            self.crm_info.is_success(),
            self.customer_story.is_success(),
            self.engineer_feedback.is_success(),
        ]
        .iter()
        .filter(|ok| **ok)
        .count()
    }

    /// Render the caller-facing shape where failed slots carry defaults.
    pub fn to_response(&self) -> AnalysisResponse {
        AnalysisResponse {
            request_id: self.request_id.clone(),
            completed_at: self.completed_at,
            crm_info: self.crm_info.value().cloned().unwrap_or_default(),
            customer_story: self.customer_story.value().cloned().unwrap_or_default(),
            engineering_feedback: self.engineer_feedback.value().cloned().unwrap_or_default(),
            agents: AgentStatuses {
                crm_info: AgentStatus::from_outcome(&self.crm_info),
                customer_story: AgentStatus::from_outcome(&self.customer_story),
                engineering_feedback: AgentStatus::from_outcome(&self.engineer_feedback),
            },
        }
    }
}

/// Caller-facing response body. Every key is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub request_id: String,
    pub completed_at: u64,
    pub crm_info: CrmInfo,
    pub customer_story: CustomerStory,
    pub engineering_feedback: EngineerFeedback,
    pub agents: AgentStatuses,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatuses {
    pub crm_info: AgentStatus,
    pub customer_story: AgentStatus,
    pub engineering_feedback: AgentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AgentStatus {
    fn from_outcome<T>(outcome: &AgentOutcome<T>) -> Self {
        let cause = outcome.cause();
        Self {
            status: outcome.status_label().to_string(),
            kind: cause.as_ref().map(|c| c.kind),
            message: cause.map(|c| c.message),
        }
    }
}

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback() -> EngineerFeedback {
        EngineerFeedback {
            feedback: "Latency dropped after the cache rollout".into(),
            action_items: vec!["Document cache settings".into()],
            priority: Priority::Low,
            recommendations: vec![Recommendation {
                action: "Publish cache tuning guide".into(),
                priority: Priority::Medium,
                rationale: "Other accounts ask the same question".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" Negative ".parse::<Sentiment>().unwrap(), Sentiment::Negative);
        assert!("urgent".parse::<Priority>().is_err());
        assert!("mixed".parse::<Sentiment>().is_err());
    }

    #[test]
    fn crm_defaults_are_unknown() {
        let info = CrmInfo::default();
        assert!(info.is_unknown());
        assert_eq!(info.email, UNKNOWN);
        assert_eq!(or_unknown(Some("  ")), UNKNOWN);
        assert_eq!(or_unknown(None), UNKNOWN);
        assert_eq!(or_unknown(Some(" Jane ")), "Jane");
    }

    #[test]
    fn response_fills_failed_slots_with_defaults() {
        let report = Report::new(
            "req-1",
            AgentOutcome::failure(ErrorKind::LookupError, "crm down"),
            AgentOutcome::TimedOut,
            AgentOutcome::Success(feedback()),
        );
        assert_eq!(report.success_count(), 1);

        let response = report.to_response();
        assert!(response.crm_info.is_unknown());
        assert_eq!(response.customer_story.sentiment, Sentiment::Neutral);
        assert_eq!(response.engineering_feedback.priority, Priority::Low);
        assert_eq!(
            response.engineering_feedback.recommendations[0].priority,
            Priority::Medium
        );
        assert_eq!(response.agents.crm_info.status, "failure");
        assert_eq!(response.agents.crm_info.kind, Some(ErrorKind::LookupError));
        assert_eq!(response.agents.customer_story.status, "timed_out");
        assert_eq!(response.agents.engineering_feedback.status, "success");
        assert!(response.agents.engineering_feedback.kind.is_none());
    }

    #[test]
    fn response_json_always_has_every_key() {
        let report = Report::new(
            "req-2",
            AgentOutcome::TimedOut,
            AgentOutcome::TimedOut,
            AgentOutcome::TimedOut,
        );
        let json = serde_json::to_value(report.to_response()).unwrap();

        for key in ["name", "title", "department", "email", "tenure", "summary"] {
            assert_eq!(json["crm_info"][key], UNKNOWN, "crm_info.{key}");
        }
        assert_eq!(json["crm_info"]["expertise"], serde_json::json!([]));
        for key in ["customer_background", "key_points", "sentiment", "action_items"] {
            assert!(!json["customer_story"][key].is_null(), "customer_story.{key}");
        }
        for key in [
            "feedback",
            "action_items",
            "priority",
            "technical_issues",
            "engineering_insights",
            "recommendations",
            "systemic_patterns",
            "best_practices",
        ] {
            assert!(
                !json["engineering_feedback"][key].is_null(),
                "engineering_feedback.{key}"
            );
        }
        assert_eq!(json["engineering_feedback"]["priority"], "medium");
    }
}
