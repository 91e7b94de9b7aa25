//! Agent roles and the terminal outcome of one agent run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three fixed analysis roles. Report slots are keyed by role, not by
/// completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    CrmInfo,
    CustomerStory,
    EngineerFeedback,
}

impl AgentRole {
    pub const ALL: [AgentRole; 3] = [
        AgentRole::CrmInfo,
        AgentRole::CustomerStory,
        AgentRole::EngineerFeedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrmInfo => "crm_info",
            Self::CustomerStory => "customer_story",
            Self::EngineerFeedback => "engineer_feedback",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    Transient,
    Rejected,
    MalformedResponse,
    LookupError,
    TimedOut,
    AllAgentsFailed,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidRequest => "invalid_request",
            Self::Transient => "transient",
            Self::Rejected => "rejected",
            Self::MalformedResponse => "malformed_response",
            Self::LookupError => "lookup_error",
            Self::TimedOut => "timed_out",
            Self::AllAgentsFailed => "all_agents_failed",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Why an agent slot did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCause {
    pub kind: ErrorKind,
    pub message: String,
}

impl FailureCause {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timed_out() -> Self {
        Self::new(ErrorKind::TimedOut, "timed out")
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Terminal result of one agent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentOutcome<T> {
    Success(T),
    Failure { kind: ErrorKind, message: String },
    TimedOut,
}

impl<T> AgentOutcome<T> {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success(v) => Some(v),
            _ => None,
        }
    }

    /// The failure cause, or `None` for a success.
    pub fn cause(&self) -> Option<FailureCause> {
        match self {
            Self::Success(_) => None,
            Self::Failure { kind, message } => Some(FailureCause::new(*kind, message.clone())),
            Self::TimedOut => Some(FailureCause::timed_out()),
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Failure { .. } => "failure",
            Self::TimedOut => "timed_out",
        }
    }
}
