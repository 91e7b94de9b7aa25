//! Error types for the sales copilot.

use crate::outcome::{ErrorKind, FailureCause};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CopilotError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Transient error: {0}")]
    Transient(String),

    /// Transient failure where the service said when to come back.
    #[error("Transient error (retry after {}s): {message}", retry_after.as_secs())]
    Throttled {
        message: String,
        retry_after: Duration,
    },

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error(
        "All agents failed (crm_info: {crm_info}; customer_story: {customer_story}; engineering_feedback: {engineer_feedback})"
    )]
    AllAgentsFailed {
        crm_info: FailureCause,
        customer_story: FailureCause,
        engineer_feedback: FailureCause,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CopilotError {
    /// Classification used when the error is absorbed into an agent outcome.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Transient(_) | Self::Throttled { .. } => ErrorKind::Transient,
            Self::Rejected(_) => ErrorKind::Rejected,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Self::Lookup(_) => ErrorKind::LookupError,
            Self::AllAgentsFailed { .. } => ErrorKind::AllAgentsFailed,
            Self::Config(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether a caller may retry the operation that produced this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Throttled { .. })
    }

    /// Server-provided wait before retrying, when there was one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Throttled { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CopilotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(
            CopilotError::Transient("503".into()).kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            CopilotError::Lookup("boom".into()).kind(),
            ErrorKind::LookupError
        );
        assert_eq!(
            CopilotError::Config("missing key".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn only_transient_is_retryable() {
        assert!(CopilotError::Transient("timeout".into()).is_transient());
        let throttled = CopilotError::Throttled {
            message: "429 Too Many Requests".into(),
            retry_after: Duration::from_secs(3),
        };
        assert!(throttled.is_transient());
        assert_eq!(throttled.kind(), ErrorKind::Transient);
        assert_eq!(throttled.retry_after(), Some(Duration::from_secs(3)));
        assert!(CopilotError::Transient("retry-after: 9".into()).retry_after().is_none());
        assert!(!CopilotError::Rejected("content filter".into()).is_transient());
        assert!(!CopilotError::MalformedResponse("not json".into()).is_transient());
    }

    #[test]
    fn all_agents_failed_lists_every_cause() {
        let err = CopilotError::AllAgentsFailed {
            crm_info: FailureCause::new(ErrorKind::LookupError, "crm down"),
            customer_story: FailureCause::timed_out(),
            engineer_feedback: FailureCause::new(ErrorKind::Rejected, "filtered"),
        };
        let text = err.to_string();
        assert!(text.contains("crm down"));
        assert!(text.contains("timed out"));
        assert!(text.contains("filtered"));
        assert_eq!(err.kind(), ErrorKind::AllAgentsFailed);
    }
}
