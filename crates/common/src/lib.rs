//! Common types shared across the sales copilot crates.
//!
//! Requests enter through [`AnalysisRequest`], are decoded into an
//! [`AnalysisInput`] shared by every agent, and leave as a [`Report`]
//! whose slots each hold one [`AgentOutcome`].

pub mod error;
pub mod outcome;
pub mod report;
pub mod request;

pub use error::{CopilotError, Result};
pub use outcome::{AgentOutcome, AgentRole, ErrorKind, FailureCause};
pub use report::{
    AgentStatus, AgentStatuses, AnalysisResponse, CrmInfo, CustomerStory, EngineerFeedback,
    Priority, Recommendation, Report, Sentiment, TechnicalIssue, UNKNOWN, or_unknown,
};
pub use request::{AnalysisInput, AnalysisRequest, MAX_REQUEST_BYTES, PayloadEncoding, encode_payload};
