//! Analysis agents for sales conversations.
//!
//! Three agents run over the same decoded request:
//!
//! - **Engineer Feedback Agent**: technical issues and engineering follow-ups
//! - **Customer Story Agent**: narrative and sentiment, with knowledge-base context
//! - **CRM Info Agent**: the employee profile behind the record id
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     AnalysisInput                        │
//! └──────┬──────────────────────┬─────────────────────┬──────┘
//!        ▼                      ▼                     ▼
//! ┌─────────────┐       ┌──────────────┐      ┌─────────────┐
//! │  Engineer   │       │   Customer   │      │  CRM Info   │
//! │  Feedback   │       │    Story     │      │             │
//! └──────┬──────┘       └───┬──────┬───┘      └──────┬──────┘
//!        ▼                  ▼      ▼                 ▼
//!    LlmClient        LlmClient  Retriever      RecordStore
//! ```
//!
//! Each agent returns its own [`AgentOutcome`](copilot_common::AgentOutcome);
//! none of them sees the others' results.

pub mod crm_info;
pub mod customer_story;
pub mod engineer_feedback;
pub mod parse;
pub mod prompts;
pub mod traits;

#[cfg(test)]
mod mock;

pub use crm_info::CrmInfoAgent;
pub use customer_story::CustomerStoryAgent;
pub use engineer_feedback::EngineerFeedbackAgent;
pub use traits::{Agent, AgentsConfig};
