//! Orchestration of the sales copilot analysis agents.
//!
//! One request flows through the [`Orchestrator`]:
//!
//! ```text
//! AnalysisRequest ──decode──▶ AnalysisInput
//!                                  │
//!            ┌─────────────────────┼─────────────────────┐
//!            ▼                     ▼                     ▼
//!       CRM info task      customer story task   engineer feedback task
//!            │                     │                     │
//!            └──── settle (deadline, progress flag) ─────┘
//!                                  ▼
//!                               Report
//! ```
//!
//! Progress is published per request through a [`ProgressReporter`].

pub mod config;
pub mod orchestrator;
pub mod progress;

pub use config::OrchestratorConfig;
pub use orchestrator::{AnalysisHandle, Orchestrator};
pub use progress::{ProgressReporter, ProgressState};
