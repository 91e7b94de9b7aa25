//! Concurrent dispatch and aggregation of the three analysis agents.

use crate::config::OrchestratorConfig;
use crate::progress::ProgressReporter;
use copilot_agents::{Agent, CrmInfoAgent, CustomerStoryAgent, EngineerFeedbackAgent};
use copilot_common::{
    AgentOutcome, AgentRole, AnalysisInput, AnalysisRequest, CopilotError, CrmInfo,
    CustomerStory, EngineerFeedback, ErrorKind, Report, Result,
};
use copilot_llm::build_llm_client;
use copilot_records::build_record_store;
use copilot_retrieval::build_retriever;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Dispatches one request to every agent and assembles the [`Report`].
///
/// The orchestrator owns progress and aggregation; agents only hand their
/// outcomes back. It never retries an agent.
pub struct Orchestrator {
    engineer: Arc<dyn Agent<Output = EngineerFeedback>>,
    story: Arc<dyn Agent<Output = CustomerStory>>,
    crm: Arc<dyn Agent<Output = CrmInfo>>,
    deadline: Duration,
    agent_timeout: Option<Duration>,
}

/// A request running in the background.
pub struct AnalysisHandle {
    pub request_id: String,
    pub progress: ProgressReporter,
    task: JoinHandle<Result<Report>>,
}

impl AnalysisHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the report.
    pub async fn join(self) -> Result<Report> {
        self.task
            .await
            .map_err(|e| CopilotError::Internal(format!("analysis task failed: {e}")))?
    }
}

impl Orchestrator {
    pub fn new(
        engineer: Arc<dyn Agent<Output = EngineerFeedback>>,
        story: Arc<dyn Agent<Output = CustomerStory>>,
        crm: Arc<dyn Agent<Output = CrmInfo>>,
    ) -> Self {
        Self {
            engineer,
            story,
            crm,
            deadline: DEFAULT_DEADLINE,
            agent_timeout: None,
        }
    }

    /// Default overall deadline used by callers that don't pass one.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_agent_timeout(mut self, agent_timeout: Option<Duration>) -> Self {
        self.agent_timeout = agent_timeout;
        self
    }

    /// Wire real collaborators from configuration.
    pub fn from_config(config: &OrchestratorConfig) -> Result<Self> {
        let llm = build_llm_client(&config.llm)?;

        let mut story = CustomerStoryAgent::new(Arc::clone(&llm), &config.agents);
        if let Some(retriever) = build_retriever(&config.retrieval)? {
            story = story.with_retriever(retriever, config.retrieval.max_context_tokens);
        }

        let engineer = EngineerFeedbackAgent::new(llm, &config.agents);
        let crm = CrmInfoAgent::new(build_record_store(&config.records)?);

        Ok(Self::new(Arc::new(engineer), Arc::new(story), Arc::new(crm))
            .with_deadline(config.deadline())
            .with_agent_timeout(config.agent_timeout()))
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Analyze one request, returning once every agent has settled or the
    /// deadline has passed.
    ///
    /// Fails with `InvalidRequest` before any agent runs, or with
    /// `AllAgentsFailed` when no agent produced a value.
    pub async fn analyze(&self, request: &AnalysisRequest, deadline: Duration) -> Result<Report> {
        self.analyze_with_progress(request, deadline, &ProgressReporter::new())
            .await
    }

    /// [`Orchestrator::analyze`] publishing per-agent settlement to `progress`.
    pub async fn analyze_with_progress(
        &self,
        request: &AnalysisRequest,
        deadline: Duration,
        progress: &ProgressReporter,
    ) -> Result<Report> {
        let input = decode(request)?;
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("analysis", request_id = %request_id);

        self.run(request_id, Arc::new(input), deadline, progress.clone())
            .instrument(span)
            .await
    }

    /// Validate synchronously, then run the analysis on a background task.
    pub fn start(self: &Arc<Self>, request: &AnalysisRequest, deadline: Duration) -> Result<AnalysisHandle> {
        let input = decode(request)?;
        let request_id = Uuid::new_v4().to_string();
        let progress = ProgressReporter::new();
        let span = info_span!("analysis", request_id = %request_id);

        let this = Arc::clone(self);
        let (id, reporter) = (request_id.clone(), progress.clone());
        let task = tokio::spawn(
            async move { this.run(id, Arc::new(input), deadline, reporter).await }.instrument(span),
        );

        Ok(AnalysisHandle {
            request_id,
            progress,
            task,
        })
    }

    async fn run(
        &self,
        request_id: String,
        input: Arc<AnalysisInput>,
        deadline: Duration,
        progress: ProgressReporter,
    ) -> Result<Report> {
        let started = Instant::now();
        let deadline_at = started + deadline;
        let agent_timeout = self.agent_timeout.map_or(deadline, |cap| cap.min(deadline));

        info!(
            transcript_len = input.transcript.len(),
            notes_len = input.notes.len(),
            has_record_id = !input.record_id.is_empty(),
            deadline_ms = deadline.as_millis() as u64,
            "Starting analysis"
        );

        let crm = spawn_agent(Arc::clone(&self.crm), &request_id, Arc::clone(&input), agent_timeout);
        let story = spawn_agent(Arc::clone(&self.story), &request_id, Arc::clone(&input), agent_timeout);
        let engineer = spawn_agent(Arc::clone(&self.engineer), &request_id, input, agent_timeout);

        let (crm_info, customer_story, engineer_feedback) = tokio::join!(
            settle(AgentRole::CrmInfo, crm, deadline_at, &progress),
            settle(AgentRole::CustomerStory, story, deadline_at, &progress),
            settle(AgentRole::EngineerFeedback, engineer, deadline_at, &progress),
        );

        let elapsed_ms = started.elapsed().as_millis() as u64;

        if let (Some(crm_cause), Some(story_cause), Some(engineer_cause)) = (
            crm_info.cause(),
            customer_story.cause(),
            engineer_feedback.cause(),
        ) {
            error!(elapsed_ms, "All agents failed");
            return Err(CopilotError::AllAgentsFailed {
                crm_info: crm_cause,
                customer_story: story_cause,
                engineer_feedback: engineer_cause,
            });
        }

        let report = Report::new(request_id, crm_info, customer_story, engineer_feedback);
        info!(
            elapsed_ms,
            succeeded = report.success_count(),
            "Analysis complete"
        );
        Ok(report)
    }
}

fn decode(request: &AnalysisRequest) -> Result<AnalysisInput> {
    request.decode().inspect_err(|e| {
        warn!(error = %e, "Rejected analysis request");
    })
}

/// An agent task that is aborted when dropped, so a caller that stops
/// waiting on the analysis also stops its agents.
struct AgentTask<T> {
    handle: JoinHandle<AgentOutcome<T>>,
}

impl<T> Drop for AgentTask<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn spawn_agent<T: Send + 'static>(
    agent: Arc<dyn Agent<Output = T>>,
    request_id: &str,
    input: Arc<AnalysisInput>,
    timeout: Duration,
) -> AgentTask<T> {
    let span = info_span!("agent", request_id = %request_id, agent = %agent.role());
    AgentTask {
        handle: tokio::spawn(async move { agent.run(&input, timeout).await }.instrument(span)),
    }
}

/// Wait for one agent task until the shared deadline. A task still running
/// at the deadline is aborted and its slot is `TimedOut`.
async fn settle<T>(
    role: AgentRole,
    mut task: AgentTask<T>,
    deadline_at: Instant,
    progress: &ProgressReporter,
) -> AgentOutcome<T> {
    let outcome = match tokio::time::timeout_at(deadline_at, &mut task.handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            error!(agent = %role, error = %e, "Agent task panicked");
            AgentOutcome::failure(ErrorKind::Internal, format!("agent task failed: {e}"))
        }
        Err(_) => {
            warn!(agent = %role, "Deadline elapsed, abandoning agent");
            AgentOutcome::TimedOut
        }
    };
    drop(task);

    progress.mark_settled(role);
    debug!(agent = %role, status = outcome.status_label(), "Agent settled");
    outcome
}
