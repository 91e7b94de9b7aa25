//! Application state for the API server.

use copilot_common::{AnalysisRequest, Result};
use copilot_orchestrator::{AnalysisHandle, Orchestrator, OrchestratorConfig, ProgressState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(600);
const DEFAULT_MAX_RUNNING: usize = 64;

/// A background analysis awaiting its caller.
struct TrackedAnalysis {
    handle: AnalysisHandle,
    started_at: Instant,
}

/// Answer to a request to start a background analysis.
#[derive(Debug)]
pub enum Admission {
    Started(String),
    /// `max_running` analyses are already in flight.
    AtCapacity,
}

/// What a caller polling an analysis gets back.
pub enum Claim {
    Running(ProgressState),
    /// The analysis finished; its entry has been released.
    Finished(AnalysisHandle),
}

/// Shared application state for the API server.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,

    analyses: RwLock<HashMap<String, TrackedAnalysis>>,

    /// Finished analyses nobody claimed are dropped after this long
    result_ttl: Duration,

    /// Background analyses allowed in flight at once
    max_running: usize,

    /// Server start time (for health checks)
    pub start_time: Instant,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            analyses: RwLock::new(HashMap::new()),
            result_ttl: DEFAULT_RESULT_TTL,
            max_running: DEFAULT_MAX_RUNNING,
            start_time: Instant::now(),
        }
    }

    pub fn from_config(config: &OrchestratorConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(Orchestrator::from_config(config)?)))
    }

    pub fn with_result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl = ttl;
        self
    }

    pub fn with_max_running(mut self, max_running: usize) -> Self {
        self.max_running = max_running.max(1);
        self
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Start and track a background analysis unless too many are running.
    ///
    /// Invalid requests fail with `InvalidRequest` before anything is spawned.
    pub async fn start(&self, request: &AnalysisRequest) -> Result<Admission> {
        let mut analyses = self.analyses.write().await;
        self.evict_expired(&mut analyses);

        let running = analyses
            .values()
            .filter(|tracked| !tracked.handle.is_finished())
            .count();
        if running >= self.max_running {
            warn!(running, max_running = self.max_running, "Background analysis limit reached");
            return Ok(Admission::AtCapacity);
        }

        let handle = self.orchestrator.start(request, self.orchestrator.deadline())?;
        let request_id = handle.request_id.clone();
        analyses.insert(
            request_id.clone(),
            TrackedAnalysis {
                handle,
                started_at: Instant::now(),
            },
        );
        Ok(Admission::Started(request_id))
    }

    pub async fn progress(&self, request_id: &str) -> Option<ProgressState> {
        self.analyses
            .read()
            .await
            .get(request_id)
            .map(|tracked| tracked.handle.progress.snapshot())
    }

    /// Poll an analysis, releasing it once finished.
    pub async fn claim(&self, request_id: &str) -> Option<Claim> {
        let mut analyses = self.analyses.write().await;
        self.evict_expired(&mut analyses);

        let tracked = analyses.get(request_id)?;
        if !tracked.handle.is_finished() {
            return Some(Claim::Running(tracked.handle.progress.snapshot()));
        }

        analyses
            .remove(request_id)
            .map(|tracked| Claim::Finished(tracked.handle))
    }

    pub async fn tracked_count(&self) -> usize {
        self.analyses.read().await.len()
    }

    fn evict_expired(&self, analyses: &mut HashMap<String, TrackedAnalysis>) {
        let ttl = self.result_ttl;
        analyses.retain(|request_id, tracked| {
            let keep = !tracked.handle.is_finished() || tracked.started_at.elapsed() < ttl;
            if !keep {
                debug!(request_id = %request_id, "Evicting unclaimed analysis");
            }
            keep
        });
    }
}
