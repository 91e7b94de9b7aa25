//! Per-request progress surface.

use copilot_common::AgentRole;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Which agents have settled. Each flag flips false to true once and never
/// resets within a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub crm_info: bool,
    pub customer_story: bool,
    pub engineer_feedback: bool,
}

impl ProgressState {
    pub fn is_settled(&self, role: AgentRole) -> bool {
        match role {
            AgentRole::CrmInfo => self.crm_info,
            AgentRole::CustomerStory => self.customer_story,
            AgentRole::EngineerFeedback => self.engineer_feedback,
        }
    }

    pub fn all_settled(&self) -> bool {
        AgentRole::ALL.iter().all(|role| self.is_settled(*role))
    }

    pub fn settled_count(&self) -> usize {
        AgentRole::ALL.iter().filter(|role| self.is_settled(**role)).count()
    }

    /// Returns whether the flag changed.
    fn settle(&mut self, role: AgentRole) -> bool {
        let flag = match role {
            AgentRole::CrmInfo => &mut self.crm_info,
            AgentRole::CustomerStory => &mut self.customer_story,
            AgentRole::EngineerFeedback => &mut self.engineer_feedback,
        };
        !std::mem::replace(flag, true)
    }
}

/// Publishes [`ProgressState`] for one request. Cheap to clone; every clone
/// observes the same state.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Arc<watch::Sender<ProgressState>>,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Flip the flag for `role`. Idempotent.
    pub fn mark_settled(&self, role: AgentRole) {
        self.tx.send_if_modified(|state| state.settle(role));
    }

    pub fn snapshot(&self) -> ProgressState {
        *self.tx.borrow()
    }

    /// Change notifications, for callers that prefer not to poll.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.tx.subscribe()
    }

    /// Resolve once every agent has settled.
    pub async fn wait_all(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(ProgressState::all_settled).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn flags_flip_once() {
        let progress = ProgressReporter::new();
        assert_eq!(progress.snapshot(), ProgressState::default());

        progress.mark_settled(AgentRole::CustomerStory);
        progress.mark_settled(AgentRole::CustomerStory);

        let state = progress.snapshot();
        assert!(state.customer_story);
        assert!(!state.crm_info);
        assert_eq!(state.settled_count(), 1);
    }

    #[test]
    fn serializes_camel_case() {
        let state = ProgressState {
            crm_info: true,
            ..Default::default()
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"crmInfo": true, "customerStory": false, "engineerFeedback": false})
        );
    }

    #[tokio::test]
    async fn subscribers_see_every_change() {
        let progress = ProgressReporter::new();
        let mut rx = progress.subscribe();

        progress.mark_settled(AgentRole::CrmInfo);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().crm_info);

        // No-op settles do not notify.
        progress.mark_settled(AgentRole::CrmInfo);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn wait_all_resolves_after_last_flag() {
        let progress = ProgressReporter::new();
        let waiter = {
            let progress = progress.clone();
            tokio::spawn(async move { progress.wait_all().await })
        };

        for role in AgentRole::ALL {
            tokio::time::sleep(Duration::from_millis(5)).await;
            progress.mark_settled(role);
        }

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(progress.snapshot().all_settled());
    }
}
