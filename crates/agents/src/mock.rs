//! Scripted collaborators for unit tests.

use async_trait::async_trait;
use copilot_common::{CopilotError, Result};
use copilot_llm::{LlmClient, LlmRequest, LlmResponse};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Replays scripted completion results in order; the last one repeats.
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Result<String>>>,
    last: Mutex<Option<LlmRequest>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(script: Vec<Result<String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(content: &str) -> Self {
        Self::new(vec![Ok(content.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<LlmRequest> {
        self.last.lock().unwrap().clone()
    }
}

fn replay(result: &Result<String>) -> Result<String> {
    match result {
        Ok(s) => Ok(s.clone()),
        Err(CopilotError::Transient(m)) => Err(CopilotError::Transient(m.clone())),
        Err(CopilotError::Throttled {
            message,
            retry_after,
        }) => Err(CopilotError::Throttled {
            message: message.clone(),
            retry_after: *retry_after,
        }),
        Err(CopilotError::Rejected(m)) => Err(CopilotError::Rejected(m.clone())),
        Err(e) => Err(CopilotError::MalformedResponse(e.to_string())),
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(request);

        let next = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().map(replay)
            }
        };
        let content = next.unwrap_or_else(|| Ok(String::new()))?;

        Ok(LlmResponse {
            content,
            model: "scripted".into(),
            usage: None,
            finish_reason: Some("stop".into()),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
