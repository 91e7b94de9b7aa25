//! Retrieval contract.

use async_trait::async_trait;
use copilot_common::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One retrieved piece of prior knowledge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,

    /// Where the passage came from (document title, URL, id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Relevance score, higher is better
    #[serde(default)]
    pub score: f32,
}

impl Passage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: None,
            score: 0.0,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Search over prior customer and engineering knowledge.
///
/// Results are ordered most relevant first. Failures are `Transient`.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn query(&self, text: &str) -> Result<Vec<Passage>>;
}

#[async_trait]
impl<T: Retriever + ?Sized> Retriever for Arc<T> {
    async fn query(&self, text: &str) -> Result<Vec<Passage>> {
        (**self).query(text).await
    }
}
