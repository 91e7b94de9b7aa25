//! Retrieval configuration.

use crate::client::{Passage, Retriever};
use crate::index::InMemoryIndex;
use crate::search::SearchClient;
use copilot_common::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Search service endpoint. Without one, `documents` are served from memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default = "default_index")]
    pub index: String,

    /// Falls back to SEARCH_API_KEY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Maximum passages per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Token budget for the rendered context block
    #[serde(default = "default_max_context")]
    pub max_context_tokens: usize,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Seed passages for the in-memory index
    #[serde(default)]
    pub documents: Vec<Passage>,
}

fn default_index() -> String {
    "customer-knowledge".into()
}

fn default_top_k() -> usize {
    5
}

fn default_max_context() -> usize {
    1024
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            index: default_index(),
            api_key: None,
            top_k: default_top_k(),
            max_context_tokens: default_max_context(),
            timeout_ms: default_timeout_ms(),
            documents: Vec::new(),
        }
    }
}

impl RetrievalConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("SEARCH_API_KEY").ok())
    }
}

/// Build the configured retriever, or `None` when retrieval is disabled
/// (no endpoint and no seed documents).
pub fn build_retriever(config: &RetrievalConfig) -> Result<Option<Arc<dyn Retriever>>> {
    if let Some(ref endpoint) = config.endpoint {
        info!(endpoint = %endpoint, index = %config.index, "Using search service for retrieval");
        let client = SearchClient::new(
            endpoint.clone(),
            config.index.clone(),
            config.resolve_api_key(),
            config.top_k,
        )
        .with_timeout(Duration::from_millis(config.timeout_ms))?;
        return Ok(Some(Arc::new(client)));
    }

    if config.documents.is_empty() {
        info!("Retrieval disabled");
        return Ok(None);
    }

    info!(documents = config.documents.len(), "Using in-memory retrieval index");
    Ok(Some(Arc::new(InMemoryIndex::with_documents(
        config.top_k,
        config.documents.clone(),
    ))))
}
