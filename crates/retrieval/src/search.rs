//! HTTP search-index client.

use crate::client::{Passage, Retriever};
use async_trait::async_trait;
use copilot_common::{CopilotError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SEARCH_API_VERSION: &str = "2023-11-01";

#[derive(Serialize)]
struct SearchRequest<'a> {
    search: &'a str,
    top: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "@search.score", default)]
    score: f32,
}

/// Client for an Azure-AI-Search-style index:
/// `POST {endpoint}/indexes/{index}/docs/search?api-version=...`.
pub struct SearchClient {
    endpoint: String,
    index: String,
    api_key: Option<String>,
    top_k: usize,
    http_client: reqwest::Client,
}

impl SearchClient {
    pub fn new(
        endpoint: impl Into<String>,
        index: impl Into<String>,
        api_key: Option<String>,
        top_k: usize,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            index: index.into(),
            api_key,
            top_k,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CopilotError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.endpoint, self.index, SEARCH_API_VERSION
        )
    }
}

#[async_trait]
impl Retriever for SearchClient {
    async fn query(&self, text: &str) -> Result<Vec<Passage>> {
        let body = SearchRequest {
            search: text,
            top: self.top_k,
        };

        let mut http_req = self.http_client.post(self.search_url()).json(&body);
        if let Some(ref key) = self.api_key {
            http_req = http_req.header("api-key", key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| CopilotError::Transient(format!("Search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(CopilotError::Transient(format!(
                "Search API error {status}: {body_text}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| CopilotError::Transient(format!("Failed to parse search response: {e}")))?;

        let passages: Vec<Passage> = parsed
            .value
            .into_iter()
            .filter_map(|hit| {
                let content = hit.content.filter(|c| !c.trim().is_empty())?;
                Some(Passage {
                    content,
                    source: hit.title.or(hit.id),
                    score: hit.score,
                })
            })
            .collect();

        debug!(index = %self.index, results = passages.len(), "Search completed");

        Ok(passages)
    }
}
