//! In-process keyword index.

use crate::client::{Passage, Retriever};
use async_trait::async_trait;
use copilot_common::Result;
use std::collections::HashSet;
use tracing::debug;

/// Keyword-overlap retriever held entirely in memory.
///
/// Useful for local runs and tests where no search service is deployed.
pub struct InMemoryIndex {
    documents: Vec<Passage>,
    top_k: usize,
}

impl InMemoryIndex {
    pub fn with_documents(top_k: usize, documents: Vec<Passage>) -> Self {
        Self { documents, top_k }
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl Retriever for InMemoryIndex {
    async fn query(&self, text: &str) -> Result<Vec<Passage>> {
        let query_terms = terms(text);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<Passage> = self
            .documents
            .iter()
            .filter_map(|doc| {
                let hits = terms(&doc.content).intersection(&query_terms).count();
                (hits > 0).then(|| Passage {
                    score: hits as f32 / query_terms.len() as f32,
                    ..doc.clone()
                })
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(self.top_k);

        debug!(
            query_terms = query_terms.len(),
            results = results.len(),
            "Searched in-memory index"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ranks_by_term_overlap() {
        let index = InMemoryIndex::with_documents(
            5,
            vec![
                Passage::new("Billing export failed for invoices"),
                Passage::new("Latency improvements shipped in the edge cache").with_source("kb-17"),
                Passage::new("Edge cache latency regression last quarter"),
            ],
        );

        let results = index.query("customer praised latency of edge cache").await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        assert!(results.iter().all(|p| p.content.to_lowercase().contains("latency")));
    }

    #[tokio::test]
    async fn respects_top_k_and_empty_queries() {
        let index = InMemoryIndex::with_documents(
            1,
            vec![
                Passage::new("rate limits on the API"),
                Passage::new("API documentation gaps"),
            ],
        );

        assert_eq!(index.query("api").await.unwrap().len(), 1);
        assert!(index.query("?!").await.unwrap().is_empty());
    }
}
