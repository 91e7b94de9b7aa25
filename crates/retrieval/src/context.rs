//! Rendering retrieved passages into prompt context.

use crate::client::Passage;
use tracing::debug;

/// Formats passages for a prompt within a token budget.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    max_context_tokens: usize,
}

impl ContextBuilder {
    pub fn new(max_context_tokens: usize) -> Self {
        Self { max_context_tokens }
    }

    /// Build a context block, most relevant passages first. Returns an empty
    /// string when nothing fits or nothing was retrieved.
    pub fn build(&self, passages: &[Passage]) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut token_count = 0;

        for passage in passages {
            let part = format_passage(passage);
            let tokens = estimate_tokens(&part);
            if token_count + tokens > self.max_context_tokens {
                break;
            }
            // Avoid duplicates
            if !parts.contains(&part) {
                parts.push(part);
                token_count += tokens;
            }
        }

        if parts.is_empty() {
            return String::new();
        }

        debug!(
            passage_count = parts.len(),
            estimated_tokens = token_count,
            "Built retrieval context"
        );

        format!(
            "Relevant Context from Knowledge Base:\n{}",
            parts.join("\n")
        )
    }
}

fn format_passage(passage: &Passage) -> String {
    match passage.source {
        Some(ref source) => format!("- [{}] {}", source, passage.content.trim()),
        None => format!("- {}", passage.content.trim()),
    }
}

/// Rough estimate: ~4 chars per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}
