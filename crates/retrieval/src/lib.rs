//! Knowledge retrieval for the customer-story agent.
//!
//! A [`Retriever`] returns passages relevant to a query, ordered most
//! relevant first. Two backends are provided:
//!
//! - [`SearchClient`]: a hosted search index over HTTP
//! - [`InMemoryIndex`]: keyword overlap over seed documents
//!
//! [`ContextBuilder`] renders passages into the prompt context block.

pub mod client;
pub mod config;
pub mod context;
pub mod index;
pub mod search;

pub use client::{Passage, Retriever};
pub use config::{RetrievalConfig, build_retriever};
pub use context::{ContextBuilder, estimate_tokens};
pub use index::InMemoryIndex;
pub use search::SearchClient;
