//! Top-k retrieval: embed the question, search the store, assemble context.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error};

use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::vectorstore::VectorStore;

/// Source label used when a record has no recorded document name.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Separator between chunk texts in the assembled context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// The outcome of one retrieval.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    /// Retrieved chunk texts in rank order, separated by a blank line.
    pub context: String,
    /// Distinct document names among the hits.
    pub sources: BTreeSet<String>,
    /// The raw hits, best first.
    pub hits: Vec<SearchResult>,
}

impl Retrieval {
    /// Assemble context and sources from ranked hits.
    pub fn from_hits(hits: Vec<SearchResult>) -> Self {
        let context = hits
            .iter()
            .map(|hit| hit.record.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);
        let sources = hits
            .iter()
            .map(|hit| match hit.record.metadata.source.trim() {
                "" => UNKNOWN_SOURCE.to_string(),
                source => source.to_string(),
            })
            .collect();
        Self { context, sources, hits }
    }

    /// True when nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Combines an [`EmbeddingProvider`] and a [`VectorStore`] to fetch context
/// for a question.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever returning `top_k` chunks per question.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        top_k: usize,
    ) -> Self {
        Self { embedder, store, top_k }
    }

    /// Retrieve the configured number of chunks for `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query or searching the store fails.
    pub async fn retrieve(&self, query: &str) -> Result<Retrieval> {
        self.retrieve_k(query, self.top_k).await
    }

    /// Retrieve up to `k` chunks for `query`.
    ///
    /// No similarity threshold is applied. An empty collection short-circuits
    /// to an empty [`Retrieval`] without embedding the query.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the query or searching the store fails.
    pub async fn retrieve_k(&self, query: &str, k: usize) -> Result<Retrieval> {
        if k == 0 || self.store.count().await? == 0 {
            debug!(collection = self.store.collection(), "nothing to retrieve");
            return Ok(Retrieval::default());
        }

        let embedding = self.embedder.embed(query).await.map_err(|e| {
            error!(provider = self.embedder.name(), error = %e, "failed to embed query");
            e
        })?;
        let hits = self.store.query(&embedding, k).await.map_err(|e| {
            error!(collection = self.store.collection(), error = %e, "vector search failed");
            e
        })?;

        debug!(query_len = query.len(), hits = hits.len(), "retrieval complete");
        Ok(Retrieval::from_hits(hits))
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }
}
