//! Vector store trait and the shared brute-force collection used by the
//! local backends.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{SearchResult, VectorRecord};
use crate::error::{RagError, Result};

/// A persistence backend bound to one named collection of [`VectorRecord`]s.
///
/// Adding a record whose id already exists replaces it (upsert). Query
/// results are ordered by descending cosine similarity; equal scores keep
/// insertion order.
///
/// # Example
///
/// ```rust,ignore
/// use notes_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new("appunti_corso");
/// store.add(&records).await?;
/// let hits = store.query(&query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace records.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if a record's dimension does not
    /// match the collection or the backend cannot persist the change. No
    /// record of a rejected batch is stored.
    async fn add(&self, records: &[VectorRecord]) -> Result<()>;

    /// Return at most `top_k` records most similar to `embedding`.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;

    /// Number of records in the collection.
    async fn count(&self) -> Result<usize>;

    /// Delete every record in the collection.
    async fn reset(&self) -> Result<()>;

    /// The collection this store is bound to.
    fn collection(&self) -> &str;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// An ordered set of records with an id index, scanned linearly on query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Collection {
    pub(crate) name: String,
    pub(crate) dimensions: Option<usize>,
    records: Vec<VectorRecord>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl Collection {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Restore the id index after deserialization.
    pub(crate) fn reindex(mut self) -> Self {
        self.positions =
            self.records.iter().enumerate().map(|(pos, r)| (r.id.clone(), pos)).collect();
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
        self.positions.clear();
        self.dimensions = None;
    }

    pub(crate) fn upsert(&mut self, backend: &str, records: &[VectorRecord]) -> Result<()> {
        let mut dimensions = self.dimensions;
        for record in records {
            if record.embedding.is_empty() {
                return Err(RagError::store(
                    backend,
                    format!("record '{}' has an empty embedding", record.id),
                ));
            }
            match dimensions {
                Some(dims) if dims != record.embedding.len() => {
                    return Err(RagError::store(
                        backend,
                        format!(
                            "record '{}' has dimension {}, collection '{}' expects {dims}",
                            record.id,
                            record.embedding.len(),
                            self.name
                        ),
                    ));
                }
                Some(_) => {}
                None => dimensions = Some(record.embedding.len()),
            }
        }

        self.dimensions = dimensions;
        for record in records {
            match self.positions.get(&record.id) {
                Some(&pos) => self.records[pos] = record.clone(),
                None => {
                    self.positions.insert(record.id.clone(), self.records.len());
                    self.records.push(record.clone());
                }
            }
        }
        Ok(())
    }

    pub(crate) fn search(
        &self,
        backend: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        if let Some(dims) = self.dimensions.filter(|&d| d != embedding.len()) {
            return Err(RagError::store(
                backend,
                format!(
                    "query has dimension {}, collection '{}' expects {dims}",
                    embedding.len(),
                    self.name
                ),
            ));
        }

        let mut scored: Vec<SearchResult> = self
            .records
            .iter()
            .map(|record| SearchResult {
                score: cosine_similarity(&record.embedding, embedding),
                record: record.clone(),
            })
            .collect();

        // sort_by is stable, so equal scores stay in insertion order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}
