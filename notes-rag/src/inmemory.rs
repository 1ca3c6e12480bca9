//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] keeps one collection behind a
//! `tokio::sync::RwLock`. Nothing is persisted; it is meant for tests and
//! throwaway sessions.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::DEFAULT_COLLECTION;
use crate::document::{SearchResult, VectorRecord};
use crate::error::Result;
use crate::vectorstore::{Collection, VectorStore};

const BACKEND: &str = "InMemory";

/// An ephemeral [`VectorStore`] bound to one collection.
///
/// # Example
///
/// ```rust,ignore
/// use notes_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new("appunti_corso");
/// assert_eq!(store.count().await?, 0);
/// ```
#[derive(Debug)]
pub struct InMemoryVectorStore {
    name: String,
    inner: RwLock<Collection>,
}

impl InMemoryVectorStore {
    /// Create a new empty store for the named collection.
    pub fn new(collection: impl Into<String>) -> Self {
        let name = collection.into();
        Self { inner: RwLock::new(Collection::new(name.clone())), name }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION)
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(&self, records: &[VectorRecord]) -> Result<()> {
        self.inner.write().await.upsert(BACKEND, records)
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        self.inner.read().await.search(BACKEND, embedding, top_k)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().await.len())
    }

    async fn reset(&self) -> Result<()> {
        self.inner.write().await.clear();
        Ok(())
    }

    fn collection(&self) -> &str {
        &self.name
    }
}
