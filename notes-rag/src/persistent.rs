//! File-backed vector store.
//!
//! A collection lives in a single JSON file, `<dir>/<collection>.json`. The
//! whole file is loaded when the store is opened; every mutation rewrites it
//! through a temporary file in the same directory followed by a rename, so a
//! crash mid-write leaves the previous version intact.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::document::{SearchResult, VectorRecord};
use crate::error::{RagError, Result};
use crate::vectorstore::{Collection, VectorStore};

const BACKEND: &str = "File";

/// A [`VectorStore`] persisted as one JSON file per collection.
///
/// Reads are served from memory. Writers hold the lock until the file has
/// been replaced, so the on-disk copy never lags an acknowledged `add`.
///
/// # Example
///
/// ```rust,ignore
/// use notes_rag::FileVectorStore;
///
/// // Ingestion creates the collection if needed.
/// let store = FileVectorStore::create("vectorstore", "appunti_corso").await?;
///
/// // Querying requires it to exist.
/// let store = FileVectorStore::open("vectorstore", "appunti_corso").await?;
/// ```
#[derive(Debug)]
pub struct FileVectorStore {
    name: String,
    path: PathBuf,
    inner: RwLock<Collection>,
}

impl FileVectorStore {
    /// Location of the collection file inside `dir`.
    pub fn collection_path(dir: impl AsRef<Path>, collection: &str) -> PathBuf {
        dir.as_ref().join(format!("{collection}.json"))
    }

    /// Whether a persisted collection exists in `dir`.
    pub fn exists(dir: impl AsRef<Path>, collection: &str) -> bool {
        Self::collection_path(dir, collection).is_file()
    }

    /// Open an existing collection, or create an empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or an existing
    /// collection file cannot be read.
    pub async fn create(dir: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let path = Self::collection_path(&dir, collection);
        if path.is_file() {
            return Self::load(path, collection).await;
        }

        std::fs::create_dir_all(&dir).map_err(|e| {
            error!(
                backend = BACKEND,
                dir = %dir.display(),
                error = %e,
                "cannot create store directory"
            );
            RagError::store(BACKEND, format!("cannot create '{}': {e}", dir.display()))
        })?;

        let store = Self {
            name: collection.to_string(),
            path,
            inner: RwLock::new(Collection::new(collection)),
        };
        let snapshot = store.inner.read().await.clone();
        write_atomically(store.path.clone(), &snapshot).await?;
        info!(backend = BACKEND, collection, path = %store.path.display(), "created collection");
        Ok(store)
    }

    /// Open an existing collection.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the collection does not exist
    /// or its file is unreadable.
    pub async fn open(dir: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let path = Self::collection_path(dir.as_ref(), collection);
        if !path.is_file() {
            return Err(RagError::store(
                BACKEND,
                format!(
                    "collection '{collection}' not found in '{}'; run ingestion first",
                    dir.as_ref().display()
                ),
            ));
        }
        Self::load(path, collection).await
    }

    async fn load(path: PathBuf, collection: &str) -> Result<Self> {
        let read_path = path.clone();
        let bytes = tokio::task::spawn_blocking(move || std::fs::read(read_path))
            .await
            .map_err(|e| RagError::store(BACKEND, format!("load task failed: {e}")))?
            .map_err(|e| {
                RagError::store(BACKEND, format!("cannot read '{}': {e}", path.display()))
            })?;

        let loaded: Collection = serde_json::from_slice(&bytes).map_err(|e| {
            error!(
                backend = BACKEND,
                path = %path.display(),
                error = %e,
                "corrupt collection file"
            );
            RagError::store(BACKEND, format!("corrupt collection file '{}': {e}", path.display()))
        })?;
        let loaded = loaded.reindex();
        info!(backend = BACKEND, collection, records = loaded.len(), "opened collection");

        Ok(Self { name: collection.to_string(), path, inner: RwLock::new(loaded) })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Serialize the collection and replace the file at `path`.
async fn write_atomically(path: PathBuf, collection: &Collection) -> Result<()> {
    let bytes = serde_json::to_vec(collection)
        .map_err(|e| RagError::store(BACKEND, format!("serialization failed: {e}")))?;

    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| RagError::store(BACKEND, format!("write task failed: {e}")))?
    .map_err(|e| {
        error!(backend = BACKEND, error = %e, "failed to persist collection");
        RagError::store(BACKEND, format!("failed to persist collection: {e}"))
    })
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn add(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut guard = self.inner.write().await;
        let mut next = guard.clone();
        next.upsert(BACKEND, records)?;
        write_atomically(self.path.clone(), &next).await?;
        *guard = next;
        debug!(backend = BACKEND, added = records.len(), total = guard.len(), "records stored");
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        self.inner.read().await.search(BACKEND, embedding, top_k)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().await.len())
    }

    async fn reset(&self) -> Result<()> {
        let mut guard = self.inner.write().await;
        let mut next = guard.clone();
        next.clear();
        write_atomically(self.path.clone(), &next).await?;
        *guard = next;
        info!(backend = BACKEND, collection = %self.name, "collection reset");
        Ok(())
    }

    fn collection(&self) -> &str {
        &self.name
    }
}
