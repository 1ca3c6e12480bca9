//! Lazily-initialized, process-wide embedder and vector store.
//!
//! Loading the encoder is slow and the store holds the whole collection in
//! memory, so both are built once and shared as `Arc`s. The cache is only
//! rebuilt after [`ResourceCache::invalidate`], which callers use after an
//! upload has changed the collection.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::persistent::FileVectorStore;
use crate::vectorstore::VectorStore;

/// The embedder and store shared by every component of a process.
#[derive(Clone)]
pub struct SharedResources {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub store: Arc<dyn VectorStore>,
}

/// Builds the shared resources on first use.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Load the embedding model.
    async fn load_embedder(&self) -> Result<Arc<dyn EmbeddingProvider>>;

    /// Open the vector store for embeddings of `dimensions` length.
    async fn load_store(&self, dimensions: usize) -> Result<Arc<dyn VectorStore>>;
}

/// Memoizes [`SharedResources`] produced by a [`ResourceLoader`].
///
/// The embedder is loaded before the store. A failed load leaves the cache
/// empty so the next call retries.
pub struct ResourceCache {
    loader: Arc<dyn ResourceLoader>,
    slot: RwLock<Option<Arc<SharedResources>>>,
}

impl ResourceCache {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self { loader, slot: RwLock::new(None) }
    }

    /// Return the cached resources, loading them if needed.
    ///
    /// # Errors
    ///
    /// Propagates loader errors.
    pub async fn get_or_init(&self) -> Result<Arc<SharedResources>> {
        if let Some(resources) = self.slot.read().await.as_ref() {
            return Ok(Arc::clone(resources));
        }

        let mut slot = self.slot.write().await;
        if let Some(resources) = slot.as_ref() {
            return Ok(Arc::clone(resources));
        }

        let embedder = self.loader.load_embedder().await?;
        let store = self.loader.load_store(embedder.dimensions()).await?;
        info!(embedder = embedder.name(), collection = store.collection(), "resources loaded");

        let resources = Arc::new(SharedResources { embedder, store });
        *slot = Some(Arc::clone(&resources));
        Ok(resources)
    }

    /// Drop the cached resources; the next [`get_or_init`](Self::get_or_init) reloads them.
    pub async fn invalidate(&self) {
        debug!("resource cache invalidated");
        self.slot.write().await.take();
    }

    /// Whether resources are currently cached.
    pub async fn is_loaded(&self) -> bool {
        self.slot.read().await.is_some()
    }
}

/// Which embedding backend a [`LocalLoader`] builds.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingBackend {
    /// In-process multilingual MiniLM (feature `fastembed`).
    FastEmbed,
    /// An OpenAI-compatible embeddings endpoint (feature `openai`).
    OpenAi { api_key: String, base_url: String, model: String },
}

/// Which vector store a [`LocalLoader`] opens.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    /// A JSON collection file in `dir`.
    File {
        dir: PathBuf,
        /// Create the collection when missing. Query paths leave this off so
        /// a missing collection surfaces as "run ingestion first".
        create: bool,
    },
    /// A Qdrant server (feature `qdrant`).
    Qdrant { url: String },
}

/// The [`ResourceLoader`] used by the command-line tools.
#[derive(Debug, Clone)]
pub struct LocalLoader {
    pub embedding: EmbeddingBackend,
    pub store: StoreBackend,
    pub collection: String,
}

#[async_trait]
impl ResourceLoader for LocalLoader {
    async fn load_embedder(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        match &self.embedding {
            #[cfg(feature = "fastembed")]
            EmbeddingBackend::FastEmbed => {
                Ok(Arc::new(crate::minilm::FastEmbedProvider::load().await?))
            }
            #[cfg(not(feature = "fastembed"))]
            EmbeddingBackend::FastEmbed => Err(crate::error::RagError::ConfigError(
                "built without the `fastembed` feature; choose another embedding backend"
                    .to_string(),
            )),
            #[cfg(feature = "openai")]
            EmbeddingBackend::OpenAi { api_key, base_url, model } => Ok(Arc::new(
                crate::openai::OpenAIEmbeddingProvider::new(api_key.clone())?
                    .with_base_url(base_url.clone())
                    .with_model(model.clone()),
            )),
            #[cfg(not(feature = "openai"))]
            EmbeddingBackend::OpenAi { .. } => Err(crate::error::RagError::ConfigError(
                "built without the `openai` feature".to_string(),
            )),
        }
    }

    async fn load_store(&self, dimensions: usize) -> Result<Arc<dyn VectorStore>> {
        match &self.store {
            StoreBackend::File { dir, create: true } => {
                Ok(Arc::new(FileVectorStore::create(dir, &self.collection).await?))
            }
            StoreBackend::File { dir, create: false } => {
                Ok(Arc::new(FileVectorStore::open(dir, &self.collection).await?))
            }
            #[cfg(feature = "qdrant")]
            StoreBackend::Qdrant { url } => Ok(Arc::new(
                crate::qdrant::QdrantVectorStore::connect(url, &self.collection, dimensions)
                    .await?,
            )),
            #[cfg(not(feature = "qdrant"))]
            StoreBackend::Qdrant { url } => {
                let _ = dimensions;
                Err(crate::error::RagError::ConfigError(format!(
                    "built without the `qdrant` feature; cannot connect to {url}"
                )))
            }
        }
    }
}
