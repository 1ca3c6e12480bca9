//! Local multilingual sentence encoder backed by `fastembed`.
//!
//! This module is only available when the `fastembed` feature is enabled.
//! The ONNX model is downloaded on first use and cached by `fastembed`.

use std::sync::Arc;

use async_trait::async_trait;
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, error, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const PROVIDER: &str = "fastembed";

/// Output length of `paraphrase-multilingual-MiniLM-L12-v2`.
pub const MINILM_DIMENSIONS: usize = 384;

/// An [`EmbeddingProvider`] running `paraphrase-multilingual-MiniLM-L12-v2`
/// in-process.
///
/// Inference is CPU-bound, so every call is moved onto the blocking pool.
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    batch_size: Option<usize>,
}

impl FastEmbedProvider {
    /// Load the multilingual MiniLM encoder.
    ///
    /// Blocks while the model is fetched or read from the local cache; call it
    /// from [`tokio::task::spawn_blocking`] inside async code, or use
    /// [`FastEmbedProvider::load`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the model cannot be loaded.
    pub fn new() -> Result<Self> {
        let options = InitOptions::new(EmbeddingModel::ParaphraseMLMiniLML12V2)
            .with_show_download_progress(false);
        let model = TextEmbedding::try_new(options).map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to load embedding model");
            RagError::embedding(PROVIDER, format!("failed to load model: {e}"))
        })?;
        info!(provider = PROVIDER, dimensions = MINILM_DIMENSIONS, "embedding model loaded");
        Ok(Self { model: Arc::new(model), batch_size: None })
    }

    /// Load the encoder on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if loading fails or the loader task panics.
    pub async fn load() -> Result<Self> {
        tokio::task::spawn_blocking(Self::new)
            .await
            .map_err(|e| RagError::embedding(PROVIDER, format!("model loader panicked: {e}")))?
    }

    /// Set the internal batch size passed to the ONNX runtime.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::embedding(PROVIDER, "model returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = PROVIDER, batch_size = texts.len(), "embedding batch");

        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        let batch_size = self.batch_size;
        let expected = owned.len();

        let embeddings = tokio::task::spawn_blocking(move || model.embed(owned, batch_size))
            .await
            .map_err(|e| RagError::embedding(PROVIDER, format!("embedding task panicked: {e}")))?
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "embedding failed");
                RagError::embedding(PROVIDER, e.to_string())
            })?;

        if embeddings.len() != expected {
            return Err(RagError::embedding(
                PROVIDER,
                format!("expected {expected} embeddings, got {}", embeddings.len()),
            ));
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        MINILM_DIMENSIONS
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
