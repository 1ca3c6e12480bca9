//! Error types for the `notes-rag` crate.

use thiserror::Error;

/// Errors that can occur across ingestion, retrieval and generation.
#[derive(Debug, Error)]
pub enum RagError {
    /// A source document could not be turned into text.
    ///
    /// Ingestion logs this and skips the document; it never aborts a batch.
    #[error("Extraction error ({document}): {message}")]
    ExtractionError {
        /// Name of the document that failed.
        document: String,
        /// A description of the failure.
        message: String,
    },

    /// The chunker was configured with an unusable window.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The hosted chat-completion call failed.
    ///
    /// The answer generator converts this into an inline message instead of
    /// returning it to the session.
    #[error("Generation error ({model}): {message}")]
    GenerationError {
        /// The model identifier the request was sent to.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the ingestion or retrieval orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// A filesystem error outside any specific backend.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Build a [`RagError::VectorStoreError`] for the given backend.
    pub(crate) fn store(backend: &str, message: impl Into<String>) -> Self {
        Self::VectorStoreError { backend: backend.to_string(), message: message.into() }
    }

    /// Build a [`RagError::EmbeddingError`] for the given provider.
    pub(crate) fn embedding(provider: &str, message: impl Into<String>) -> Self {
        Self::EmbeddingError { provider: provider.to_string(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
