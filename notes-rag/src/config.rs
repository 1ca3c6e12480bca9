//! Configuration for ingestion, retrieval and answer generation.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// The fixed collection identifier used for the notes corpus.
pub const DEFAULT_COLLECTION: &str = "appunti_corso";

/// Base URL of the hosted, OpenAI-compatible chat-completion service.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

/// The default generation model.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Models the console offers for switching.
pub const AVAILABLE_MODELS: &[&str] =
    &["llama-3.3-70b-versatile", "llama-3.1-8b-instant", "mixtral-8x7b-32768"];

/// Extensions picked up by folder ingestion.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "bmp", "tiff", "txt"];

/// Extensions accepted by the single-file upload path.
pub const UPLOAD_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// Settings for the hosted chat-completion call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// Base URL of the OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Bounded wait for one completion request, in seconds.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: GROQ_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl GenerationConfig {
    /// The request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration parameters for the notes assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Window size in words for folder ingestion.
    pub chunk_size: usize,
    /// Words shared between consecutive folder-ingestion chunks.
    pub chunk_overlap: usize,
    /// Maximum chunk size in characters for uploaded files.
    pub upload_chunk_size: usize,
    /// Characters carried over between consecutive upload chunks.
    pub upload_chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Number of chunk texts sent to the embedder per call.
    pub embed_batch_size: usize,
    /// Directory holding the persisted collection.
    pub vectorstore_dir: PathBuf,
    /// Collection name inside `vectorstore_dir`.
    pub collection: String,
    /// Tesseract language set used for OCR.
    pub ocr_languages: String,
    /// Chat-completion settings.
    pub generation: GenerationConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
            upload_chunk_size: 1000,
            upload_chunk_overlap: 200,
            top_k: 3,
            embed_batch_size: 32,
            vectorstore_dir: PathBuf::from("vectorstore"),
            collection: DEFAULT_COLLECTION.to_string(),
            ocr_languages: "ita+eng".to_string(),
            generation: GenerationConfig::default(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - a chunk size is zero, or an overlap is not smaller than its chunk size
    /// - `top_k == 0` or `embed_batch_size == 0`
    /// - the collection name is empty
    /// - the temperature is outside `0.0..=2.0`
    pub fn validate(&self) -> Result<()> {
        check_window("chunk", self.chunk_size, self.chunk_overlap)?;
        check_window("upload_chunk", self.upload_chunk_size, self.upload_chunk_overlap)?;
        if self.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.embed_batch_size == 0 {
            return Err(RagError::ConfigError(
                "embed_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::ConfigError("collection name must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(RagError::ConfigError(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.generation.temperature
            )));
        }
        Ok(())
    }
}

fn check_window(name: &str, size: usize, overlap: usize) -> Result<()> {
    if size == 0 {
        return Err(RagError::ConfigError(format!("{name}_size must be greater than zero")));
    }
    if overlap >= size {
        return Err(RagError::ConfigError(format!(
            "{name}_overlap ({overlap}) must be less than {name}_size ({size})"
        )));
    }
    Ok(())
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the folder-ingestion window size in words.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the folder-ingestion overlap in words.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the upload chunk size in characters.
    pub fn upload_chunk_size(mut self, size: usize) -> Self {
        self.config.upload_chunk_size = size;
        self
    }

    /// Set the upload overlap in characters.
    pub fn upload_chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.upload_chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set how many texts go to the embedder per call.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Set the directory holding the persisted collection.
    pub fn vectorstore_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.vectorstore_dir = dir.into();
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the Tesseract language set (e.g. `ita+eng`).
    pub fn ocr_languages(mut self, languages: impl Into<String>) -> Self {
        self.config.ocr_languages = languages.into();
        self
    }

    /// Replace the generation settings.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    /// Set the generation model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
