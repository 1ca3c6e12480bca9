//! Turns parsed arguments into library configuration.

use anyhow::{Context, Result, bail};
use notes_rag::{
    EmbeddingBackend, GenerationConfig, LocalLoader, RagConfig, StoreBackend, TextExtractor,
};

use crate::cli::{EmbedderKind, GlobalArgs};

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: RagConfig,
    pub embedding: EmbeddingBackend,
    pub api_key: Option<String>,
    qdrant_url: Option<String>,
}

impl Settings {
    /// Validate `args` and build the library configuration.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the `openai` embedder is
    /// selected without an API key.
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let generation = GenerationConfig {
            base_url: args.api_base.clone(),
            model: args.model.clone(),
            ..GenerationConfig::default()
        };
        let config = RagConfig::builder()
            .top_k(args.top_k)
            .vectorstore_dir(&args.vectorstore_dir)
            .collection(&args.collection)
            .ocr_languages(&args.ocr_languages)
            .generation(generation)
            .build()
            .context("invalid configuration")?;

        let embedding = match args.embedder {
            EmbedderKind::Fastembed => EmbeddingBackend::FastEmbed,
            EmbedderKind::Openai => {
                let Some(api_key) = non_empty(args.embedding_api_key.as_deref()) else {
                    bail!("the openai embedder needs --embedding-api-key or OPENAI_API_KEY");
                };
                EmbeddingBackend::OpenAi {
                    api_key,
                    base_url: args.embedding_base_url.clone(),
                    model: args.embedding_model.clone(),
                }
            }
        };

        Ok(Self {
            config,
            embedding,
            api_key: non_empty(args.api_key.as_deref()),
            qdrant_url: non_empty(args.qdrant_url.as_deref()),
        })
    }

    /// A loader for the configured backends. With `create` off, a missing
    /// local collection is an error.
    pub fn loader(&self, create: bool) -> LocalLoader {
        let store = match &self.qdrant_url {
            Some(url) => StoreBackend::Qdrant { url: url.clone() },
            None => StoreBackend::File { dir: self.config.vectorstore_dir.clone(), create },
        };
        LocalLoader {
            embedding: self.embedding.clone(),
            store,
            collection: self.config.collection.clone(),
        }
    }

    /// The text extractor for this build and language set.
    pub fn extractor(&self) -> TextExtractor {
        TextExtractor::for_languages(&self.config.ocr_languages)
    }

    /// The chat API key.
    ///
    /// # Errors
    ///
    /// Fails when no key was given on the command line, in the environment
    /// or in `.env`.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("GROQ_API_KEY not set; pass --api-key or add it to .env")
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
