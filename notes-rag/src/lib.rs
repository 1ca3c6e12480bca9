//! Retrieval-augmented question answering over a corpus of course notes.
//!
//! This crate provides:
//! - Text extraction from PDFs, plain text and images (OCR behind the `ocr` feature)
//! - Word-window and recursive character chunking
//! - Embedding providers (`fastembed` by default, OpenAI-compatible behind `openai`)
//! - Vector stores: a JSON file store, an in-memory store and Qdrant (`qdrant`)
//! - A retriever, an answer generator over an OpenAI-compatible chat API, and a
//!   session controller that drives one retrieve-then-generate cycle per turn
//! - Folder ingestion and single-file upload
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use notes_rag::{AnswerGenerator, OpenAiCompatibleChat, RagConfig, Retriever, SessionController};
//!
//! let config = RagConfig::builder().build()?;
//! let retriever = Retriever::new(embedder, store, config.top_k);
//! let chat = OpenAiCompatibleChat::new(api_key, &config.generation)?;
//! let generator = AnswerGenerator::new(Arc::new(chat), config.generation.clone());
//!
//! let mut session = SessionController::new(retriever, generator);
//! let outcome = session.handle("What is the Sharpe ratio?").await?;
//! println!("{}\nSources: {:?}", outcome.answer, outcome.sources);
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generator;
mod http;
pub mod inmemory;
pub mod ingest;
pub mod persistent;
pub mod resources;
pub mod retriever;
pub mod session;
pub mod vectorstore;

#[cfg(feature = "fastembed")]
pub mod minilm;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chunking::{Chunker, RecursiveCharChunker, WordWindowChunker};
pub use config::{
    AVAILABLE_MODELS, DEFAULT_COLLECTION, DEFAULT_MODEL, GenerationConfig, RagConfig,
    RagConfigBuilder,
};
pub use document::{Chunk, Document, DocumentKind, RecordMetadata, SearchResult, VectorRecord};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
#[cfg(feature = "ocr")]
pub use extract::TesseractOcr;
pub use extract::{OcrEngine, PAGE_BREAK, TextExtractor};
pub use generator::{AnswerGenerator, ChatModel, ChatRequest, OpenAiCompatibleChat};
pub use ingest::{FileReport, FileStatus, IngestReport, Ingestor, UploadOutcome};
pub use inmemory::InMemoryVectorStore;
#[cfg(feature = "fastembed")]
pub use minilm::FastEmbedProvider;
pub use persistent::FileVectorStore;
pub use resources::{
    EmbeddingBackend, LocalLoader, ResourceCache, ResourceLoader, SharedResources, StoreBackend,
};
pub use retriever::{Retrieval, Retriever};
pub use session::{ConversationTurn, Role, SessionController, TurnOutcome, TurnPlan};
pub use vectorstore::VectorStore;
