//! Ingestion: folder scans and single-file uploads into the vector store.
//!
//! Both paths run extract → chunk → embed → store. Record ids are fresh
//! UUIDs assigned in chunk order before any embedding call, so the id of a
//! chunk never depends on how the embedding work is batched. Ingesting the
//! same file twice stores it twice.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::chunking::{Chunker, RecursiveCharChunker, WordWindowChunker};
use crate::config::{RagConfig, SUPPORTED_EXTENSIONS, UPLOAD_EXTENSIONS};
use crate::document::{Chunk, Document, VectorRecord};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::extract::TextExtractor;
use crate::vectorstore::VectorStore;

/// What happened to one file during a folder ingestion.
#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    /// The file produced this many chunks.
    Ingested { chunks: usize },
    /// The file contributed nothing.
    Skipped { reason: String },
}

/// Per-file line of an [`IngestReport`].
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Summary of a folder ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub files: Vec<FileReport>,
    /// Records written to the store.
    pub total_chunks: usize,
}

impl IngestReport {
    /// Number of files that produced at least one chunk.
    pub fn ingested(&self) -> usize {
        self.files.iter().filter(|f| matches!(f.status, FileStatus::Ingested { .. })).count()
    }

    /// Number of files that were skipped.
    pub fn skipped(&self) -> usize {
        self.files.len() - self.ingested()
    }
}

/// Result of a single-file upload, reported to the user as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub success: bool,
    pub message: String,
    pub chunks_added: usize,
}

impl UploadOutcome {
    fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), chunks_added: 0 }
    }
}

/// Moves documents into a [`VectorStore`].
pub struct Ingestor {
    extractor: TextExtractor,
    folder_chunker: WordWindowChunker,
    upload_chunker: RecursiveCharChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
}

impl Ingestor {
    /// Build an ingestor from validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] or [`RagError::ChunkingError`] if a
    /// chunk window is unusable.
    pub fn new(
        config: &RagConfig,
        extractor: TextExtractor,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            extractor,
            folder_chunker: WordWindowChunker::new(config.chunk_size, config.chunk_overlap)?,
            upload_chunker: RecursiveCharChunker::new(
                config.upload_chunk_size,
                config.upload_chunk_overlap,
            )?,
            embedder,
            store,
            batch_size: config.embed_batch_size,
        })
    }

    /// The store records are written to.
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Supported files under `dir`, recursively, in path order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::PipelineError`] if `dir` is not a directory.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(RagError::PipelineError(format!(
                "data folder '{}' not found",
                dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| has_extension(path, SUPPORTED_EXTENSIONS))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Ingest every supported file under `dir` in one pass.
    ///
    /// Unreadable or empty files are reported as skipped. All chunks are
    /// embedded before anything is written, so an embedding failure leaves
    /// the store untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` does not exist, or if embedding or storing
    /// fails.
    pub async fn ingest_folder(&self, dir: impl AsRef<Path>) -> Result<IngestReport> {
        let paths = Self::discover(&dir)?;
        info!(dir = %dir.as_ref().display(), files = paths.len(), "starting folder ingestion");

        let mut report = IngestReport::default();
        let mut chunks = Vec::new();

        for path in paths {
            let status = match Document::read(&path) {
                Ok(document) => {
                    let (name, kind) = (document.name.clone(), document.kind);
                    let text = self.extract(document).await;
                    let file_chunks = self.folder_chunker.chunk(&name, kind, &text);
                    if file_chunks.is_empty() {
                        warn!(document = %name, "no text extracted, skipping");
                        FileStatus::Skipped { reason: "no text extracted".to_string() }
                    } else {
                        info!(
                            document = %name,
                            chunk_count = file_chunks.len(),
                            "chunked document"
                        );
                        let count = file_chunks.len();
                        chunks.extend(file_chunks);
                        FileStatus::Ingested { chunks: count }
                    }
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "cannot read file, skipping");
                    FileStatus::Skipped { reason: e.to_string() }
                }
            };
            report.files.push(FileReport { path, status });
        }

        report.total_chunks = self.store_chunks(chunks).await?;
        info!(
            ingested = report.ingested(),
            skipped = report.skipped(),
            total_chunks = report.total_chunks,
            "folder ingestion complete"
        );
        Ok(report)
    }

    /// Extract, chunk with the word-window chunker, embed and store one document.
    ///
    /// Returns the number of records added; zero when the document has no text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding or storing fails.
    pub async fn ingest_document(&self, document: Document) -> Result<usize> {
        let (name, kind) = (document.name.clone(), document.kind);
        let text = self.extract(document).await;
        let chunks = self.folder_chunker.chunk(&name, kind, &text);
        self.store_chunks(chunks).await
    }

    /// Add one uploaded pdf or txt file to the live collection.
    ///
    /// Never fails; problems are described in the returned outcome.
    pub async fn upload(&self, name: &str, content: Vec<u8>) -> UploadOutcome {
        if !has_extension(Path::new(name), UPLOAD_EXTENSIONS) {
            return UploadOutcome::failed("Unsupported file type. Please upload PDF or TXT files.");
        }
        let document = match Document::new(name, content) {
            Ok(document) => document,
            Err(e) => return UploadOutcome::failed(format!("Error processing file: {e}")),
        };

        let kind = document.kind;
        let text = match self.try_extract(document).await {
            Ok(text) => text,
            Err(e) => return UploadOutcome::failed(format!("Error processing file: {e}")),
        };
        let chunks = self.upload_chunker.chunk(name, kind, &text);
        if chunks.is_empty() {
            return UploadOutcome::failed(format!("No text could be extracted from {name}"));
        }

        match self.store_chunks(chunks).await {
            Ok(added) => {
                info!(document = name, chunk_count = added, "upload stored");
                UploadOutcome {
                    success: true,
                    message: format!("Successfully added {added} chunks from {name}"),
                    chunks_added: added,
                }
            }
            Err(e) => {
                error!(document = name, error = %e, "upload failed");
                UploadOutcome::failed(format!("Error processing file: {e}"))
            }
        }
    }

    async fn extract(&self, document: Document) -> String {
        let extractor = self.extractor.clone();
        let name = document.name.clone();
        match tokio::task::spawn_blocking(move || extractor.extract(&document)).await {
            Ok(text) => text,
            Err(e) => {
                error!(document = %name, error = %e, "extraction task failed");
                String::new()
            }
        }
    }

    async fn try_extract(&self, document: Document) -> Result<String> {
        let extractor = self.extractor.clone();
        let name = document.name.clone();
        tokio::task::spawn_blocking(move || extractor.try_extract(&document)).await.map_err(|e| {
            let message = format!("extraction task failed: {e}");
            RagError::ExtractionError { document: name, message }
        })?
    }

    /// Assign ids, embed in batches and write all records at once.
    async fn store_chunks(&self, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = chunks.iter().map(|_| Uuid::new_v4().to_string()).collect();
        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let batch_embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
                error!(
                    provider = self.embedder.name(),
                    error = %e,
                    "embedding failed during ingestion"
                );
                e
            })?;
            if batch_embeddings.len() != batch.len() {
                return Err(RagError::embedding(
                    self.embedder.name(),
                    format!("expected {} embeddings, got {}", batch.len(), batch_embeddings.len()),
                ));
            }
            debug!(batch_size = batch.len(), "embedded batch");
            embeddings.extend(batch_embeddings);
        }

        let records: Vec<VectorRecord> = ids
            .into_iter()
            .zip(chunks)
            .zip(embeddings)
            .map(|((id, chunk), embedding)| VectorRecord::from_chunk(id, chunk, embedding))
            .collect();
        let added = records.len();

        self.store.add(&records).await.map_err(|e| {
            error!(collection = self.store.collection(), error = %e, "failed to store records");
            e
        })?;
        Ok(added)
    }
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
