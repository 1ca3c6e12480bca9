//! Data types for documents, chunks, stored records and search results.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// The detected type of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// A PDF, with or without a text layer.
    Pdf,
    /// Plain UTF-8 text.
    Text,
    /// A raster image that needs OCR.
    Image,
}

impl DocumentKind {
    /// Detect the kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Text),
            "png" | "jpg" | "jpeg" | "bmp" | "tiff" | "tif" => Some(Self::Image),
            _ => None,
        }
    }

    /// Detect the kind from a file name or path.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref().extension().and_then(|ext| ext.to_str()).and_then(Self::from_extension)
    }

    /// Parse the label produced by [`DocumentKind::as_str`].
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "pdf" => Some(Self::Pdf),
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            _ => None,
        }
    }

    /// The lowercase label stored in record metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source file identified by its name.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// File name used as the citation source.
    pub name: String,
    /// Raw file content.
    pub content: Vec<u8>,
    /// Type detected from the file extension.
    pub kind: DocumentKind,
}

impl Document {
    /// Create a document, detecting its kind from `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionError`] if the extension is not supported.
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let kind = DocumentKind::from_path(&name).ok_or_else(|| RagError::ExtractionError {
            document: name.clone(),
            message: "unsupported file type".to_string(),
        })?;
        Ok(Self { name, content, kind })
    }

    /// Create a plain-text document from an in-memory string.
    pub fn from_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { name: name.into(), content: text.into().into_bytes(), kind: DocumentKind::Text }
    }

    /// Read a document from disk. The file name becomes the document name.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        let content = std::fs::read(path)?;
        Self::new(name, content)
    }
}

/// A bounded span of text cut from one [`Document`], before embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text.
    pub text: String,
    /// Name of the source document.
    pub source: String,
    /// Position of this chunk within its document, starting at zero.
    pub index: usize,
    /// Type of the source document.
    pub kind: DocumentKind,
}

/// Metadata persisted alongside each [`VectorRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Name of the source document.
    pub source: String,
    /// Ordinal of the chunk within its document.
    pub chunk_index: usize,
    /// Type of the source document.
    #[serde(rename = "type")]
    pub kind: DocumentKind,
}

/// A persisted chunk with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier within the collection.
    pub id: String,
    /// The embedding vector for `text`.
    pub embedding: Vec<f32>,
    /// The chunk text.
    pub text: String,
    /// Source attribution.
    pub metadata: RecordMetadata,
}

impl VectorRecord {
    /// Attach an id and an embedding to a [`Chunk`].
    pub fn from_chunk(id: impl Into<String>, chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            embedding,
            text: chunk.text,
            metadata: RecordMetadata {
                source: chunk.source,
                chunk_index: chunk.index,
                kind: chunk.kind,
            },
        }
    }
}

/// A retrieved [`VectorRecord`] paired with its cosine similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved record.
    pub record: VectorRecord,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_kind_from_extension() {
        assert_eq!(DocumentKind::from_path("notes/Asset Pricing.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path("scan.jpeg"), Some(DocumentKind::Image));
        assert_eq!(DocumentKind::from_path("lecture.txt"), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_path("slides.pptx"), None);
        assert_eq!(DocumentKind::from_path("README"), None);
    }

    #[test]
    fn rejects_unsupported_documents() {
        let err = Document::new("deck.pptx", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, RagError::ExtractionError { .. }));
    }

    #[test]
    fn metadata_serializes_kind_as_type() {
        let meta =
            RecordMetadata { source: "a.pdf".into(), chunk_index: 2, kind: DocumentKind::Pdf };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "pdf");
        assert_eq!(json["chunk_index"], 2);
    }
}
