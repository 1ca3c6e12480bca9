//! Text chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`WordWindowChunker`]: sliding window over whitespace-separated words
//! - [`RecursiveCharChunker`]: splits by paragraphs, lines, sentences, then
//!   words, bounded by a character budget
//!
//! Both reject an overlap that is not strictly smaller than the window when
//! they are constructed, so no chunker can exist that would fail to advance.

use crate::document::{Chunk, DocumentKind};
use crate::error::{RagError, Result};

/// A strategy for splitting extracted text into chunks.
pub trait Chunker: Send + Sync {
    /// Split text into ordered, non-empty chunk strings.
    ///
    /// Returns an empty `Vec` for empty or whitespace-only text.
    fn split(&self, text: &str) -> Vec<String>;

    /// Split text and attach source attribution to every piece.
    fn chunk(&self, source: &str, kind: DocumentKind, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { text, source: source.to_string(), index, kind })
            .collect()
    }
}

fn validate_window(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::ChunkingError("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::ChunkingError(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Splits text into windows of `chunk_size` words that advance by
/// `chunk_size - chunk_overlap` words.
///
/// Consecutive chunks share exactly `chunk_overlap` words. The window stops
/// once it has reached the end of the text, so the final chunk may be
/// shorter than `chunk_size` but never repeats words already fully covered.
/// Text of `n > chunk_size` words yields `1 + ceil((n - chunk_size) / step)`
/// chunks, where `step = chunk_size - chunk_overlap`.
///
/// # Example
///
/// ```rust,ignore
/// use notes_rag::WordWindowChunker;
///
/// let chunker = WordWindowChunker::new(500, 50)?;
/// let pieces = chunker.split(&text);
/// ```
#[derive(Debug, Clone)]
pub struct WordWindowChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl WordWindowChunker {
    /// Create a new `WordWindowChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ChunkingError`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Window size in words.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Words shared between neighbors.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for WordWindowChunker {
    fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Splits text hierarchically and merges the pieces into chunks of at most
/// `chunk_size` characters.
///
/// Separators are tried in order: blank lines, line breaks, sentence ends,
/// then single spaces; a piece that still exceeds the budget is cut on
/// character boundaries. When a chunk is emitted, up to `chunk_overlap`
/// trailing characters (trimmed to a word boundary) seed the next chunk.
#[derive(Debug, Clone)]
pub struct RecursiveCharChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

impl RecursiveCharChunker {
    /// Create a new `RecursiveCharChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ChunkingError`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_window(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Break text into pieces no longer than `chunk_size` characters.
fn split_pieces(text: &str, chunk_size: usize, separators: &[&str]) -> Vec<String> {
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }

    let Some((separator, remaining)) = separators.split_first() else {
        let chars: Vec<char> = text.chars().collect();
        return chars.chunks(chunk_size).map(|c| c.iter().collect()).collect();
    };

    let mut pieces = Vec::new();
    for segment in split_keeping_separator(text, separator) {
        if char_len(segment) > chunk_size {
            pieces.extend(split_pieces(segment, chunk_size, remaining));
        } else {
            pieces.push(segment.to_string());
        }
    }
    pieces
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// The last `overlap` characters of `text`, starting at a word boundary.
fn overlap_tail(text: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }
    let total = char_len(text);
    if total <= overlap {
        return text;
    }
    let (byte_start, _) = text.char_indices().nth(total - overlap).unwrap_or((text.len(), ' '));
    let tail = &text[byte_start..];
    match tail.find(char::is_whitespace) {
        Some(ws) => tail[ws..].trim_start(),
        None => tail,
    }
}

impl Chunker for RecursiveCharChunker {
    fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let pieces = split_pieces(text, self.chunk_size, SEPARATORS);
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for piece in pieces {
            let piece_len = char_len(&piece);
            if current_len + piece_len <= self.chunk_size {
                current.push_str(&piece);
                current_len += piece_len;
                continue;
            }

            let emitted = current.trim();
            if !emitted.is_empty() {
                chunks.push(emitted.to_string());
            }

            let carry = overlap_tail(&current, self.chunk_overlap).to_string();
            let carry_len = char_len(&carry);
            if !carry.is_empty() && carry_len + piece_len <= self.chunk_size {
                current = carry;
                current_len = carry_len;
            } else {
                current = String::new();
                current_len = 0;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }

        let emitted = current.trim();
        if !emitted.is_empty() {
            chunks.push(emitted.to_string());
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn word_window_rejects_bad_overlap() {
        assert!(matches!(WordWindowChunker::new(10, 10), Err(RagError::ChunkingError(_))));
        assert!(matches!(WordWindowChunker::new(10, 25), Err(RagError::ChunkingError(_))));
        assert!(WordWindowChunker::new(0, 0).is_err());
        assert!(RecursiveCharChunker::new(100, 100).is_err());
    }

    #[test]
    fn word_window_empty_text_yields_nothing() {
        let chunker = WordWindowChunker::new(5, 2).unwrap();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("  \n\t ").is_empty());
    }

    #[test]
    fn word_window_slides_with_overlap() {
        let chunker = WordWindowChunker::new(5, 2).unwrap();
        let chunks = chunker.split(&numbered_words(10));
        assert_eq!(chunks, vec!["w0 w1 w2 w3 w4", "w3 w4 w5 w6 w7", "w6 w7 w8 w9"]);
    }

    #[test]
    fn word_window_short_text_is_single_chunk() {
        let chunker = WordWindowChunker::new(500, 50).unwrap();
        let chunks = chunker.split("The Sharpe ratio measures risk-adjusted return.");
        assert_eq!(chunks, vec!["The Sharpe ratio measures risk-adjusted return."]);
    }

    #[test]
    fn chunk_attaches_source_and_ordinal() {
        let chunker = WordWindowChunker::new(3, 1).unwrap();
        let chunks = chunker.chunk("notes.txt", DocumentKind::Text, &numbered_words(5));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].source, "notes.txt");
        assert_eq!(chunks[1].kind, DocumentKind::Text);
    }

    #[test]
    fn recursive_respects_character_budget() {
        let chunker = RecursiveCharChunker::new(60, 15).unwrap();
        let text = "Il rendimento atteso è la media ponderata.\n\nLa varianza misura il rischio. \
                    Il CAPM collega rendimento e beta. Frontiera efficiente di Markowitz!";
        let chunks = chunker.split(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 60, "chunk too long: {chunk:?}");
            assert!(!chunk.trim().is_empty());
        }
    }

    #[test]
    fn recursive_carries_overlap_into_next_chunk() {
        let chunker = RecursiveCharChunker::new(40, 15).unwrap();
        let chunks = chunker.split(&numbered_words(30));
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let first_word = pair[1].split_whitespace().next().unwrap();
            assert!(pair[0].split_whitespace().any(|w| w == first_word));
        }
    }

    #[test]
    fn recursive_hard_splits_unbroken_text() {
        let chunker = RecursiveCharChunker::new(10, 2).unwrap();
        let chunks = chunker.split(&"é".repeat(35));
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        let total: usize = chunks.iter().map(|c| c.chars().count()).sum();
        assert!(total >= 35);
    }
}
