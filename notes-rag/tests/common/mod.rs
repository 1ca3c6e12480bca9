//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use notes_rag::generator::{ChatModel, ChatRequest};
use notes_rag::{
    EmbeddingProvider, Ingestor, InMemoryVectorStore, RagConfig, RagError, Result, TextExtractor,
    VectorStore,
};

pub const DIM: usize = 32;

/// Bag-of-words embedder: each lowercase word adds weight to a hashed
/// bucket, and the result is L2-normalised. Deterministic and cheap, and
/// texts sharing words have positive cosine similarity.
#[derive(Default)]
pub struct HashEmbedder {
    pub calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn hash_embedding(text: &str) -> Vec<f32> {
    let mut emb = vec![0.0f32; DIM];
    for word in text.split_whitespace() {
        let word = word.to_lowercase();
        let hash = word.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        emb[(hash % DIM as u64) as usize] += 1.0;
        emb[((hash / 7) % DIM as u64) as usize] += 0.5;
    }
    let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        emb.iter_mut().for_each(|x| *x /= norm);
    }
    emb
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(hash_embedding(text))
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Chat backend that records every request and replies with a fixed answer.
pub struct RecordingChat {
    pub reply: std::result::Result<String, String>,
    pub requests: std::sync::Mutex<Vec<ChatRequest>>,
}

impl RecordingChat {
    pub fn answering(reply: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(reply.to_string()), requests: Default::default() })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self { reply: Err(message.to_string()), requests: Default::default() })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for RecordingChat {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(answer) => Ok(answer.clone()),
            Err(message) => Err(RagError::GenerationError {
                model: request.model.clone(),
                message: message.clone(),
            }),
        }
    }
}

pub fn test_config() -> RagConfig {
    RagConfig::builder().embed_batch_size(4).build().unwrap()
}

pub fn ingestor(
    embedder: Arc<HashEmbedder>,
    store: Arc<InMemoryVectorStore>,
) -> Ingestor {
    let store: Arc<dyn VectorStore> = store;
    Ingestor::new(&test_config(), TextExtractor::new(), embedder, store).unwrap()
}
