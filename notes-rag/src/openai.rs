//! Embeddings from a hosted OpenAI-compatible `/embeddings` endpoint.
//!
//! Only compiled with the `openai` feature. The local MiniLM encoder is the
//! default; this backend exists for deployments that cannot run ONNX.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::http::describe_failure;

const PROVIDER: &str = "openai";

/// Base URL of the OpenAI API.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Model used unless [`OpenAIEmbeddingProvider::with_model`] says otherwise.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Requested vector length. Matches MiniLM so a collection can be queried
/// with either backend.
const DEFAULT_DIMENSIONS: usize = 384;

/// An [`EmbeddingProvider`] calling an OpenAI-compatible embeddings API.
///
/// ```rust,ignore
/// use notes_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new(api_key)?.with_base_url("http://localhost:8080/v1");
/// let embedding = provider.embed("rendimento atteso").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider for [`OPENAI_API_BASE`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the key is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::embedding(PROVIDER, "API key must not be empty"));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            endpoint: endpoint_for(OPENAI_API_BASE),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Point at another OpenAI-compatible server, e.g. `http://localhost:8080/v1`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.endpoint = endpoint_for(&base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Request vectors of `dims` components.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }
}

fn endpoint_for(base_url: &str) -> String {
    format!("{}/embeddings", base_url.trim_end_matches('/'))
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Put each vector in the slot named by its `index`, rejecting gaps and
/// repeats.
fn in_input_order(items: Vec<EmbeddingItem>, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in items {
        let Some(slot) = slots.get_mut(item.index) else {
            return Err(RagError::embedding(
                PROVIDER,
                format!("embedding index {} out of range for {expected} inputs", item.index),
            ));
        };
        if slot.is_some() {
            return Err(RagError::embedding(
                PROVIDER,
                format!("duplicate embedding for input {}", item.index),
            ));
        }
        *slot = Some(item.embedding);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| RagError::embedding(PROVIDER, format!("no embedding for input {i}")))
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors.pop().ok_or_else(|| RagError::embedding(PROVIDER, "API returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(
            provider = PROVIDER,
            model = %self.model,
            batch_size = texts.len(),
            "embedding batch"
        );

        let request =
            EmbeddingsRequest { model: &self.model, input: texts, dimensions: self.dimensions };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::embedding(PROVIDER, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let message = describe_failure(response).await;
            error!(provider = PROVIDER, %message, "embedding request rejected");
            return Err(RagError::embedding(PROVIDER, message));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| RagError::embedding(PROVIDER, format!("failed to parse response: {e}")))?;
        in_input_order(parsed.data, texts.len())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(index: usize, value: f32) -> EmbeddingItem {
        EmbeddingItem { index, embedding: vec![value] }
    }

    #[test]
    fn vectors_follow_input_order() {
        let ordered = in_input_order(vec![item(2, 2.0), item(0, 0.0), item(1, 1.0)], 3).unwrap();
        assert_eq!(ordered, vec![vec![0.0], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn gaps_and_repeats_are_rejected() {
        assert!(in_input_order(vec![item(0, 0.0), item(0, 1.0)], 2).is_err());
        assert!(in_input_order(vec![item(0, 0.0)], 2).is_err());
        assert!(in_input_order(vec![item(5, 0.0)], 1).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let provider = OpenAIEmbeddingProvider::new("sk-test")
            .unwrap()
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(provider.endpoint, "http://localhost:8080/v1/embeddings");
        assert!(OpenAIEmbeddingProvider::new(" ").is_err());
    }
}
