//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//! Record ids must be UUIDs, which is what ingestion assigns.
//!
//! # Example
//!
//! ```rust,ignore
//! use notes_rag::qdrant::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::connect("http://localhost:6334", "appunti_corso", 384).await?;
//! store.add(&records).await?;
//! let hits = store.query(&query_embedding, 3).await?;
//! ```

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info};

use crate::document::{DocumentKind, RecordMetadata, SearchResult, VectorRecord};
use crate::error::{RagError, Result};
use crate::retriever::UNKNOWN_SOURCE;
use crate::vectorstore::VectorStore;

const BACKEND: &str = "qdrant";

/// A [`VectorStore`] bound to one [Qdrant](https://qdrant.tech/) collection
/// using cosine distance.
///
/// Chunk text and metadata are stored as point payload. Returned records do
/// not carry their embedding.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    dimensions: usize,
}

impl QdrantVectorStore {
    /// Connect to `url` and make sure `collection` exists.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the server is unreachable or
    /// the collection cannot be created.
    pub async fn connect(url: &str, collection: &str, dimensions: usize) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        let store = Self { client, collection: collection.to_string(), dimensions };
        store.ensure_collection().await?;
        Ok(store)
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::store(BACKEND, e.to_string())
    }

    async fn ensure_collection(&self) -> Result<()> {
        let exists =
            self.client.collection_exists(&self.collection).await.map_err(Self::map_err)?;
        if exists {
            debug!(collection = %self.collection, "qdrant collection already exists");
            return Ok(());
        }

        self.client
            .create_collection(CreateCollectionBuilder::new(&self.collection).vectors_config(
                VectorParamsBuilder::new(self.dimensions as u64, Distance::Cosine),
            ))
            .await
            .map_err(Self::map_err)?;

        info!(
            collection = %self.collection,
            dimensions = self.dimensions,
            "created qdrant collection"
        );
        Ok(())
    }

    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn extract_usize(value: &QdrantValue) -> Option<usize> {
        match &value.kind {
            Some(Kind::IntegerValue(n)) => usize::try_from(*n).ok(),
            _ => None,
        }
    }

    fn to_point(record: &VectorRecord) -> Result<PointStruct> {
        let payload = Payload::try_from(serde_json::json!({
            "text": record.text,
            "source": record.metadata.source,
            "chunk_index": record.metadata.chunk_index,
            "type": record.metadata.kind.as_str(),
        }))
        .map_err(Self::map_err)?;
        Ok(PointStruct::new(record.id.clone(), record.embedding.clone(), payload))
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn add(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != self.dimensions) {
            return Err(RagError::store(
                BACKEND,
                format!(
                    "record '{}' has dimension {}, collection '{}' expects {}",
                    bad.id,
                    bad.embedding.len(),
                    self.collection,
                    self.dimensions
                ),
            ));
        }

        let points = records.iter().map(Self::to_point).collect::<Result<Vec<_>>>()?;
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, count = records.len(), "upserted records to qdrant");
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, embedding.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let results = response
            .result
            .into_iter()
            .map(|scored| {
                let id = scored
                    .id
                    .as_ref()
                    .and_then(|pid| match &pid.point_id_options {
                        Some(PointIdOptions::Uuid(s)) => Some(s.clone()),
                        Some(PointIdOptions::Num(n)) => Some(n.to_string()),
                        None => None,
                    })
                    .unwrap_or_default();
                let payload = &scored.payload;
                let text = payload.get("text").and_then(Self::extract_string).unwrap_or_default();
                let metadata = RecordMetadata {
                    source: payload
                        .get("source")
                        .and_then(Self::extract_string)
                        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
                    chunk_index: payload
                        .get("chunk_index")
                        .and_then(Self::extract_usize)
                        .unwrap_or_default(),
                    kind: payload
                        .get("type")
                        .and_then(Self::extract_string)
                        .and_then(|label| DocumentKind::from_label(&label))
                        .unwrap_or(DocumentKind::Text),
                };

                SearchResult {
                    record: VectorRecord { id, embedding: Vec::new(), text, metadata },
                    score: scored.score,
                }
            })
            .collect();

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(Self::map_err)?;
        Ok(response.result.map(|r| r.count as usize).unwrap_or_default())
    }

    async fn reset(&self) -> Result<()> {
        self.client.delete_collection(&self.collection).await.map_err(Self::map_err)?;
        info!(collection = %self.collection, "deleted qdrant collection");
        self.ensure_collection().await
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
