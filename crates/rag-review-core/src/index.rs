//! Vector index: the embedding provider and the vector store, bound together.
//!
//! A [`VectorIndex`] owns exactly one [`EmbeddingProvider`]. Chunks are
//! embedded with it on [`add`](VectorIndex::add), and the
//! [`Retriever`](crate::retrieve::Retriever) it hands out embeds queries
//! with the same instance, so indexed content and queries always share one
//! embedding space.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::embedding::EmbeddingProvider;
use crate::error::{ReviewError, ReviewResult};
use crate::models::{Chunk, IndexedVector, RetrievalResult};
use crate::retrieve::Retriever;
use crate::store::memory::InMemoryStore;
use crate::store::VectorStore;

pub struct VectorIndex {
    provider: Arc<dyn EmbeddingProvider>,
    store: Box<dyn VectorStore>,
}

impl VectorIndex {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Box<dyn VectorStore>) -> Self {
        Self { provider, store }
    }

    /// Index backed by an [`InMemoryStore`].
    pub fn in_memory(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(provider, Box::new(InMemoryStore::new()))
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Embed and store `chunks`. Returns the number of vectors added.
    ///
    /// Embedding happens before the store is touched, so a provider failure
    /// leaves the index unchanged.
    pub async fn add(&self, chunks: Vec<Chunk>) -> ReviewResult<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .provider
            .embed(&texts)
            .await
            .map_err(ReviewError::upstream)?;
        if vectors.len() != chunks.len() {
            return Err(ReviewError::Upstream(format!(
                "embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let entries: Vec<IndexedVector> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| IndexedVector {
                id: Uuid::new_v4().to_string(),
                embedding,
                chunk,
            })
            .collect();
        let added = entries.len();

        self.store
            .insert(entries)
            .await
            .map_err(|e| ReviewError::Index(format!("{:#}", e)))?;

        info!(
            added,
            model = self.provider.model_name(),
            "indexed chunks"
        );
        Ok(added)
    }

    /// The `k` stored chunks closest to `query_vec` under cosine similarity.
    pub async fn search(&self, query_vec: &[f32], k: usize) -> ReviewResult<RetrievalResult> {
        let results = self
            .store
            .search(query_vec, k)
            .await
            .map_err(|e| ReviewError::Index(format!("{:#}", e)))?;
        debug!(k, returned = results.len(), "vector search");
        Ok(results)
    }

    pub async fn len(&self) -> ReviewResult<usize> {
        self.store
            .len()
            .await
            .map_err(|e| ReviewError::Index(format!("{:#}", e)))
    }

    pub async fn is_empty(&self) -> ReviewResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Drop every stored vector.
    pub async fn reset(&self) -> ReviewResult<()> {
        self.store
            .clear()
            .await
            .map_err(|e| ReviewError::Index(format!("{:#}", e)))?;
        info!("vector index reset");
        Ok(())
    }

    /// A retriever bound to this index and its embedding provider.
    pub fn retriever(&self) -> Retriever<'_> {
        Retriever::new(self)
    }
}
