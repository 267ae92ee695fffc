//! Query-side retrieval.
//!
//! A [`Retriever`] can only be obtained from [`VectorIndex::retriever`], so
//! queries are always embedded by the provider that embedded the index.

use tracing::debug;

use crate::embedding::embed_one;
use crate::error::{ReviewError, ReviewResult};
use crate::index::VectorIndex;
use crate::models::RetrievalResult;

/// Default number of chunks pulled into a prompt's context.
pub const DEFAULT_TOP_K: usize = 5;

pub struct Retriever<'a> {
    index: &'a VectorIndex,
}

impl<'a> Retriever<'a> {
    pub(crate) fn new(index: &'a VectorIndex) -> Self {
        Self { index }
    }

    /// Embed `query_text` and return the `k` nearest chunks, best first.
    ///
    /// An empty index, an empty query, or `k == 0` yields an empty result.
    pub async fn retrieve(&self, query_text: &str, k: usize) -> ReviewResult<RetrievalResult> {
        if query_text.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        // Only here to skip the embedding call, which may be remote.
        if self.index.is_empty().await? {
            return Ok(Vec::new());
        }

        let query_vec = embed_one(self.index.provider(), query_text)
            .await
            .map_err(ReviewError::upstream)?;
        let results = self.index.search(&query_vec, k).await?;

        debug!(
            query_chars = query_text.chars().count(),
            k,
            returned = results.len(),
            top_score = results.first().map(|r| r.score),
            "retrieved context"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;

    use crate::embedding::{EmbeddingProvider, HashEmbedder};
    use crate::index::VectorIndex;
    use crate::models::{Chunk, Metadata};

    fn chunk(text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_metadata: Metadata::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty() {
        let index = VectorIndex::in_memory(Arc::new(HashEmbedder::new(64)));
        let results = index.retriever().retrieve("find bugs", 5).await.unwrap();
        assert!(results.is_empty());
    }

    struct UnreachableProvider;

    #[async_trait]
    impl EmbeddingProvider for UnreachableProvider {
        fn model_name(&self) -> &str {
            "unreachable"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            anyhow::bail!("embedding backend must not be called")
        }
    }

    #[tokio::test]
    async fn test_empty_index_skips_query_embedding() {
        let index = VectorIndex::in_memory(Arc::new(UnreachableProvider));
        let results = index.retriever().retrieve("find bugs", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_single_document_always_first() {
        let index = VectorIndex::in_memory(Arc::new(HashEmbedder::new(64)));
        index
            .add(vec![chunk("def divide(a, b): return a / b")])
            .await
            .unwrap();
        let results = index
            .retriever()
            .retrieve("completely unrelated weather forecast", 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.text, "def divide(a, b): return a / b");
    }

    #[tokio::test]
    async fn test_top_k_limits_and_ranks() {
        let index = VectorIndex::in_memory(Arc::new(HashEmbedder::new(256)));
        let texts = [
            "password stored in plain text",
            "sql injection via f-string query",
            "recursive fibonacci is slow",
            "division by zero crash",
            "thread race on shared cache",
            "memory leak cache never cleared",
            "unused import time",
        ];
        index
            .add(texts.iter().map(|t| chunk(t)).collect())
            .await
            .unwrap();
        let results = index
            .retriever()
            .retrieve("sql injection via f-string query", 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].chunk.text, "sql injection via f-string query");
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_blank_query() {
        let index = VectorIndex::in_memory(Arc::new(HashEmbedder::new(16)));
        index.add(vec![chunk("x = 1")]).await.unwrap();
        assert!(index.retriever().retrieve("  ", 5).await.unwrap().is_empty());
    }
}
