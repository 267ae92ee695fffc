//! Storage abstraction for the vector index.
//!
//! The [`VectorStore`] trait defines the storage operations the
//! [`VectorIndex`](crate::index::VectorIndex) needs, so the in-memory
//! backend can be swapped for a persistent one without touching retrieval.
//!
//! Implementations must be `Send + Sync` to be shared across requests.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{IndexedVector, ScoredChunk};

/// Abstract vector storage backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](VectorStore::insert) | Append a batch of embedded chunks atomically |
/// | [`search`](VectorStore::search) | Top-k cosine similarity search |
/// | [`len`](VectorStore::len) | Number of stored vectors |
/// | [`clear`](VectorStore::clear) | Remove everything |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append entries; the whole batch becomes visible at once.
    async fn insert(&self, entries: Vec<IndexedVector>) -> Result<()>;

    /// Return the `k` entries most similar to `query_vec`, best first,
    /// ties in insertion order.
    async fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    async fn len(&self) -> Result<usize>;

    async fn clear(&self) -> Result<()>;
}
