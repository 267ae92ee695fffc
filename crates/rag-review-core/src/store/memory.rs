//! In-memory [`VectorStore`] implementation.
//!
//! Entries live in a `Vec` behind `std::sync::RwLock`: readers run
//! concurrently, a writer excludes everyone, and no guard is held across an
//! `.await`. Search is brute-force cosine similarity over all vectors.

use std::cmp::Ordering;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{IndexedVector, ScoredChunk};

use super::VectorStore;

/// In-memory store; contents last for the life of the process.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<Vec<IndexedVector>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<IndexedVector>>> {
        self.entries
            .read()
            .map_err(|_| anyhow!("vector store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<IndexedVector>>> {
        self.entries
            .write()
            .map_err(|_| anyhow!("vector store lock poisoned"))
    }
}

/// Dimensionality every stored vector must share, if any are stored.
fn stored_dims(entries: &[IndexedVector]) -> Option<usize> {
    entries.first().map(|e| e.embedding.len())
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn insert(&self, batch: Vec<IndexedVector>) -> Result<()> {
        let mut entries = self.write()?;
        let dims = stored_dims(&entries).or_else(|| stored_dims(&batch));
        if let Some(dims) = dims {
            if let Some(bad) = batch.iter().find(|e| e.embedding.len() != dims) {
                bail!(
                    "embedding dimension mismatch: index holds {}-d vectors, got {}-d",
                    dims,
                    bad.embedding.len()
                );
            }
        }
        entries.extend(batch);
        Ok(())
    }

    async fn search(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let entries = self.read()?;
        if k == 0 || entries.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(dims) = stored_dims(&entries) {
            if dims != query_vec.len() {
                bail!(
                    "query dimension mismatch: index holds {}-d vectors, query is {}-d",
                    dims,
                    query_vec.len()
                );
            }
        }

        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query_vec, &e.embedding)))
            .collect();
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    async fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }
}
