//! # rag-review core
//!
//! Network-free logic for the rag-review service: data models, chunking,
//! the embedding and completion traits, the vector index with its store
//! abstraction, retrieval, prompt rendering, and response normalization.
//!
//! Concrete remote backends (embedding APIs, LLM APIs), configuration, and
//! the HTTP server live in the `rag-review` application crate.
//!
//! ## Pipeline
//!
//! ```text
//! write path:  Document ──▶ chunk ──▶ embed ──▶ VectorIndex
//! read path:   query ──▶ Retriever ──▶ prompt ──▶ CompletionClient ──▶ normalize
//! ```

pub mod chunk;
pub mod completion;
pub mod embedding;
pub mod error;
pub mod index;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod retrieve;
pub mod store;

pub use error::{ReviewError, ReviewResult};
