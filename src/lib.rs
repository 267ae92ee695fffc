//! # rag-review
//!
//! A retrieval-augmented code review service.
//!
//! Code snippets are chunked, embedded, and kept in an in-memory vector
//! index. A natural-language query retrieves the most relevant chunks, which
//! are sent to an LLM for one of three tasks: an issue list, quality
//! metrics, or deliberately injected bugs. Whatever the model replies, the
//! caller gets a well-formed result.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Snippets │──▶│ Chunk+Embed  │──▶│ Vector index │
//! │ / files  │   │              │   │  (in memory) │
//! └──────────┘   └──────────────┘   └──────┬───────┘
//!                                          │ top-k
//!                 ┌────────────┐   ┌───────▼──────┐   ┌───────────┐
//!                 │ Normalizer │◀──│  Completion  │◀──│  Prompt   │
//!                 └─────┬──────┘   └──────────────┘   └───────────┘
//!                       ▼
//!              CLI (rrv) / HTTP API
//! ```
//!
//! The network-free pipeline pieces live in `rag-review-core`; this crate
//! adds configuration, remote backends, the service, and the surfaces.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Embedding provider implementations |
//! | [`completion`] | Gemini, OpenAI, and Ollama completion clients |
//! | [`ingest`] | Filesystem walking into documents |
//! | [`service`] | The review operations |
//! | [`server`] | HTTP API |
//! | [`commands`] | CLI command implementations |

pub mod commands;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod ingest;
pub mod server;
pub mod service;
