//! CLI command implementations.
//!
//! Results go to stdout as pretty-printed JSON; progress and diagnostics go
//! through `tracing` to stderr.

use anyhow::{bail, Result};
use serde::Serialize;
use std::path::PathBuf;

use rag_review_core::chunk;
use rag_review_core::prompt::Task;

use crate::config::Config;
use crate::ingest::{collect_documents, SOURCE_KEY};
use crate::service::ReviewService;

/// `rrv chunk`: show the chunks ingestion would produce, without embedding.
pub fn run_chunk(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let documents = collect_documents(paths, &config.ingest)?;
    if documents.is_empty() {
        println!("No matching files.");
        return Ok(());
    }

    let mut total = 0;
    for doc in &documents {
        let pieces = chunk::split_text(
            &doc.text,
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        )?;
        let source = doc.metadata.get(SOURCE_KEY).map(String::as_str).unwrap_or("?");
        println!(
            "{}  chars={}  chunks={}",
            source,
            doc.text.chars().count(),
            pieces.len()
        );
        total += pieces.len();
    }
    println!("{} documents, {} chunks", documents.len(), total);
    Ok(())
}

/// `rrv analyze | metrics | inject-bugs`: ingest `inputs`, run one query, print JSON.
pub async fn run_query(
    config: &Config,
    task: Task,
    query: &str,
    inputs: &[PathBuf],
    api_key: Option<&str>,
) -> Result<()> {
    let documents = collect_documents(inputs, &config.ingest)?;
    if documents.is_empty() {
        bail!("No input files matched {:?}", config.ingest.include_globs);
    }

    let service = ReviewService::from_config(config)?;
    service.ingest_documents(&documents, api_key).await?;

    print_json(&service.review(query, task, api_key).await?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
