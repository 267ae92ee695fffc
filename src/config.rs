//! TOML configuration parsing and validation.
//!
//! Every section is optional; missing keys take the defaults documented on
//! each field. [`Config::minimal`] is the all-defaults configuration used
//! when no config file exists.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use rag_review_core::chunk::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use rag_review_core::retrieve::DEFAULT_TOP_K;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `hash`, `openai`, `ollama`, or `local`.
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_embedding_provider() -> String {
    "hash".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_embedding_timeout() -> u64 {
    30
}

/// Dimensionality of the hash embedder when `dims` is not set.
pub const DEFAULT_HASH_DIMS: usize = 384;

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    /// `gemini`, `openai`, or `ollama`.
    #[serde(default = "default_completion_provider")]
    pub provider: String,
    #[serde(default = "default_completion_model")]
    pub model: String,
    /// Base URL override for the selected backend.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
    /// Environment variable holding the process-wide default API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_completion_provider(),
            model: default_completion_model(),
            url: None,
            timeout_secs: default_completion_timeout(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_completion_provider() -> String {
    "gemini".to_string()
}
fn default_completion_model() -> String {
    "gemini-2.5-pro".to_string()
}
fn default_completion_timeout() -> u64 {
    120
}
fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.py".to_string()]
}

impl Config {
    /// All-defaults configuration.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Read the process-wide default API key from the configured env var.
    pub fn default_api_key(&self) -> Option<String> {
        std::env::var(&self.completion.api_key_env)
            .ok()
            .and_then(|v| clean_env_key(&v))
    }
}

/// Trim and strip one pair of surrounding quotes; empty → `None`.
fn clean_env_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|s| s.strip_suffix(*q))
        })
        .unwrap_or(trimmed)
        .trim();
    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.chunk_size == 0 {
        bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        bail!("chunking.chunk_overlap must be smaller than chunking.chunk_size");
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "hash" => {
            if config.embedding.dims == Some(0) {
                bail!("embedding.dims must be > 0 for the hash provider");
            }
        }
        "openai" | "ollama" => {
            if config.embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
            if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        "local" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be hash, openai, ollama, or local.",
            other
        ),
    }

    // Validate completion
    match config.completion.provider.as_str() {
        "gemini" | "openai" | "ollama" => {}
        other => bail!(
            "Unknown completion provider: '{}'. Must be gemini, openai, or ollama.",
            other
        ),
    }
    if config.completion.model.trim().is_empty() {
        bail!("completion.model must not be empty");
    }

    Ok(())
}

/// Default config path used by the CLI.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("./config/rrv.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.embedding.provider, "hash");
        assert_eq!(config.completion.provider, "gemini");
        assert_eq!(config.completion.model, "gemini-2.5-pro");
        assert_eq!(config.completion.api_key_env, "API_KEY");
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.ingest.include_globs, vec!["**/*.py"]);
    }

    #[test]
    fn test_overrides() {
        let config = parse(
            r#"
[chunking]
chunk_size = 500
chunk_overlap = 50

[retrieval]
top_k = 3

[completion]
provider = "openai"
model = "gpt-4o-mini"
"#,
        )
        .unwrap();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.completion.model, "gpt-4o-mini");
    }

    #[test]
    fn test_overlap_must_be_smaller() {
        let err = parse("[chunking]\nchunk_size = 100\nchunk_overlap = 100\n").unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_top_k_zero_rejected() {
        assert!(parse("[retrieval]\ntop_k = 0\n").is_err());
    }

    #[test]
    fn test_unknown_providers_rejected() {
        assert!(parse("[embedding]\nprovider = \"magic\"\n").is_err());
        assert!(parse("[completion]\nprovider = \"magic\"\n").is_err());
    }

    #[test]
    fn test_openai_embedding_needs_model_and_dims() {
        assert!(parse("[embedding]\nprovider = \"openai\"\n").is_err());
        assert!(parse(
            "[embedding]\nprovider = \"openai\"\nmodel = \"text-embedding-3-small\"\ndims = 1536\n"
        )
        .is_ok());
    }

    #[test]
    fn test_clean_env_key() {
        assert_eq!(clean_env_key("  abc "), Some("abc".to_string()));
        assert_eq!(clean_env_key("\"abc\""), Some("abc".to_string()));
        assert_eq!(clean_env_key("'abc'"), Some("abc".to_string()));
        assert_eq!(clean_env_key("\"\""), None);
        assert_eq!(clean_env_key(""), None);
    }

    #[test]
    fn test_load_or_default() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("missing.toml");
        assert_eq!(load_or_default(&missing).unwrap().retrieval.top_k, 5);

        let path = tmp.path().join("rrv.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[retrieval]\ntop_k = 2").unwrap();
        assert_eq!(load_or_default(&path).unwrap().retrieval.top_k, 2);
    }
}
