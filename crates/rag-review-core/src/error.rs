use thiserror::Error;

/// Errors surfaced to callers of the review pipeline.
///
/// Malformed model output is deliberately absent: the response normalizer
/// absorbs it into a typed default and it never reaches a caller.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Missing credential or unusable settings. Not retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The LLM or embedding backend failed (network, HTTP status, auth).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Caller input rejected before any index or network access.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The vector index could not serve the request.
    #[error("index error: {0}")]
    Index(String),
}

impl ReviewError {
    /// Wrap an upstream failure, keeping the full `anyhow` context chain.
    pub fn upstream(err: anyhow::Error) -> Self {
        ReviewError::Upstream(format!("{:#}", err))
    }
}

pub type ReviewResult<T> = std::result::Result<T, ReviewError>;
