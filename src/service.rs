//! The caller-facing review operations.
//!
//! [`ReviewService`] owns the vector index and the completion client. Every
//! query operation runs the same pipeline:
//!
//! ```text
//! validate input → resolve credential → retrieve top-k → render → complete → normalize
//! ```
//!
//! Input validation and credential resolution happen before the index or
//! any backend is touched. Ingestion resolves the credential too.

use std::sync::Arc;

use tracing::{debug, info};

use rag_review_core::chunk;
use rag_review_core::completion::CompletionClient;
use rag_review_core::embedding::EmbeddingProvider;
use rag_review_core::index::VectorIndex;
use rag_review_core::models::{
    AnalysisResult, BugInjectionResult, Document, IssueList, MetricsReport,
};
use rag_review_core::normalize::{normalize, Shape};
use rag_review_core::prompt::{self, BugInjectionParams, Task};
use rag_review_core::{ReviewError, ReviewResult};

use crate::completion::create_client;
use crate::config::Config;
use crate::embedding::create_provider;

/// Override values treated as "not supplied".
const PLACEHOLDER_CREDENTIALS: [&str; 3] = ["string", "none", "null"];

/// Settings the service reads on every call.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub model: String,
    /// Process-wide credential used when a call supplies none.
    pub default_api_key: Option<String>,
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.chunking.chunk_size,
            chunk_overlap: config.chunking.chunk_overlap,
            top_k: config.retrieval.top_k,
            model: config.completion.model.clone(),
            default_api_key: config.default_api_key(),
        }
    }
}

/// Outcome of an ingest call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

pub struct ReviewService {
    index: Arc<VectorIndex>,
    completion: Arc<dyn CompletionClient>,
    settings: ServiceSettings,
}

impl ReviewService {
    /// Build the embedding provider and completion client named in `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = create_provider(&config.embedding)?;
        let completion = create_client(&config.completion)?;
        info!(
            embedding = provider.model_name(),
            completion = completion.name(),
            model = %config.completion.model,
            "review service ready"
        );
        Ok(Self::new(
            provider,
            completion,
            ServiceSettings::from_config(config),
        ))
    }

    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        completion: Arc<dyn CompletionClient>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            index: Arc::new(VectorIndex::in_memory(provider)),
            completion,
            settings,
        }
    }

    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Chunk and index raw code snippets.
    ///
    /// Each snippet becomes a document tagged `source = "snippet"` and its
    /// position.
    pub async fn ingest(
        &self,
        snippets: &[String],
        credential: Option<&str>,
    ) -> ReviewResult<IngestReport> {
        if snippets.is_empty() {
            return Err(ReviewError::InvalidInput(
                "at least one code snippet is required".to_string(),
            ));
        }
        let documents: Vec<Document> = snippets
            .iter()
            .enumerate()
            .map(|(i, text)| {
                Document::new(text.clone())
                    .with_metadata("source", "snippet")
                    .with_metadata("snippet_index", i.to_string())
            })
            .collect();
        self.ingest_documents(&documents, credential).await
    }

    /// Chunk, embed, and index `documents`.
    ///
    /// Fails with [`ReviewError::Configuration`] before anything is chunked
    /// or embedded when no usable credential is available.
    pub async fn ingest_documents(
        &self,
        documents: &[Document],
        credential: Option<&str>,
    ) -> ReviewResult<IngestReport> {
        if documents.is_empty() {
            return Err(ReviewError::InvalidInput(
                "at least one document is required".to_string(),
            ));
        }
        resolve_credential(credential, self.settings.default_api_key.as_deref())?;

        let chunks = chunk::split(
            documents,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
        )?;
        let added = self.index.add(chunks).await?;
        info!(documents = documents.len(), chunks = added, "ingested");
        Ok(IngestReport {
            documents: documents.len(),
            chunks: added,
        })
    }

    pub async fn analyze(&self, query: &str, credential: Option<&str>) -> ReviewResult<IssueList> {
        match self.review(query, Task::Analysis, credential).await? {
            AnalysisResult::Issues(list) => Ok(list),
            _ => unreachable!("analysis always normalizes to an issue list"),
        }
    }

    pub async fn metrics(
        &self,
        query: &str,
        credential: Option<&str>,
    ) -> ReviewResult<MetricsReport> {
        match self.review(query, Task::Metrics, credential).await? {
            AnalysisResult::Metrics(report) => Ok(report),
            _ => unreachable!("metrics always normalize to a metrics report"),
        }
    }

    /// Ask the model to inject `params.num_bugs` bugs into the retrieved code.
    ///
    /// When the reply is unusable the retrieved code comes back unchanged
    /// with no bugs listed.
    pub async fn inject_bugs(
        &self,
        query: &str,
        params: BugInjectionParams,
        credential: Option<&str>,
    ) -> ReviewResult<BugInjectionResult> {
        match self.review(query, Task::InjectBugs(params), credential).await? {
            AnalysisResult::BugInjection(result) => Ok(result),
            _ => unreachable!("bug injection always normalizes to a bug injection result"),
        }
    }

    /// Drop every indexed chunk.
    pub async fn reset(&self) -> ReviewResult<()> {
        self.index.reset().await
    }

    pub async fn indexed_chunks(&self) -> ReviewResult<usize> {
        self.index.len().await
    }

    /// Run one task end to end and return the normalized result.
    ///
    /// The variant always matches the task: [`Task::Analysis`] gives
    /// `Issues`, [`Task::Metrics`] gives `Metrics`, [`Task::InjectBugs`]
    /// gives `BugInjection`.
    pub async fn review(
        &self,
        query: &str,
        task: Task,
        credential: Option<&str>,
    ) -> ReviewResult<AnalysisResult> {
        if let Task::InjectBugs(params) = &task {
            validate_bug_params(params)?;
        }
        if query.trim().is_empty() {
            return Err(ReviewError::InvalidInput("query must not be empty".to_string()));
        }
        let api_key = resolve_credential(credential, self.settings.default_api_key.as_deref())?;

        let retrieved = self
            .index
            .retriever()
            .retrieve(query, self.settings.top_k)
            .await?;
        let prompt = prompt::render(&task, &retrieved);
        debug!(
            task = task.name(),
            chunks = retrieved.len(),
            prompt_chars = prompt.user.len(),
            "rendered prompt"
        );

        let raw = self
            .completion
            .complete(&prompt, &self.settings.model, &api_key)
            .await?;
        debug!(task = task.name(), reply_chars = raw.len(), "completion received");

        let shape = match &task {
            Task::Analysis => Shape::Issues,
            Task::Metrics => Shape::Metrics,
            Task::InjectBugs(_) => Shape::BugInjection {
                original_code: &prompt.context,
            },
        };
        Ok(normalize(&raw, shape))
    }
}

fn validate_bug_params(params: &BugInjectionParams) -> ReviewResult<()> {
    if !BugInjectionParams::SEVERITY_RANGE.contains(&params.severity_level) {
        return Err(ReviewError::InvalidInput(format!(
            "severity_level must be between 1 and 5, got {}",
            params.severity_level
        )));
    }
    if !BugInjectionParams::NUM_BUGS_RANGE.contains(&params.num_bugs) {
        return Err(ReviewError::InvalidInput(format!(
            "num_bugs must be between 1 and 10, got {}",
            params.num_bugs
        )));
    }
    if params.bug_type.trim().is_empty() {
        return Err(ReviewError::InvalidInput(
            "bug_type must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Pick the credential for one call.
///
/// A usable override wins; otherwise the process default. Neither →
/// [`ReviewError::Configuration`].
pub fn resolve_credential(
    override_key: Option<&str>,
    default_key: Option<&str>,
) -> ReviewResult<String> {
    override_key
        .and_then(usable_credential)
        .or_else(|| default_key.and_then(usable_credential))
        .ok_or_else(|| {
            ReviewError::Configuration(
                "no API key: pass one with the request or set the configured environment variable"
                    .to_string(),
            )
        })
}

/// Trimmed `key`, unless it is blank or a placeholder such as `"string"`.
pub fn usable_credential(key: &str) -> Option<String> {
    let key = key.trim();
    let placeholder = PLACEHOLDER_CREDENTIALS
        .iter()
        .any(|p| key.eq_ignore_ascii_case(p));
    (!key.is_empty() && !placeholder).then(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        assert_eq!(
            resolve_credential(Some(" sk-call "), Some("sk-env")).unwrap(),
            "sk-call"
        );
    }

    #[test]
    fn test_placeholders_fall_back_to_default() {
        for placeholder in ["string", "None", "NULL", "", "   "] {
            assert_eq!(
                resolve_credential(Some(placeholder), Some("sk-env")).unwrap(),
                "sk-env"
            );
        }
    }

    #[test]
    fn test_no_credential_is_configuration_error() {
        let err = resolve_credential(Some("null"), None).unwrap_err();
        assert!(matches!(err, ReviewError::Configuration(_)));
        assert!(matches!(
            resolve_credential(None, Some("  ")).unwrap_err(),
            ReviewError::Configuration(_)
        ));
    }
}
