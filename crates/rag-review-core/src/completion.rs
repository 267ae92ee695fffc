//! Completion client trait.
//!
//! Concrete backends (Gemini, OpenAI, Ollama) live in the app crate. The
//! core only needs to send a [`RenderedPrompt`] and get raw text back.

use async_trait::async_trait;

use crate::error::ReviewResult;
use crate::prompt::RenderedPrompt;

/// A remote large-language-model backend.
///
/// Implementations return [`ReviewError::Upstream`](crate::ReviewError::Upstream)
/// on network, HTTP, or authentication failure and do not retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Backend identifier (e.g. `"gemini"`).
    fn name(&self) -> &str;

    /// Send `prompt` to `model` using `api_key` and return the raw reply text.
    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        model: &str,
        api_key: &str,
    ) -> ReviewResult<String>;
}
