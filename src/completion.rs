//! Completion backends: Gemini, OpenAI chat, and Ollama chat.
//!
//! Each backend sends one [`RenderedPrompt`] and returns the raw reply text.
//! Failures (network, HTTP status, missing text) become
//! [`ReviewError::Upstream`]. Nothing here retries; the caller decides.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use rag_review_core::completion::CompletionClient;
use rag_review_core::prompt::RenderedPrompt;
use rag_review_core::{ReviewError, ReviewResult};

use crate::config::CompletionConfig;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// POST `body` and return the JSON reply, failing on any non-2xx status.
async fn post_json(request: reqwest::RequestBuilder, label: &str, body: &Value) -> Result<Value> {
    let response = request
        .json(body)
        .send()
        .await
        .with_context(|| format!("{} request failed", label))?;
    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("{} API error {}: {}", label, status, body_text);
    }
    response
        .json()
        .await
        .with_context(|| format!("{} returned a non-JSON body", label))
}

// ============ Gemini ============

/// Google Gemini `generateContent` backend. The credential is sent as the
/// `x-goog-api-key` header.
pub struct GeminiClient {
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(base_url: Option<&str>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            base_url: base_url
                .unwrap_or(GEMINI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        model: &str,
        api_key: &str,
    ) -> ReviewResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let body = json!({
            "systemInstruction": { "parts": [{ "text": prompt.system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt.user }] }],
        });
        debug!(model, "sending gemini request");
        let reply = post_json(
            self.client.post(&url).header("x-goog-api-key", api_key),
            "Gemini",
            &body,
        )
        .await
        .and_then(|json| parse_gemini_response(&json))
        .map_err(ReviewError::upstream)?;
        Ok(reply)
    }
}

/// Concatenate `candidates[0].content.parts[].text`.
fn parse_gemini_response(json: &Value) -> Result<String> {
    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let reason = json
                .pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str())
                .unwrap_or("no candidates");
            anyhow!("Invalid Gemini response: {}", reason)
        })?;
    Ok(parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect())
}

// ============ OpenAI chat ============

/// OpenAI-compatible `/chat/completions` backend (bearer auth).
pub struct OpenAIChatClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIChatClient {
    pub fn new(base_url: Option<&str>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            base_url: base_url
                .unwrap_or(OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: http_client(timeout_secs)?,
        })
    }
}

fn chat_messages(prompt: &RenderedPrompt) -> Value {
    json!([
        { "role": "system", "content": prompt.system },
        { "role": "user", "content": prompt.user },
    ])
}

#[async_trait]
impl CompletionClient for OpenAIChatClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        model: &str,
        api_key: &str,
    ) -> ReviewResult<String> {
        let body = json!({
            "model": model,
            "messages": chat_messages(prompt),
        });
        let url = format!("{}/chat/completions", self.base_url);
        post_json(self.client.post(&url).bearer_auth(api_key), "OpenAI", &body)
            .await
            .and_then(|json| parse_openai_chat_response(&json))
            .map_err(ReviewError::upstream)
    }
}

fn parse_openai_chat_response(json: &Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing choices[0].message.content"))
}

// ============ Ollama chat ============

/// Ollama `/api/chat` backend. The credential is accepted but unused.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: Option<&str>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            base_url: base_url
                .unwrap_or(OLLAMA_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            client: http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        model: &str,
        _api_key: &str,
    ) -> ReviewResult<String> {
        let body = json!({
            "model": model,
            "messages": chat_messages(prompt),
            "stream": false,
        });
        let url = format!("{}/api/chat", self.base_url);
        post_json(self.client.post(&url), "Ollama", &body)
            .await
            .and_then(|json| parse_ollama_chat_response(&json))
            .map_err(ReviewError::upstream)
    }
}

fn parse_ollama_chat_response(json: &Value) -> Result<String> {
    json.pointer("/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing message.content"))
}

/// Build the backend named by `config.provider`.
pub fn create_client(config: &CompletionConfig) -> Result<Arc<dyn CompletionClient>> {
    let url = config.url.as_deref();
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiClient::new(url, config.timeout_secs)?)),
        "openai" => Ok(Arc::new(OpenAIChatClient::new(url, config.timeout_secs)?)),
        "ollama" => Ok(Arc::new(OllamaClient::new(url, config.timeout_secs)?)),
        other => bail!("Unknown completion provider: {}", other),
    }
}
