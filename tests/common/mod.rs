//! Shared fixtures: a completion client that replays a canned reply.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rag_review::service::{ReviewService, ServiceSettings};
use rag_review_core::completion::CompletionClient;
use rag_review_core::embedding::HashEmbedder;
use rag_review_core::prompt::RenderedPrompt;
use rag_review_core::ReviewResult;

/// Returns `reply` for every call and records what it was sent.
pub struct ScriptedClient {
    reply: String,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<RenderedPrompt>>,
    last_key: Mutex<Option<String>>,
}

impl ScriptedClient {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
            last_key: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<RenderedPrompt> {
        self.last_prompt.lock().unwrap().clone()
    }

    pub fn last_key(&self) -> Option<String> {
        self.last_key.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        _model: &str,
        api_key: &str,
    ) -> ReviewResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.clone());
        *self.last_key.lock().unwrap() = Some(api_key.to_string());
        Ok(self.reply.clone())
    }
}

pub fn settings(default_api_key: Option<&str>) -> ServiceSettings {
    ServiceSettings {
        chunk_size: 1000,
        chunk_overlap: 200,
        top_k: 5,
        model: "test-model".to_string(),
        default_api_key: default_api_key.map(str::to_string),
    }
}

/// Service with a 256-dim hash embedder and the given scripted client.
pub fn service(client: Arc<ScriptedClient>, default_api_key: Option<&str>) -> ReviewService {
    ReviewService::new(
        Arc::new(HashEmbedder::new(256)),
        client,
        settings(default_api_key),
    )
}
