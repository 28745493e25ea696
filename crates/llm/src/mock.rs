//! Deterministic in-process `LlmClient` for tests: no network, canned
//! or derived responses keyed off the request content.

use std::sync::Mutex;

use coinq_domain::Result;

use crate::traits::{ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse, LlmClient, Usage};

/// A function from a chat request to its canned textual reply.
pub type ChatResponder = Box<dyn Fn(&ChatRequest) -> String + Send + Sync>;

pub struct MockLlmClient {
    responder: Mutex<ChatResponder>,
    calls: Mutex<Vec<ChatRequest>>,
}

impl MockLlmClient {
    pub fn new(responder: impl Fn(&ChatRequest) -> String + Send + Sync + 'static) -> Self {
        Self {
            responder: Mutex::new(Box::new(responder)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A mock that always returns the same fixed string.
    pub fn fixed(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::new(move |_| reply.clone())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let content = (self.responder.lock().unwrap())(&req);
        self.calls.lock().unwrap().push(req);
        Ok(ChatResponse {
            content,
            model: "mock".to_string(),
            usage: Some(Usage::default()),
        })
    }

    async fn embed(&self, req: EmbeddingRequest) -> Result<EmbeddingResponse> {
        // Deterministic pseudo-embedding: length-derived scalar per input,
        // enough for mock vector stores to rank distinctly and reproducibly.
        let embeddings = req
            .input
            .iter()
            .map(|s| vec![s.len() as f32])
            .collect();
        Ok(EmbeddingResponse { embeddings })
    }

    fn provider_id(&self) -> &str {
        "mock"
    }
}
