//! Anthropic Messages API adapter.
//!
//! System messages are hoisted into the top-level `system` field; the
//! rest of the conversation is sent as plain `user`/`assistant` turns.
//! No tool use and no streaming — this pipeline never delegates
//! control flow to the model.

use coinq_domain::{Error, Result};
use serde_json::Value;

use crate::traits::{ChatRequest, ChatResponse, ChatRole, EmbeddingRequest, EmbeddingResponse, LlmClient, Usage};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(base_url: &str, api_key: impl Into<String>, default_model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: "anthropic".to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            default_model: default_model.into(),
            client,
        })
    }

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
    }

    fn build_messages_body(&self, req: &ChatRequest) -> Value {
        let model = req.model.clone().unwrap_or_else(|| self.default_model.clone());

        let mut system_parts: Vec<String> = Vec::new();
        let mut api_messages: Vec<Value> = Vec::new();

        for msg in &req.messages {
            match msg.role {
                ChatRole::System => system_parts.push(msg.content.clone()),
                ChatRole::User => api_messages.push(serde_json::json!({
                    "role": "user",
                    "content": msg.content,
                })),
                ChatRole::Assistant => api_messages.push(serde_json::json!({
                    "role": "assistant",
                    "content": msg.content,
                })),
            }
        }

        let mut body = serde_json::json!({
            "model": model,
            "messages": api_messages,
        });

        if !system_parts.is_empty() {
            body["system"] = Value::String(system_parts.join("\n\n"));
        }
        if let Some(temp) = req.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        body["max_tokens"] = serde_json::json!(req.max_tokens.unwrap_or(4096));

        body
    }
}

fn from_reqwest(e: reqwest::Error) -> Error {
    Error::Http(e.to_string())
}

fn parse_response(body: &Value) -> Result<ChatResponse> {
    let content = body
        .get("content")
        .and_then(|v| v.as_array())
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let model = body
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    let usage = body.get("usage").and_then(|u| {
        let input = u.get("input_tokens")?.as_u64()? as u32;
        let output = u.get("output_tokens")?.as_u64()? as u32;
        Some(Usage {
            prompt_tokens: input,
            completion_tokens: output,
        })
    });

    Ok(ChatResponse { content, model, usage })
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_messages_body(&req);

        tracing::debug!(provider = %self.id, "anthropic chat request");

        let resp = self.authed_post(&url).json(&body).send().await.map_err(from_reqwest)?;
        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::UpstreamFailure {
                provider: self.id.clone(),
                message: format!("HTTP {} - {}", status.as_u16(), text),
            });
        }

        let json: Value = serde_json::from_str(&text)?;
        parse_response(&json)
    }

    async fn embed(&self, _req: EmbeddingRequest) -> Result<EmbeddingResponse> {
        // Anthropic has no embeddings endpoint; deployments needing
        // `semantic_search` pair this client with an embeddings-capable
        // one for that role.
        Err(Error::UpstreamFailure {
            provider: self.id.clone(),
            message: "anthropic does not provide an embeddings API".to_string(),
        })
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
