//! Remote language-model boundary.
//!
//! A single `complete(messages) -> text` seam over an OpenAI-compatible
//! chat completions endpoint. The reranker consumes it here; the answer
//! generator (out of scope) consumes the same interface elsewhere.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::ChatConfig;
use crate::error::{Result, RetrievalError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct RemoteChatModel {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: String,
}

impl RemoteChatModel {
    pub fn new(config: &ChatConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl ChatModel for RemoteChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RetrievalError::MissingCredential("LLM API key"))?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "messages": messages,
                "max_tokens": self.max_tokens,
                "temperature": 0.0,
            }))
            .send()
            .await
            .map_err(|e| RetrievalError::service("llm", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RetrievalError::service("llm", e))?;
        if !status.is_success() {
            return Err(RetrievalError::Service {
                service: "llm",
                message: format!("HTTP {}: {}", status, truncate(&body, 200)),
            });
        }
        if body.trim_start().starts_with('<') {
            return Err(RetrievalError::malformed(
                "llm",
                format!("body was HTML, not JSON: {}", truncate(&body, 200)),
            ));
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| RetrievalError::malformed("llm", e))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| RetrievalError::malformed("llm", "empty choices array"))
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
