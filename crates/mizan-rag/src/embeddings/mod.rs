//! Remote embedding service client.
//!
//! Embeddings come from an HTTP service with a fixed output dimensionality.
//! A missing credential is a fatal configuration error raised at call time;
//! transport and shape failures are transient errors surfaced to the caller
//! for fallback handling — this module never retries internally.

pub mod cache;

pub use cache::{BoundedCache, EmbeddingCache, NoopCache, UnboundedCache};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::EmbeddingConfig;
use crate::error::{Result, RetrievalError};

/// Fixed pause between serialized batch-embedding calls, respecting
/// provider rate limits during offline ingestion.
const BATCH_CALL_DELAY_MS: u64 = 100;

/// Unified embedding seam. Implementations must be deterministic per input
/// text modulo service nondeterminism.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding vector dimension.
    fn dimension(&self) -> usize;
}

/// HTTP client for an OpenAI-compatible embeddings endpoint.
pub struct RemoteEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    /// The credential is read from process configuration here but its
    /// absence only becomes an error when a call is attempted.
    pub fn new(config: &EmbeddingConfig) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
            dimension: config.dimension,
        }
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RetrievalError::MissingCredential("embedding API key"))?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&json!({ "model": self.model, "input": text }))
            .send()
            .await
            .map_err(|e| RetrievalError::service("embedding", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Service {
                service: "embedding",
                message: format!("HTTP {}: {}", status, truncate(&body, 200)),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RetrievalError::service("embedding", e))?;
        if body.trim_start().starts_with('<') {
            return Err(RetrievalError::malformed(
                "embedding",
                format!("body was HTML, not JSON: {}", truncate(&body, 200)),
            ));
        }
        let parsed: EmbeddingResponse = serde_json::from_str(&body)
            .map_err(|e| RetrievalError::malformed("embedding", e))?;

        let vector = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RetrievalError::malformed("embedding", "empty data array"))?;
        if vector.len() != self.dimension {
            return Err(RetrievalError::malformed(
                "embedding",
                format!("expected {} dims, got {}", self.dimension, vector.len()),
            ));
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Embed a batch of texts serially with a fixed inter-call delay. Used by
/// offline ingestion; the delay is a deliberate provider-rate throttle, so
/// do not parallelize this.
pub async fn embed_batch(embedder: &dyn Embedder, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    let mut vectors = Vec::with_capacity(texts.len());
    for (i, text) in texts.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(BATCH_CALL_DELAY_MS)).await;
        }
        vectors.push(embedder.embed(text).await?);
        tracing::debug!(done = i + 1, total = texts.len(), "batch embedding progress");
    }
    Ok(vectors)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_is_fatal_at_call_time() {
        let config = EmbeddingConfig {
            endpoint: "https://example.invalid/v1/embeddings".to_string(),
            model: "test".to_string(),
            dimension: 4,
            api_key_env: "MIZAN_TEST_NO_SUCH_KEY".to_string(),
        };
        let embedder = RemoteEmbedder::new(&config);
        // Construction succeeds; the error surfaces on the first call.
        let err = tokio_test_block_on(embedder.embed("query"));
        assert!(matches!(err, Err(RetrievalError::MissingCredential(_))));
        assert!(err.unwrap_err().is_fatal());
    }

    #[test]
    fn test_batch_embed_preserves_order() {
        let embedder = test_support::StaticEmbedder::unit(4);
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let vectors = tokio_test_block_on(embed_batch(&embedder, &texts)).unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == 4));
    }

    fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
            .block_on(f)
    }
}
