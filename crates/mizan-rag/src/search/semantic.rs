//! Dense-vector search over pre-embedded articles.
//!
//! The query is embedded through the remote service (behind the injected
//! cache); articles are ranked by cosine similarity. Articles without a
//! stored embedding are skipped, not errors.

use std::sync::Arc;

use crate::corpus::ArticleSource;
use crate::embeddings::{Embedder, EmbeddingCache};
use crate::error::Result;
use crate::types::{Article, LegalCategory};

pub struct SemanticSearch {
    embedder: Arc<dyn Embedder>,
    cache: Arc<dyn EmbeddingCache>,
}

impl SemanticSearch {
    pub fn new(embedder: Arc<dyn Embedder>, cache: Arc<dyn EmbeddingCache>) -> Self {
        Self { embedder, cache }
    }

    /// Fetch the query embedding, going to the remote service only on a
    /// cache miss. Errors (fatal or transient) propagate to the caller —
    /// fallback policy lives in the fusion layer.
    pub async fn query_embedding(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(vector) = self.cache.get(text) {
            return Ok(vector);
        }
        let vector = self.embedder.embed(text).await?;
        self.cache.insert(text.to_string(), vector.clone());
        Ok(vector)
    }

    /// Top-K articles by cosine similarity, optionally pre-filtered by
    /// category. Empty query or empty corpus yields an empty list.
    pub async fn search(
        &self,
        corpus: &dyn ArticleSource,
        query_text: &str,
        top_k: usize,
        category_filter: Option<LegalCategory>,
    ) -> Result<Vec<(Article, f32)>> {
        if query_text.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let articles = match category_filter {
            Some(category) => corpus.list_articles_in_category(category),
            None => corpus.list_articles(),
        };
        if articles.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.query_embedding(query_text).await?;

        let mut scored: Vec<(Article, f32)> = articles
            .into_iter()
            .filter_map(|article| {
                let similarity = article
                    .embedding
                    .as_ref()
                    .map(|e| cosine_similarity(&query_vector, e))?;
                Some((article, similarity))
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
