//! Library facade wiring the retrieval pipeline together.
//!
//! Owns the corpus handle, the embedding and chat seams, and the
//! process-wide caches. Collaborators (consultation orchestration, answer
//! generation, storage) interact only through the methods here.

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::confidence::{self, ConfidenceScore, VerificationResult};
use crate::corpus::ArticleSource;
use crate::embeddings::{Embedder, EmbeddingCache, UnboundedCache};
use crate::error::Result;
use crate::llm::ChatModel;
use crate::preprocess;
use crate::reranking::llm_reranker::{self, LlmReranker};
use crate::search::{fuse, keyword_only, lexical_search, SemanticSearch};
use crate::types::{
    Article, HybridSearchResult, LegalCategory, PreprocessedQuery, RerankResult, ScoredCandidate,
    SearchQuality,
};

/// Per-call overrides for [`LegalRagEngine::hybrid_search`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridOptions {
    /// Restrict the semantic pass to one category.
    pub category_filter: Option<LegalCategory>,
    /// Override the configured fusion weights. Both must be given and sum
    /// to 1.0; a lone override is ignored.
    pub lexical_weight: Option<f32>,
    pub semantic_weight: Option<f32>,
}

pub struct LegalRagEngine {
    corpus: Arc<dyn ArticleSource>,
    config: RetrievalConfig,
    semantic: SemanticSearch,
    reranker: Option<LlmReranker>,
}

impl LegalRagEngine {
    /// Build an engine with the default unbounded embedding cache.
    pub fn new(
        corpus: Arc<dyn ArticleSource>,
        embedder: Arc<dyn Embedder>,
        config: RetrievalConfig,
    ) -> Self {
        Self::with_cache(corpus, embedder, Arc::new(UnboundedCache::new()), config)
    }

    /// Build an engine with an injected embedding cache (bounded, no-op, …).
    pub fn with_cache(
        corpus: Arc<dyn ArticleSource>,
        embedder: Arc<dyn Embedder>,
        cache: Arc<dyn EmbeddingCache>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            semantic: SemanticSearch::new(embedder, cache),
            corpus,
            reranker: None,
            config,
        }
    }

    /// Attach a chat model, enabling the LLM rerank pass. Without one,
    /// `rerank` returns the fused order — reranking is strictly optional.
    pub fn with_chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.reranker = Some(LlmReranker::new(model, &self.config.rerank));
        self
    }

    pub fn preprocess(&self, raw_query: &str) -> PreprocessedQuery {
        preprocess::preprocess(raw_query)
    }

    /// Run lexical and semantic search concurrently and fuse the results.
    ///
    /// A transient semantic failure degrades to lexical-only candidates
    /// tagged [`SearchQuality::KeywordOnly`]; a fatal configuration error
    /// propagates. `top_k == 0` uses the configured default.
    pub async fn hybrid_search(
        &self,
        query: &str,
        top_k: usize,
        opts: HybridOptions,
    ) -> Result<HybridSearchResult> {
        let preprocessed = self.preprocess(query);
        if preprocessed.cleaned.is_empty() {
            return Ok(HybridSearchResult {
                candidates: Vec::new(),
                quality: SearchQuality::Hybrid,
            });
        }

        let top_k = if top_k == 0 {
            self.config.fusion.default_top_k
        } else {
            top_k
        };
        let (lexical_weight, semantic_weight) = match (opts.lexical_weight, opts.semantic_weight) {
            (Some(lex), Some(sem)) => (lex, sem),
            _ => (
                self.config.fusion.lexical_weight,
                self.config.fusion.semantic_weight,
            ),
        };

        let (lexical, semantic) = tokio::join!(
            async { lexical_search(&preprocessed, self.corpus.as_ref()) },
            self.semantic.search(
                self.corpus.as_ref(),
                &preprocessed.cleaned,
                top_k,
                opts.category_filter,
            )
        );

        match semantic {
            Ok(semantic) => Ok(HybridSearchResult {
                candidates: fuse(
                    lexical,
                    semantic,
                    lexical_weight,
                    semantic_weight,
                    top_k,
                    self.config.fusion.min_score_threshold,
                ),
                quality: SearchQuality::Hybrid,
            }),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "semantic search unavailable, falling back to keyword-only results"
                );
                Ok(HybridSearchResult {
                    candidates: keyword_only(lexical, top_k),
                    quality: SearchQuality::KeywordOnly,
                })
            }
        }
    }

    /// Second-pass LLM reranking of fused candidates.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<ScoredCandidate>,
        top_k: usize,
    ) -> RerankResult {
        match &self.reranker {
            Some(reranker) => reranker.rerank(query, candidates, top_k).await,
            None => llm_reranker::fused_order(candidates, top_k),
        }
    }

    pub fn score_confidence(&self, query: &str, relevant_articles: &[Article]) -> ConfidenceScore {
        confidence::score_confidence(query, relevant_articles)
    }

    pub fn verify_citations(&self, answer: &str) -> VerificationResult {
        confidence::verify_citations(answer, &self.corpus.list_articles())
    }

    pub fn grounding_score(&self, answer: &str, used_articles: &[Article]) -> f32 {
        confidence::grounding_score(answer, used_articles)
    }

    /// Drop all memoized embeddings and rerank scores. The documented
    /// eviction point for the unbounded process-wide caches.
    pub fn clear_caches(&self) {
        self.semantic.clear_cache();
        if let Some(reranker) = &self.reranker {
            reranker.clear_cache();
        }
    }
}
