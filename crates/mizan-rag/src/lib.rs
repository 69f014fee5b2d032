//! Bilingual legal-article retrieval and answer-trust engine.
//!
//! Turns a noisy English/Arabic legal question into a ranked set of
//! statutory articles and a calibrated confidence signal:
//!
//! - query normalization and expansion (including Arabic morphology)
//! - lexical substring search and semantic vector search, fused into one
//!   ranking with configurable weights
//! - optional LLM-based reranking of the top candidates
//! - confidence scoring, citation verification, and grounding of generated
//!   answers against the corpus
//!
//! Storage, chat orchestration, report rendering, and authentication are
//! external collaborators; this crate is a library boundary only.

pub mod arabic;
pub mod config;
pub mod confidence;
pub mod corpus;
pub mod embeddings;
pub mod engine;
pub mod error;
pub mod llm;
pub mod preprocess;
pub mod reranking;
pub mod search;
pub mod types;

// Re-export the primary surface for convenience
pub use config::RetrievalConfig;
pub use confidence::{
    grounding_score, score_confidence, verify_citations, ConfidenceFactors, ConfidenceLevel,
    ConfidenceScore, VerificationResult,
};
pub use corpus::{ArticleSource, InMemoryCorpus, RawArticle};
pub use embeddings::{Embedder, EmbeddingCache, RemoteEmbedder};
pub use engine::{HybridOptions, LegalRagEngine};
pub use error::{Result, RetrievalError};
pub use llm::{ChatMessage, ChatModel, RemoteChatModel};
pub use preprocess::preprocess;
pub use types::{
    Article, HybridSearchResult, LegalCategory, MatchSource, PreprocessedQuery, QueryLanguage,
    RerankOutcome, RerankResult, RerankedCandidate, ScoredCandidate, SearchQuality,
};
