use serde::{Deserialize, Serialize};

/// One indexed unit of statutory text — a law, or one numbered provision
/// within a law. Immutable once it crosses into the retrieval core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub law_name: String,
    /// May embed a 4-digit enactment year, e.g. "26/2007".
    pub law_number: String,
    pub article_number: Option<String>,
    pub title_en: String,
    pub title_ar: Option<String>,
    pub content_en: String,
    pub content_ar: Option<String>,
    pub category: LegalCategory,
    pub keywords: Vec<String>,
    /// Worked example illustrating how the provision applies.
    pub example: Option<String>,
    /// Attached post-creation by the ingestion pipeline; semantic search
    /// skips articles where this is absent.
    pub embedding: Option<Vec<f32>>,
}

impl Article {
    /// All searchable text of the article joined together, lowercased.
    /// Used by lexical matching, topic coverage, and grounding checks.
    pub fn combined_text(&self) -> String {
        let mut parts = vec![self.title_en.as_str(), self.content_en.as_str()];
        if let Some(ref t) = self.title_ar {
            parts.push(t);
        }
        if let Some(ref c) = self.content_ar {
            parts.push(c);
        }
        parts.join(" ").to_lowercase()
    }
}

/// Closed set of statutory families in the knowledge base. Declaration
/// order is the category-detection tie-break, so reordering variants is a
/// behavioral change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalCategory {
    RentalLaw,
    CivilCode,
    Regulatory,
    Escrow,
    RealEstate,
    Ownership,
    Procedural,
    Other,
}

impl LegalCategory {
    pub const ALL: [LegalCategory; 8] = [
        LegalCategory::RentalLaw,
        LegalCategory::CivilCode,
        LegalCategory::Regulatory,
        LegalCategory::Escrow,
        LegalCategory::RealEstate,
        LegalCategory::Ownership,
        LegalCategory::Procedural,
        LegalCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LegalCategory::RentalLaw => "rental_law",
            LegalCategory::CivilCode => "civil_code",
            LegalCategory::Regulatory => "regulatory",
            LegalCategory::Escrow => "escrow",
            LegalCategory::RealEstate => "real_estate",
            LegalCategory::Ownership => "ownership",
            LegalCategory::Procedural => "procedural",
            LegalCategory::Other => "other",
        }
    }
}

/// Dominant script of a query. Two-valued: there is no "mixed" state —
/// a query is Arabic-dominant or it is treated as Latin-script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryLanguage {
    Latin,
    Arabic,
}

/// Structured form of a raw user query after cleaning and expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessedQuery {
    pub original: String,
    /// Lowercase, whitespace-collapsed, punctuation stripped except for
    /// the script's own alphabet.
    pub cleaned: String,
    pub language: QueryLanguage,
    /// Canonical legal terms recognized in the query.
    pub legal_terms: Vec<String>,
    /// Synonym and morphology expansion terms (deduplicated, capped).
    pub expansion_terms: Vec<String>,
    pub category: Option<LegalCategory>,
    /// Cleaned text and every expansion term joined with OR-disjunction.
    pub expanded_query: String,
}

/// Which searcher produced a candidate before fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Lexical,
    Semantic,
    Both,
}

/// An article paired with its component and fused scores. All three scores
/// are in [0, 1]; fused = lexical_weight·lexical + semantic_weight·semantic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub article: Article,
    pub lexical_score: f32,
    pub semantic_score: f32,
    pub fused_score: f32,
    pub source: MatchSource,
}

/// Whether a hybrid result is the real fused ranking or the degraded
/// lexical-only fallback. Callers must branch on this, never on score
/// magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchQuality {
    Hybrid,
    KeywordOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridSearchResult {
    pub candidates: Vec<ScoredCandidate>,
    pub quality: SearchQuality,
}

/// A fused candidate after the optional LLM second pass.
///
/// `rerank_score` is the LLM's 0–100 relevance judgment, except on the
/// fallback path where it equals the original fused score so that a forced
/// fallback is byte-for-byte the input ranking. `previous_rank` is the
/// candidate's position before reranking and breaks score ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankedCandidate {
    pub candidate: ScoredCandidate,
    pub rerank_score: f32,
    pub previous_rank: usize,
}

/// Whether the LLM ranking was actually applied or the fused order was
/// kept (LLM unavailable, malformed output, length mismatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankOutcome {
    Reranked,
    FusedOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankResult {
    pub candidates: Vec<RerankedCandidate>,
    pub outcome: RerankOutcome,
}
