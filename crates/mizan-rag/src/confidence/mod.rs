//! Answer-trust scoring.
//!
//! Produces a 0–100 confidence score from four factors — knowledge-base
//! coverage, article-count support, legal clarity, and (inverted) query
//! complexity — plus a fixed-order recommendation list. Citation
//! verification and grounding live in the submodules. Nothing here calls a
//! remote service, so this layer has no transient-failure class.

pub mod citations;
pub mod grounding;

pub use citations::{verify_citations, CitationMatch, ExtractedCitation, VerificationResult};
pub use grounding::grounding_score;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::arabic;
use crate::types::Article;

/// Factor weights: coverage, article support, clarity, inverted complexity.
const COVERAGE_WEIGHT: f32 = 0.40;
const SUPPORT_WEIGHT: f32 = 0.20;
const CLARITY_WEIGHT: f32 = 0.25;
const SIMPLICITY_WEIGHT: f32 = 0.15;

/// Legal topic keywords extracted from queries and matched against
/// articles, bilingual (Arabic patterns in normalized orthography).
const TOPIC_PATTERNS: [(&str, &[&str]); 10] = [
    ("rent", &["rent", "ايجار", "اجره"]),
    ("eviction", &["eviction", "evict", "اخلاء"]),
    ("deposit", &["deposit", "تامين", "وديعه"]),
    ("maintenance", &["maintenance", "repair", "صيانه", "اصلاح"]),
    ("contract", &["contract", "agreement", "عقد", "اتفاقيه"]),
    ("increase", &["increase", "raise", "زياده"]),
    ("termination", &["termination", "cancel", "فسخ", "انهاء"]),
    ("notice", &["notice", "notification", "اخطار", "انذار"]),
    ("dispute", &["dispute", "claim", "نزاع", "دعوي"]),
    ("ownership", &["ownership", "ملكيه", "تملك"]),
];

static HEDGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(may|might|could|reasonable|appropriate|generally|usually|typically|discretion|قد|يجوز|ربما|معقول|مناسب)\b",
    )
    .expect("hedge-word regex is valid")
});

/// Numbers, percentages, date fragments, currency amounts.
static SPECIFICITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+\s*%|٪|aed\s*[\d,]+|درهم|\d+\s*(day|month|year)s?|\d+/\d{4}|\d+")
        .expect("specificity regex is valid")
});

static CONDITIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(if|unless|provided that|in case|except|اذا|ما لم|بشرط)\b")
        .expect("conditional regex is valid")
});

static MULTI_PARTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(landlord and tenant|both parties|all parties|third party|sublease|subtenant|الطرفين|جميع الاطراف|الباطن)\b",
    )
    .expect("multi-party regex is valid")
});

static CROSS_BORDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(abroad|overseas|foreign|international|خارج|اجنبي)\b")
        .expect("cross-border regex is valid")
});

static DEFINITIONAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(what is|what are|define|explain|meaning of|ما هو|ما هي|اشرح)\b")
        .expect("definitional regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn from_overall(overall: u8) -> Self {
        match overall {
            90..=100 => ConfidenceLevel::VeryHigh,
            75..=89 => ConfidenceLevel::High,
            60..=74 => ConfidenceLevel::Medium,
            40..=59 => ConfidenceLevel::Low,
            _ => ConfidenceLevel::VeryLow,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    pub knowledge_coverage: f32,
    pub article_support: f32,
    pub legal_clarity: f32,
    /// Higher means more complex; the overall score weighs its inverse.
    pub query_complexity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceScore {
    /// Weighted sum of the factors, rounded: coverage 0.40, support 0.20,
    /// clarity 0.25, inverted complexity 0.15.
    pub overall: u8,
    pub level: ConfidenceLevel,
    pub factors: ConfidenceFactors,
    pub requires_lawyer_review: bool,
    pub recommendations: Vec<String>,
}

/// Score how much an answer built from `relevant_articles` should be
/// trusted for `query`.
pub fn score_confidence(query: &str, relevant_articles: &[Article]) -> ConfidenceScore {
    let factors = ConfidenceFactors {
        knowledge_coverage: coverage_factor(query, relevant_articles),
        article_support: (relevant_articles.len() as f32 * 10.0).min(100.0),
        legal_clarity: clarity_factor(relevant_articles),
        query_complexity: complexity_factor(query),
    };

    let overall = (factors.knowledge_coverage * COVERAGE_WEIGHT
        + factors.article_support * SUPPORT_WEIGHT
        + factors.legal_clarity * CLARITY_WEIGHT
        + (100.0 - factors.query_complexity) * SIMPLICITY_WEIGHT)
        .round()
        .clamp(0.0, 100.0) as u8;

    ConfidenceScore {
        overall,
        level: ConfidenceLevel::from_overall(overall),
        requires_lawyer_review: overall < 60,
        recommendations: recommendations(&factors, relevant_articles.len(), overall),
        factors,
    }
}

fn searchable(text: &str) -> String {
    arabic::normalize(&text.to_lowercase())
}

/// Topics present in a text, by bilingual pattern containment.
fn detect_topics(text: &str) -> Vec<&'static str> {
    let haystack = searchable(text);
    TOPIC_PATTERNS
        .iter()
        .filter(|(_, patterns)| patterns.iter().any(|p| haystack.contains(p)))
        .map(|(topic, _)| *topic)
        .collect()
}

/// Fraction of query topics also present in at least one relevant article.
/// No relevant articles scores 0; a query with no recognizable topic
/// scores a neutral 50.
fn coverage_factor(query: &str, articles: &[Article]) -> f32 {
    if articles.is_empty() {
        return 0.0;
    }
    let query_topics = detect_topics(query);
    if query_topics.is_empty() {
        return 50.0;
    }

    let article_texts: Vec<String> = articles
        .iter()
        .map(|a| searchable(&format!("{} {}", a.combined_text(), a.keywords.join(" "))))
        .collect();

    let covered = TOPIC_PATTERNS
        .iter()
        .filter(|(name, patterns)| {
            query_topics.contains(name)
                && article_texts
                    .iter()
                    .any(|text| patterns.iter().any(|p| text.contains(p)))
        })
        .count();

    covered as f32 / query_topics.len() as f32 * 100.0
}

/// Average per-article clarity: hedge words subtract, concrete numbers and
/// worked examples add.
fn clarity_factor(articles: &[Article]) -> f32 {
    if articles.is_empty() {
        return 0.0;
    }
    let total: f32 = articles
        .iter()
        .map(|article| {
            let text = searchable(&format!(
                "{} {}",
                article.content_en,
                article.content_ar.as_deref().unwrap_or("")
            ));
            let mut score = 100.0;
            score -= 5.0 * HEDGE_RE.find_iter(&text).count() as f32;
            if SPECIFICITY_RE.is_match(&text) {
                score += 10.0;
            }
            if article.example.is_some() {
                score += 15.0;
            }
            score.clamp(0.0, 100.0)
        })
        .sum();
    total / articles.len() as f32
}

/// Query-only complexity estimate; higher means more complex.
fn complexity_factor(query: &str) -> f32 {
    let text = searchable(query);
    let mut score: f32 = 50.0;

    let topic_count = detect_topics(query).len();
    if topic_count > 2 {
        score += 15.0;
    }
    if topic_count > 4 {
        score += 15.0;
    }
    if CONDITIONAL_RE.is_match(&text) {
        score += 10.0;
    }
    if MULTI_PARTY_RE.is_match(&text) {
        score += 10.0;
    }
    if CROSS_BORDER_RE.is_match(&text) {
        score += 15.0;
    }
    let length = query.chars().count();
    if length > 500 {
        score += 10.0;
    }
    if length > 1000 {
        score += 10.0;
    }
    if DEFINITIONAL_RE.is_match(&text) {
        score -= 15.0;
    }

    score.clamp(0.0, 100.0)
}

/// Fixed-rule recommendations in fixed order: coverage → count → clarity →
/// complexity → overall. Multiple rules may fire together.
fn recommendations(factors: &ConfidenceFactors, article_count: usize, overall: u8) -> Vec<String> {
    let mut recs = Vec::new();
    if factors.knowledge_coverage < 70.0 {
        recs.push(
            "The knowledge base has limited coverage of this topic; the cited provisions may not be exhaustive."
                .to_string(),
        );
    }
    if article_count == 0 {
        recs.push(
            "No relevant articles were found in the knowledge base; consult a licensed lawyer before acting."
                .to_string(),
        );
    } else if article_count < 3 {
        recs.push(
            "Only a few supporting articles were found; the answer may not reflect every applicable provision."
                .to_string(),
        );
    }
    if factors.legal_clarity < 60.0 {
        recs.push(
            "The applicable provisions use discretionary language; outcomes can vary with the specific circumstances."
                .to_string(),
        );
    }
    if factors.query_complexity > 70.0 {
        recs.push(
            "The question combines several legal issues; consider asking about each issue separately."
                .to_string(),
        );
    }
    if overall < 60 {
        recs.push("Confidence is low; have a qualified lawyer review this answer.".to_string());
    } else if overall >= 90 {
        recs.push("The answer is well supported by specific statutory provisions.".to_string());
    }
    recs
}
