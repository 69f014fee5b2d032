//! Article corpus access boundary.
//!
//! Articles arrive from ingestion in several historical shapes — keywords as
//! a JSON array, as a delimited string, or under a `tags` field. All shape
//! tolerance lives in [`RawArticle`], applied exactly once when an article
//! crosses into the core; search and scoring logic only ever sees the
//! normalized [`Article`].

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::types::{Article, LegalCategory};

/// Read access to the article corpus. No write access is required by the
/// retrieval core; ingestion lives elsewhere.
pub trait ArticleSource: Send + Sync {
    /// All articles in insertion order. Insertion order is the lexical
    /// searcher's ranking, so implementations must keep it stable.
    fn list_articles(&self) -> Vec<Article>;

    fn list_articles_in_category(&self, category: LegalCategory) -> Vec<Article> {
        self.list_articles()
            .into_iter()
            .filter(|a| a.category == category)
            .collect()
    }

    fn article_count(&self) -> usize {
        self.list_articles().len()
    }
}

/// Insertion-ordered in-memory corpus, read-only after construction.
pub struct InMemoryCorpus {
    articles: Vec<Article>,
}

impl InMemoryCorpus {
    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    /// Deserialize a corpus from a JSON array of raw article records,
    /// normalizing keyword shapes and rejecting articles that violate the
    /// corpus invariants.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<RawArticle> =
            serde_json::from_str(json).context("Failed to parse article corpus JSON")?;
        let articles = raw
            .into_iter()
            .map(RawArticle::into_article)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(articles))
    }

    /// Article counts per category, for engine diagnostics.
    pub fn category_counts(&self) -> Vec<(LegalCategory, usize)> {
        LegalCategory::ALL
            .iter()
            .map(|&c| (c, self.articles.iter().filter(|a| a.category == c).count()))
            .filter(|&(_, n)| n > 0)
            .collect()
    }
}

impl ArticleSource for InMemoryCorpus {
    fn list_articles(&self) -> Vec<Article> {
        self.articles.clone()
    }
}

/// Keyword field as it appears in the wild: a proper list, or a single
/// delimited string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeywordShape {
    List(Vec<String>),
    Joined(String),
}

impl KeywordShape {
    fn into_set(self) -> Vec<String> {
        let raw = match self {
            KeywordShape::List(list) => list,
            KeywordShape::Joined(s) => s
                .split([',', ';'])
                .map(|k| k.to_string())
                .collect(),
        };
        let mut keywords = Vec::new();
        for k in raw {
            let k = k.trim().to_lowercase();
            if !k.is_empty() && !keywords.contains(&k) {
                keywords.push(k);
            }
        }
        keywords
    }
}

/// Wire-shape article record as produced by ingestion.
#[derive(Debug, Deserialize)]
pub struct RawArticle {
    pub id: i64,
    pub law_name: String,
    pub law_number: String,
    #[serde(default)]
    pub article_number: Option<String>,
    pub title_en: String,
    #[serde(default)]
    pub title_ar: Option<String>,
    pub content_en: String,
    #[serde(default)]
    pub content_ar: Option<String>,
    pub category: LegalCategory,
    #[serde(default)]
    keywords: Option<KeywordShape>,
    /// Legacy field name for keywords.
    #[serde(default)]
    tags: Option<KeywordShape>,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl RawArticle {
    /// Normalize into a core [`Article`], enforcing the corpus invariants:
    /// non-empty law name, law number, English title and body, and at least
    /// one keyword.
    pub fn into_article(self) -> Result<Article> {
        let keywords = self
            .keywords
            .or(self.tags)
            .map(KeywordShape::into_set)
            .unwrap_or_default();

        if self.law_name.trim().is_empty() {
            bail!("article {}: empty law name", self.id);
        }
        if self.law_number.trim().is_empty() {
            bail!("article {}: empty law number", self.id);
        }
        if self.title_en.trim().is_empty() || self.content_en.trim().is_empty() {
            bail!("article {}: empty English title or body", self.id);
        }
        if keywords.is_empty() {
            bail!("article {}: no keywords", self.id);
        }

        Ok(Article {
            id: self.id,
            law_name: self.law_name,
            law_number: self.law_number,
            article_number: self.article_number,
            title_en: self.title_en,
            title_ar: self.title_ar,
            content_en: self.content_en,
            content_ar: self.content_ar,
            category: self.category,
            keywords,
            example: self.example,
            embedding: self.embedding,
        })
    }
}
