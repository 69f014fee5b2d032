//! Keyword/substring search over the article corpus.
//!
//! Intentionally the cheapest, lowest-latency stage: plain case-insensitive
//! substring matching, no term-frequency weighting. Ranking is corpus
//! insertion order; the fusion stage converts positions to scores. Zero
//! matches is a normal outcome, never an error.

use crate::corpus::ArticleSource;
use crate::types::{Article, PreprocessedQuery};

/// Tokens shorter than this match too much to be useful.
const MIN_TOKEN_CHARS: usize = 2;

/// An article matches when any of its keywords contains a query token as a
/// substring, or its title/body contains the whole cleaned query.
pub fn lexical_search(query: &PreprocessedQuery, corpus: &dyn ArticleSource) -> Vec<Article> {
    if query.cleaned.is_empty() {
        return Vec::new();
    }

    let mut tokens: Vec<String> = query
        .cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .map(|t| t.to_string())
        .collect();
    for term in &query.expansion_terms {
        let term = term.to_lowercase();
        if term.chars().count() >= MIN_TOKEN_CHARS && !tokens.contains(&term) {
            tokens.push(term);
        }
    }

    corpus
        .list_articles()
        .into_iter()
        .filter(|article| matches(article, &tokens, &query.cleaned))
        .collect()
}

fn matches(article: &Article, tokens: &[String], cleaned: &str) -> bool {
    let keyword_hit = article
        .keywords
        .iter()
        .any(|keyword| tokens.iter().any(|token| keyword.contains(token.as_str())));
    keyword_hit || article.combined_text().contains(cleaned)
}
