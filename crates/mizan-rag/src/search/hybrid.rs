//! Score fusion for lexical and semantic candidate lists.
//!
//! Lexical positions become `1/(rank+1)` scores; semantic cosine scores are
//! min-max rescaled to [0, 1] over the returned set. Lists merge by article
//! identity, a missing component scores 0, and the fused score is the
//! configured weighted sum.

use std::collections::HashMap;

use crate::types::{Article, MatchSource, ScoredCandidate};

/// Fixed fused score assigned to every candidate on the lexical-only
/// fallback path (semantic outage). Deliberately a placeholder: callers
/// distinguish degraded results by `SearchQuality::KeywordOnly`, never by
/// this value.
pub const KEYWORD_ONLY_SCORE: f32 = 0.5;

/// Merge lexical and semantic results into one fused ranking: sorted by
/// fused score descending, truncated to `top_k`, then filtered by
/// `min_score` (dropped, not zero-padded).
pub fn fuse(
    lexical: Vec<Article>,
    semantic: Vec<(Article, f32)>,
    lexical_weight: f32,
    semantic_weight: f32,
    top_k: usize,
    min_score: f32,
) -> Vec<ScoredCandidate> {
    struct Entry {
        article: Article,
        lexical: f32,
        semantic: f32,
        source: MatchSource,
    }

    let mut merged: HashMap<i64, Entry> = HashMap::new();

    for (rank, article) in lexical.into_iter().enumerate() {
        let score = 1.0 / (rank as f32 + 1.0);
        merged.insert(
            article.id,
            Entry {
                article,
                lexical: score,
                semantic: 0.0,
                source: MatchSource::Lexical,
            },
        );
    }

    for (article, score) in normalize_semantic(semantic) {
        match merged.get_mut(&article.id) {
            Some(entry) => {
                entry.semantic = score;
                entry.source = MatchSource::Both;
            }
            None => {
                merged.insert(
                    article.id,
                    Entry {
                        article,
                        lexical: 0.0,
                        semantic: score,
                        source: MatchSource::Semantic,
                    },
                );
            }
        }
    }

    let mut candidates: Vec<ScoredCandidate> = merged
        .into_values()
        .map(|entry| {
            let fused = lexical_weight * entry.lexical + semantic_weight * entry.semantic;
            ScoredCandidate {
                article: entry.article,
                lexical_score: entry.lexical,
                semantic_score: entry.semantic,
                fused_score: fused,
                source: entry.source,
            }
        })
        .collect();

    // Deterministic order: fused descending, article id as the tie-break
    // (HashMap iteration order must not leak into results).
    candidates.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.article.id.cmp(&b.article.id))
    });
    candidates.truncate(top_k);
    candidates.retain(|c| c.fused_score >= min_score);
    candidates
}

/// Min-max rescale semantic scores to [0, 1] over the returned set. When
/// all scores are equal there is no range to divide by; scores are left as
/// they are, clamped into [0, 1].
fn normalize_semantic(results: Vec<(Article, f32)>) -> Vec<(Article, f32)> {
    if results.is_empty() {
        return results;
    }
    let max = results.iter().map(|(_, s)| *s).fold(f32::MIN, f32::max);
    let min = results.iter().map(|(_, s)| *s).fold(f32::MAX, f32::min);
    if (max - min).abs() < 1e-9 {
        return results
            .into_iter()
            .map(|(a, s)| (a, s.clamp(0.0, 1.0)))
            .collect();
    }
    let range = max - min;
    results
        .into_iter()
        .map(|(a, s)| (a, (s - min) / range))
        .collect()
}

/// Lexical-only fallback candidates for a semantic-service outage. The
/// lexical component keeps its position score; the fused score is the
/// documented [`KEYWORD_ONLY_SCORE`] placeholder.
pub fn keyword_only(lexical: Vec<Article>, top_k: usize) -> Vec<ScoredCandidate> {
    lexical
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(rank, article)| ScoredCandidate {
            article,
            lexical_score: 1.0 / (rank as f32 + 1.0),
            semantic_score: 0.0,
            fused_score: KEYWORD_ONLY_SCORE,
            source: MatchSource::Lexical,
        })
        .collect()
}
