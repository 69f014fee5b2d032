//! LLM-based listwise reranker for fused search results.
//!
//! Fusion produces scores that mix positional and cosine signals; this
//! second pass asks a remote language model to judge each top candidate
//! against the query directly, producing a globally-consistent 0–100
//! relevance score per article.
//!
//! Reranking is strictly additive: on any failure (missing credential,
//! network error, unparseable output, wrong-length array) the input order
//! is returned unmodified with each rerank score set to the original fused
//! score, tagged `RerankOutcome::FusedOrder`.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::RerankConfig;
use crate::llm::{ChatMessage, ChatModel};
use crate::types::{RerankOutcome, RerankResult, RerankedCandidate, ScoredCandidate};

const SNIPPET_CHARS: usize = 300;

pub struct LlmReranker {
    model: Arc<dyn ChatModel>,
    max_candidates: usize,
    timeout: std::time::Duration,
    /// Best-effort memoization of parsed score arrays, keyed by query and
    /// candidate identity.
    cache: DashMap<String, Vec<f32>>,
}

impl LlmReranker {
    pub fn new(model: Arc<dyn ChatModel>, config: &RerankConfig) -> Self {
        Self {
            model,
            max_candidates: config.max_candidates,
            timeout: std::time::Duration::from_secs(config.timeout_secs),
            cache: DashMap::new(),
        }
    }

    /// Rerank up to `max_candidates` fused candidates, returning the final
    /// ordering truncated to `top_k`. Ordering is by rerank score
    /// descending; equal scores keep their pre-rerank order.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<ScoredCandidate>,
        top_k: usize,
    ) -> RerankResult {
        if candidates.len() <= 1 {
            return fused_order(candidates, top_k);
        }

        let head_len = candidates.len().min(self.max_candidates);
        let cache_key = cache_key(query, &candidates[..head_len]);

        let scores = if let Some(cached) = self.cache.get(&cache_key) {
            cached.clone()
        } else {
            match self.score_remote(query, &candidates[..head_len]).await {
                Some(scores) => {
                    self.cache.insert(cache_key, scores.clone());
                    scores
                }
                None => return fused_order(candidates, top_k),
            }
        };

        let mut reranked: Vec<RerankedCandidate> = candidates
            .into_iter()
            .enumerate()
            .map(|(previous_rank, candidate)| {
                // Candidates beyond the prompt head keep their fused score.
                let rerank_score = scores
                    .get(previous_rank)
                    .copied()
                    .unwrap_or(candidate.fused_score);
                RerankedCandidate {
                    candidate,
                    rerank_score,
                    previous_rank,
                }
            })
            .collect();

        // Stable sort: ties stay in pre-rerank order.
        reranked.sort_by(|a, b| {
            b.rerank_score
                .partial_cmp(&a.rerank_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        reranked.truncate(top_k);

        RerankResult {
            candidates: reranked,
            outcome: RerankOutcome::Reranked,
        }
    }

    async fn score_remote(&self, query: &str, head: &[ScoredCandidate]) -> Option<Vec<f32>> {
        let prompt = build_prompt(query, head);
        let messages = [
            ChatMessage::system(
                "You are a legal search relevance judge. Respond with JSON only.",
            ),
            ChatMessage::user(prompt),
        ];

        let raw = match tokio::time::timeout(self.timeout, self.model.complete(&messages)).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "rerank call failed, keeping fused order");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "rerank call timed out, keeping fused order"
                );
                return None;
            }
        };

        match parse_scores(&raw, head.len()) {
            Some(scores) => Some(scores),
            None => {
                tracing::warn!(
                    output = %raw.chars().take(200).collect::<String>(),
                    "could not parse rerank output, keeping fused order"
                );
                None
            }
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// Return the input order unmodified with rerank score equal to the fused
/// score. This is the fallback law: a forced fallback is byte-for-byte the
/// fused ranking. Also the result shape when no chat model is configured
/// at all — reranking is strictly optional.
pub fn fused_order(candidates: Vec<ScoredCandidate>, top_k: usize) -> RerankResult {
    let reranked = candidates
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(previous_rank, candidate)| RerankedCandidate {
            rerank_score: candidate.fused_score,
            candidate,
            previous_rank,
        })
        .collect();
    RerankResult {
        candidates: reranked,
        outcome: RerankOutcome::FusedOrder,
    }
}

fn cache_key(query: &str, head: &[ScoredCandidate]) -> String {
    let ids: Vec<String> = head.iter().map(|c| c.article.id.to_string()).collect();
    format!("{}|{}", query, ids.join(","))
}

fn build_prompt(query: &str, head: &[ScoredCandidate]) -> String {
    let listing: String = head
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let a = &c.article;
            let snippet: String = a.content_en.chars().take(SNIPPET_CHARS).collect();
            let article_ref = a
                .article_number
                .as_deref()
                .map(|n| format!(", Article {}", n))
                .unwrap_or_default();
            format!(
                "[{}] {} (Law {}{})\n{}",
                i + 1,
                a.title_en,
                a.law_number,
                article_ref,
                snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Score each numbered legal article for relevance to the question.\n\n\
         Question: \"{}\"\n\n\
         Articles:\n{}\n\n\
         Score each article 0-100 weighing: whether it directly answers the \
         question (40%), how specific its citation is to the issue (30%), its \
         practical applicability (20%), and its completeness (10%).\n\
         Return ONLY a JSON array of {} numbers, one score per article in the \
         order given. Example: [85, 40, 72]\n\
         Output ONLY the JSON array, nothing else.",
        query,
        listing,
        head.len()
    )
}

/// Extract the first well-formed numeric array from the model output.
///
/// Two-tier strategy: direct JSON parse of the (fence-stripped) output,
/// then the first `[...]` substring. Anything else — including an array of
/// the wrong length or out-of-range values — is rejected so the caller
/// falls back to the fused order.
fn parse_scores(output: &str, expected_count: usize) -> Option<Vec<f32>> {
    let trimmed = output
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if let Some(scores) = try_parse_array(trimmed, expected_count) {
        return Some(scores);
    }

    if let Some(start) = trimmed.find('[') {
        if let Some(end) = trimmed[start..].find(']') {
            let slice = &trimmed[start..=start + end];
            if let Some(scores) = try_parse_array(slice, expected_count) {
                return Some(scores);
            }
        }
    }

    None
}

fn try_parse_array(text: &str, expected_count: usize) -> Option<Vec<f32>> {
    let values: Vec<f64> = serde_json::from_str(text).ok()?;
    if values.len() != expected_count {
        return None;
    }
    if !values.iter().all(|v| v.is_finite() && (0.0..=100.0).contains(v)) {
        return None;
    }
    Some(values.into_iter().map(|v| v as f32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalConfig;
    use crate::llm::test_support::{FailingChatModel, ScriptedChatModel};
    use crate::types::test_support::article;
    use crate::types::MatchSource;

    fn candidates(scores: &[f32]) -> Vec<ScoredCandidate> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &fused)| ScoredCandidate {
                article: article(i as i64 + 1, &format!("title {}", i + 1), "body", &["kw"]),
                lexical_score: 0.0,
                semantic_score: fused,
                fused_score: fused,
                source: MatchSource::Semantic,
            })
            .collect()
    }

    fn reranker(model: Arc<dyn ChatModel>) -> LlmReranker {
        LlmReranker::new(model, &RetrievalConfig::default().rerank)
    }

    #[test]
    fn test_parse_clean_json() {
        assert_eq!(parse_scores("[90, 40, 72]", 3), Some(vec![90.0, 40.0, 72.0]));
    }

    #[test]
    fn test_parse_with_fences_and_wrapping_text() {
        assert_eq!(
            parse_scores("```json\n[10, 20]\n```", 2),
            Some(vec![10.0, 20.0])
        );
        assert_eq!(
            parse_scores("Here are the scores: [55.5, 0] as requested.", 2),
            Some(vec![55.5, 0.0])
        );
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(parse_scores("[90, 40]", 3), None);
        assert_eq!(parse_scores("[90, 40, 72, 11]", 3), None);
    }

    #[test]
    fn test_parse_rejects_out_of_range_and_garbage() {
        assert_eq!(parse_scores("[90, 140, 72]", 3), None);
        assert_eq!(parse_scores("[90, -5, 72]", 3), None);
        assert_eq!(parse_scores("no scores here", 3), None);
    }

    #[tokio::test]
    async fn test_rerank_orders_by_score() {
        let model = Arc::new(ScriptedChatModel {
            response: "[10, 95, 50]".to_string(),
        });
        let result = reranker(model).rerank("query", candidates(&[0.9, 0.8, 0.7]), 10).await;
        assert_eq!(result.outcome, RerankOutcome::Reranked);
        let ids: Vec<i64> = result.candidates.iter().map(|c| c.candidate.article.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(result.candidates[0].previous_rank, 1);
    }

    #[tokio::test]
    async fn test_rerank_ties_keep_prerank_order() {
        let model = Arc::new(ScriptedChatModel {
            response: "[80, 80, 90]".to_string(),
        });
        let result = reranker(model).rerank("query", candidates(&[0.9, 0.8, 0.7]), 10).await;
        let ids: Vec<i64> = result.candidates.iter().map(|c| c.candidate.article.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_forced_failure_returns_fused_order() {
        let input = candidates(&[0.9, 0.8, 0.7]);
        let result = reranker(Arc::new(FailingChatModel))
            .rerank("query", input.clone(), 10)
            .await;
        assert_eq!(result.outcome, RerankOutcome::FusedOrder);
        for (i, reranked) in result.candidates.iter().enumerate() {
            assert_eq!(reranked.candidate.article.id, input[i].article.id);
            assert_eq!(reranked.rerank_score, input[i].fused_score);
            assert_eq!(reranked.previous_rank, i);
        }
    }

    #[tokio::test]
    async fn test_wrong_length_response_falls_back() {
        let model = Arc::new(ScriptedChatModel {
            response: "[90, 40]".to_string(),
        });
        let result = reranker(model).rerank("query", candidates(&[0.9, 0.8, 0.7]), 10).await;
        assert_eq!(result.outcome, RerankOutcome::FusedOrder);
    }

    #[tokio::test]
    async fn test_single_candidate_skips_llm() {
        let result = reranker(Arc::new(FailingChatModel))
            .rerank("query", candidates(&[0.9]), 10)
            .await;
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.outcome, RerankOutcome::FusedOrder);
    }

    #[tokio::test]
    async fn test_rerank_cache_reuses_scores() {
        let model = Arc::new(ScriptedChatModel {
            response: "[10, 95]".to_string(),
        });
        let reranker = reranker(model);
        let first = reranker.rerank("q", candidates(&[0.9, 0.8]), 10).await;
        let second = reranker.rerank("q", candidates(&[0.9, 0.8]), 10).await;
        assert_eq!(
            first.candidates[0].candidate.article.id,
            second.candidates[0].candidate.article.id
        );
        reranker.clear_cache();
    }
}
