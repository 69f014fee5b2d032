//! Citation extraction and verification for generated answers.
//!
//! Citations are substrings shaped like statutory references, extracted
//! with a fixed bilingual pattern set and verified against the corpus by
//! law-number/article-number containment. A law-number match scores 60
//! (exact) or 30 (fuzzy); the article-number component adds 40 (exact) or
//! 20 (fuzzy). A citation is valid when its best match reaches 80.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::Article;

const VALID_THRESHOLD: u8 = 80;

/// Bilingual citation patterns, most specific first. Later patterns are
/// suppressed where they overlap an earlier match.
static CITATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Article 7 of Law No. 26/2007  |  Article 7 of Decree 33 of 2008
        Regex::new(
            r"(?i)article\s+(?P<article>\d+)\s+of\s+(?:federal\s+)?(?:law|decree)\s+(?:no\.?\s*)?(?P<num>\d+)\s*(?:/|of\s+)\s*(?P<year>\d{4})",
        )
        .expect("citation pattern is valid"),
        // Law No. 26/2007
        Regex::new(
            r"(?i)(?:federal\s+)?(?:law|decree)\s+(?:no\.?\s*)?(?P<num>\d+)\s*(?:/|of\s+)\s*(?P<year>\d{4})",
        )
        .expect("citation pattern is valid"),
        // المادة 7 من القانون رقم 26 لسنة 2007 (clitic prefixes tolerated)
        Regex::new(
            r"(?:لل|ال)?ماد[ةه]\s*(?:رقم\s*)?(?P<article>\d+)\s*من\s*(?:لل|ال|بال|وال)?(?:قانون|مرسوم)\s*(?:رقم\s*)?(?P<num>\d+)\s*لسن[ةه]\s*(?P<year>\d{4})",
        )
        .expect("citation pattern is valid"),
        // القانون رقم 26 لسنة 2007
        Regex::new(
            r"(?:لل|ال|بال|وال)?(?:قانون|مرسوم)\s*(?:رقم\s*)?(?P<num>\d+)\s*لسن[ةه]\s*(?P<year>\d{4})",
        )
        .expect("citation pattern is valid"),
        // Standalone article references (not verifiable against a law)
        Regex::new(r"(?i)article\s+(?P<article>\d+)").expect("citation pattern is valid"),
        Regex::new(r"(?:لل|ال)?ماد[ةه]\s*(?P<article>\d+)").expect("citation pattern is valid"),
    ]
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedCitation {
    /// The matched answer substring, verbatim.
    pub raw: String,
    /// Canonical "number/year" form when the citation names a law.
    pub law_number: Option<String>,
    pub article_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationMatch {
    pub citation: ExtractedCitation,
    pub matched_article_id: Option<i64>,
    /// Best match confidence in [0, 100].
    pub confidence: u8,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub citations: Vec<CitationMatch>,
    pub total_citations: usize,
    pub valid_citations: usize,
    /// Vacuously true for an answer with no citations.
    pub all_valid: bool,
    pub warnings: Vec<String>,
}

/// Extract citation-shaped substrings from an answer. Deduplicated;
/// overlapping matches keep the most specific pattern.
pub fn extract_citations(answer: &str) -> Vec<ExtractedCitation> {
    let mut citations: Vec<ExtractedCitation> = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();

    for pattern in CITATION_PATTERNS.iter() {
        for cap in pattern.captures_iter(answer) {
            let whole = cap.get(0).expect("group 0 always present");
            let overlaps = spans
                .iter()
                .any(|&(start, end)| whole.start() < end && whole.end() > start);
            if overlaps {
                continue;
            }

            let law_number = match (cap.name("num"), cap.name("year")) {
                (Some(num), Some(year)) => Some(format!("{}/{}", num.as_str(), year.as_str())),
                _ => None,
            };
            let article_number = cap.name("article").map(|m| m.as_str().to_string());
            let raw = whole.as_str().to_string();

            if citations.iter().any(|c| c.raw == raw) {
                continue;
            }
            spans.push((whole.start(), whole.end()));
            citations.push(ExtractedCitation {
                raw,
                law_number,
                article_number,
            });
        }
    }

    citations
}

/// Verify every citation in an answer against the corpus, taking the
/// best-scoring article per citation.
pub fn verify_citations(answer: &str, corpus: &[Article]) -> VerificationResult {
    let citations = extract_citations(answer);
    let mut matches = Vec::with_capacity(citations.len());
    let mut warnings = Vec::new();

    for citation in citations {
        let mut best_score = 0u8;
        let mut best_article = None;
        for article in corpus {
            let score = match_score(&citation, article);
            if score > best_score {
                best_score = score;
                best_article = Some(article.id);
            }
        }
        let valid = best_score >= VALID_THRESHOLD;
        if !valid {
            warnings.push(format!(
                "Citation '{}' could not be verified against the knowledge base",
                citation.raw
            ));
        }
        matches.push(CitationMatch {
            citation,
            matched_article_id: best_article,
            confidence: best_score,
            valid,
        });
    }

    let total_citations = matches.len();
    let valid_citations = matches.iter().filter(|m| m.valid).count();
    let all_valid = matches.iter().all(|m| m.valid);

    if total_citations > 0 && valid_citations * 10 < total_citations * 7 {
        warnings.insert(
            0,
            format!(
                "Only {}/{} citations verified - the answer may contain inaccurate references",
                valid_citations, total_citations
            ),
        );
    }

    tracing::debug!(
        total = total_citations,
        valid = valid_citations,
        "citation verification complete"
    );

    VerificationResult {
        citations: matches,
        total_citations,
        valid_citations,
        all_valid,
        warnings,
    }
}

/// Score one citation against one article. The law-number component is
/// required context for verification: a citation naming no law cannot
/// reach the valid threshold.
fn match_score(citation: &ExtractedCitation, article: &Article) -> u8 {
    let mut score = 0u8;

    let law_quality = citation.law_number.as_deref().map(|law| {
        let (num, year) = law.split_once('/').unwrap_or((law, ""));
        if article.law_number == law || article.law_number.contains(law) {
            LawMatch::Exact
        } else if contains_number(&article.law_number, num)
            || contains_number(&article.law_number, year)
        {
            LawMatch::Fuzzy
        } else {
            LawMatch::None
        }
    });

    match law_quality {
        Some(LawMatch::Exact) => score += 60,
        Some(LawMatch::Fuzzy) => score += 30,
        Some(LawMatch::None) => return 0,
        None => {}
    }

    match (&citation.article_number, &article.article_number) {
        (Some(cited), Some(actual)) => {
            if cited == actual {
                score += 40;
            } else if actual.contains(cited.as_str()) || cited.contains(actual.as_str()) {
                score += 20;
            }
        }
        (Some(_), None) => {}
        // A law-only citation has no article component to contradict; it
        // inherits the law-match quality.
        (None, _) => match law_quality {
            Some(LawMatch::Exact) => score += 40,
            Some(LawMatch::Fuzzy) => score += 20,
            _ => {}
        },
    }

    score
}

#[derive(Clone, Copy, PartialEq)]
enum LawMatch {
    Exact,
    Fuzzy,
    None,
}

/// Number-aware containment: "6" must not match inside "26".
fn contains_number(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack
        .split(|c: char| !c.is_ascii_digit())
        .any(|part| part == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::article;

    fn rental_corpus() -> Vec<Article> {
        let mut a = article(
            1,
            "Rent increase limits",
            "The rent may not be increased during the term.",
            &["rent increase"],
        );
        a.law_number = "26/2007".to_string();
        a.article_number = Some("7".to_string());
        let mut b = article(2, "Deposit refund", "Deposit rules.", &["deposit"]);
        b.law_number = "26/2007".to_string();
        b.article_number = Some("20".to_string());
        vec![a, b]
    }

    #[test]
    fn test_extract_full_english_citation() {
        let citations = extract_citations("See Article 7 of Law No. 26/2007 for the cap.");
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].article_number.as_deref(), Some("7"));
        assert_eq!(citations[0].law_number.as_deref(), Some("26/2007"));
    }

    #[test]
    fn test_extract_law_of_year_form() {
        let citations = extract_citations("Law No. 26 of 2007 governs tenancy.");
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].law_number.as_deref(), Some("26/2007"));
        assert_eq!(citations[0].article_number, None);
    }

    #[test]
    fn test_extract_arabic_citation() {
        let citations = extract_citations("وفقاً للمادة 7 من القانون رقم 26 لسنة 2007");
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].article_number.as_deref(), Some("7"));
        assert_eq!(citations[0].law_number.as_deref(), Some("26/2007"));
    }

    #[test]
    fn test_overlapping_matches_keep_most_specific() {
        // The "Law 26/2007" inside the full citation must not surface as a
        // second, separate citation.
        let citations = extract_citations("Article 7 of Law 26/2007.");
        assert_eq!(citations.len(), 1);
        assert!(citations[0].article_number.is_some());
    }

    #[test]
    fn test_duplicate_citations_deduplicated() {
        let citations =
            extract_citations("Article 7 of Law 26/2007 and again Article 7 of Law 26/2007.");
        assert_eq!(citations.len(), 1);
    }

    #[test]
    fn test_empty_answer_vacuously_valid() {
        let result = verify_citations("", &rental_corpus());
        assert_eq!(result.total_citations, 0);
        assert!(result.all_valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_exact_citation_verifies_at_100() {
        let result = verify_citations("Per Article 7 of Law 26/2007.", &rental_corpus());
        assert_eq!(result.total_citations, 1);
        assert_eq!(result.citations[0].confidence, 100);
        assert!(result.citations[0].valid);
        assert_eq!(result.citations[0].matched_article_id, Some(1));
    }

    #[test]
    fn test_law_only_citation_verifies() {
        let result = verify_citations("Law 26/2007 applies here.", &rental_corpus());
        assert_eq!(result.citations[0].confidence, 100);
        assert!(result.citations[0].valid);
    }

    #[test]
    fn test_hallucinated_law_fails() {
        let result = verify_citations("See Article 9 of Law 99/2019.", &rental_corpus());
        assert_eq!(result.total_citations, 1);
        assert!(!result.citations[0].valid);
        assert!(!result.all_valid);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("could not be verified")));
    }

    #[test]
    fn test_wrong_article_number_scores_law_only() {
        let result = verify_citations("See Article 99 of Law 26/2007.", &rental_corpus());
        // Law matches exactly (60) but article 99 does not exist: invalid.
        assert_eq!(result.citations[0].confidence, 60);
        assert!(!result.citations[0].valid);
    }

    #[test]
    fn test_standalone_article_citation_cannot_verify() {
        let result = verify_citations("Article 7 covers this.", &rental_corpus());
        assert_eq!(result.total_citations, 1);
        assert!(!result.citations[0].valid);
    }

    #[test]
    fn test_number_containment_is_token_aware() {
        assert!(contains_number("26/2007", "26"));
        assert!(!contains_number("26/2007", "6"));
        assert!(contains_number("26/2007", "2007"));
    }
}
