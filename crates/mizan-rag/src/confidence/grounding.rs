//! Sentence-level grounding of generated answers.
//!
//! A sentence is grounded when it carries an extracted citation, or when it
//! uses legal terminology and shares at least two content keywords with one
//! of the articles the answer was built from. The score is the grounded
//! fraction of all sentences, 0–100.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::arabic;
use crate::confidence::citations::extract_citations;
use crate::types::Article;

static SENTENCE_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?؟\n]+").expect("sentence split regex is valid"));

/// Content words shorter than this carry too little signal to count as
/// keyword overlap.
const MIN_CONTENT_WORD_CHARS: usize = 5;
const MIN_SHARED_KEYWORDS: usize = 2;

/// Bilingual legal-terminology markers (Arabic in normalized orthography).
const LEGAL_TERMS: [&str; 22] = [
    "law",
    "article",
    "decree",
    "contract",
    "landlord",
    "tenant",
    "lease",
    "court",
    "provision",
    "clause",
    "pursuant",
    "obligation",
    "entitled",
    "liable",
    "قانون",
    "ماده",
    "مرسوم",
    "عقد",
    "محكمه",
    "مستاجر",
    "موجر",
    "التزام",
];

/// Fraction of answer sentences grounded in citations or article content,
/// scaled to 0–100. An answer with no sentences scores 0.
pub fn grounding_score(answer: &str, used_articles: &[Article]) -> f32 {
    let sentences: Vec<&str> = SENTENCE_SPLIT_RE
        .split(answer)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if sentences.is_empty() {
        return 0.0;
    }

    let citations = extract_citations(answer);
    let article_words: Vec<HashSet<String>> = used_articles
        .iter()
        .map(|a| content_words(&format!("{} {}", a.combined_text(), a.keywords.join(" "))))
        .collect();

    let grounded = sentences
        .iter()
        .filter(|sentence| {
            if citations.iter().any(|c| sentence.contains(c.raw.as_str())) {
                return true;
            }
            if !has_legal_terminology(sentence) {
                return false;
            }
            let words = content_words(sentence);
            article_words
                .iter()
                .any(|aw| words.intersection(aw).count() >= MIN_SHARED_KEYWORDS)
        })
        .count();

    grounded as f32 / sentences.len() as f32 * 100.0
}

fn has_legal_terminology(sentence: &str) -> bool {
    let haystack = arabic::normalize(&sentence.to_lowercase());
    LEGAL_TERMS.iter().any(|term| haystack.contains(term))
}

/// Words longer than the content threshold, normalized and lowercased.
fn content_words(text: &str) -> HashSet<String> {
    arabic::normalize(&text.to_lowercase())
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_CONTENT_WORD_CHARS)
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::article;

    fn rental_article() -> Article {
        let mut a = article(
            1,
            "Rent increase limits",
            "The landlord may not increase the rent before two years have elapsed since the tenancy began.",
            &["rent increase", "tenancy"],
        );
        a.law_number = "26/2007".to_string();
        a.article_number = Some("7".to_string());
        a
    }

    #[test]
    fn test_cited_sentence_is_grounded() {
        let answer = "Article 7 of Law 26/2007 caps rent increases.";
        let score = grounding_score(answer, &[rental_article()]);
        assert!(score > 0.0);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_keyword_overlap_grounds_uncited_sentence() {
        // No citation, but legal terminology plus >= 2 shared content words
        // ("landlord"/"increase"/"tenancy" overlap with the article).
        let answer = "The landlord cannot increase rent during the first years of the tenancy";
        let score = grounding_score(answer, &[rental_article()]);
        assert_eq!(score, 100.0);
    }

    #[test]
    fn test_ungrounded_sentences_lower_score() {
        let answer = "Article 7 of Law 26/2007 caps rent increases. Penguins live in Antarctica.";
        let score = grounding_score(answer, &[rental_article()]);
        assert!(score > 0.0 && score < 100.0);
    }

    #[test]
    fn test_empty_answer_scores_zero() {
        assert_eq!(grounding_score("", &[rental_article()]), 0.0);
        assert_eq!(grounding_score("   \n ", &[rental_article()]), 0.0);
    }

    #[test]
    fn test_no_articles_only_citations_ground() {
        let with_citation = "Article 7 of Law 26/2007 applies.";
        assert_eq!(grounding_score(with_citation, &[]), 100.0);
        let without = "The landlord cannot increase rent during the tenancy";
        assert_eq!(grounding_score(without, &[]), 0.0);
    }

    #[test]
    fn test_arabic_answer_grounds() {
        let mut a = rental_article();
        a.content_ar =
            Some("لا يجوز للمؤجر زيادة الأجرة قبل مرور سنتين على بداية الإيجار".to_string());
        let answer = "بموجب المادة 7 من القانون رقم 26 لسنة 2007 لا يجوز زيادة الأجرة";
        assert!(grounding_score(answer, &[a]) > 0.0);
    }
}
