//! Query preprocessing: cleaning, legal-term extraction, synonym and
//! morphology expansion, category detection.
//!
//! Deterministic given the synonym and pattern tables — no network calls,
//! no randomness. The Arabic path routes through [`crate::arabic`]; the
//! Latin path uses a parallel English legal-synonym table.

use std::collections::HashSet;

use crate::arabic;
use crate::types::{LegalCategory, PreprocessedQuery, QueryLanguage};

/// Upper bound on expansion terms so morphology expansion of long queries
/// cannot blow up the downstream search.
const MAX_EXPANSION_TERMS: usize = 50;

const OR_SEPARATOR: &str = " OR ";

/// English legal-synonym groups. The first member of each group is the
/// canonical legal term collected into `legal_terms`.
const EN_SYNONYM_GROUPS: [&[&str]; 15] = [
    &["rent", "rental", "lease", "tenancy", "letting"],
    &["tenant", "lessee", "renter", "occupant"],
    &["landlord", "lessor", "proprietor"],
    &["eviction", "evict", "dispossession"],
    &["deposit", "security deposit", "guarantee"],
    &["contract", "agreement", "covenant"],
    &["maintenance", "repair", "upkeep"],
    &["dispute", "conflict", "claim"],
    &["increase", "raise", "hike"],
    &["termination", "cancellation", "expiry"],
    &["escrow", "trust account"],
    &["ownership", "freehold", "title deed"],
    &["notice", "notification"],
    &["compensation", "damages", "indemnity"],
    &["broker", "intermediary", "agent"],
];

/// Category keyword patterns, English and Arabic (Arabic stored in
/// normalized orthography). Scored in declaration order; the first
/// category reaching the maximum score wins.
const CATEGORY_PATTERNS: [(LegalCategory, &[&str], &[&str]); 8] = [
    (
        LegalCategory::RentalLaw,
        &["rent", "lease", "tenant", "landlord", "eviction", "tenancy"],
        &["ايجار", "اجره", "مستاجر", "موجر", "اخلاء"],
    ),
    (
        LegalCategory::CivilCode,
        &["civil code", "obligation", "liability", "damages", "tort"],
        &["مدني", "التزام", "ضرر", "تعويض"],
    ),
    (
        LegalCategory::Regulatory,
        &["regulation", "license", "permit", "authority", "municipality"],
        &["تنظيم", "ترخيص", "تصريح", "رقابه"],
    ),
    (
        LegalCategory::Escrow,
        &["escrow", "trust account", "off plan", "developer"],
        &["حساب الضمان", "ضمان", "مطور"],
    ),
    (
        LegalCategory::RealEstate,
        &["property", "real estate", "land", "plot", "title deed", "registration"],
        &["عقار", "ارض", "تسجيل"],
    ),
    (
        LegalCategory::Ownership,
        &["ownership", "freehold", "jointly owned", "owners association", "common areas"],
        &["تملك", "ملكيه", "ملاك"],
    ),
    (
        LegalCategory::Procedural,
        &["court", "procedure", "appeal", "judgment", "committee", "filing"],
        &["محكمه", "دعوي", "استيناف", "اجراء", "لجنه"],
    ),
    (LegalCategory::Other, &[], &[]),
];

/// Lowercase, strip punctuation (keeping both scripts' alphabets and
/// digits), collapse whitespace. Combining diacritics are dropped without
/// splitting the word they attach to.
pub fn clean_text(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for c in lowered.chars() {
        if arabic::is_diacritic(c) {
            continue;
        }
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Detect a legal category by counting bilingual keyword-pattern hits in
/// the cleaned text. Returns the max-scoring category when its score is at
/// least 1, resolving ties by declaration order (first max wins — an
/// inherited tie-break, preserved for compatibility, not load-bearing).
pub fn detect_category(cleaned: &str) -> Option<LegalCategory> {
    let normalized = arabic::normalize(cleaned);
    let mut best: Option<LegalCategory> = None;
    let mut best_score = 0usize;
    for (category, en_patterns, ar_patterns) in CATEGORY_PATTERNS {
        let score = en_patterns.iter().filter(|p| cleaned.contains(*p)).count()
            + ar_patterns.iter().filter(|p| normalized.contains(*p)).count();
        if score > best_score {
            best_score = score;
            best = Some(category);
        }
    }
    best
}

/// Preprocess a raw query into its structured form.
pub fn preprocess(raw: &str) -> PreprocessedQuery {
    let language = arabic::detect_language(raw);
    let (cleaned, legal_terms, expansion_terms) = match language {
        QueryLanguage::Arabic => preprocess_arabic(raw),
        QueryLanguage::Latin => preprocess_latin(raw),
    };

    let category = detect_category(&cleaned);
    let expanded_query = build_expanded_query(&cleaned, &expansion_terms);

    PreprocessedQuery {
        original: raw.to_string(),
        cleaned,
        language,
        legal_terms,
        expansion_terms,
        category,
        expanded_query,
    }
}

fn preprocess_arabic(raw: &str) -> (String, Vec<String>, Vec<String>) {
    let cleaned = clean_text(&arabic::normalize(raw));
    let mut legal_terms: Vec<String> = Vec::new();
    let mut expansion: Vec<String> = Vec::new();

    for token in cleaned.split_whitespace() {
        // A token counts as a legal term when it (or its stem, for
        // definite-article forms) appears in the synonym table.
        let mut token_synonyms = arabic::synonyms(token);
        if token_synonyms.is_empty() {
            token_synonyms = arabic::synonyms(&arabic::stem(token));
        }
        if !token_synonyms.is_empty() && !legal_terms.iter().any(|t| t == token) {
            legal_terms.push(token.to_string());
        }
        for form in arabic::expand_morphology(token) {
            push_capped(&mut expansion, form);
        }
        for synonym in token_synonyms {
            push_capped(&mut expansion, synonym);
        }
        if expansion.len() >= MAX_EXPANSION_TERMS {
            break;
        }
    }

    (cleaned, legal_terms, expansion)
}

fn preprocess_latin(raw: &str) -> (String, Vec<String>, Vec<String>) {
    let cleaned = clean_text(raw);
    let tokens: HashSet<&str> = cleaned.split_whitespace().collect();
    let mut legal_terms: Vec<String> = Vec::new();
    let mut expansion: Vec<String> = Vec::new();

    for group in EN_SYNONYM_GROUPS {
        let hit = group.iter().any(|member| {
            if member.contains(' ') {
                cleaned.contains(member)
            } else {
                tokens.contains(member)
            }
        });
        if hit {
            let canonical = group[0].to_string();
            if !legal_terms.contains(&canonical) {
                legal_terms.push(canonical);
            }
            for member in group {
                push_capped(&mut expansion, member.to_string());
            }
        }
    }

    (cleaned, legal_terms, expansion)
}

fn push_capped(expansion: &mut Vec<String>, term: String) {
    if expansion.len() < MAX_EXPANSION_TERMS && !expansion.contains(&term) {
        expansion.push(term);
    }
}

/// Join cleaned text and every expansion term with OR-disjunction
/// semantics.
fn build_expanded_query(cleaned: &str, expansion: &[String]) -> String {
    if expansion.is_empty() {
        return cleaned.to_string();
    }
    let mut parts = Vec::with_capacity(expansion.len() + 1);
    if !cleaned.is_empty() {
        parts.push(cleaned);
    }
    for term in expansion {
        if term != cleaned {
            parts.push(term);
        }
    }
    parts.join(OR_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_invariants() {
        let cleaned = clean_text("  What's the RENT-increase cap, per Law 26/2007?! ");
        assert_eq!(cleaned, "what s the rent increase cap per law 26 2007");
    }

    #[test]
    fn test_clean_text_keeps_arabic_words_whole() {
        // Diacritics vanish without splitting the word they attach to.
        assert_eq!(clean_text("عَقْد الإيجار"), "عقد الإيجار");
        assert!(!clean_text("عَقْد").contains(' '));
    }

    #[test]
    fn test_preprocess_english_rent_query() {
        let query = preprocess("Can my landlord increase the rent?");
        assert_eq!(query.language, QueryLanguage::Latin);
        assert_eq!(query.category, Some(LegalCategory::RentalLaw));
        assert!(query.legal_terms.contains(&"rent".to_string()));
        assert!(query.legal_terms.contains(&"landlord".to_string()));
        assert!(query.legal_terms.contains(&"increase".to_string()));
        assert!(query.expansion_terms.contains(&"lease".to_string()));
        assert!(query.expanded_query.contains(" OR "));
    }

    #[test]
    fn test_preprocess_arabic_query() {
        let query = preprocess("ما هي حقوق المستأجر؟");
        assert_eq!(query.language, QueryLanguage::Arabic);
        // Cleaned text is normalized: no hamza seats, no punctuation.
        assert!(query.cleaned.contains("المستاجر"));
        assert!(!query.cleaned.contains('؟'));
        assert!(query.expansion_terms.contains(&"مستاجر".to_string()));
        assert!(query.expanded_query.contains(" OR "));
    }

    #[test]
    fn test_arabic_expansion_capped() {
        let long_query = "مستأجر موجر ايجار عقد اخلاء تامين صيانه نزاع ملكيه وسيط زياده فسخ ".repeat(4);
        let query = preprocess(&long_query);
        assert!(query.expansion_terms.len() <= 50);
    }

    #[test]
    fn test_detect_category_rental() {
        assert_eq!(
            detect_category("rent increase"),
            Some(LegalCategory::RentalLaw)
        );
        assert_eq!(
            detect_category(&clean_text("ما هي زيادة الإيجار")),
            Some(LegalCategory::RentalLaw)
        );
    }

    #[test]
    fn test_detect_category_none_without_hits() {
        assert_eq!(detect_category("weather in dubai tomorrow"), None);
        assert_eq!(detect_category(""), None);
    }

    #[test]
    fn test_detect_category_tie_goes_to_declaration_order() {
        // "property" (RealEstate) and "court" (Procedural) score 1 each;
        // RealEstate is declared first.
        assert_eq!(
            detect_category("court case about property"),
            Some(LegalCategory::RealEstate)
        );
    }

    #[test]
    fn test_empty_query_is_not_an_error() {
        let query = preprocess("");
        assert!(query.cleaned.is_empty());
        assert!(query.legal_terms.is_empty());
        assert_eq!(query.category, None);
        assert_eq!(query.expanded_query, "");
    }

    #[test]
    fn test_expanded_query_without_expansion_is_cleaned_text() {
        let query = preprocess("weather tomorrow");
        assert_eq!(query.expanded_query, query.cleaned);
    }
}
