//! Arabic text normalization, stemming, and legal-term synonym lookup.
//!
//! Everything here is a pure function over its input — no I/O, no shared
//! mutable state — so all of it is trivially safe to call from concurrent
//! tasks. Orthography handling covers the variants that actually occur in
//! statutory text and colloquial queries: diacritics, alef/hamza seats,
//! teh marbuta, kashida.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::types::QueryLanguage;

/// Light stemmer prefix set: definite article (with attached conjunctions
/// and prepositions) plus the single-letter clitics. Longest first.
const PREFIXES: [&str; 11] = [
    "وال", "بال", "فال", "كال", "لل", "ال", "و", "ف", "ب", "ك", "ل",
];

/// Suffix set: dual/plural markers and pronoun suffixes. Longest first.
const SUFFIXES: [&str; 15] = [
    "تين", "ات", "ون", "ين", "ان", "ها", "هم", "هن", "كم", "كن", "نا", "ية", "ه", "ة", "ي",
];

/// Stripping below this many characters destroys Arabic roots.
const MIN_STEM_CHARS: usize = 3;

/// Legal-term synonym groups, stored in normalized orthography. Lookup is
/// symmetric: every member of a group maps to all other members.
const SYNONYM_GROUPS: [&[&str]; 12] = [
    &["مستاجر", "ساكن", "قاطن"],
    &["موجر", "مالك"],
    &["ايجار", "اجره", "كراء"],
    &["عقد", "اتفاقيه", "اتفاق"],
    &["اخلاء", "طرد"],
    &["تامين", "وديعه", "ضمان"],
    &["صيانه", "اصلاح", "ترميم"],
    &["نزاع", "خلاف", "دعوي"],
    &["ملكيه", "تملك", "حيازه"],
    &["وسيط", "سمسار"],
    &["زياده", "رفع"],
    &["فسخ", "انهاء", "الغاء"],
];

static SYNONYM_TABLE: LazyLock<HashMap<&'static str, Vec<&'static str>>> = LazyLock::new(|| {
    let mut table: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
    for group in SYNONYM_GROUPS {
        for &word in group {
            let others: Vec<&'static str> =
                group.iter().copied().filter(|&w| w != word).collect();
            table.entry(word).or_default().extend(others);
        }
    }
    table
});

fn is_arabic_char(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c)
}

/// Combining diacritics (tanwin, harakat, shadda, sukun, superscript alef).
pub(crate) fn is_diacritic(c: char) -> bool {
    ('\u{064B}'..='\u{065F}').contains(&c) || c == '\u{0670}'
}

pub fn contains_arabic(text: &str) -> bool {
    text.chars().any(is_arabic_char)
}

/// True when Arabic-range characters exceed 50% of non-space characters.
pub fn is_primarily_arabic(text: &str) -> bool {
    let mut arabic = 0usize;
    let mut non_space = 0usize;
    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        non_space += 1;
        if is_arabic_char(c) {
            arabic += 1;
        }
    }
    non_space > 0 && arabic * 2 > non_space
}

pub fn detect_language(text: &str) -> QueryLanguage {
    if is_primarily_arabic(text) {
        QueryLanguage::Arabic
    } else {
        QueryLanguage::Latin
    }
}

/// Normalize Arabic orthography: strip diacritics and kashida, unify
/// alef/hamza-seat variants, unify alef maqsura and teh marbuta, collapse
/// whitespace. No-op on text without Arabic characters. Idempotent.
pub fn normalize(text: &str) -> String {
    if !contains_arabic(text) {
        return text.to_string();
    }
    let mapped = text.chars().filter_map(|c| {
        if is_diacritic(c) || c == '\u{0640}' {
            return None; // kashida and combining marks carry no meaning
        }
        Some(match c {
            'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
            'ى' | 'ئ' => 'ي',
            'ؤ' => 'و',
            'ة' => 'ه',
            other => other,
        })
    });
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in mapped {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }
    out
}

/// Light stemming: strip at most one prefix and one suffix, each only when
/// the remainder keeps at least [`MIN_STEM_CHARS`] characters. Words already
/// shorter than the guard are returned unchanged.
pub fn stem(word: &str) -> String {
    let mut current = word;
    for prefix in PREFIXES {
        if let Some(rest) = current.strip_prefix(prefix) {
            if rest.chars().count() >= MIN_STEM_CHARS {
                current = rest;
            }
            break;
        }
    }
    for suffix in SUFFIXES {
        if let Some(rest) = current.strip_suffix(suffix) {
            if rest.chars().count() >= MIN_STEM_CHARS {
                current = rest;
            }
            break;
        }
    }
    current.to_string()
}

/// Morphological expansion of a single word: the original, its normalized
/// and stemmed forms, the definite-article variant, and common plural
/// suffixes. Deduplicated, filtered to length ≥ 2.
pub fn expand_morphology(word: &str) -> Vec<String> {
    let normalized = normalize(word);
    let stemmed = stem(&normalized);

    let mut candidates = vec![word.to_string(), normalized.clone(), stemmed.clone()];
    if let Some(bare) = stemmed.strip_prefix("ال") {
        candidates.push(bare.to_string());
    } else {
        candidates.push(format!("ال{}", stemmed));
    }
    for plural_suffix in ["ات", "ون", "ين"] {
        candidates.push(format!("{}{}", stemmed, plural_suffix));
    }

    let mut forms = Vec::new();
    for form in candidates {
        if form.chars().count() >= 2 && !forms.contains(&form) {
            forms.push(form);
        }
    }
    forms
}

/// Symmetric legal-term synonym lookup. The input is normalized before the
/// lookup, so callers may pass raw orthography.
pub fn synonyms(word: &str) -> Vec<String> {
    let key = normalize(word);
    SYNONYM_TABLE
        .get(key.as_str())
        .map(|group| group.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language_arabic_dominant() {
        assert_eq!(detect_language("مستأجر"), QueryLanguage::Arabic);
        assert_eq!(detect_language("what is rent"), QueryLanguage::Latin);
        // Mixed text where Latin dominates
        assert_eq!(
            detect_language("what is the meaning of عقد in contracts"),
            QueryLanguage::Latin
        );
    }

    #[test]
    fn test_is_primarily_arabic_requires_majority() {
        assert!(is_primarily_arabic("مستأجر"));
        assert!(is_primarily_arabic("ما هو عقد الإيجار"));
        assert!(!is_primarily_arabic("rent عقد increase details"));
        assert!(!is_primarily_arabic(""));
    }

    #[test]
    fn test_normalize_unifies_variants() {
        assert_eq!(normalize("أحكام"), "احكام");
        assert_eq!(normalize("إيجار"), "ايجار");
        assert_eq!(normalize("الأجرة"), "الاجره");
        assert_eq!(normalize("دعوى"), "دعوي");
        assert_eq!(normalize("مسؤولية"), "مسووليه");
    }

    #[test]
    fn test_normalize_strips_diacritics_and_kashida() {
        assert_eq!(normalize("عَقْدٌ"), "عقد");
        assert_eq!(normalize("عـــقد"), "عقد");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  عقد   الإيجار  "), "عقد الايجار");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["عَقْدُ الإيجارِ", "تأمينٌ", "المستأجرون", "دعوى قضائية"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_normalize_is_noop_on_non_arabic() {
        assert_eq!(normalize("Rent Increase!"), "Rent Increase!");
    }

    #[test]
    fn test_stem_strips_definite_article() {
        assert_eq!(stem("المستاجر"), "مستاجر");
        assert_eq!(stem("الايجار"), "ايجار");
    }

    #[test]
    fn test_stem_strips_plural_suffix() {
        assert_eq!(stem("مستاجرون"), "مستاجر");
        assert_eq!(stem("عقود"), "عقود"); // broken plural, untouched
    }

    #[test]
    fn test_stem_never_lengthens_and_respects_guard() {
        for word in ["المستاجرون", "ولد", "عقد", "ال", "و", "بيوتها"] {
            let stemmed = stem(word);
            assert!(stemmed.chars().count() <= word.chars().count());
            let floor = word.chars().count().min(MIN_STEM_CHARS);
            assert!(
                stemmed.chars().count() >= floor,
                "stem({}) = {} violated the length guard",
                word,
                stemmed
            );
        }
    }

    #[test]
    fn test_stem_guard_keeps_short_roots() {
        // Stripping و from ولد would leave a 2-char fragment
        assert_eq!(stem("ولد"), "ولد");
    }

    #[test]
    fn test_expand_morphology_of_tenant() {
        let forms = expand_morphology("مستأجر");
        assert!(forms.len() > 1);
        assert!(forms.contains(&"مستاجر".to_string())); // normalized
        assert!(forms.contains(&"المستاجر".to_string())); // + definite article
        assert!(forms.contains(&"مستاجرون".to_string())); // plural
        assert!(forms.iter().all(|f| f.chars().count() >= 2));
    }

    #[test]
    fn test_expand_morphology_dedups() {
        let forms = expand_morphology("عقد");
        let mut unique = forms.clone();
        unique.dedup();
        assert_eq!(forms.len(), unique.len());
    }

    #[test]
    fn test_synonyms_symmetric() {
        // مستاجر is a group head; ساكن appears only as a listed synonym.
        assert!(synonyms("مستاجر").contains(&"ساكن".to_string()));
        assert!(synonyms("ساكن").contains(&"مستاجر".to_string()));
    }

    #[test]
    fn test_synonyms_normalize_input() {
        assert!(synonyms("مستأجر").contains(&"ساكن".to_string()));
    }

    #[test]
    fn test_synonyms_unknown_word_empty() {
        assert!(synonyms("سيارة").is_empty());
    }
}
