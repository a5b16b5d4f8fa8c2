//! Name normalization used before any comparison.
//!
//! All matching in the resolver happens on these normalized forms, never on
//! the raw display names or filenames.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Tokens dropped by the stopword tier.
///
/// `&` never survives [`normalize_name`], it is listed so the set reads the
/// same as the catalog's own filter.
pub const STOPWORDS: [&str; 11] = [
    "for", "women", "men", "the", "de", "le", "la", "du", "des", "and", "&",
];

/// Lowercase, keep only alphanumerics and whitespace, collapse whitespace.
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    collapse_whitespace(&cleaned)
}

/// Remove stopword tokens from an already normalized name.
pub fn strip_stopwords(normalized: &str) -> String {
    normalized
        .split_whitespace()
        .filter(|token| !STOPWORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// NFD-decompose and drop combining marks, so "lancôme" becomes "lancome".
pub fn fold_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// First whitespace-separated token, if any.
pub fn first_token(normalized: &str) -> Option<&str> {
    normalized.split_whitespace().next()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Precomputed comparison forms of one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameKeys {
    pub normalized: String,
    pub without_stopwords: String,
}

impl NameKeys {
    pub fn new(name: &str) -> Self {
        let normalized = normalize_name(name);
        let without_stopwords = strip_stopwords(&normalized);
        Self {
            normalized,
            without_stopwords,
        }
    }

    /// Same keys computed from the accent-folded name.
    pub fn folded(name: &str) -> Self {
        Self::new(&fold_diacritics(name))
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}
