//! Text cleanup and fallback keyword derivation shared by every generation
//! operation.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Words never used as search keywords.
const STOPWORDS: &[&str] = &[
    "the", "and", "of", "to", "in", "a", "is", "for", "on", "with", "as", "by", "an", "at",
    "from", "that", "this", "it", "be", "are", "or",
];

/// Collapse every whitespace run (newlines included) to one space and trim.
///
/// Idempotent: `sanitize(&sanitize(x)) == sanitize(x)`.
pub fn sanitize(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    WS_RE.replace_all(text.trim(), " ").into_owned()
}

/// [`sanitize`] for optional model fields; absent text becomes `""`.
pub fn sanitize_opt(text: Option<&str>) -> String {
    text.map(sanitize).unwrap_or_default()
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Derive lowercase keyword tokens from free text.
///
/// Splits on non-alphanumeric characters, drops stopwords, and deduplicates
/// (first occurrence kept).
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut seen = HashSet::new();

    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty() && !is_stopword(word))
        .filter(|word| seen.insert(word.to_string()))
        .map(String::from)
        .collect()
}

/// Normalize model-supplied keywords: sanitized, lower-cased, without
/// stopwords or duplicates. Multi-word phrases are kept whole.
pub fn normalize_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();

    keywords
        .iter()
        .map(|k| sanitize(k.as_ref()).to_lowercase())
        .filter(|k| !k.is_empty() && !is_stopword(k))
        .filter(|k| seen.insert(k.clone()))
        .collect()
}
