//! Keyword extraction for bilingual (English/Arabic) text

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Words that carry no meaning for FAQ matching
pub const STOP_WORDS: &[&str] = &[
    // English
    "how", "what", "where", "when", "why", "do", "does", "can", "could", "would", "should", "the",
    "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with",
    // Arabic
    "كيف", "ماذا", "أين", "متى", "لماذا", "هل", "يمكن", "في", "على", "إلى", "من", "مع",
];

/// Whole-word greetings, compared against lower-cased tokens
pub const GREETINGS: &[&str] = &["hello", "hi", "hey", "مرحبا", "السلام", "اهلا"];

/// Tokens of this many characters or fewer are ignored
const MIN_KEYWORD_CHARS: usize = 2;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("word pattern is valid"));

static STOP_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// Lower-cased word tokens in order of appearance
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Meaningful keywords of `text`: stop words and short tokens removed
pub fn extract_keywords(text: &str) -> HashSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|word| word.chars().count() > MIN_KEYWORD_CHARS)
        .filter(|word| !STOP_SET.contains(word.as_str()))
        .collect()
}

/// Whether the text contains a greeting word
pub fn is_greeting(text: &str) -> bool {
    tokenize(text)
        .iter()
        .any(|token| GREETINGS.contains(&token.as_str()))
}

/// Jaccard overlap of two keyword sets; 0 when either is empty
pub fn keyword_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}
