//! FAQ entries and the in-memory knowledge base

use std::collections::HashSet;

use super::keywords::extract_keywords;

/// One stored question/answer pair
#[derive(Debug, Clone, PartialEq)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
    /// Lower-cased question, compared against lower-cased queries
    pub(crate) question_lower: String,
    pub keywords: HashSet<String>,
}

impl FaqEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        let question = question.into();
        Self {
            question_lower: question.to_lowercase(),
            keywords: extract_keywords(&question),
            answer: answer.into(),
            question,
        }
    }
}

/// Immutable table of FAQ entries, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: Vec<FaqEntry>,
}

impl KnowledgeBase {
    pub fn from_entries(entries: Vec<FaqEntry>) -> Self {
        Self { entries }
    }

    /// Build from `(question, answer)` pairs
    pub fn from_pairs<Q, A>(pairs: impl IntoIterator<Item = (Q, A)>) -> Self
    where
        Q: Into<String>,
        A: Into<String>,
    {
        Self::from_entries(pairs.into_iter().map(|(q, a)| FaqEntry::new(q, a)).collect())
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
