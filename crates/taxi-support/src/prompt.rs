//! Prompt assembly for generated answers

use std::fmt::Write;

use taxi_core::{HistoryEntry, Language};

use crate::faq::ScoredCandidate;

/// System instructions sent with every generation request
pub fn system_prompt(support_phone: &str) -> String {
    format!(
        "You are a helpful customer support agent for a taxi app company in Saudi Arabia. \
         Answer the customer's question using the FAQ context you are given. \
         If the context holds no direct answer, give helpful general information and \
         suggest contacting support at {support_phone}. \
         Always respond in the same language as the question: Arabic for Arabic, English for English. \
         Keep answers short and polite."
    )
}

/// User turn combining conversation history, FAQ context and the question
pub fn build_prompt(
    query: &str,
    language: Language,
    candidates: &[ScoredCandidate],
    history: &[HistoryEntry],
) -> String {
    let mut prompt = String::new();

    if !history.is_empty() {
        prompt.push_str("Previous conversation:\n");
        for entry in history {
            let _ = writeln!(prompt, "{}", entry);
        }
        prompt.push('\n');
    }

    prompt.push_str("FAQ Context:\n");
    for candidate in candidates {
        let _ = writeln!(
            prompt,
            "Q: {}\nA: {}",
            candidate.entry.question, candidate.entry.answer
        );
    }

    let _ = write!(
        prompt,
        "\nRespond in {}.\n\nUser Question: {}\n\nHelpful Answer:",
        language.name(),
        query
    );

    prompt
}
