//! FAQ relevance matching
//!
//! Every entry is scored against the query with a weighted blend of
//! character-level similarity and keyword overlap. Entries at or below the
//! relevance floor are dropped and the best `top_k` are returned, highest
//! score first.

use std::sync::Arc;

use taxi_core::FaqConfig;
use tracing::debug;

use super::entry::{FaqEntry, KnowledgeBase};
use super::keywords::{extract_keywords, keyword_overlap};
use super::similarity::sequence_ratio;
use crate::error::{Result, SupportError};

/// Weights and cut-offs for one ranking pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPolicy {
    pub text_weight: f64,
    pub keyword_weight: f64,
    pub top_k: usize,
    /// Candidates must score strictly above this
    pub floor: f64,
}

impl ScoringPolicy {
    /// Policy used to gather context for generation
    pub fn llm_context(config: &FaqConfig) -> Self {
        Self {
            text_weight: config.context_text_weight,
            keyword_weight: config.context_keyword_weight,
            top_k: config.context_top_k,
            floor: config.relevance_floor,
        }
    }

    /// Policy used to pick a single stored answer without generation
    pub fn direct_answer(config: &FaqConfig) -> Self {
        Self {
            text_weight: config.direct_text_weight,
            keyword_weight: config.direct_keyword_weight,
            top_k: 1,
            floor: config.relevance_floor,
        }
    }

    fn combine(&self, text: f64, overlap: f64) -> f64 {
        self.text_weight * text + self.keyword_weight * overlap
    }
}

/// An entry paired with its relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub score: f64,
    pub entry: FaqEntry,
}

/// Scores queries against a shared knowledge base
#[derive(Debug, Clone)]
pub struct FaqMatcher {
    knowledge: Arc<KnowledgeBase>,
    context_policy: ScoringPolicy,
    direct_policy: ScoringPolicy,
}

impl FaqMatcher {
    pub fn new(knowledge: Arc<KnowledgeBase>, config: &FaqConfig) -> Self {
        Self {
            knowledge,
            context_policy: ScoringPolicy::llm_context(config),
            direct_policy: ScoringPolicy::direct_answer(config),
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Rank entries under an arbitrary policy
    pub fn rank(&self, query: &str, policy: &ScoringPolicy) -> Result<Vec<ScoredCandidate>> {
        if self.knowledge.is_empty() {
            return Err(SupportError::EmptyKnowledgeBase);
        }

        let query_lower = query.to_lowercase();
        let query_keywords = extract_keywords(query);

        let mut scored: Vec<ScoredCandidate> = self
            .knowledge
            .entries()
            .iter()
            .map(|entry| {
                let text = sequence_ratio(&query_lower, &entry.question_lower);
                let overlap = keyword_overlap(&query_keywords, &entry.keywords);
                ScoredCandidate {
                    score: policy.combine(text, overlap),
                    entry: entry.clone(),
                }
            })
            .filter(|candidate| candidate.score > policy.floor)
            .collect();

        // stable: equal scores keep table order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(policy.top_k);

        debug!(
            "Ranked {} candidate(s) for query, best score {:.3}",
            scored.len(),
            scored.first().map(|c| c.score).unwrap_or(0.0)
        );

        Ok(scored)
    }

    /// Top candidates to hand to the generator as context
    pub fn rank_for_llm_context(&self, query: &str) -> Result<Vec<ScoredCandidate>> {
        self.rank(query, &self.context_policy)
    }

    /// Single best candidate for answering without generation
    pub fn rank_for_direct_answer(&self, query: &str) -> Result<Vec<ScoredCandidate>> {
        self.rank(query, &self.direct_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faq::fixtures::taxi_knowledge;

    fn matcher() -> FaqMatcher {
        FaqMatcher::new(Arc::new(taxi_knowledge()), &FaqConfig::default())
    }

    #[test]
    fn test_empty_knowledge_base_is_an_error() {
        let matcher = FaqMatcher::new(Arc::new(KnowledgeBase::default()), &FaqConfig::default());
        assert!(matches!(
            matcher.rank_for_llm_context("anything"),
            Err(SupportError::EmptyKnowledgeBase)
        ));
    }

    #[test]
    fn test_exact_question_scores_top() {
        let candidates = matcher().rank_for_llm_context("HOW CAN I BOOK A RIDE?").unwrap();
        assert_eq!(candidates[0].entry.answer, "Open the app and tap Book.");
        assert!(candidates[0].score >= 0.99);
    }

    #[test]
    fn test_paraphrase_scores_above_threshold() {
        let candidates = matcher().rank_for_llm_context("How do I book a taxi?").unwrap();
        assert_eq!(candidates[0].entry.question, "How can I book a ride?");
        assert!((candidates[0].score - 0.580).abs() < 0.01);
    }

    #[test]
    fn test_ambiguous_query_lands_in_generation_band() {
        let candidates = matcher()
            .rank_for_llm_context("what about refunds for canceled airport trips")
            .unwrap();
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].entry.question, "Do you offer airport trips?");
        assert!(candidates[0].score > 0.1 && candidates[0].score <= 0.5);
    }

    #[test]
    fn test_ambiguous_scores() {
        let candidates = matcher()
            .rank_for_llm_context("what about refunds for canceled airport trips")
            .unwrap();
        let scores: Vec<f64> = candidates.iter().map(|c| c.score).collect();
        assert!((scores[0] - 0.431).abs() < 0.005);
        assert!((scores[1] - 0.285).abs() < 0.005);
        assert!((scores[2] - 0.197).abs() < 0.005);
    }

    #[test]
    fn test_shared_pronoun_counts_towards_overlap() {
        let candidates = matcher().rank_for_llm_context("Are you open on Friday?").unwrap();
        assert_eq!(candidates[0].entry.question, "Do you offer airport trips?");
        assert!((candidates[0].score - 0.321).abs() < 0.005);
        assert_eq!(candidates[1].entry.question, "Which cities do you operate in?");
        assert!((candidates[1].score - 0.302).abs() < 0.005);
    }

    #[test]
    fn test_candidates_sorted_and_above_floor() {
        let candidates = matcher()
            .rank_for_llm_context("what about refunds for canceled airport trips")
            .unwrap();
        for pair in candidates.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(candidates.iter().all(|c| c.score > 0.1));
    }

    #[test]
    fn test_direct_answer_keeps_one() {
        let candidates = matcher().rank_for_direct_answer("How do I book a taxi?").unwrap();
        assert_eq!(candidates.len(), 1);
        assert!((candidates[0].score - 0.621).abs() < 0.01);
    }

    #[test]
    fn test_unrelated_query_has_no_candidates() {
        let kb = KnowledgeBase::from_pairs([("Do you offer airport trips?", "Yes.")]);
        let matcher = FaqMatcher::new(Arc::new(kb), &FaqConfig::default());
        assert!(matcher.rank_for_llm_context("hello").unwrap().is_empty());
    }

    #[test]
    fn test_custom_policy_weights() {
        let policy = ScoringPolicy {
            text_weight: 0.0,
            keyword_weight: 1.0,
            top_k: 5,
            floor: 0.0,
        };
        let candidates = matcher().rank("refund", &policy).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].entry.question, "How do I get a refund?");
        assert!((candidates[0].score - 0.5).abs() < 1e-9);
    }
}
