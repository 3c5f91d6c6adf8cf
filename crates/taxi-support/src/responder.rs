//! Answer selection policy
//!
//! Turns a query into exactly one answer. Strong FAQ matches are quoted
//! verbatim, ambiguous ones go to the generator with the best candidates
//! as context, and everything else gets a canned reply. `answer` never
//! fails: every collaborator error is recovered here.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use taxi_core::{FaqConfig, HistoryEntry, Language, detect_language};
use tracing::{debug, info, warn};

use crate::error::SupportError;
use crate::faq::{FaqMatcher, ScoredCandidate, keywords};
use crate::generator::Generator;
use crate::messages::CannedReplies;
use crate::prompt;

/// Where an answer's text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    /// Stored FAQ answer quoted verbatim
    Stored,
    /// Produced by the generator from FAQ context
    Generated,
    /// Canned reply, or a stored answer used after generation was skipped or failed
    Fallback,
}

impl fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnswerSource::Stored => "stored",
            AnswerSource::Generated => "generated",
            AnswerSource::Fallback => "fallback",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub confidence: f64,
    pub source: AnswerSource,
}

impl Answer {
    fn fallback(text: String, confidence: f64) -> Self {
        Self {
            text,
            confidence,
            source: AnswerSource::Fallback,
        }
    }
}

/// Score thresholds that pick between the answer paths
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponsePolicy {
    /// Above this the stored answer is quoted
    pub confidence_threshold: f64,
    /// Offline mode quotes the best direct match only above this
    pub direct_answer_floor: f64,
}

impl From<&FaqConfig> for ResponsePolicy {
    fn from(config: &FaqConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            direct_answer_floor: config.direct_answer_floor,
        }
    }
}

pub struct Responder {
    matcher: FaqMatcher,
    generator: Option<Arc<dyn Generator>>,
    replies: CannedReplies,
    policy: ResponsePolicy,
}

impl Responder {
    pub fn new(
        matcher: FaqMatcher,
        generator: Option<Arc<dyn Generator>>,
        replies: CannedReplies,
        policy: ResponsePolicy,
    ) -> Self {
        Self {
            matcher,
            generator,
            replies,
            policy,
        }
    }

    pub fn matcher(&self) -> &FaqMatcher {
        &self.matcher
    }

    pub fn replies(&self) -> &CannedReplies {
        &self.replies
    }

    pub fn generation_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Answer a standalone query
    pub async fn answer(&self, query: &str) -> Answer {
        self.answer_with_history(query, detect_language(query), &[])
            .await
    }

    /// Answer a query, giving the generator recent conversation as context
    pub async fn answer_with_history(
        &self,
        query: &str,
        language: Language,
        history: &[HistoryEntry],
    ) -> Answer {
        let candidates = match self.matcher.rank_for_llm_context(query) {
            Ok(candidates) => candidates,
            Err(SupportError::EmptyKnowledgeBase) => {
                warn!("Knowledge base is empty, cannot answer");
                return Answer::fallback(self.replies.no_knowledge_base(language), 0.0);
            }
            Err(e) => {
                warn!("FAQ matching failed: {}", e);
                return Answer::fallback(self.replies.no_knowledge_base(language), 0.0);
            }
        };

        let Some(best) = candidates.first() else {
            let text = if keywords::is_greeting(query) {
                self.replies.greeting(language)
            } else {
                self.replies.contact_support(language)
            };
            return Answer::fallback(text, 0.0);
        };

        if best.score > self.policy.confidence_threshold {
            debug!("Quoting stored answer (score {:.3})", best.score);
            return Answer {
                text: best.entry.answer.clone(),
                confidence: best.score,
                source: AnswerSource::Stored,
            };
        }

        match &self.generator {
            Some(generator) => {
                self.generate(generator.as_ref(), query, language, &candidates, history)
                    .await
            }
            None => self.answer_offline(query, language),
        }
    }

    async fn generate(
        &self,
        generator: &dyn Generator,
        query: &str,
        language: Language,
        candidates: &[ScoredCandidate],
        history: &[HistoryEntry],
    ) -> Answer {
        let best = &candidates[0];
        let prompt = prompt::build_prompt(query, language, candidates, history);

        match generator.generate(&prompt).await {
            Ok(text) => {
                info!("Generated answer from {} candidate(s)", candidates.len());
                Answer {
                    text,
                    confidence: best.score,
                    source: AnswerSource::Generated,
                }
            }
            Err(e) => {
                warn!("Generation failed, using best stored answer: {}", e);
                Answer::fallback(best.entry.answer.clone(), best.score)
            }
        }
    }

    /// No generator configured: quote the best direct match if it is good enough
    fn answer_offline(&self, query: &str, language: Language) -> Answer {
        let best = self
            .matcher
            .rank_for_direct_answer(query)
            .ok()
            .and_then(|candidates| candidates.into_iter().next());

        match best {
            Some(candidate) if candidate.score > self.policy.direct_answer_floor => {
                debug!("Offline direct match (score {:.3})", candidate.score);
                Answer::fallback(candidate.entry.answer, candidate.score)
            }
            _ => Answer::fallback(self.replies.rephrase(language), 0.0),
        }
    }
}
