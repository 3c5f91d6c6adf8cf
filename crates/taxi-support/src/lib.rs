//! taxi-support: FAQ matching and the customer support pipeline
//!
//! Ranks FAQ entries against a customer's question and decides whether to
//! answer with the stored text, ask the generation service to phrase an
//! answer, or fall back to a canned reply.

pub mod agent;
pub mod error;
pub mod faq;
pub mod generator;
pub mod messages;
pub mod prompt;
pub mod responder;

pub use agent::{Reply, SupportAgent};
pub use error::{Result, SupportError};
pub use faq::{FaqEntry, FaqMatcher, KnowledgeBase, ScoredCandidate, ScoringPolicy};
pub use generator::{GenerationError, Generator, LlmGenerator};
pub use messages::CannedReplies;
pub use responder::{Answer, AnswerSource, Responder, ResponsePolicy};
