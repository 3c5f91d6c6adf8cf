//! FAQ knowledge base and relevance matching

mod entry;
pub mod keywords;
pub mod knowledge;
mod matcher;
pub mod similarity;

pub use entry::{FaqEntry, KnowledgeBase};
pub use matcher::{FaqMatcher, ScoredCandidate, ScoringPolicy};

#[cfg(test)]
pub(crate) mod fixtures {
    use super::KnowledgeBase;

    pub(crate) fn taxi_knowledge() -> KnowledgeBase {
        KnowledgeBase::from_pairs([
            ("How can I book a ride?", "Open the app and tap Book."),
            (
                "What payment methods do you accept?",
                "We accept Apple Pay, STC Pay, credit cards, Mada and cash.",
            ),
            ("How do I get a refund?", "Refunds are processed within 5 business days."),
            (
                "Do you offer airport trips?",
                "Yes, we serve all airports in our service cities.",
            ),
            (
                "Which cities do you operate in?",
                "Riyadh, Jeddah, Mecca, Medina, Dammam, Khobar and Taif.",
            ),
            ("كيف يمكنني حجز سيارة؟", "افتح التطبيق واضغط على حجز."),
        ])
    }
}
