//! Per-user support conversations

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use taxi_core::{ConversationSummary, HistoryEntry, HistoryStore, Language, detect_language};
use tracing::{debug, info, warn};

use crate::responder::{AnswerSource, Responder};

/// Generated answers shorter than this (trimmed, in characters) are replaced
const MIN_REPLY_CHARS: usize = 5;

/// Reply handed back to a messaging channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub language: Language,
    pub confidence: f64,
    pub source: AnswerSource,
}

/// Wraps the responder with language detection and conversation history
pub struct SupportAgent {
    responder: Responder,
    history: Arc<dyn HistoryStore>,
    history_limit: usize,
}

impl SupportAgent {
    pub fn new(responder: Responder, history: Arc<dyn HistoryStore>, history_limit: usize) -> Self {
        Self {
            responder,
            history,
            history_limit,
        }
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    /// Answer one message from `user_id` and remember the exchange
    ///
    /// History failures are logged and otherwise ignored.
    pub async fn handle(&self, user_id: &str, message: &str) -> Reply {
        let language = detect_language(message);
        debug!("Message from {} detected as {}", user_id, language);

        let history = self
            .history
            .recent(user_id, self.history_limit)
            .unwrap_or_else(|e| {
                warn!("Failed to load history for {}: {}", user_id, e);
                Vec::new()
            });

        let answer = self
            .responder
            .answer_with_history(message, language, &history)
            .await;

        let mut text = answer.text.trim().to_string();
        let (mut source, mut confidence) = (answer.source, answer.confidence);
        // Stored and canned texts are sent as written
        if source == AnswerSource::Generated && text.chars().count() < MIN_REPLY_CHARS {
            text = self.responder.replies().thanks_for_contacting(language);
            source = AnswerSource::Fallback;
            confidence = 0.0;
        }

        if let Err(e) = self.history.record(user_id, message, &text, language) {
            warn!("Failed to save history for {}: {}", user_id, e);
        }

        info!(
            "Answered {} ({}, source={}, confidence={:.2})",
            user_id, language, source, confidence
        );

        Reply {
            text,
            language,
            confidence,
            source,
        }
    }

    /// Most recent exchanges with `user_id`, oldest first
    pub fn history(&self, user_id: &str) -> taxi_core::Result<Vec<HistoryEntry>> {
        self.history.recent(user_id, self.history_limit)
    }

    pub fn conversation(&self, user_id: &str) -> taxi_core::Result<Option<ConversationSummary>> {
        self.history.conversation(user_id)
    }

    /// Forget everything said with `user_id`; returns the number of messages removed
    pub fn clear_history(&self, user_id: &str) -> taxi_core::Result<usize> {
        self.history.clear(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faq::KnowledgeBase;
    use crate::faq::fixtures::taxi_knowledge;
    use crate::responder::tests::{MockGenerator, responder_with};
    use std::sync::atomic::Ordering;
    use taxi_core::{Error, Role, SqliteHistory};

    /// Store that fails every call
    struct BrokenHistory;

    impl HistoryStore for BrokenHistory {
        fn recent(&self, _: &str, _: usize) -> taxi_core::Result<Vec<HistoryEntry>> {
            Err(Error::HistoryUnavailable("offline".to_string()))
        }

        fn record(&self, _: &str, _: &str, _: &str, _: Language) -> taxi_core::Result<()> {
            Err(Error::HistoryUnavailable("offline".to_string()))
        }

        fn clear(&self, _: &str) -> taxi_core::Result<usize> {
            Err(Error::HistoryUnavailable("offline".to_string()))
        }

        fn conversation(&self, _: &str) -> taxi_core::Result<Option<ConversationSummary>> {
            Err(Error::HistoryUnavailable("offline".to_string()))
        }
    }

    fn agent(responder: Responder) -> (SupportAgent, Arc<SqliteHistory>) {
        let store = Arc::new(SqliteHistory::in_memory().unwrap());
        (SupportAgent::new(responder, store.clone(), 8), store)
    }

    #[tokio::test]
    async fn test_handle_records_exchange() {
        let (agent, store) = agent(responder_with(taxi_knowledge(), None));

        let reply = agent.handle("966500000001", "How do I book a taxi?").await;
        assert_eq!(reply.text, "Open the app and tap Book.");
        assert_eq!(reply.language, Language::English);
        assert_eq!(reply.source, AnswerSource::Stored);

        let history = store.recent("966500000001", 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "How do I book a taxi?");
        assert_eq!(history[1].content, "Open the app and tap Book.");
    }

    #[tokio::test]
    async fn test_arabic_message_gets_arabic_reply() {
        let (agent, _) = agent(responder_with(KnowledgeBase::default(), None));

        let reply = agent.handle("user", "كيف يمكنني حجز سيارة؟").await;
        assert_eq!(reply.language, Language::Arabic);
        assert_eq!(
            reply.text,
            agent.responder().replies().no_knowledge_base(Language::Arabic)
        );
    }

    #[tokio::test]
    async fn test_previous_exchanges_reach_generator() {
        let generator = Arc::new(MockGenerator::replying("Refunds apply to airport trips too."));
        let (agent, _) = agent(responder_with(taxi_knowledge(), Some(generator.clone())));

        agent.handle("user", "How do I book a taxi?").await;
        let reply = agent
            .handle("user", "what about refunds for canceled airport trips")
            .await;

        assert_eq!(reply.source, AnswerSource::Generated);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("User: How do I book a taxi?"));
        assert!(prompts[0].contains("Assistant: Open the app and tap Book."));
    }

    #[tokio::test]
    async fn test_blank_answer_is_replaced() {
        let generator = Arc::new(MockGenerator::replying("ok"));
        let (agent, _) = agent(responder_with(taxi_knowledge(), Some(generator)));

        let reply = agent
            .handle("user", "what about refunds for canceled airport trips")
            .await;
        assert_eq!(
            reply.text,
            agent.responder().replies().thanks_for_contacting(Language::English)
        );
        assert_eq!(reply.source, AnswerSource::Fallback);
        assert_eq!(reply.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_short_stored_answer_is_sent_verbatim() {
        let knowledge = KnowledgeBase::from_pairs([("Do you offer airport trips?", "Yes.")]);
        let (agent, store) = agent(responder_with(knowledge, None));

        let reply = agent.handle("user", "Do you offer airport trips?").await;
        assert_eq!(reply.text, "Yes.");
        assert_eq!(reply.source, AnswerSource::Stored);
        assert!(reply.confidence >= 0.99);
        assert_eq!(store.recent("user", 10).unwrap()[1].content, "Yes.");
    }

    #[tokio::test]
    async fn test_history_failures_do_not_break_replies() {
        let agent = SupportAgent::new(
            responder_with(taxi_knowledge(), None),
            Arc::new(BrokenHistory),
            8,
        );

        let reply = agent.handle("user", "How do I book a taxi?").await;
        assert_eq!(reply.text, "Open the app and tap Book.");
        assert!(agent.history("user").is_err());
    }

    #[tokio::test]
    async fn test_clear_history() {
        let (agent, _) = agent(responder_with(taxi_knowledge(), None));
        agent.handle("user", "How do I book a taxi?").await;

        assert_eq!(agent.history("user").unwrap().len(), 2);
        assert_eq!(agent.conversation("user").unwrap().unwrap().message_count, 2);
        assert_eq!(agent.clear_history("user").unwrap(), 2);
        assert!(agent.history("user").unwrap().is_empty());
        assert!(agent.conversation("user").unwrap().is_none());
    }
}
