//! Conversation history
//!
//! Stores every customer message and bot reply so the generation prompt can
//! include recent context.

mod store;
mod types;

pub use store::SqliteHistory;
pub use types::{ConversationSummary, HistoryEntry, Role};

use crate::Result;
use crate::language::Language;

/// Conversation history backend
///
/// Callers treat every method as best effort: a failing store must never
/// block a reply.
pub trait HistoryStore: Send + Sync {
    /// Most recent `limit` entries for a user, oldest first
    fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>>;

    /// Record one exchange (customer message and bot reply)
    fn record(&self, user_id: &str, query: &str, answer: &str, language: Language) -> Result<()>;

    /// Remove all entries for a user, returning how many were deleted
    fn clear(&self, user_id: &str) -> Result<usize>;

    /// Summary of a user's conversation, `None` if they never wrote in
    fn conversation(&self, user_id: &str) -> Result<Option<ConversationSummary>>;
}
