//! taxi-core: shared foundation for the taxi support bot
//!
//! Configuration, the LLM API client, language detection and the
//! SQLite-backed conversation history used by the other crates.

pub mod config;
pub mod error;
pub mod history;
pub mod language;
pub mod llm;

pub use config::{
    ApiConfig, Config, FaqConfig, HistoryConfig, LlmConfig, LlmProvider, SupportConfig,
    WhatsAppConfig,
};
pub use error::{Error, Result};
pub use history::{ConversationSummary, HistoryEntry, HistoryStore, Role, SqliteHistory};
pub use language::{Language, detect_language};
pub use llm::{LlmClient, Message, MessageContent};
