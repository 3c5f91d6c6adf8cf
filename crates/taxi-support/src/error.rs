//! Error types for taxi-support

use thiserror::Error;

/// taxi-support error type
#[derive(Error, Debug)]
pub enum SupportError {
    #[error("Knowledge base is empty")]
    EmptyKnowledgeBase,

    #[error("Knowledge base load failed: {0}")]
    KnowledgeLoad(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SupportError>;
