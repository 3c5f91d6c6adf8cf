//! HTTP API handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use taxi_core::{ConversationSummary, Language};
use taxi_support::AnswerSource;
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub faq_entries: usize,
    pub generation_enabled: bool,
}

/// Chat request payload
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation key, e.g. a phone number
    pub user_id: String,
    pub message: String,
}

/// Chat response payload
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub language: Language,
    pub confidence: f64,
    pub source: AnswerSource,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub user_id: String,
    /// `User: ...` / `Assistant: ...` lines, oldest first
    pub messages: Vec<String>,
    /// Totals over the whole conversation, absent for unknown users
    pub conversation: Option<ConversationSummary>,
}

// ============================================================================
// Handler functions
// ============================================================================

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Taxi Customer Support Chatbot API is running!".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let responder = state.agent.responder();
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Service is running".to_string(),
        faq_entries: responder.matcher().knowledge().len(),
        generation_enabled: responder.generation_enabled(),
    })
}

/// Answer one customer message
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let user_id = req.user_id.trim();
    let message = req.message.trim();
    if user_id.is_empty() {
        return Err(ApiError::InvalidRequest("user_id must not be empty".to_string()));
    }
    if message.is_empty() {
        return Err(ApiError::InvalidRequest("message must not be empty".to_string()));
    }

    debug!("Chat request from {}", user_id);
    let reply = state.agent.handle(user_id, message).await;

    Ok(Json(ChatResponse {
        reply: reply.text,
        language: reply.language,
        confidence: reply.confidence,
        source: reply.source,
    }))
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<HistoryResponse>> {
    let messages = state
        .agent
        .history(&user_id)?
        .iter()
        .map(ToString::to_string)
        .collect();
    let conversation = state.agent.conversation(&user_id)?;

    Ok(Json(HistoryResponse {
        user_id,
        messages,
        conversation,
    }))
}

pub async fn clear_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode> {
    let removed = state.agent.clear_history(&user_id)?;
    info!("Cleared {} message(s) for {}", removed, user_id);
    Ok(StatusCode::NO_CONTENT)
}
