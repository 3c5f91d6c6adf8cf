//! Webhook routes

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use taxi_support::SupportAgent;
use tracing::{error, info, warn};

use crate::cloud::ReplySender;
use crate::webhook::{
    SIGNATURE_HEADER, WebhookPayload, extract_messages, truncate_for_whatsapp,
    verify_signature, verify_subscription,
};

/// Shared state for the webhook routes
#[derive(Clone)]
pub struct WhatsAppState {
    pub agent: Arc<SupportAgent>,
    pub sender: Arc<dyn ReplySender>,
    pub verify_token: String,
    /// When set, deliveries must carry a valid `X-Hub-Signature-256`
    pub app_secret: Option<String>,
}

/// Outcome reported back to Meta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    NoMessage,
    MessageSent,
    MessageFailed,
    Error,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl WebhookAck {
    fn status(status: AckStatus) -> Self {
        Self {
            status,
            replies: Vec::new(),
            message: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Error,
            replies: Vec::new(),
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// `GET /webhook` and `POST /webhook`
pub fn router(state: WhatsAppState) -> Router {
    Router::new()
        .route("/webhook", get(verify).post(receive))
        .with_state(state)
}

/// Subscription handshake
async fn verify(
    State(state): State<WhatsAppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    match verify_subscription(
        params.mode.as_deref(),
        params.verify_token.as_deref(),
        params.challenge.as_deref(),
        &state.verify_token,
    ) {
        Ok(challenge) => (StatusCode::OK, challenge).into_response(),
        Err(e) => (StatusCode::FORBIDDEN, e.to_string()).into_response(),
    }
}

/// Message delivery
///
/// Always answers 200 once the signature is accepted; Meta retries anything else.
async fn receive(State(state): State<WhatsAppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(secret) = &state.app_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if let Err(e) = verify_signature(secret, &body, signature) {
            warn!("Rejected webhook delivery: {}", e);
            return (StatusCode::UNAUTHORIZED, Json(WebhookAck::error(e.to_string()))).into_response();
        }
    }

    let payload = match WebhookPayload::parse(&body) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Error processing webhook: {}", e);
            return Json(WebhookAck::error(e.to_string())).into_response();
        }
    };

    let messages = extract_messages(&payload);
    if messages.is_empty() {
        return Json(WebhookAck::status(AckStatus::NoMessage)).into_response();
    }

    let mut ack = WebhookAck::status(AckStatus::MessageSent);
    for inbound in messages {
        info!(
            "Processing message from {} ({}): {}",
            inbound.user_name, inbound.user_id, inbound.message
        );

        let reply = state.agent.handle(&inbound.user_id, &inbound.message).await;
        let text = truncate_for_whatsapp(&reply.text);

        if let Err(e) = state.sender.send(&inbound.user_id, &text).await {
            error!("Failed to send reply to {}: {}", inbound.user_id, e);
            ack.status = AckStatus::MessageFailed;
        }
        ack.replies.push(text);
    }

    Json(ack).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, WhatsAppError};
    use crate::webhook::MAX_MESSAGE_CHARS;
    use crate::webhook::tests::{TEXT_PAYLOAD, sign};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use std::sync::Mutex;
    use taxi_core::{FaqConfig, SqliteHistory};
    use taxi_support::{CannedReplies, FaqMatcher, KnowledgeBase, Responder, ResponsePolicy};
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingSender {
        fail: bool,
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ReplySender for RecordingSender {
        async fn send(&self, to: &str, text: &str) -> Result<String> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), text.to_string()));
            if self.fail {
                Err(WhatsAppError::Api("500 - boom".to_string()))
            } else {
                Ok("wamid.sent".to_string())
            }
        }
    }

    fn agent(answer: &str) -> Arc<SupportAgent> {
        let config = FaqConfig::default();
        let knowledge = KnowledgeBase::from_pairs([("How can I book a ride?", answer)]);
        let responder = Responder::new(
            FaqMatcher::new(Arc::new(knowledge), &config),
            None,
            CannedReplies::default(),
            ResponsePolicy::from(&config),
        );
        let history = Arc::new(SqliteHistory::in_memory().unwrap());
        Arc::new(SupportAgent::new(responder, history, 8))
    }

    fn app(sender: Arc<RecordingSender>, app_secret: Option<&str>, answer: &str) -> Router {
        router(WhatsAppState {
            agent: agent(answer),
            sender,
            verify_token: "verify-me".to_string(),
            app_secret: app_secret.map(str::to_string),
        })
    }

    async fn post(app: Router, body: &str, signature: Option<String>) -> (StatusCode, WebhookAck) {
        let mut request = Request::post("/webhook").header("content-type", "application/json");
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        let response = app
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_verify_handshake() {
        let sender = Arc::new(RecordingSender::default());
        let response = app(sender.clone(), None, "x")
            .oneshot(
                Request::get("/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"42");

        let response = app(sender, None, "x")
            .oneshot(
                Request::get("/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_text_message_is_answered() {
        let sender = Arc::new(RecordingSender::default());
        let (status, ack) = post(
            app(sender.clone(), None, "Open the app and tap Book."),
            TEXT_PAYLOAD,
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack.status, AckStatus::MessageSent);
        assert_eq!(ack.replies, vec!["Open the app and tap Book."]);

        let sent = sender.sent.lock().unwrap();
        assert_eq!(
            sent[0],
            ("966500000001".to_string(), "Open the app and tap Book.".to_string())
        );
    }

    #[tokio::test]
    async fn test_send_failure_is_reported() {
        let sender = Arc::new(RecordingSender {
            fail: true,
            ..Default::default()
        });
        let (status, ack) = post(app(sender, None, "Open the app."), TEXT_PAYLOAD, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack.status, AckStatus::MessageFailed);
    }

    #[tokio::test]
    async fn test_payload_without_messages() {
        let sender = Arc::new(RecordingSender::default());
        let (status, ack) = post(app(sender.clone(), None, "x"), r#"{"entry": []}"#, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack.status, AckStatus::NoMessage);
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_payload_still_acknowledged() {
        let sender = Arc::new(RecordingSender::default());
        let (status, ack) = post(app(sender, None, "x"), "{not json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack.status, AckStatus::Error);
        assert!(ack.message.is_some());
    }

    #[tokio::test]
    async fn test_signature_required_when_secret_set() {
        let sender = Arc::new(RecordingSender::default());

        let (status, ack) = post(app(sender.clone(), Some("s3cret"), "x"), TEXT_PAYLOAD, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(ack.status, AckStatus::Error);
        assert_eq!(
            ack.message.as_deref(),
            Some("Webhook signature verification failed")
        );

        let signature = sign("s3cret", TEXT_PAYLOAD.as_bytes());
        let (status, ack) = post(
            app(sender.clone(), Some("s3cret"), "Open the app."),
            TEXT_PAYLOAD,
            Some(signature),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack.status, AckStatus::MessageSent);
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_long_replies_are_truncated() {
        let sender = Arc::new(RecordingSender::default());
        let long_answer = "x".repeat(MAX_MESSAGE_CHARS + 100);
        post(app(sender.clone(), None, &long_answer), TEXT_PAYLOAD, None).await;

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent[0].1.chars().count(), MAX_MESSAGE_CHARS);
    }
}
