//! Meta webhook payloads, verification and signatures

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info, warn};

use crate::error::{Result, WhatsAppError};

type HmacSha256 = Hmac<Sha256>;

/// WhatsApp rejects text bodies longer than this many characters
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Header carrying the payload signature
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

// =============================================================================
// Payload structures
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub contacts: Vec<WebhookContact>,
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookContact {
    pub wa_id: String,
    #[serde(default)]
    pub profile: Option<ContactProfile>,
}

#[derive(Debug, Deserialize)]
pub struct ContactProfile {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    pub from: String,
    pub id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<WebhookText>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookText {
    pub body: String,
}

/// A customer text message pulled out of a webhook delivery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboundMessage {
    pub user_id: String,
    pub user_name: String,
    pub message: String,
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
}

impl WebhookPayload {
    pub fn parse(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// Meta sends epoch seconds as a string
fn parse_timestamp(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}

/// Every text message in the payload, in delivery order
///
/// Status callbacks and non-text messages (images, locations, ...) are skipped.
pub fn extract_messages(payload: &WebhookPayload) -> Vec<InboundMessage> {
    let mut inbound = Vec::new();

    for change in payload.entry.iter().flat_map(|entry| &entry.changes) {
        let value = &change.value;
        for message in &value.messages {
            let Some(text) = message.text.as_ref().filter(|_| message.kind == "text") else {
                debug!("Ignoring {} message {}", message.kind, message.id);
                continue;
            };

            let user_name = value
                .contacts
                .iter()
                .find(|contact| contact.wa_id == message.from)
                .or_else(|| value.contacts.first())
                .and_then(|contact| contact.profile.as_ref())
                .map(|profile| profile.name.clone())
                .unwrap_or_default();

            inbound.push(InboundMessage {
                user_id: message.from.clone(),
                user_name,
                message: text.body.clone(),
                message_id: message.id.clone(),
                timestamp: parse_timestamp(message.timestamp.as_deref()),
            });
        }
    }

    inbound
}

/// Answer Meta's subscription handshake
///
/// Succeeds with the challenge when `mode` is `subscribe` and the token
/// matches a non-empty configured token.
pub fn verify_subscription(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: &str,
) -> Result<String> {
    match (mode, token, challenge) {
        (Some("subscribe"), Some(token), Some(challenge))
            if !expected_token.is_empty() && token == expected_token =>
        {
            info!("Webhook verified successfully");
            Ok(challenge.to_string())
        }
        _ => {
            warn!("Webhook verification failed: invalid mode or token");
            Err(WhatsAppError::VerificationFailed)
        }
    }
}

/// Check an `X-Hub-Signature-256` header (`sha256=<hex>`) against the raw body
pub fn verify_signature(app_secret: &str, body: &[u8], header: &str) -> Result<()> {
    let signature = header
        .trim()
        .strip_prefix("sha256=")
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
        .ok_or(WhatsAppError::SignatureVerificationFailed)?;
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|_| WhatsAppError::SignatureVerificationFailed)?;
    mac.update(body);
    mac.verify_slice(&signature)
        .map_err(|_| WhatsAppError::SignatureVerificationFailed)
}

/// Cut `text` to the WhatsApp limit on a character boundary
pub fn truncate_for_whatsapp(text: &str) -> String {
    match text.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    pub(crate) const TEXT_PAYLOAD: &str = r#"{
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "102290129340398",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {"display_phone_number": "15550783881", "phone_number_id": "106540352242922"},
                    "contacts": [{"profile": {"name": "Sara"}, "wa_id": "966500000001"}],
                    "messages": [{
                        "from": "966500000001",
                        "id": "wamid.HBgLMTY1MDM4Nzk0MzkVAgASGBQzQTRBNjU5OUFFRTAzODEwMTQ0RgA=",
                        "timestamp": "1700000000",
                        "type": "text",
                        "text": {"body": "How do I book a taxi?"}
                    }]
                }
            }]
        }]
    }"#;

    #[test]
    fn test_extract_text_message() {
        let payload = WebhookPayload::parse(TEXT_PAYLOAD.as_bytes()).unwrap();
        let messages = extract_messages(&payload);

        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.user_id, "966500000001");
        assert_eq!(message.user_name, "Sara");
        assert_eq!(message.message, "How do I book a taxi?");
        assert_eq!(message.timestamp.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_status_callbacks_have_no_messages() {
        let body = r#"{
            "object": "whatsapp_business_account",
            "entry": [{"id": "1", "changes": [{"field": "messages", "value": {
                "messaging_product": "whatsapp",
                "statuses": [{"id": "wamid.x", "status": "delivered", "timestamp": "1700000001", "recipient_id": "966500000001"}]
            }}]}]
        }"#;
        let payload = WebhookPayload::parse(body.as_bytes()).unwrap();
        assert!(extract_messages(&payload).is_empty());
    }

    #[test]
    fn test_non_text_messages_are_skipped() {
        let body = r#"{"entry": [{"changes": [{"value": {
            "messages": [
                {"from": "1", "id": "a", "type": "image", "image": {"id": "img"}},
                {"from": "2", "id": "b", "type": "text", "text": {"body": "مرحبا"}}
            ]
        }}]}]}"#;
        let payload = WebhookPayload::parse(body.as_bytes()).unwrap();
        let messages = extract_messages(&payload);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].user_id, "2");
        assert_eq!(messages[0].user_name, "");
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            WebhookPayload::parse(b"not json"),
            Err(WhatsAppError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_verify_subscription() {
        assert_eq!(
            verify_subscription(Some("subscribe"), Some("secret"), Some("1158201444"), "secret")
                .unwrap(),
            "1158201444"
        );
        assert!(verify_subscription(Some("subscribe"), Some("wrong"), Some("c"), "secret").is_err());
        assert!(verify_subscription(Some("unsubscribe"), Some("secret"), Some("c"), "secret").is_err());
        assert!(verify_subscription(Some("subscribe"), Some(""), Some("c"), "").is_err());
        assert!(verify_subscription(None, None, None, "secret").is_err());
    }

    #[test]
    fn test_verify_signature() {
        let body = TEXT_PAYLOAD.as_bytes();
        let header = sign("app-secret", body);

        assert!(verify_signature("app-secret", body, &header).is_ok());
        for (secret, body, header) in [
            ("other-secret", body, header.as_str()),
            ("app-secret", b"tampered".as_slice(), header.as_str()),
            ("app-secret", body, "sha256=zz"),
            ("app-secret", body, "md5=abc"),
            ("app-secret", body, ""),
        ] {
            assert!(matches!(
                verify_signature(secret, body, header),
                Err(WhatsAppError::SignatureVerificationFailed)
            ));
        }
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        let short = "شكرا";
        assert_eq!(truncate_for_whatsapp(short), short);

        let long: String = "ع".repeat(MAX_MESSAGE_CHARS + 10);
        let truncated = truncate_for_whatsapp(&long);
        assert_eq!(truncated.chars().count(), MAX_MESSAGE_CHARS);

        let exact = "a".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(truncate_for_whatsapp(&exact), exact);
    }
}
