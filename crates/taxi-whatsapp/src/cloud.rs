//! Meta WhatsApp Cloud API client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use taxi_core::WhatsAppConfig;
use tracing::{debug, error, info};

use crate::error::{Result, WhatsAppError};

/// Graph API base URL
const GRAPH_API_URL: &str = "https://graph.facebook.com";

/// Outbound half of the messaging transport
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Send `text` to `to`, returning the provider's message id
    async fn send(&self, to: &str, text: &str) -> Result<String>;
}

/// WhatsApp Cloud API client
#[derive(Debug, Clone)]
pub struct CloudApiClient {
    client: Client,
    access_token: String,
    phone_number_id: String,
    api_version: String,
    base_url: String,
}

impl CloudApiClient {
    /// Create a client from configuration
    pub fn new(config: &WhatsAppConfig) -> Result<Self> {
        let (Some(access_token), Some(phone_number_id)) =
            (config.access_token.as_ref(), config.phone_number_id.as_ref())
        else {
            return Err(WhatsAppError::CredentialsNotSet);
        };

        Ok(Self {
            client: Client::new(),
            access_token: access_token.clone(),
            phone_number_id: phone_number_id.clone(),
            api_version: config.api_version.clone(),
            base_url: GRAPH_API_URL.to_string(),
        })
    }

    /// Point the client at another Graph API host (tests, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url, self.api_version, self.phone_number_id
        )
    }

    /// Send a plain text message
    pub async fn send_text(&self, to: &str, body: &str) -> Result<String> {
        let payload = SendTextPayload {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: TextBody { body },
        };

        debug!("Sending WhatsApp message to {}", to);

        let response = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("WhatsApp API error: {} - {}", status, body);
            return Err(WhatsAppError::Api(format!("{} - {}", status, body)));
        }

        let sent: SendMessageResponse = response.json().await?;
        let message_id = sent
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .unwrap_or_default();

        info!("Message sent to {}: {}", to, message_id);
        Ok(message_id)
    }
}

#[async_trait]
impl ReplySender for CloudApiClient {
    async fn send(&self, to: &str, text: &str) -> Result<String> {
        self.send_text(to, text).await
    }
}

#[derive(Debug, Serialize)]
struct SendTextPayload<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}
