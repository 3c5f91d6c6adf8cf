//! Answer generation through an LLM

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use taxi_core::{LlmClient, LlmConfig};
use thiserror::Error;
use tracing::{debug, warn};

use crate::prompt;

/// Why a generation attempt produced nothing usable
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Generation API error: {0}")]
    Api(String),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Generation returned an empty response")]
    EmptyResponse,

    #[error("Generation is not configured")]
    NotConfigured,
}

/// Produces free text from a fully assembled prompt
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// `Generator` backed by the configured LLM provider
pub struct LlmGenerator {
    client: Arc<LlmClient>,
    system_prompt: String,
    timeout: Duration,
}

impl LlmGenerator {
    pub fn new(client: Arc<LlmClient>, support_phone: &str, timeout: Duration) -> Self {
        Self {
            client,
            system_prompt: prompt::system_prompt(support_phone),
            timeout,
        }
    }

    /// Build the client from configuration
    pub fn from_config(config: &LlmConfig, support_phone: &str) -> Result<Self, GenerationError> {
        let client = LlmClient::new(config).map_err(|_| GenerationError::NotConfigured)?;
        Ok(Self::new(
            Arc::new(client),
            support_phone,
            Duration::from_secs(config.timeout_secs.max(1)),
        ))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = self
            .client
            .request_builder()
            .system(self.system_prompt.as_str())
            .user(prompt)
            .build();

        debug!("Requesting generation from {}", self.client.model());

        let response = match tokio::time::timeout(self.timeout, self.client.messages(request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(taxi_core::Error::Http(e))) if e.is_timeout() => {
                warn!("Generation request timed out: {}", e);
                return Err(GenerationError::Timeout(self.timeout));
            }
            Ok(Err(e)) => {
                warn!("Generation request failed: {}", e);
                return Err(GenerationError::Api(e.to_string()));
            }
            Err(_) => {
                warn!("Generation exceeded {:?}", self.timeout);
                return Err(GenerationError::Timeout(self.timeout));
            }
        };

        let text = response.text();
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}
