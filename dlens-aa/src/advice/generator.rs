//! External advice generator client
//!
//! The care-recommendation text comes from an external chatbot webhook:
//! request carries a single prompt string, response carries a reply string.
//! Anything else (transport failure, non-2xx status, missing reply field)
//! is a typed failure the cache layer turns into a non-cached notice.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default webhook endpoint for the advice chatbot
pub const DEFAULT_WEBHOOK_URL: &str = "http://127.0.0.1:5678/webhook/chatbot";

/// Timeout for advice generation requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Advice generation errors
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Transport-level failure (connect, timeout, ...)
    #[error("Advice request failed: {0}")]
    Request(String),

    /// Generator answered with a non-success status
    #[error("Advice service returned status {0}")]
    Status(u16),

    /// Response body missing or unparseable
    #[error("Malformed advice response: {0}")]
    Malformed(String),
}

/// Request/response text generation seam
#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    /// Generate advice text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

#[derive(Serialize)]
struct WebhookRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct WebhookResponse {
    reply: String,
}

/// HTTP client for the chatbot webhook
pub struct WebhookAdviceClient {
    http_client: Client,
    endpoint: String,
}

impl WebhookAdviceClient {
    /// Create a client for the given webhook endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AdviceGenerator for WebhookAdviceClient {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        debug!(endpoint = %self.endpoint, "Requesting advice generation");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&WebhookRequest { message: prompt })
            .send()
            .await
            .map_err(|e| GeneratorError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeneratorError::Status(status.as_u16()));
        }

        let body: WebhookResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Malformed(e.to_string()))?;

        Ok(body.reply)
    }
}
