//! Webhook message transport.
//!
//! Delivers dispatched messages as JSON POSTs to a configured endpoint.
//! A non-success response becomes a structured rejection carrying
//! whatever body the remote returned, so the engine can log it in full.

use crate::config::WebhookConfig;
use async_trait::async_trait;
use chime_dispatch::{MessageTransport, TransportError};
use chime_message::ScheduledMessage;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Transport that POSTs message payloads to a webhook endpoint.
pub struct WebhookTransport {
    client: reqwest::Client,
    url: String,
}

impl WebhookTransport {
    /// Creates a transport from the webhook configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &WebhookConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.send_timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    fn payload(message: &ScheduledMessage) -> JsonValue {
        serde_json::json!({
            "message_id": message.id.to_string(),
            "text": message.text,
            "channel": message.details.channel,
            "recipients": message.details.recipients,
        })
    }
}

#[async_trait]
impl MessageTransport for WebhookTransport {
    async fn send(&self, message: &ScheduledMessage) -> Result<(), TransportError> {
        let response = self
            .client
            .post(&self.url)
            .json(&Self::payload(message))
            .send()
            .await
            .map_err(|e| TransportError::Failed {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Keep the remote's body even when it is not JSON.
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(JsonValue::String(text));

        Err(TransportError::Rejected {
            status: Some(status.as_u16()),
            body,
        })
    }
}
