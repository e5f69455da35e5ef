use crate::error::{RelayError, Result};
use crate::types::DeliveryPayload;
use async_trait::async_trait;
use std::time::Duration;

/// Sends one payload to the webhook target. An `Ok` return is the only
/// signal that lets the relay loop track the row.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, target: &str, payload: &DeliveryPayload) -> Result<()>;
}

/// JSON-over-HTTP [`Transport`].
#[derive(Clone)]
pub struct WebhookTransport {
    client: reqwest::Client,
}

impl WebhookTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    async fn deliver(&self, target: &str, payload: &DeliveryPayload) -> Result<()> {
        let resp = self
            .client
            .post(target)
            .json(payload)
            .send()
            .await
            .map_err(|e| RelayError::DeliveryFailed {
                target: target.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::DeliveryStatus {
                target: target.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
