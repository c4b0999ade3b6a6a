//! HTTP transport
//!
//! The delivery engine only needs "POST this body to that URL". The trait
//! keeps reqwest out of the delivery logic so it can be exercised without a
//! network.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::warn;

use crate::error::{DeliveryError, Result};

/// Status and body returned by a webhook endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport trait for posting JSON payloads
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// POSTs `body` to `url` with `Content-Type: application/json`
    ///
    /// Only transport-level failures are errors; any HTTP status is returned
    /// as a [`WebhookResponse`].
    async fn post(&self, url: &str, body: &str) -> Result<WebhookResponse>;
}

/// reqwest implementation of WebhookTransport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Creates a transport whose requests fail after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("herald/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DeliveryError::InvalidClient)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post(&self, url: &str, body: &str) -> Result<WebhookResponse> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read response body (status {}): {}", status, e);
                String::new()
            }
        };

        Ok(WebhookResponse { status, body })
    }
}
