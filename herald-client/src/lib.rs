//! Herald HTTP Client
//!
//! Delivers a rendered message to chat webhooks.
//!
//! Endpoints are contacted one after another in the configured order. The
//! first failure stops the run; endpoints after it are never attempted.
//!
//! # Example
//!
//! ```no_run
//! use herald_client::{DeliveryOptions, WebhookClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = WebhookClient::new(DeliveryOptions::default())?;
//!     let webhooks = vec!["https://open.feishu.cn/open-apis/bot/v2/hook/xxx".to_string()];
//!
//!     client
//!         .send_all(&webhooks, r#"{"msg_type":"text","content":{"text":"hi"}}"#)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod error;
mod transport;

pub use error::{DeliveryError, Result};
pub use transport::{HttpTransport, WebhookResponse, WebhookTransport};

use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which responses count as a failed delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Any non-2xx status is a failure
    #[default]
    RequireSuccess,
    /// Only connection-level errors are failures
    TransportOnly,
}

/// Delivery settings
#[derive(Debug, Clone)]
pub struct DeliveryOptions {
    /// Log request and response bodies
    pub debug: bool,
    /// Per-request timeout
    pub timeout: Duration,
    pub status_policy: StatusPolicy,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            debug: false,
            timeout: DEFAULT_TIMEOUT,
            status_policy: StatusPolicy::default(),
        }
    }
}

/// Client that posts messages to webhook endpoints
#[derive(Debug, Clone)]
pub struct WebhookClient<T = HttpTransport> {
    transport: T,
    options: DeliveryOptions,
}

impl WebhookClient<HttpTransport> {
    /// Create a client backed by reqwest
    ///
    /// # Errors
    /// Returns [`DeliveryError::InvalidClient`] if the HTTP client cannot be built
    pub fn new(options: DeliveryOptions) -> Result<Self> {
        let transport = HttpTransport::new(options.timeout)?;
        Ok(Self::with_transport(transport, options))
    }
}

impl<T: WebhookTransport> WebhookClient<T> {
    /// Create a client over a custom transport
    pub fn with_transport(transport: T, options: DeliveryOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &DeliveryOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Deliver `message` to every endpoint, in order
    ///
    /// # Returns
    /// The number of endpoints the message was delivered to
    ///
    /// # Errors
    /// - [`DeliveryError::MissingWebhook`] if `endpoints` is empty; nothing is sent
    /// - [`DeliveryError::Endpoint`] wrapping the first failure; later
    ///   endpoints are not attempted
    pub async fn send_all(&self, endpoints: &[String], message: &str) -> Result<usize> {
        if endpoints.is_empty() {
            return Err(DeliveryError::MissingWebhook);
        }

        let total = endpoints.len();
        for (position, url) in endpoints.iter().enumerate() {
            let index = position + 1;
            let redacted = redact_url(url);
            info!("Sending message to webhook {}/{} ({})", index, total, redacted);

            if let Err(e) = self.send(url, message).await {
                warn!("Webhook {}/{} ({}) failed: {}", index, total, redacted, e);
                return Err(e.at_endpoint(index, total, redacted));
            }
        }

        info!("Message delivered to {} webhook(s)", total);
        Ok(total)
    }

    /// Deliver `message` to a single endpoint
    ///
    /// Applies the configured [`StatusPolicy`] to the response.
    pub async fn send(&self, url: &str, message: &str) -> Result<WebhookResponse> {
        let response = self.transport.post(url, message).await?;

        if self.options.debug {
            debug!("================================");
            debug!("Request Body: \n{}", message);
            debug!("Response Body: {:?}", response.body);
            debug!("================================");
        }

        if self.options.status_policy == StatusPolicy::RequireSuccess && !response.is_success() {
            return Err(DeliveryError::Status {
                status: response.status,
                body: response.body,
            });
        }

        Ok(response)
    }
}

/// Reduce a webhook URL to scheme and host
///
/// Webhook URLs carry their access token in the path or query, so only the
/// host is safe to log.
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => match parsed.port() {
                Some(port) => format!("{}://{}:{}/…", parsed.scheme(), host, port),
                None => format!("{}://{}/…", parsed.scheme(), host),
            },
            None => format!("{}:…", parsed.scheme()),
        },
        Err(_) => "<invalid url>".to_string(),
    }
}
