//! Error types for webhook delivery

use thiserror::Error;

/// Result type alias for delivery operations
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Errors that can occur while delivering a message
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// No endpoint to deliver to
    #[error("missing webhook url")]
    MissingWebhook,

    /// The HTTP client could not be configured
    #[error("failed to build HTTP client: {0}")]
    InvalidClient(#[source] reqwest::Error),

    /// HTTP request failed (connection, timeout, invalid URL, ...)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Transport failure not originating from reqwest
    #[error("transport error: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status code
    #[error("webhook returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Delivery to one endpoint failed; later endpoints were skipped
    #[error("webhook {index}/{total} ({url}) failed: {source}")]
    Endpoint {
        /// 1-based position of the endpoint in the configured list
        index: usize,
        total: usize,
        /// Endpoint with its path and query redacted
        url: String,
        #[source]
        source: Box<DeliveryError>,
    },
}

impl DeliveryError {
    /// Wrap an error with the position of the endpoint that produced it
    pub fn at_endpoint(self, index: usize, total: usize, url: impl Into<String>) -> Self {
        Self::Endpoint {
            index,
            total,
            url: url.into(),
            source: Box::new(self),
        }
    }

    /// 1-based index of the failing endpoint, if known
    pub fn endpoint_index(&self) -> Option<usize> {
        match self {
            Self::Endpoint { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// The underlying error, without endpoint attribution
    pub fn root(&self) -> &DeliveryError {
        match self {
            Self::Endpoint { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if the endpoint answered with a 4xx status
    pub fn is_client_error(&self) -> bool {
        matches!(self.root(), Self::Status { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if the endpoint answered with a 5xx status
    pub fn is_server_error(&self) -> bool {
        matches!(self.root(), Self::Status { status, .. } if *status >= 500)
    }
}
