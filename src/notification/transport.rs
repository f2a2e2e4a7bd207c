//! Outbound delivery to the Ubuntu Touch push service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use thiserror::Error;

/// Why a single device delivery did not go through.
#[derive(Debug, Error)]
pub enum DeliveryFailure {
    /// The message could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Connection, TLS or timeout failure talking to the provider
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status
    #[error("Push server responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl DeliveryFailure {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryFailure::Serialization(_) => "serialization",
            DeliveryFailure::Transport(e) if e.is_timeout() => "timeout",
            DeliveryFailure::Transport(_) => "transport",
            DeliveryFailure::Status { .. } => "status",
        }
    }
}

/// Outcome of a successful provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub status: StatusCode,
    /// Bytes drained from the response body
    pub response_bytes: usize,
}

/// Sends one serialized push message to the provider.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Deliver a JSON-encoded outbound message.
    async fn deliver(&self, payload: &str) -> Result<DeliveryReceipt, DeliveryFailure>;

    /// Where messages are sent, for logging
    fn endpoint(&self) -> &str;
}

/// HTTP transport sharing one pooled client across all requests.
#[derive(Debug, Clone)]
pub struct HttpPushTransport {
    client: Client,
    endpoint: Url,
}

impl HttpPushTransport {
    /// Build a transport with its own client bounded by `timeout` per call.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, crate::error::AppError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            crate::error::AppError::ConfigurationMissing(format!(
                "push.server_url {} is not a valid URL: {}",
                endpoint, e
            ))
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn deliver(&self, payload: &str) -> Result<DeliveryReceipt, DeliveryFailure> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload.to_owned())
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryFailure::Status { status, body });
        }

        // Drain the body so the connection goes back to the pool
        let drained = response.bytes().await?;

        Ok(DeliveryReceipt {
            status,
            response_bytes: drained.len(),
        })
    }

    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}
