//! Shared HTTP client for the SMS and email relays.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use letusconnect_core::config::RelayConfig;
use letusconnect_core::error::{AppError, ErrorKind};
use letusconnect_core::result::AppResult;

use crate::error::DeliveryError;

/// A JSON-over-HTTP relay endpoint.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    url: String,
    api_key: Option<String>,
    sender: String,
}

impl RelayClient {
    /// Build a client for the configured relay.
    pub fn new(config: &RelayConfig) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build relay client", e)
            })?;
        Ok(Self {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            sender: config.sender.clone(),
        })
    }

    /// Configured sender number or address.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// POST `body` to the relay and classify the outcome.
    pub async fn post<B: Serialize + ?Sized>(&self, body: &B) -> Result<(), DeliveryError> {
        let mut request = self.http.post(&self.url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            DeliveryError::Retryable(if e.is_timeout() {
                format!("relay timed out: {e}")
            } else {
                format!("relay transport error: {e}")
            })
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Relay accepted message");
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(classify(status, &message))
    }
}

/// Map a non-success relay status to a delivery error.
pub fn classify(status: StatusCode, message: &str) -> DeliveryError {
    let detail = format!("status {}: {}", status.as_u16(), message);
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => DeliveryError::Retryable(detail),
        _ if status.is_server_error() => DeliveryError::Retryable(detail),
        _ => DeliveryError::Permanent(detail),
    }
}
