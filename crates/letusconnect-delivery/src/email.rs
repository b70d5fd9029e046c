//! Email delivery through the email relay.

use async_trait::async_trait;
use serde::Serialize;

use letusconnect_core::config::RelayConfig;
use letusconnect_core::result::AppResult;
use letusconnect_entity::notification::DeliveryChannel;

use crate::adapter::DeliveryAdapter;
use crate::error::DeliveryError;
use crate::message::OutboundMessage;
use crate::relay::RelayClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
}

/// Sends an HTML email.
#[derive(Debug, Clone)]
pub struct EmailRelayAdapter {
    relay: RelayClient,
}

impl EmailRelayAdapter {
    /// Create the adapter for the configured relay.
    pub fn new(config: &RelayConfig) -> AppResult<Self> {
        Ok(Self {
            relay: RelayClient::new(config)?,
        })
    }
}

#[async_trait]
impl DeliveryAdapter for EmailRelayAdapter {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Email
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        if !message.recipient.contains('@') {
            return Err(DeliveryError::Permanent(format!(
                "'{}' is not an email address",
                message.recipient
            )));
        }
        self.relay
            .post(&EmailRequest {
                from: self.relay.sender(),
                to: &message.recipient,
                subject: &message.subject,
                html_body: &message.body,
            })
            .await
    }
}
