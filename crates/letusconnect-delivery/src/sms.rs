//! SMS delivery through the SMS relay.

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
struct SmsRequest<'a> {
    from: &'a str,
    to: &'a str,
    body: &'a str,
}

/// Sends `body` to a phone number.
#[derive(Debug, Clone)]
pub struct SmsRelayAdapter {
    relay: RelayClient,
}

impl SmsRelayAdapter {
    /// Create the adapter for the configured relay.
    pub fn new(config: &RelayConfig) -> AppResult<Self> {
        Ok(Self {
            relay: RelayClient::new(config)?,
        })
    }
}

#[async_trait]
impl DeliveryAdapter for SmsRelayAdapter {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Sms
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        if message.recipient.trim().is_empty() {
            return Err(DeliveryError::Permanent("SMS recipient is empty".into()));
        }
        self.relay
            .post(&SmsRequest {
                from: self.relay.sender(),
                to: &message.recipient,
                body: &message.body,
            })
            .await
    }
}
