//! Push delivery over a pub/sub bus.

use std::sync::Arc;

use async_trait::async_trait;

use letusconnect_entity::notification::DeliveryChannel;

use crate::adapter::DeliveryAdapter;
use crate::bus::{BusMessage, PubSubBus};
use crate::error::DeliveryError;
use crate::message::OutboundMessage;

/// Publishes the notification payload on the recipient's channel.
#[derive(Debug, Clone)]
pub struct PushAdapter {
    bus: Arc<dyn PubSubBus>,
}

impl PushAdapter {
    /// Create a push adapter over `bus`.
    pub fn new(bus: Arc<dyn PubSubBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl DeliveryAdapter for PushAdapter {
    fn channel(&self) -> DeliveryChannel {
        DeliveryChannel::Push
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        self.bus
            .publish(BusMessage {
                channel: message.recipient.clone(),
                event: message.event.clone(),
                payload: message.payload.clone(),
            })
            .await
    }
}
