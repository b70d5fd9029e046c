//! In-memory pub/sub for single-node deployments.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;

use super::{BusMessage, PubSubBus};
use crate::error::DeliveryError;

/// In-memory pub/sub implementation.
#[derive(Debug)]
pub struct MemoryPubSub {
    /// Channel name → broadcast sender
    channels: DashMap<String, broadcast::Sender<BusMessage>>,
    /// Buffer size for channels
    buffer_size: usize,
}

impl MemoryPubSub {
    /// Create a new in-memory pub/sub
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: DashMap::new(),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Subscribe to a channel, returns a receiver
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<BusMessage> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .subscribe()
    }

    /// Number of live subscribers on a channel.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map_or(0, |tx| tx.receiver_count())
    }
}

#[async_trait]
impl PubSubBus for MemoryPubSub {
    async fn publish(&self, message: BusMessage) -> Result<(), DeliveryError> {
        // Nobody listening is not a failure: offline clients read the
        // stored notification later.
        let Some(tx) = self.channels.get(&message.channel) else {
            trace!(channel = %message.channel, "No subscribers");
            return Ok(());
        };
        let _ = tx.send(message);
        Ok(())
    }
}
