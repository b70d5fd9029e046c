//! Pub/sub buses carrying push deliveries to connected clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DeliveryError;

pub mod memory;
#[cfg(feature = "redis-pubsub")]
pub mod redis_pubsub;

pub use memory::MemoryPubSub;
#[cfg(feature = "redis-pubsub")]
pub use redis_pubsub::RedisPubSub;

/// A message published on a bus channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    /// Channel name, e.g. `user:u1`.
    pub channel: String,
    /// Event name.
    pub event: String,
    /// Event payload.
    pub payload: Value,
}

/// Fire-and-forget publish.
#[async_trait]
pub trait PubSubBus: Send + Sync + std::fmt::Debug + 'static {
    /// Publish `message` on its channel.
    async fn publish(&self, message: BusMessage) -> Result<(), DeliveryError>;
}
