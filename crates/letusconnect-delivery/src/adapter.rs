//! Delivery adapter trait and the per-channel registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use letusconnect_core::config::DeliveryConfig;
use letusconnect_core::result::AppResult;
use letusconnect_entity::notification::DeliveryChannel;

use crate::bus::PubSubBus;
use crate::email::EmailRelayAdapter;
use crate::error::DeliveryError;
use crate::message::OutboundMessage;
use crate::push::PushAdapter;
use crate::sms::SmsRelayAdapter;

/// An external service boundary for one channel.
#[async_trait]
pub trait DeliveryAdapter: Send + Sync + std::fmt::Debug + 'static {
    /// The channel this adapter serves.
    fn channel(&self) -> DeliveryChannel;

    /// Hand one message to the external service.
    async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError>;
}

/// Adapters keyed by channel.
#[derive(Debug, Clone, Default)]
pub struct DeliveryRegistry {
    adapters: HashMap<DeliveryChannel, Arc<dyn DeliveryAdapter>>,
}

impl DeliveryRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration. Push is always available;
    /// SMS and email only when their relay is configured.
    pub fn from_config(config: &DeliveryConfig, bus: Arc<dyn PubSubBus>) -> AppResult<Self> {
        let mut registry = Self::new().with(Arc::new(PushAdapter::new(bus)));
        if let Some(sms) = &config.sms {
            registry = registry.with(Arc::new(SmsRelayAdapter::new(sms)?));
        }
        if let Some(email) = &config.email {
            registry = registry.with(Arc::new(EmailRelayAdapter::new(email)?));
        }
        info!(channels = ?registry.channels(), "Delivery adapters registered");
        Ok(registry)
    }

    /// Register an adapter, replacing any for the same channel.
    pub fn register(&mut self, adapter: Arc<dyn DeliveryAdapter>) {
        self.adapters.insert(adapter.channel(), adapter);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, adapter: Arc<dyn DeliveryAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// The adapter for `channel`.
    pub fn get(&self, channel: DeliveryChannel) -> Option<&Arc<dyn DeliveryAdapter>> {
        self.adapters.get(&channel)
    }

    /// Registered channels.
    pub fn channels(&self) -> Vec<DeliveryChannel> {
        let mut channels: Vec<_> = self.adapters.keys().copied().collect();
        channels.sort_by_key(|c| c.as_str());
        channels
    }

    /// Deliver through the adapter for the message's channel. A channel
    /// without an adapter fails permanently.
    pub async fn deliver(&self, message: &OutboundMessage) -> Result<(), DeliveryError> {
        match self.get(message.channel) {
            Some(adapter) => adapter.deliver(message).await,
            None => Err(DeliveryError::Permanent(format!(
                "No adapter registered for channel {}",
                message.channel
            ))),
        }
    }
}
