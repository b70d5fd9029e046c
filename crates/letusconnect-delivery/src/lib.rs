//! # letusconnect-delivery
//!
//! Delivery adapters for LetUsConnect notifications. Provides:
//!
//! - The [`DeliveryAdapter`] trait and a registry keyed by channel
//! - SMS and email adapters over HTTP relays
//! - Push delivery over a pub/sub bus (in-memory broadcast, or Redis with
//!   the `redis-pubsub` feature)
//! - Retryable/permanent failure classification

pub mod adapter;
pub mod bus;
pub mod email;
pub mod error;
pub mod message;
pub mod push;
pub mod relay;
pub mod sms;

pub use adapter::{DeliveryAdapter, DeliveryRegistry};
pub use bus::{BusMessage, MemoryPubSub, PubSubBus};
pub use error::DeliveryError;
pub use message::OutboundMessage;
