//! Redis pub/sub bus for multi-node deployments.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::info;

use letusconnect_core::error::{AppError, ErrorKind};
use letusconnect_core::result::AppResult;

use super::{BusMessage, PubSubBus};
use crate::error::DeliveryError;

/// Publishes bus messages with Redis `PUBLISH`.
#[derive(Clone)]
pub struct RedisPubSub {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisPubSub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPubSub").finish_non_exhaustive()
    }
}

impl RedisPubSub {
    /// Connect to Redis.
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid Redis URL", e)
        })?;
        let conn = client.get_connection_manager().await.map_err(|e| {
            AppError::with_source(ErrorKind::Unavailable, "Redis connection failed", e)
        })?;
        info!("Connected to Redis pub/sub");
        Ok(Self { conn })
    }
}

#[async_trait]
impl PubSubBus for RedisPubSub {
    async fn publish(&self, message: BusMessage) -> Result<(), DeliveryError> {
        let body = serde_json::to_string(&message)
            .map_err(|e| DeliveryError::Permanent(format!("Unencodable push payload: {e}")))?;
        let mut conn = self.conn.clone();
        redis::cmd("PUBLISH")
            .arg(&message.channel)
            .arg(body)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(|e| DeliveryError::Retryable(format!("Redis PUBLISH failed: {e}")))?;
        Ok(())
    }
}
