//! Per-recipient delivery of one notification.

use std::time::Duration;

use letusconnect_core::ErrorKind;
use letusconnect_core::types::id::Uid;
use letusconnect_delivery::message::user_channel;
use letusconnect_delivery::{DeliveryError, DeliveryRegistry, OutboundMessage};
use letusconnect_entity::notification::{DeliveryChannel, Notification};
use letusconnect_service::IdentityResolver;

use crate::lease::LeaseKeeper;

/// How the delivery of a whole notification ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanoutOutcome {
    /// At least one recipient got it and nothing is worth retrying.
    Delivered,
    /// Some recipient failed transiently.
    Retry(String),
    /// Nobody got it and retrying will not help.
    Failed(String),
}

/// Counts collected while fanning out.
#[derive(Debug, Default)]
pub struct FanoutSummary {
    /// Recipients the adapter accepted.
    pub delivered: usize,
    /// Targeted users without an address for the channel.
    pub skipped: usize,
    retryable: Vec<String>,
    permanent: Vec<String>,
}

impl FanoutSummary {
    fn record(&mut self, result: Result<(), DeliveryError>) {
        match result {
            Ok(()) => self.delivered += 1,
            Err(DeliveryError::Retryable(msg)) => self.retryable.push(msg),
            Err(DeliveryError::Permanent(msg)) => self.permanent.push(msg),
        }
    }

    fn lease_lost(&mut self) {
        self.retryable.push("Lease lost during dispatch".to_string());
    }

    /// Collapse the per-recipient results into one outcome.
    pub fn outcome(&self) -> FanoutOutcome {
        if let Some(last) = self.retryable.last() {
            return FanoutOutcome::Retry(last.clone());
        }
        if self.delivered > 0 {
            return FanoutOutcome::Delivered;
        }
        match self.permanent.last() {
            Some(last) => FanoutOutcome::Failed(last.clone()),
            None => FanoutOutcome::Failed("No deliverable recipients".to_string()),
        }
    }
}

/// Deliver `notification` to every recipient within `timeout` overall.
///
/// An explicit `recipient` is used as is; otherwise every targeted user is
/// addressed through the channel's own lookup. With a `keeper`, the lease is
/// confirmed before each recipient and fan-out stops once it is lost. Running
/// out of time keeps what was delivered and asks for a retry.
pub async fn deliver(
    notification: &Notification,
    registry: &DeliveryRegistry,
    identity: &dyn IdentityResolver,
    keeper: Option<&LeaseKeeper<'_>>,
    timeout: Duration,
) -> FanoutSummary {
    let mut summary = FanoutSummary::default();
    let work = fan_out(notification, registry, identity, keeper, &mut summary);
    if tokio::time::timeout(timeout, work).await.is_err() {
        tracing::warn!(
            notification_id = %notification.id,
            delivered = summary.delivered,
            timeout_seconds = timeout.as_secs(),
            "Dispatch timed out"
        );
        summary.retryable.push(format!(
            "{} dispatch timed out after {}s ({} delivered)",
            notification.delivery_channel,
            timeout.as_secs(),
            summary.delivered
        ));
    }
    summary
}

async fn fan_out(
    notification: &Notification,
    registry: &DeliveryRegistry,
    identity: &dyn IdentityResolver,
    keeper: Option<&LeaseKeeper<'_>>,
    summary: &mut FanoutSummary,
) {
    if let Some(recipient) = &notification.recipient {
        if !holds(keeper).await {
            summary.lease_lost();
            return;
        }
        let message = OutboundMessage::for_recipient(notification, recipient.as_str());
        summary.record(registry.deliver(&message).await);
        return;
    }

    for uid in &notification.targeted_users {
        if !holds(keeper).await {
            summary.lease_lost();
            return;
        }
        match resolve_address(notification.delivery_channel, uid, identity).await {
            Ok(Some(address)) => {
                let message = OutboundMessage::for_recipient(notification, address);
                summary.record(registry.deliver(&message).await);
            }
            Ok(None) => {
                tracing::warn!(
                    notification_id = %notification.id,
                    uid = %uid,
                    channel = %notification.delivery_channel,
                    "Recipient has no address for channel, skipping"
                );
                summary.skipped += 1;
            }
            Err(e) => summary.record(Err(e)),
        }
    }
}

async fn holds(keeper: Option<&LeaseKeeper<'_>>) -> bool {
    match keeper {
        Some(keeper) => keeper.hold().await,
        None => true,
    }
}

async fn resolve_address(
    channel: DeliveryChannel,
    uid: &Uid,
    identity: &dyn IdentityResolver,
) -> Result<Option<String>, DeliveryError> {
    if channel == DeliveryChannel::Push {
        return Ok(Some(user_channel(uid.as_str())));
    }
    let profile = match identity.get_user(uid).await {
        Ok(profile) => profile,
        Err(e) if e.kind == ErrorKind::NotFound => return Ok(None),
        Err(e) if e.is_retryable() => return Err(DeliveryError::Retryable(e.to_string())),
        Err(e) => return Err(DeliveryError::Permanent(e.to_string())),
    };
    let address = match channel {
        DeliveryChannel::Email => profile.email,
        DeliveryChannel::Sms => profile.phone,
        DeliveryChannel::Push => None,
    };
    Ok(address.filter(|a| !a.trim().is_empty()))
}
