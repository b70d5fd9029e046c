//! Scheduler leases: expiry arithmetic and renewal during fan-out.

use chrono::{DateTime, TimeDelta, Utc};

use letusconnect_core::traits::Clock;
use letusconnect_core::types::id::NotificationId;
use letusconnect_entity::notification::NotificationStatus;
use letusconnect_store::NotificationRepository;

/// `now + delta`, pinned to the latest representable instant on overflow.
pub(crate) fn saturating_after(now: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Keeps one claimed notification leased to its holder while it is dispatched.
#[derive(Debug)]
pub struct LeaseKeeper<'a> {
    repo: &'a NotificationRepository,
    id: &'a NotificationId,
    holder: &'a str,
    clock: &'a dyn Clock,
    length: TimeDelta,
}

impl<'a> LeaseKeeper<'a> {
    /// Create a keeper for `id` held by `holder`.
    pub fn new(
        repo: &'a NotificationRepository,
        id: &'a NotificationId,
        holder: &'a str,
        clock: &'a dyn Clock,
        length: TimeDelta,
    ) -> Self {
        Self {
            repo,
            id,
            holder,
            clock,
            length,
        }
    }

    /// Confirm the lease is still ours, extending it once less than half remains.
    ///
    /// Returns `false` when another holder took over, the notification left
    /// `sending`, or the store could not be reached.
    pub async fn hold(&self) -> bool {
        let now = self.clock.now();
        let (holder, length) = (self.holder, self.length);
        let result = self
            .repo
            .update("scheduler.renew_lease", self.id, |n| {
                if n.status != NotificationStatus::Sending {
                    return Ok(false);
                }
                let Some(lease) = n.lease.as_mut().filter(|l| l.holder == holder) else {
                    return Ok(false);
                };
                if lease.expires_at - now < length / 2 {
                    lease.expires_at = saturating_after(now, length);
                }
                Ok(true)
            })
            .await;
        match result {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!(notification_id = %self.id, holder, "Lease taken over during dispatch");
                false
            }
            Err(e) => {
                tracing::warn!(notification_id = %self.id, error = %e, "Could not renew lease");
                false
            }
        }
    }
}
