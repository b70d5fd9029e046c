//! Notification document model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use letusconnect_core::error::AppError;
use letusconnect_core::result::AppResult;
use letusconnect_core::types::id::{NotificationId, Uid};

use super::category::{ActorType, DeliveryChannel, NotificationCategory, NotificationPriority};
use super::parts::{Lease, NotificationAction, RelatedEntity};
use super::status::NotificationStatus;

/// Collection holding [`Notification`] documents.
pub const NOTIFICATIONS_COLLECTION: &str = "notifications";

/// A stored notification addressed to one or more users.
///
/// `read_status` always has exactly the keys of `targeted_users`;
/// [`NotificationBuilder`](super::NotificationBuilder) establishes that and
/// the mutators below preserve it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification id.
    pub id: NotificationId,
    /// Primary recipient, when there is exactly one.
    #[serde(default)]
    pub user_id: Option<Uid>,
    /// The user that caused the notification.
    #[serde(default)]
    pub actor_id: Option<Uid>,
    /// Display name of the actor.
    #[serde(default)]
    pub actor_name: Option<String>,
    /// Actor kind.
    #[serde(default)]
    pub actor_type: ActorType,
    /// Type tag, e.g. `connection_request`.
    #[serde(rename = "type")]
    pub notification_type: String,
    /// Category used for filtering and stats.
    pub category: NotificationCategory,
    /// Priority.
    #[serde(default)]
    pub priority: NotificationPriority,
    /// Delivery status.
    pub status: NotificationStatus,
    /// Short title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Arbitrary structured data.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Entities the notification refers to.
    #[serde(default)]
    pub related_entities: Vec<RelatedEntity>,
    /// Calls to action.
    #[serde(default)]
    pub actions: Vec<NotificationAction>,
    /// Recipients, without duplicates.
    pub targeted_users: Vec<Uid>,
    /// Per-recipient read flag.
    #[serde(default)]
    pub read_status: BTreeMap<Uid, bool>,
    /// Per-recipient archive flag; missing means not archived.
    #[serde(default)]
    pub is_archived: BTreeMap<Uid, bool>,
    /// Delivery channel.
    #[serde(default)]
    pub delivery_channel: DeliveryChannel,
    /// Explicit destination address for email or SMS sends.
    #[serde(default)]
    pub recipient: Option<String>,
    /// Earliest dispatch instant.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// When the notification was handed to the adapter.
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    /// When the single recipient read it.
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    /// After this instant the notification is cancelled instead of sent.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Dispatch attempts so far.
    #[serde(default)]
    pub attempts: u32,
    /// Current dispatch claim.
    #[serde(default)]
    pub lease: Option<Lease>,
    /// Last delivery error message.
    #[serde(default)]
    pub last_error: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Whether `uid` is a recipient.
    pub fn is_targeted(&self, uid: &Uid) -> bool {
        self.read_status.contains_key(uid)
    }

    /// Whether `uid` has read the notification.
    pub fn is_read_by(&self, uid: &Uid) -> bool {
        self.read_status.get(uid).copied().unwrap_or(false)
    }

    /// Whether `uid` has archived the notification.
    pub fn is_archived_for(&self, uid: &Uid) -> bool {
        self.is_archived.get(uid).copied().unwrap_or(false)
    }

    /// Whether the notification has exactly one recipient.
    pub fn is_single_recipient(&self) -> bool {
        self.targeted_users.len() == 1
    }

    /// Whether the notification is pending and its scheduled instant has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == NotificationStatus::Pending
            && self.scheduled_at.is_none_or(|at| at <= now)
    }

    /// Whether the expiry instant has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Whether another scheduler instance currently holds a live claim.
    pub fn is_leased(&self, now: DateTime<Utc>) -> bool {
        self.status == NotificationStatus::Sending
            && self.lease.as_ref().is_some_and(|l| l.is_live(now))
    }

    /// Mark the notification read for `uid`.
    ///
    /// Returns `false` when it was already read. `read_at` is set only for
    /// single-recipient notifications, and the status moves to `read` only
    /// from `sent`.
    pub fn mark_read(&mut self, uid: &Uid, now: DateTime<Utc>) -> AppResult<bool> {
        let Some(flag) = self.read_status.get_mut(uid) else {
            return Err(not_targeted(&self.id, uid));
        };
        if *flag {
            return Ok(false);
        }
        *flag = true;

        if self.is_single_recipient() {
            self.read_at = Some(now);
            if self.status == NotificationStatus::Sent {
                self.status = NotificationStatus::Read;
            }
        }
        self.updated_at = now;
        Ok(true)
    }

    /// Set the archive flag for `uid`. Returns `false` when unchanged.
    pub fn set_archived(&mut self, uid: &Uid, archived: bool, now: DateTime<Utc>) -> AppResult<bool> {
        if !self.is_targeted(uid) {
            return Err(not_targeted(&self.id, uid));
        }
        if self.is_archived_for(uid) == archived {
            return Ok(false);
        }
        self.is_archived.insert(uid.clone(), archived);
        self.updated_at = now;
        Ok(true)
    }

    /// Move to `next`, enforcing the status DAG.
    pub fn transition(&mut self, next: NotificationStatus, now: DateTime<Utc>) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "Notification {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        if next == NotificationStatus::Sent {
            self.sent_at = Some(now);
        }
        if next != NotificationStatus::Sending {
            self.lease = None;
        }
        self.updated_at = now;
        Ok(())
    }
}

fn not_targeted(id: &NotificationId, uid: &Uid) -> AppError {
    AppError::not_targeted(format!("User {uid} is not a recipient of notification {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationBuilder;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap()
    }

    fn single(uid: &str) -> Notification {
        NotificationBuilder::new("connection_accepted", NotificationCategory::Connection)
            .title("Connection accepted")
            .targets([Uid::from(uid)])
            .build(at(0))
    }

    #[test]
    fn test_mark_read_single_recipient_sets_read_at() {
        let mut n = single("b");
        n.transition(NotificationStatus::Sent, at(1)).unwrap();

        assert!(n.mark_read(&Uid::from("b"), at(2)).unwrap());
        assert_eq!(n.read_at, Some(at(2)));
        assert_eq!(n.status, NotificationStatus::Read);

        assert!(!n.mark_read(&Uid::from("b"), at(3)).unwrap());
        assert_eq!(n.read_at, Some(at(2)));
    }

    #[test]
    fn test_mark_read_pending_keeps_status() {
        let mut n = single("b");
        n.mark_read(&Uid::from("b"), at(1)).unwrap();
        assert_eq!(n.status, NotificationStatus::Pending);
        assert!(n.is_read_by(&Uid::from("b")));
    }

    #[test]
    fn test_mark_read_not_targeted() {
        let mut n = single("b");
        let err = n.mark_read(&Uid::from("z"), at(1)).unwrap_err();
        assert_eq!(err.kind, letusconnect_core::ErrorKind::NotTargeted);
    }

    #[test]
    fn test_archive_and_unarchive() {
        let mut n = single("b");
        let b = Uid::from("b");
        assert!(n.set_archived(&b, true, at(1)).unwrap());
        assert!(!n.set_archived(&b, true, at(2)).unwrap());
        assert!(n.is_archived_for(&b));
        assert!(n.set_archived(&b, false, at(3)).unwrap());
        assert!(!n.is_archived_for(&b));
    }

    #[test]
    fn test_transition_sets_sent_at_and_clears_lease() {
        let mut n = single("b");
        n.transition(NotificationStatus::Sending, at(1)).unwrap();
        n.lease = Some(Lease {
            holder: "w1".into(),
            expires_at: at(60),
        });
        assert!(n.is_leased(at(2)));
        assert!(!n.is_leased(at(61)));

        n.transition(NotificationStatus::Sent, at(3)).unwrap();
        assert_eq!(n.sent_at, Some(at(3)));
        assert!(n.lease.is_none());
        assert!(n.transition(NotificationStatus::Pending, at(4)).is_err());
    }

    #[test]
    fn test_due_and_expired() {
        let mut n = single("b");
        n.scheduled_at = Some(at(10));
        n.expires_at = Some(at(20));
        assert!(!n.is_due(at(9)));
        assert!(n.is_due(at(10)));
        assert!(!n.is_expired(at(19)));
        assert!(n.is_expired(at(20)));
    }

    #[test]
    fn test_wire_field_names() {
        let n = single("b");
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "connection_accepted");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["readStatus"]["b"], false);
        assert!(json.get("targetedUsers").is_some());
    }
}
