//! Per-user notification reads and read-state updates.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use letusconnect_core::config::NotificationsConfig;
use letusconnect_core::error::AppError;
use letusconnect_core::result::AppResult;
use letusconnect_core::traits::Clock;
use letusconnect_core::types::filter::FilterField;
use letusconnect_core::types::id::{NotificationId, Uid};
use letusconnect_core::types::pagination::{CursorPage, CursorRequest};
use letusconnect_entity::notification::{
    Notification, NotificationCategory, NotificationPriority, NotificationStatus,
};
use letusconnect_store::NotificationRepository;

use crate::connection::validation::UidInput;

/// Optional narrowing for [`NotificationService::list`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    /// Only notifications of this category.
    #[serde(default)]
    pub category: Option<NotificationCategory>,
    /// Only notifications the caller has not read.
    #[serde(default)]
    pub unread_only: bool,
    /// Include notifications the caller archived.
    #[serde(default = "default_include_archived")]
    pub include_archived: bool,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            category: None,
            unread_only: false,
            include_archived: true,
        }
    }
}

fn default_include_archived() -> bool {
    true
}

/// One entry of [`NotificationStats::recent_activity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    /// Notification id.
    pub id: NotificationId,
    /// Notification type tag.
    #[serde(rename = "type")]
    pub notification_type: String,
    /// Title.
    pub title: String,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Whether the caller read it.
    pub read: bool,
}

/// Aggregate view of a user's notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    /// Same value as [`NotificationService::unread_count`].
    pub unread: u64,
    /// All notifications addressed to the user.
    pub total: u64,
    /// Counts per category tag.
    pub by_category: BTreeMap<String, u64>,
    /// Counts per priority tag.
    pub by_priority: BTreeMap<String, u64>,
    /// Newest notifications first.
    pub recent_activity: Vec<RecentActivity>,
}

/// Reader API over the `notifications` collection.
///
/// Every operation is scoped to one caller and is idempotent.
#[derive(Debug, Clone)]
pub struct NotificationService {
    repo: Arc<NotificationRepository>,
    clock: Arc<dyn Clock>,
    config: NotificationsConfig,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(
        repo: Arc<NotificationRepository>,
        clock: Arc<dyn Clock>,
        config: NotificationsConfig,
    ) -> Self {
        Self {
            repo,
            clock,
            config,
        }
    }

    /// Lists notifications addressed to `uid`, newest first.
    pub async fn list(
        &self,
        uid: &Uid,
        page: &CursorRequest,
        filter: &ListFilter,
    ) -> AppResult<CursorPage<Notification>> {
        UidInput::new(uid).check()?;
        let limit = page.effective_limit(self.config.default_page_size, self.config.max_page_size);
        let mut extra = Vec::new();
        if let Some(category) = filter.category {
            extra.push(FilterField::eq("category", category.as_str()));
        }
        if filter.unread_only {
            extra.push(FilterField::eq(read_path(uid), false));
        }
        if !filter.include_archived {
            extra.push(FilterField::ne(archived_path(uid), true));
        }
        self.repo
            .page_for_user(uid, &extra, limit as usize, page.cursor.clone())
            .await
    }

    /// Fetches one notification on behalf of `uid`.
    pub async fn get(&self, id: &NotificationId, uid: &Uid) -> AppResult<Notification> {
        UidInput::new(uid).check()?;
        let notification = self.repo.get(id).await?;
        if !notification.is_targeted(uid) {
            return Err(not_targeted(id, uid));
        }
        Ok(notification)
    }

    /// Marks a notification read for `uid`. Returns whether anything changed.
    pub async fn mark_read(&self, id: &NotificationId, uid: &Uid) -> AppResult<bool> {
        UidInput::new(uid).check()?;
        let now = self.clock.now();
        let changed = self
            .repo
            .update("notifications.mark_read", id, |n| n.mark_read(uid, now))
            .await?;
        debug!(notification_id = %id, uid = %uid, changed, "Marked notification read");
        Ok(changed)
    }

    /// Marks every unread notification of `uid` read. Returns how many changed.
    pub async fn mark_all_read(&self, uid: &Uid) -> AppResult<u64> {
        UidInput::new(uid).check()?;
        let unread = self
            .repo
            .all_for_user(uid, &[FilterField::eq(read_path(uid), false)])
            .await?;
        let mut changed = 0;
        for notification in unread {
            if self.mark_read(&notification.id, uid).await? {
                changed += 1;
            }
        }
        info!(uid = %uid, changed, "Marked all notifications read");
        Ok(changed)
    }

    /// Archives a notification for `uid`.
    pub async fn archive(&self, id: &NotificationId, uid: &Uid) -> AppResult<bool> {
        self.set_archived(id, uid, true).await
    }

    /// Reverses [`archive`](Self::archive).
    pub async fn unarchive(&self, id: &NotificationId, uid: &Uid) -> AppResult<bool> {
        self.set_archived(id, uid, false).await
    }

    async fn set_archived(&self, id: &NotificationId, uid: &Uid, archived: bool) -> AppResult<bool> {
        UidInput::new(uid).check()?;
        let now = self.clock.now();
        self.repo
            .update("notifications.archive", id, |n| n.set_archived(uid, archived, now))
            .await
    }

    /// Unread, non-archived notifications addressed to `uid`.
    pub async fn unread_count(&self, uid: &Uid) -> AppResult<u64> {
        UidInput::new(uid).check()?;
        self.repo
            .count(&[
                FilterField::array_contains("targetedUsers", uid.as_str()),
                FilterField::eq(read_path(uid), false),
                FilterField::ne(archived_path(uid), true),
            ])
            .await
    }

    /// Aggregate counts and recent activity for `uid`.
    pub async fn stats(&self, uid: &Uid) -> AppResult<NotificationStats> {
        UidInput::new(uid).check()?;
        let all = self.repo.all_for_user(uid, &[]).await?;
        let mut stats = NotificationStats {
            unread: self.unread_count(uid).await?,
            total: all.len() as u64,
            ..Default::default()
        };
        for n in &all {
            *stats.by_category.entry(n.category.as_str().to_string()).or_default() += 1;
            *stats.by_priority.entry(priority_key(n.priority)).or_default() += 1;
        }
        stats.recent_activity = all
            .iter()
            .take(self.config.recent_activity_limit as usize)
            .map(|n| RecentActivity {
                id: n.id.clone(),
                notification_type: n.notification_type.clone(),
                title: n.title.clone(),
                created_at: n.created_at,
                read: n.is_read_by(uid),
            })
            .collect();
        Ok(stats)
    }

    /// Cancels a notification that has not been picked up yet.
    ///
    /// Cancelling twice is a no-op; anything past `pending` is not cancellable.
    pub async fn cancel(&self, id: &NotificationId) -> AppResult<()> {
        let now = self.clock.now();
        self.repo
            .update("notifications.cancel", id, |n| match n.status {
                NotificationStatus::Cancelled => Ok(()),
                NotificationStatus::Pending => n.transition(NotificationStatus::Cancelled, now),
                other => Err(AppError::not_cancellable(format!(
                    "Notification {id} is {other} and can no longer be cancelled"
                ))),
            })
            .await?;
        info!(notification_id = %id, "Cancelled notification");
        Ok(())
    }
}

fn read_path(uid: &Uid) -> String {
    format!("readStatus.{uid}")
}

fn archived_path(uid: &Uid) -> String {
    format!("isArchived.{uid}")
}

fn priority_key(priority: NotificationPriority) -> String {
    priority.as_str().to_string()
}

fn not_targeted(id: &NotificationId, uid: &Uid) -> AppError {
    AppError::not_targeted(format!("Notification {id} is not addressed to {uid}"))
}
