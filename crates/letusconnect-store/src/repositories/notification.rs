//! Notification repository implementation.

use chrono::{DateTime, Utc};

use letusconnect_core::error::AppError;
use letusconnect_core::result::AppResult;
use letusconnect_core::types::filter::FilterField;
use letusconnect_core::types::id::{NotificationId, Uid};
use letusconnect_core::types::pagination::CursorPage;
use letusconnect_core::types::query::Query;
use letusconnect_core::types::sorting::SortField;
use letusconnect_entity::notification::{NOTIFICATIONS_COLLECTION, Notification, NotificationStatus};

use crate::codec;
use crate::handle::StoreHandle;

const SCAN_PAGE_SIZE: usize = 500;

/// Repository for notification documents.
///
/// Every mutation is a conditional update: the mutator sees the current
/// document inside a transaction and the write only lands if the document
/// is unchanged at commit.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    store: StoreHandle,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Insert a new notification. Fails if the id is taken.
    pub async fn create(&self, notification: &Notification) -> AppResult<()> {
        let id = notification.id.as_str();
        self.store
            .run_transaction("notifications.create", |mut tx| async move {
                let existing: Option<Notification> = tx.get(NOTIFICATIONS_COLLECTION, id).await?;
                if existing.is_some() {
                    return Err(AppError::already_exists(format!(
                        "Notification {id} already exists"
                    )));
                }
                tx.set(NOTIFICATIONS_COLLECTION, id, notification)?;
                Ok((tx, ()))
            })
            .await
    }

    /// Find a notification by id.
    pub async fn find(&self, id: &NotificationId) -> AppResult<Option<Notification>> {
        self.store
            .get(NOTIFICATIONS_COLLECTION, id.as_str())
            .await?
            .map(|doc| codec::decode(NOTIFICATIONS_COLLECTION, &doc.id, &doc.data))
            .transpose()
    }

    /// Find a notification by id or fail with `NotFound`.
    pub async fn get(&self, id: &NotificationId) -> AppResult<Notification> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }

    /// Conditionally update a notification.
    ///
    /// `mutate` sees the current document; the document is written back
    /// only if `mutate` changed it. `mutate` runs again on fresh state after
    /// contention.
    pub async fn update<T, F>(&self, operation: &str, id: &NotificationId, mutate: F) -> AppResult<T>
    where
        F: Fn(&mut Notification) -> AppResult<T> + Send + Sync,
        T: Send,
    {
        let mutate = &mutate;
        self.store
            .run_transaction(operation, |mut tx| async move {
                let Some(mut notification) =
                    tx.get::<Notification>(NOTIFICATIONS_COLLECTION, id.as_str()).await?
                else {
                    return Err(AppError::not_found(format!("Notification {id} not found")));
                };
                let before = notification.clone();
                let value = mutate(&mut notification)?;
                if notification != before {
                    tx.set(NOTIFICATIONS_COLLECTION, id.as_str(), &notification)?;
                }
                Ok((tx, value))
            })
            .await
    }

    /// One page of notifications addressed to `uid`, newest first.
    ///
    /// Ordered by `(createdAt desc, id desc)`; `cursor` is the id of the
    /// last item of the previous page.
    pub async fn page_for_user(
        &self,
        uid: &Uid,
        extra: &[FilterField],
        limit: usize,
        cursor: Option<String>,
    ) -> AppResult<CursorPage<Notification>> {
        let mut query = Query::new()
            .filter(FilterField::array_contains("targetedUsers", uid.as_str()))
            .order_by(SortField::desc("createdAt"))
            .limit(limit)
            .start_after(cursor);
        query.filters.extend_from_slice(extra);

        let result = self.store.query(NOTIFICATIONS_COLLECTION, &query).await?;
        let items = result
            .documents
            .iter()
            .map(|doc| codec::decode(NOTIFICATIONS_COLLECTION, &doc.id, &doc.data))
            .collect::<AppResult<Vec<Notification>>>()?;
        Ok(CursorPage::new(items, result.next_cursor))
    }

    /// Every notification addressed to `uid` matching `extra`, newest first.
    pub async fn all_for_user(&self, uid: &Uid, extra: &[FilterField]) -> AppResult<Vec<Notification>> {
        let mut all = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.page_for_user(uid, extra, SCAN_PAGE_SIZE, cursor).await?;
            all.extend(page.items);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(all),
            }
        }
    }

    /// Count notifications matching all filters.
    pub async fn count(&self, filters: &[FilterField]) -> AppResult<u64> {
        self.store.count(NOTIFICATIONS_COLLECTION, filters).await
    }

    /// Pending notifications whose scheduled instant is at or before `now`,
    /// earliest first.
    pub async fn find_due(&self, now: DateTime<Utc>, limit: usize) -> AppResult<Vec<Notification>> {
        let query = Query::new()
            .filter(FilterField::eq("status", NotificationStatus::Pending.as_str()))
            .filter(FilterField::lte("scheduledAt", codec::encode(&now)?))
            .order_by(SortField::asc("scheduledAt"))
            .limit(limit);
        self.decode_all(&query).await
    }

    /// Notifications stuck in `sending` whose lease lapsed at or before `now`.
    pub async fn find_lapsed_leases(&self, now: DateTime<Utc>, limit: usize) -> AppResult<Vec<Notification>> {
        let query = Query::new()
            .filter(FilterField::eq("status", NotificationStatus::Sending.as_str()))
            .filter(FilterField::lte("lease.expiresAt", codec::encode(&now)?))
            .order_by(SortField::asc("lease.expiresAt"))
            .limit(limit);
        self.decode_all(&query).await
    }

    async fn decode_all(&self, query: &Query) -> AppResult<Vec<Notification>> {
        self.store
            .query(NOTIFICATIONS_COLLECTION, query)
            .await?
            .documents
            .iter()
            .map(|doc| codec::decode(NOTIFICATIONS_COLLECTION, &doc.id, &doc.data))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use letusconnect_core::ErrorKind;
    use letusconnect_core::config::StoreConfig;
    use letusconnect_entity::notification::{NotificationBuilder, NotificationCategory};

    use super::*;
    use crate::memory::MemoryDocumentStore;

    fn repo() -> NotificationRepository {
        let store = Arc::new(MemoryDocumentStore::new());
        NotificationRepository::new(StoreHandle::new(store, &StoreConfig::default()))
    }

    fn notification(targets: &[&str], created: DateTime<Utc>) -> Notification {
        NotificationBuilder::new("message", NotificationCategory::Message)
            .title("New message")
            .targets(targets.iter().map(|t| Uid::from(*t)))
            .build(created)
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let repo = repo();
        let n = notification(&["u1"], Utc::now());
        repo.create(&n).await.unwrap();
        let err = repo.create(&n).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyExists);
        assert_eq!(repo.get(&n.id).await.unwrap(), n);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = repo();
        let err = repo
            .update("test.update", &NotificationId::generate(), |_| Ok(()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_pages_are_newest_first_and_stable() {
        let repo = repo();
        let base = Utc::now();
        let mut ids = Vec::new();
        for i in 0..5 {
            let n = notification(&["u1", "u2"], base + Duration::seconds(i));
            ids.push(n.id.clone());
            repo.create(&n).await.unwrap();
        }
        repo.create(&notification(&["u9"], base)).await.unwrap();

        let u1 = Uid::from("u1");
        let first = repo.page_for_user(&u1, &[], 2, None).await.unwrap();
        assert_eq!(first.items.iter().map(|n| &n.id).collect::<Vec<_>>(), [&ids[4], &ids[3]]);

        // A newer insert must not shift the next page.
        repo.create(&notification(&["u1"], base + Duration::seconds(60)))
            .await
            .unwrap();
        let second = repo
            .page_for_user(&u1, &[], 2, first.next_cursor.clone())
            .await
            .unwrap();
        assert_eq!(second.items.iter().map(|n| &n.id).collect::<Vec<_>>(), [&ids[2], &ids[1]]);

        let all = repo.all_for_user(&u1, &[]).await.unwrap();
        assert_eq!(all.len(), 6);
    }

    #[tokio::test]
    async fn test_find_due_respects_schedule() {
        let repo = repo();
        let now = Utc::now();
        let due = notification(&["u1"], now - Duration::seconds(5));
        let later = NotificationBuilder::new("sms", NotificationCategory::Direct)
            .targets([Uid::from("u1")])
            .scheduled_at(Some(now + Duration::seconds(30)))
            .build(now);
        repo.create(&due).await.unwrap();
        repo.create(&later).await.unwrap();

        let found = repo.find_due(now, 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, due.id);
        assert_eq!(repo.find_due(now + Duration::seconds(30), 10).await.unwrap().len(), 2);
    }
}
