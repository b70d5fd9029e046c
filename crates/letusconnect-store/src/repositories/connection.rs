//! Repository for per-user connection documents.

use chrono::{DateTime, Utc};

use letusconnect_core::error::AppError;
use letusconnect_core::result::AppResult;
use letusconnect_core::types::id::Uid;
use letusconnect_entity::connection::{USER_CONNECTIONS_COLLECTION, UserConnections};

use crate::codec;
use crate::handle::StoreHandle;
use crate::transaction::Transaction;

/// Repository for `user_connections` documents, keyed by owner uid.
#[derive(Debug, Clone)]
pub struct ConnectionRepository {
    store: StoreHandle,
}

impl ConnectionRepository {
    /// Create a new connection repository.
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Find the document for `uid` without creating it.
    pub async fn find(&self, uid: &Uid) -> AppResult<Option<UserConnections>> {
        self.store
            .get(USER_CONNECTIONS_COLLECTION, uid.as_str())
            .await?
            .map(|doc| codec::decode(USER_CONNECTIONS_COLLECTION, &doc.id, &doc.data))
            .transpose()
    }

    /// Return the document for `uid`, creating an empty one if absent.
    pub async fn get_or_create(&self, uid: &Uid, now: DateTime<Utc>) -> AppResult<UserConnections> {
        self.store
            .run_transaction("connections.get_or_create", |mut tx| async move {
                let (doc, existed) = load_or_empty(&mut tx, uid, now).await?;
                if !existed {
                    tx.set(USER_CONNECTIONS_COLLECTION, uid.as_str(), &doc)?;
                }
                Ok((tx, doc))
            })
            .await
    }

    /// Read both documents, apply `mutate`, and write back whatever changed,
    /// all in one transaction.
    ///
    /// `mutate` runs again on fresh state after contention, so it must be a
    /// pure function of the two documents. An error from `mutate` aborts
    /// without writing.
    pub async fn update_pair<T, F>(
        &self,
        operation: &str,
        a: &Uid,
        b: &Uid,
        now: DateTime<Utc>,
        mutate: F,
    ) -> AppResult<T>
    where
        F: Fn(&mut UserConnections, &mut UserConnections) -> AppResult<T> + Send + Sync,
        T: Send,
    {
        if a == b {
            return Err(AppError::invalid_argument(format!(
                "{operation} needs two distinct users"
            )));
        }
        let mutate = &mutate;
        self.store
            .run_transaction(operation, |mut tx| async move {
                let (mut doc_a, a_existed) = load_or_empty(&mut tx, a, now).await?;
                let (mut doc_b, b_existed) = load_or_empty(&mut tx, b, now).await?;
                let (before_a, before_b) = (doc_a.clone(), doc_b.clone());

                let value = mutate(&mut doc_a, &mut doc_b)?;

                write_if_changed(&mut tx, doc_a, &before_a, a_existed, now)?;
                write_if_changed(&mut tx, doc_b, &before_b, b_existed, now)?;
                Ok((tx, value))
            })
            .await
    }
}

async fn load_or_empty(
    tx: &mut Transaction,
    uid: &Uid,
    now: DateTime<Utc>,
) -> AppResult<(UserConnections, bool)> {
    let existing: Option<UserConnections> = tx.get(USER_CONNECTIONS_COLLECTION, uid.as_str()).await?;
    Ok(match existing {
        Some(doc) => (doc, true),
        None => (UserConnections::empty(uid.clone(), now), false),
    })
}

fn write_if_changed(
    tx: &mut Transaction,
    mut doc: UserConnections,
    before: &UserConnections,
    existed: bool,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if existed && doc == *before {
        return Ok(());
    }
    doc.touch(now);
    tx.set(USER_CONNECTIONS_COLLECTION, doc.uid.as_str(), &doc)
}
