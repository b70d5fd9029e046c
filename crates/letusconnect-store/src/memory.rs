//! In-process document store with optimistic commits.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use letusconnect_core::error::AppError;
use letusconnect_core::result::AppResult;
use letusconnect_core::traits::store::{
    CommitOutcome, DocumentStore, QueryResult, ReadStamp, StoredDocument, WriteOp,
};
use letusconnect_core::types::filter::FilterField;
use letusconnect_core::types::query::Query;

use crate::eval;

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, BTreeMap<String, StoredDocument>>,
    /// Versions are drawn from one counter so a deleted and recreated
    /// document never reuses a version a reader may hold.
    last_version: u64,
}

impl State {
    fn version_of(&self, collection: &str, id: &str) -> u64 {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map_or(0, |doc| doc.version)
    }

    fn apply(&mut self, write: WriteOp) {
        self.last_version += 1;
        let version = self.last_version;
        match write {
            WriteOp::Set {
                collection,
                id,
                data,
            } => {
                self.collections
                    .entry(collection)
                    .or_default()
                    .insert(id.clone(), StoredDocument { id, data, version });
            }
            WriteOp::Merge {
                collection,
                id,
                patch,
            } => {
                let docs = self.collections.entry(collection).or_default();
                let doc = docs.entry(id.clone()).or_insert_with(|| StoredDocument {
                    id,
                    data: Value::Object(Default::default()),
                    version,
                });
                if let (Value::Object(target), Value::Object(fields)) = (&mut doc.data, patch) {
                    target.extend(fields);
                }
                doc.version = version;
            }
            WriteOp::Delete { collection, id } => {
                if let Some(docs) = self.collections.get_mut(&collection) {
                    docs.remove(&id);
                }
            }
        }
    }
}

/// A [`DocumentStore`] held entirely in memory.
///
/// Commits take the write lock, validate every read stamp against the
/// current versions, and apply all writes or none. Used by the server
/// binary and by every test in the workspace.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    state: RwLock<State>,
    injected_failures: AtomicU32,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` commits fail with a transient `Unavailable` error.
    pub fn fail_next_commits(&self, n: u32) {
        self.injected_failures.store(n, Ordering::SeqCst);
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.state
            .read()
            .await
            .collections
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    fn take_injected_failure(&self) -> bool {
        self.injected_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<StoredDocument>> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn query(&self, collection: &str, query: &Query) -> AppResult<QueryResult> {
        let state = self.state.read().await;
        let Some(docs) = state.collections.get(collection) else {
            return Ok(QueryResult::default());
        };

        let mut matching: Vec<&StoredDocument> = docs
            .values()
            .filter(|doc| eval::matches_all(&doc.data, &query.filters))
            .collect();
        matching.sort_by(|a, b| eval::order(a, b, &query.order_by));

        if let Some(cursor) = &query.start_after {
            let anchor = docs.get(cursor).ok_or_else(|| {
                AppError::invalid_argument(format!("Unknown cursor '{cursor}'"))
            })?;
            matching.retain(|doc| eval::order(doc, anchor, &query.order_by).is_gt());
        }

        let has_more = query.limit.is_some_and(|limit| matching.len() > limit);
        if let Some(limit) = query.limit {
            matching.truncate(limit);
        }
        let documents: Vec<StoredDocument> = matching.into_iter().cloned().collect();
        let next_cursor = if has_more {
            documents.last().map(|doc| doc.id.clone())
        } else {
            None
        };

        Ok(QueryResult {
            documents,
            next_cursor,
        })
    }

    async fn count(&self, collection: &str, filters: &[FilterField]) -> AppResult<u64> {
        let state = self.state.read().await;
        let count = state.collections.get(collection).map_or(0, |docs| {
            docs.values()
                .filter(|doc| eval::matches_all(&doc.data, filters))
                .count()
        });
        Ok(count as u64)
    }

    async fn commit(&self, reads: &[ReadStamp], writes: Vec<WriteOp>) -> AppResult<CommitOutcome> {
        if self.take_injected_failure() {
            return Err(AppError::unavailable("Injected transient store failure"));
        }

        let mut state = self.state.write().await;
        if let Some(stale) = reads
            .iter()
            .find(|r| state.version_of(&r.collection, &r.id) != r.version)
        {
            debug!(
                collection = %stale.collection,
                id = %stale.id,
                "Commit contended"
            );
            return Ok(CommitOutcome::Contended);
        }

        for write in writes {
            state.apply(write);
        }
        Ok(CommitOutcome::Committed)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
