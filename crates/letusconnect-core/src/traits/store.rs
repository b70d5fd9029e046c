//! Document store trait for pluggable schemaless backends.
//!
//! The store speaks JSON documents; typed records are converted at the
//! repository boundary. Transactions are optimistic: a transaction records
//! the version of every document it read and submits those stamps with its
//! writes. The commit applies atomically only if none of the read
//! documents changed in between.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::result::AppResult;
use crate::types::filter::FilterField;
use crate::types::query::Query;

/// A document as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Document id, unique within its collection.
    pub id: String,
    /// Document body.
    pub data: Value,
    /// Monotonic version, bumped on every write. Never zero for a stored document.
    pub version: u64,
}

/// The version of a document observed by a transaction read.
///
/// A version of `0` records that the document was absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReadStamp {
    /// Collection name.
    pub collection: String,
    /// Document id.
    pub id: String,
    /// Observed version, `0` when absent.
    pub version: u64,
}

/// A buffered transaction write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Replace the whole document.
    Set {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
        /// New body.
        data: Value,
    },
    /// Merge top-level fields into the document, creating it when absent.
    Merge {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
        /// Fields to overwrite.
        patch: Value,
    },
    /// Remove the document.
    Delete {
        /// Collection name.
        collection: String,
        /// Document id.
        id: String,
    },
}

impl WriteOp {
    /// The `(collection, id)` the write targets.
    pub fn target(&self) -> (&str, &str) {
        match self {
            Self::Set { collection, id, .. }
            | Self::Merge { collection, id, .. }
            | Self::Delete { collection, id } => (collection, id),
        }
    }
}

/// Result of submitting a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// All writes were applied.
    Committed,
    /// A read document changed concurrently; nothing was applied.
    Contended,
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Matching documents in query order.
    pub documents: Vec<StoredDocument>,
    /// Id of the last returned document when more results follow.
    pub next_cursor: Option<String>,
}

/// Trait for schemaless, collection-oriented document stores.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a document by id. Returns `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<StoredDocument>>;

    /// Run a filtered, ordered, paginated query.
    async fn query(&self, collection: &str, query: &Query) -> AppResult<QueryResult>;

    /// Count documents matching all filters.
    async fn count(&self, collection: &str, filters: &[FilterField]) -> AppResult<u64>;

    /// Atomically apply `writes` if every read stamp still matches.
    async fn commit(&self, reads: &[ReadStamp], writes: Vec<WriteOp>) -> AppResult<CommitOutcome>;

    /// Check that the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
