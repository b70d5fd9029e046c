//! Shared, deadline-enforcing access to the document store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use letusconnect_core::config::StoreConfig;
use letusconnect_core::error::AppError;
use letusconnect_core::result::AppResult;
use letusconnect_core::traits::store::{
    CommitOutcome, DocumentStore, QueryResult, ReadStamp, StoredDocument, WriteOp,
};
use letusconnect_core::types::filter::FilterField;
use letusconnect_core::types::query::Query;

use crate::deadline::with_deadline;
use crate::transaction::Transaction;

/// Bounded retry for contended or transiently failing transactions.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Attempt `n` is followed by a pause of `n * base_delay`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Pause after the given (1-based) attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Cloneable handle wrapping a [`DocumentStore`] with per-call deadlines
/// and the transaction runner.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    store: Arc<dyn DocumentStore>,
    deadline: Duration,
    retry: RetryPolicy,
}

impl StoreHandle {
    /// Wrap a store using the configured deadline and retry policy.
    pub fn new(store: Arc<dyn DocumentStore>, config: &StoreConfig) -> Self {
        info!(
            deadline_seconds = config.deadline_seconds,
            max_attempts = config.transaction_max_attempts,
            "Document store handle ready"
        );
        Self {
            store,
            deadline: config.deadline(),
            retry: RetryPolicy {
                max_attempts: config.transaction_max_attempts.max(1),
                base_delay: config.retry_base_delay(),
            },
        }
    }

    /// The retry policy used by [`run_transaction`](Self::run_transaction).
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Get a document by id.
    pub async fn get(&self, collection: &str, id: &str) -> AppResult<Option<StoredDocument>> {
        with_deadline(self.deadline, "store.get", self.store.get(collection, id)).await
    }

    /// Run a query.
    pub async fn query(&self, collection: &str, query: &Query) -> AppResult<QueryResult> {
        with_deadline(self.deadline, "store.query", self.store.query(collection, query)).await
    }

    /// Count matching documents.
    pub async fn count(&self, collection: &str, filters: &[FilterField]) -> AppResult<u64> {
        with_deadline(self.deadline, "store.count", self.store.count(collection, filters)).await
    }

    /// Submit reads and writes for an optimistic commit.
    pub async fn commit(&self, reads: &[ReadStamp], writes: Vec<WriteOp>) -> AppResult<CommitOutcome> {
        with_deadline(self.deadline, "store.commit", self.store.commit(reads, writes)).await
    }

    /// Check store connectivity.
    pub async fn health_check(&self) -> AppResult<bool> {
        with_deadline(self.deadline, "store.health_check", self.store.health_check()).await
    }

    /// Start an empty transaction.
    pub fn begin(&self) -> Transaction {
        Transaction::new(self.clone())
    }

    /// Run `body` in a fresh transaction and commit it, retrying the whole
    /// attempt on contention or a transient error.
    ///
    /// `body` receives the transaction by value and hands it back together
    /// with its result. An error returned by `body` that is not transient
    /// aborts immediately without writing anything. Exhausting the attempts
    /// under contention surfaces `Conflict`; exhausting them under transient
    /// errors surfaces the last such error.
    pub async fn run_transaction<T, F, Fut>(&self, operation: &str, mut body: F) -> AppResult<T>
    where
        F: FnMut(Transaction) -> Fut,
        Fut: Future<Output = AppResult<(Transaction, T)>>,
    {
        let mut attempt = 1;
        loop {
            let outcome = match body(self.begin()).await {
                Ok((tx, value)) => tx.commit().await.map(|outcome| (outcome, value)),
                Err(e) => Err(e),
            };

            let exhausted = attempt >= self.retry.max_attempts;
            match outcome {
                Ok((CommitOutcome::Committed, value)) => return Ok(value),
                Ok((CommitOutcome::Contended, _)) => {
                    debug!(operation, attempt, "Transaction contended");
                    if exhausted {
                        return Err(AppError::conflict(format!(
                            "{operation} did not commit after {attempt} attempts"
                        )));
                    }
                }
                Err(e) if e.is_retryable() => {
                    warn!(operation, attempt, error = %e, "Transient store failure");
                    if exhausted {
                        return Err(e);
                    }
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(self.retry.delay(attempt)).await;
            attempt += 1;
        }
    }
}
