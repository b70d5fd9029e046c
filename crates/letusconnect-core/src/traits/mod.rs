//! Core traits defined in `letusconnect-core` and implemented by other crates.

pub mod clock;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{
    CommitOutcome, DocumentStore, QueryResult, ReadStamp, StoredDocument, WriteOp,
};
