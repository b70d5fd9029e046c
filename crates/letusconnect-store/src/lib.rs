//! # letusconnect-store
//!
//! Document store access for LetUsConnect: the in-memory optimistic
//! store, query evaluation, deadline-bounded store calls, the transaction
//! runner with bounded retry, and typed repositories for the
//! `user_connections` and `notifications` collections.

pub mod codec;
pub mod deadline;
pub mod eval;
pub mod handle;
pub mod memory;
pub mod repositories;
pub mod transaction;

pub use handle::{RetryPolicy, StoreHandle};
pub use memory::MemoryDocumentStore;
pub use repositories::{ConnectionRepository, NotificationRepository};
pub use transaction::Transaction;
