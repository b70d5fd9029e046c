//! Core type definitions used across the LetUsConnect workspace.

pub mod filter;
pub mod id;
pub mod pagination;
pub mod query;
pub mod sorting;

pub use filter::{FilterField, FilterOp};
pub use id::*;
pub use pagination::{CursorPage, CursorRequest};
pub use query::Query;
pub use sorting::{SortDirection, SortField};
