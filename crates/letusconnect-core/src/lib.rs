//! # letusconnect-core
//!
//! Core crate for LetUsConnect. Contains the document store and clock
//! traits, configuration schemas, typed identifiers, domain events,
//! cursor pagination and query types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other LetUsConnect crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
