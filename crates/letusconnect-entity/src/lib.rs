//! # letusconnect-entity
//!
//! Domain record types for LetUsConnect. Every struct in this crate is
//! either a stored document (`UserConnections`, `Notification`) or a value
//! object embedded in one. Stored documents use camelCase field names on
//! the wire and derive `Serialize`/`Deserialize`; the store boundary is
//! the only place they become generic JSON.

pub mod connection;
pub mod notification;
pub mod user;
