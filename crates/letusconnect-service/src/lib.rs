//! # letusconnect-service
//!
//! Business logic layer for LetUsConnect. Services orchestrate the
//! store repositories, the identity resolver and the event dispatcher to
//! implement the connection graph and the notification reader.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod connection;
pub mod dispatch;
pub mod identity;
pub mod notification;

pub use connection::ConnectionGraphService;
pub use dispatch::EventDispatcher;
pub use identity::{CachedIdentityResolver, IdentityResolver, StaticIdentityDirectory};
pub use notification::{ListFilter, NotificationComposer, NotificationService, NotificationStats};
