//! Typed repositories over the document store.

pub mod connection;
pub mod notification;

pub use connection::ConnectionRepository;
pub use notification::NotificationRepository;
