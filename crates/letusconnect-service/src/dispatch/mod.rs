//! Hand-off from committed domain changes to the notification outbox.

pub mod dispatcher;

pub use dispatcher::EventDispatcher;
