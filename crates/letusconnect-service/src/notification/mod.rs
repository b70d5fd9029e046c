//! Notification composition and the per-user reader API.

pub mod composer;
pub mod service;

pub use composer::NotificationComposer;
pub use service::{ListFilter, NotificationService, NotificationStats, RecentActivity};
