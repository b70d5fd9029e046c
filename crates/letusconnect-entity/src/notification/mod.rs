//! Notification domain entities.

pub mod builder;
pub mod category;
pub mod model;
pub mod parts;
pub mod status;

pub use builder::NotificationBuilder;
pub use category::{ActorType, DeliveryChannel, NotificationCategory, NotificationPriority};
pub use model::{NOTIFICATIONS_COLLECTION, Notification};
pub use parts::{Lease, NotificationAction, RelatedEntity};
pub use status::NotificationStatus;
