//! User profile as seen through the identity resolver.

pub mod model;

pub use model::UserProfile;
