//! Identity resolution: uid → user profile.

pub mod cached;
pub mod directory;

use async_trait::async_trait;

use letusconnect_core::result::AppResult;
use letusconnect_core::types::id::Uid;
use letusconnect_entity::user::UserProfile;

pub use cached::CachedIdentityResolver;
pub use directory::StaticIdentityDirectory;

/// Read-only access to user profiles held by the identity provider.
#[async_trait]
pub trait IdentityResolver: Send + Sync + std::fmt::Debug + 'static {
    /// Profile for `uid`, or `NotFound`.
    async fn get_user(&self, uid: &Uid) -> AppResult<UserProfile>;

    /// Profile owning `email`, or `NotFound`.
    async fn get_user_by_email(&self, email: &str) -> AppResult<UserProfile>;

    /// Every known uid.
    async fn list_uids(&self) -> AppResult<Vec<Uid>>;
}
