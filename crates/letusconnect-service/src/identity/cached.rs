//! Caching decorator over an identity resolver, using moka.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use letusconnect_core::config::IdentityConfig;
use letusconnect_core::result::AppResult;
use letusconnect_core::types::id::Uid;
use letusconnect_entity::user::UserProfile;

use super::IdentityResolver;

/// Caches `get_user` results for a bounded time.
#[derive(Debug, Clone)]
pub struct CachedIdentityResolver {
    inner: Arc<dyn IdentityResolver>,
    cache: Cache<Uid, UserProfile>,
}

impl CachedIdentityResolver {
    /// Wrap `inner` with a cache sized by configuration.
    pub fn new(inner: Arc<dyn IdentityResolver>, config: &IdentityConfig) -> Self {
        Self::with_limits(inner, config.cache_capacity, config.cache_ttl())
    }

    /// Wrap `inner` with explicit limits.
    pub fn with_limits(inner: Arc<dyn IdentityResolver>, capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    /// Drop the cached profile for `uid`.
    pub async fn invalidate(&self, uid: &Uid) {
        self.cache.invalidate(uid).await;
    }
}

#[async_trait]
impl IdentityResolver for CachedIdentityResolver {
    async fn get_user(&self, uid: &Uid) -> AppResult<UserProfile> {
        if let Some(profile) = self.cache.get(uid).await {
            debug!(uid = %uid, "Identity cache hit");
            return Ok(profile);
        }
        let profile = self.inner.get_user(uid).await?;
        self.cache.insert(uid.clone(), profile.clone()).await;
        Ok(profile)
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<UserProfile> {
        let profile = self.inner.get_user_by_email(email).await?;
        self.cache.insert(profile.uid.clone(), profile.clone()).await;
        Ok(profile)
    }

    async fn list_uids(&self) -> AppResult<Vec<Uid>> {
        self.inner.list_uids().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticIdentityDirectory;

    fn profile(uid: &str, name: &str) -> UserProfile {
        UserProfile {
            uid: Uid::from(uid),
            username: uid.to_string(),
            email: None,
            display_name: Some(name.to_string()),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_serves_stale_profile_until_invalidated() {
        let directory = Arc::new(StaticIdentityDirectory::from_profiles([profile("u1", "Ana")]));
        let cached = CachedIdentityResolver::with_limits(
            directory.clone(),
            100,
            Duration::from_secs(60),
        );
        let u1 = Uid::from("u1");

        assert_eq!(cached.get_user(&u1).await.unwrap().name(), "Ana");
        directory.insert(profile("u1", "Ana Maria"));
        assert_eq!(cached.get_user(&u1).await.unwrap().name(), "Ana");

        cached.invalidate(&u1).await;
        assert_eq!(cached.get_user(&u1).await.unwrap().name(), "Ana Maria");
    }
}
