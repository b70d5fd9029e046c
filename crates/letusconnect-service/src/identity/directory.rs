//! In-memory identity directory.

use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use letusconnect_core::error::{AppError, ErrorKind};
use letusconnect_core::result::AppResult;
use letusconnect_core::types::id::Uid;
use letusconnect_entity::user::UserProfile;

use super::IdentityResolver;

/// Profiles held in process, optionally seeded from a JSON file.
#[derive(Debug, Default)]
pub struct StaticIdentityDirectory {
    users: DashMap<Uid, UserProfile>,
}

impl StaticIdentityDirectory {
    /// An empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory holding `profiles`.
    pub fn from_profiles(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let directory = Self::new();
        for profile in profiles {
            directory.insert(profile);
        }
        directory
    }

    /// Load a JSON array of profiles.
    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Cannot read identity seed file {}", path.display()),
                e,
            )
        })?;
        let profiles: Vec<UserProfile> = serde_json::from_str(&raw)?;
        info!(count = profiles.len(), path = %path.display(), "Loaded identity seed");
        Ok(Self::from_profiles(profiles))
    }

    /// Add or replace a profile.
    pub fn insert(&self, profile: UserProfile) {
        self.users.insert(profile.uid.clone(), profile);
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityDirectory {
    async fn get_user(&self, uid: &Uid) -> AppResult<UserProfile> {
        self.users
            .get(uid)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("User {uid} not found")))
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<UserProfile> {
        self.users
            .iter()
            .find(|entry| {
                entry
                    .value()
                    .email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("No user with email {email}")))
    }

    async fn list_uids(&self) -> AppResult<Vec<Uid>> {
        let mut uids: Vec<Uid> = self.users.iter().map(|entry| entry.key().clone()).collect();
        uids.sort();
        Ok(uids)
    }
}
