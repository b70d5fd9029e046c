//! User profile model.

use serde::{Deserialize, Serialize};

use letusconnect_core::types::id::Uid;

/// Profile fields the core reads from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable user identifier.
    pub uid: Uid,
    /// Unique handle.
    pub username: String,
    /// Contact email address.
    pub email: Option<String>,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Contact phone number, E.164.
    #[serde(default)]
    pub phone: Option<String>,
}

impl UserProfile {
    /// Name to show in notification texts: display name, falling back to the username.
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}
