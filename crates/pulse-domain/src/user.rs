//! User profiles.
//!
//! Profile synchronization is owned by an external collaborator; the
//! pipeline only needs the entity shape and an existence check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::result::AppResult;
use pulse_core::types::UserId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::values::Username;

/// A registered user, mirrored from the external auth provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Identifier at the external auth provider.
    pub external_id: String,
    /// Unique login name.
    pub username: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Avatar URL.
    pub avatar_url: Option<String>,
    /// Profile bio.
    pub bio: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user profile with a validated username.
    pub fn new(external_id: impl Into<String>, username: Username) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            external_id: external_id.into(),
            username: username.as_str().to_string(),
            display_name: None,
            avatar_url: None,
            bio: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persistence contract for users, limited to what ingestion requires.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Check whether a user with the given id exists.
    async fn exists(&self, id: UserId) -> AppResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user() {
        let user = User::new("auth0|abc123", Username::new("some_user").expect("name"));
        assert_eq!(user.username, "some_user");
        assert_eq!(user.external_id, "auth0|abc123");
        assert!(user.display_name.is_none());
    }
}
