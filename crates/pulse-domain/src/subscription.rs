//! Webhook subscriptions for momentum spike notifications.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_core::types::{CommunityId, SubscriptionId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user's subscription to a community's momentum notifications.
///
/// One subscription per `(user_id, community_id)` pair; the schema enforces
/// uniqueness and subscription CRUD is owned by an external collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WebhookSubscription {
    /// Unique subscription identifier.
    pub id: SubscriptionId,
    /// The subscribing user.
    pub user_id: UserId,
    /// The community being watched.
    pub community_id: CommunityId,
    /// Callback URL receiving spike payloads.
    pub target_url: String,
    /// Shared secret used to sign payloads.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Whether deliveries are currently enabled.
    pub is_active: bool,
    /// When the subscription was created.
    pub created_at: DateTime<Utc>,
    /// When the subscription was last updated.
    pub updated_at: DateTime<Utc>,
}

impl WebhookSubscription {
    /// Create a new active subscription.
    pub fn new(
        user_id: UserId,
        community_id: CommunityId,
        target_url: impl Into<String>,
        secret: impl Into<String>,
    ) -> AppResult<Self> {
        let target_url = target_url.into();
        let secret = secret.into();
        if target_url.is_empty() {
            return Err(AppError::invalid_input("target url cannot be empty"));
        }
        if secret.is_empty() {
            return Err(AppError::invalid_input("secret cannot be empty"));
        }

        let now = Utc::now();
        Ok(Self {
            id: SubscriptionId::new(),
            user_id,
            community_id,
            target_url,
            secret,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Persistence contract for subscriptions, limited to what the dispatcher
/// requires.
#[async_trait]
pub trait WebhookSubscriptionStore: Send + Sync {
    /// Fetch every active subscription watching the given community.
    async fn find_active_by_community(
        &self,
        community_id: CommunityId,
    ) -> AppResult<Vec<WebhookSubscription>>;
}
