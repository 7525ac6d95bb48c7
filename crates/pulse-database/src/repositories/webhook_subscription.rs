//! Webhook subscription repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use pulse_core::result::AppResult;
use pulse_core::types::CommunityId;
use pulse_domain::subscription::{WebhookSubscription, WebhookSubscriptionStore};

use super::map_db_err;

/// Repository for the dispatcher's subscription reads.
#[derive(Debug, Clone)]
pub struct WebhookSubscriptionRepository {
    pool: PgPool,
}

impl WebhookSubscriptionRepository {
    /// Create a new webhook subscription repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookSubscriptionStore for WebhookSubscriptionRepository {
    async fn find_active_by_community(
        &self,
        community_id: CommunityId,
    ) -> AppResult<Vec<WebhookSubscription>> {
        sqlx::query_as::<_, WebhookSubscription>(
            "SELECT id, user_id, community_id, target_url, secret, is_active, created_at, updated_at \
             FROM webhook_subscriptions WHERE community_id = $1 AND is_active",
        )
        .bind(community_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to fetch subscriptions for community", e))
    }
}
