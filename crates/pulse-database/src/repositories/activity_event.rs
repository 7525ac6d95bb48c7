//! Activity event repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, QueryBuilder};
use tracing::debug;

use pulse_core::result::AppResult;
use pulse_core::types::CommunityId;
use pulse_domain::activity_event::{ActivityEvent, ActivityEventStore};

use super::map_db_err;

/// Repository for the append-only activity event log.
#[derive(Debug, Clone)]
pub struct ActivityEventRepository {
    pool: PgPool,
}

impl ActivityEventRepository {
    /// Create a new activity event repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Empty metadata is stored as NULL rather than an empty object.
fn metadata_value(event: &ActivityEvent) -> Option<Value> {
    let metadata = event.metadata();
    if metadata.is_empty() {
        None
    } else {
        Some(Value::Object(metadata))
    }
}

#[async_trait]
impl ActivityEventStore for ActivityEventRepository {
    async fn save(&self, event: &ActivityEvent) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO activity_events (id, community_id, user_id, kind, weight, metadata, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(event.id())
        .bind(event.community_id())
        .bind(event.user_id())
        .bind(event.kind())
        .bind(event.weight().value())
        .bind(metadata_value(event))
        .bind(event.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to save activity event", e))?;

        Ok(())
    }

    async fn save_batch(&self, events: &[ActivityEvent]) -> AppResult<()> {
        if events.is_empty() {
            return Ok(());
        }

        // A single multi-row INSERT keeps the batch atomic.
        let mut builder = QueryBuilder::new(
            "INSERT INTO activity_events (id, community_id, user_id, kind, weight, metadata, created_at) ",
        );
        builder.push_values(events, |mut row, event| {
            row.push_bind(event.id())
                .push_bind(event.community_id())
                .push_bind(event.user_id())
                .push_bind(event.kind())
                .push_bind(event.weight().value())
                .push_bind(metadata_value(event))
                .push_bind(event.created_at());
        });

        builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_err("Failed to save activity event batch", e))?;

        debug!(batch_size = events.len(), "Activity event batch saved");
        Ok(())
    }

    async fn sum_weights_since(
        &self,
        community_id: CommunityId,
        since: DateTime<Utc>,
    ) -> AppResult<f64> {
        // leave events subtract, every other kind adds
        sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(SUM(CASE WHEN kind = 'leave' THEN -weight ELSE weight END), 0) \
             FROM activity_events WHERE community_id = $1 AND created_at >= $2",
        )
        .bind(community_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to sum event weights", e))
    }

    async fn count_since(
        &self,
        community_id: CommunityId,
        since: DateTime<Utc>,
    ) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM activity_events WHERE community_id = $1 AND created_at >= $2",
        )
        .bind(community_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to count events", e))
    }
}
