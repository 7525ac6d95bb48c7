//! Community repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_core::types::{CommunityId, UserId};
use pulse_domain::community::{Community, CommunityStore};
use pulse_domain::values::{Momentum, Slug};

use super::map_db_err;

const COLUMNS: &str = "id, slug, name, description, creator_id, avatar_url, is_active, \
     current_momentum, momentum_updated_at, created_at, updated_at";

/// Repository for community reads and momentum writes.
#[derive(Debug, Clone)]
pub struct CommunityRepository {
    pool: PgPool,
}

impl CommunityRepository {
    /// Create a new community repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommunityStore for CommunityRepository {
    async fn find_by_id(&self, id: CommunityId) -> AppResult<Option<Community>> {
        let query = format!("SELECT {COLUMNS} FROM communities WHERE id = $1");
        let row = sqlx::query_as::<_, CommunityRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_err("Failed to find community by id", e))?;

        row.map(CommunityRow::into_domain).transpose()
    }

    async fn find_by_ids(&self, ids: &[CommunityId]) -> AppResult<Vec<Community>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<Uuid> = ids.iter().map(|id| id.into_uuid()).collect();

        // UNNEST WITH ORDINALITY preserves the caller's order; missing ids
        // simply produce no row.
        let query = "SELECT c.id, c.slug, c.name, c.description, c.creator_id, c.avatar_url, \
             c.is_active, c.current_momentum, c.momentum_updated_at, c.created_at, c.updated_at \
             FROM UNNEST($1::uuid[]) WITH ORDINALITY AS input(id, ord) \
             JOIN communities c ON c.id = input.id \
             ORDER BY input.ord";
        let rows = sqlx::query_as::<_, CommunityRow>(query)
            .bind(&uuids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_err("Failed to find communities by ids", e))?;

        rows.into_iter().map(CommunityRow::into_domain).collect()
    }

    async fn list_by_momentum(&self, limit: i64, offset: i64) -> AppResult<Vec<Community>> {
        let query = format!(
            "SELECT {COLUMNS} FROM communities WHERE is_active \
             ORDER BY current_momentum DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, CommunityRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_err("Failed to list communities by momentum", e))?;

        rows.into_iter().map(CommunityRow::into_domain).collect()
    }

    async fn update_momentum(&self, id: CommunityId, momentum: Momentum) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE communities \
             SET current_momentum = $2, momentum_updated_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(momentum.value())
        .execute(&self.pool)
        .await
        .map_err(|e| map_db_err("Failed to update community momentum", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("community {id} not found")));
        }
        Ok(())
    }
}

/// Raw community row, reconstructed into the domain entity with structural
/// checks.
#[derive(Debug, FromRow)]
struct CommunityRow {
    id: Uuid,
    slug: String,
    name: String,
    description: Option<String>,
    creator_id: Uuid,
    avatar_url: Option<String>,
    is_active: bool,
    current_momentum: f64,
    momentum_updated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CommunityRow {
    fn into_domain(self) -> AppResult<Community> {
        if self.current_momentum < 0.0 {
            return Err(AppError::corrupt_storage(format!(
                "community {} carries negative momentum {}",
                self.id, self.current_momentum
            )));
        }

        Ok(Community::reconstruct(
            CommunityId::from_uuid(self.id),
            Slug::from_trusted(self.slug),
            self.name,
            self.description.unwrap_or_default(),
            UserId::from_uuid(self.creator_id),
            self.avatar_url.unwrap_or_default(),
            self.is_active,
            Momentum::new(self.current_momentum),
            self.momentum_updated_at,
            self.created_at,
            self.updated_at,
        ))
    }
}
