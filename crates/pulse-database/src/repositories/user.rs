//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use pulse_core::result::AppResult;
use pulse_core::types::UserId;
use pulse_domain::user::UserStore;

use super::map_db_err;

/// Repository for user lookups on the ingestion path.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn exists(&self, id: UserId) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_err("Failed to check user existence", e))
    }
}
