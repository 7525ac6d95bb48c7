//! The momentum leaderboard: a Redis sorted set implementing the ranked
//! index contract.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use pulse_core::error::{AppError, ErrorKind};
use pulse_core::result::AppResult;
use pulse_domain::ranking::RankedIndex;

use super::client::RedisClient;

/// The sorted set key for momentum rankings. A single key keeps the
/// leaderboard global.
pub const LEADERBOARD_KEY: &str = "pulse:leaderboard";

/// Redis-backed ranked index over the momentum leaderboard.
#[derive(Debug, Clone)]
pub struct RedisLeaderboard {
    client: RedisClient,
}

impl RedisLeaderboard {
    /// Create a leaderboard over an established Redis connection.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Map a Redis error to the application taxonomy.
    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::Transient, format!("Redis error: {e}"), e)
    }
}

#[async_trait]
impl RankedIndex for RedisLeaderboard {
    async fn upsert_score(&self, member: &str, score: f64) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .zadd(LEADERBOARD_KEY, member, score)
            .await
            .map_err(Self::map_err)?;

        debug!(member, score, "Leaderboard score updated");
        Ok(())
    }

    async fn top_members(&self, limit: i64, offset: i64) -> AppResult<Vec<String>> {
        let mut conn = self.client.conn_mut();
        let start = offset;
        let stop = offset + limit - 1;

        // ZREVRANGE returns members ordered by score, high to low
        let members: Vec<String> = conn
            .zrevrange(LEADERBOARD_KEY, start as isize, stop as isize)
            .await
            .map_err(Self::map_err)?;

        debug!(limit, offset, returned = members.len(), "Leaderboard queried");
        Ok(members)
    }

    async fn remove(&self, member: &str) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let _: () = conn
            .zrem(LEADERBOARD_KEY, member)
            .await
            .map_err(Self::map_err)?;

        debug!(member, "Removed from leaderboard");
        Ok(())
    }

    async fn rank_of(&self, member: &str) -> AppResult<Option<i64>> {
        let mut conn = self.client.conn_mut();
        let rank: Option<i64> = conn
            .zrevrank(LEADERBOARD_KEY, member)
            .await
            .map_err(Self::map_err)?;
        Ok(rank)
    }

    async fn size(&self) -> AppResult<i64> {
        let mut conn = self.client.conn_mut();
        let count: i64 = conn.zcard(LEADERBOARD_KEY).await.map_err(Self::map_err)?;
        Ok(count)
    }

    async fn health(&self) -> AppResult<()> {
        let mut conn = self.client.conn_mut();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}
