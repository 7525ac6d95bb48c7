//! The ranked index contract.

use async_trait::async_trait;
use pulse_core::result::AppResult;

/// A score-ordered set mirroring current momentum per community.
///
/// Members are community ids rendered as strings; scores are momentum
/// values. Implementations are expected to provide `O(log N)` upserts and
/// range reads. The authoritative store remains the source of truth: every
/// caller treats index failures as best-effort misses.
#[async_trait]
pub trait RankedIndex: Send + Sync {
    /// Insert or update a member's score.
    async fn upsert_score(&self, member: &str, score: f64) -> AppResult<()>;

    /// Members in descending score order, range `[offset, offset+limit-1]`.
    async fn top_members(&self, limit: i64, offset: i64) -> AppResult<Vec<String>>;

    /// Remove a member from the index.
    async fn remove(&self, member: &str) -> AppResult<()>;

    /// Zero-based rank of a member (highest score first), if present.
    async fn rank_of(&self, member: &str) -> AppResult<Option<i64>>;

    /// Number of members in the index.
    async fn size(&self) -> AppResult<i64>;

    /// Verify the index is reachable.
    async fn health(&self) -> AppResult<()>;
}
