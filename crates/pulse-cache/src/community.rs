//! Ranked read path over the authoritative community store.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use pulse_core::result::AppResult;
use pulse_core::types::CommunityId;
use pulse_domain::community::{Community, CommunityStore};
use pulse_domain::ranking::RankedIndex;
use pulse_domain::values::Momentum;

/// Community store wrapper that serves the momentum-ordered listing from
/// the ranked index and falls back to the authoritative store whenever the
/// index misses. Every other operation delegates unchanged.
pub struct CachedCommunityStore {
    store: Arc<dyn CommunityStore>,
    index: Option<Arc<dyn RankedIndex>>,
}

impl CachedCommunityStore {
    /// Create a cached store. With `index` unset all calls delegate.
    pub fn new(store: Arc<dyn CommunityStore>, index: Option<Arc<dyn RankedIndex>>) -> Self {
        Self { store, index }
    }
}

#[async_trait]
impl CommunityStore for CachedCommunityStore {
    async fn find_by_id(&self, id: CommunityId) -> AppResult<Option<Community>> {
        self.store.find_by_id(id).await
    }

    async fn find_by_ids(&self, ids: &[CommunityId]) -> AppResult<Vec<Community>> {
        self.store.find_by_ids(ids).await
    }

    async fn list_by_momentum(&self, limit: i64, offset: i64) -> AppResult<Vec<Community>> {
        let Some(index) = &self.index else {
            return self.store.list_by_momentum(limit, offset).await;
        };

        let members = match index.top_members(limit, offset).await {
            Ok(members) if !members.is_empty() => members,
            Ok(_) => {
                debug!(limit, offset, "Leaderboard empty, falling back to authoritative store");
                return self.store.list_by_momentum(limit, offset).await;
            }
            Err(e) => {
                warn!(
                    limit,
                    offset,
                    error = %e,
                    "Leaderboard read failed, falling back to authoritative store"
                );
                return self.store.list_by_momentum(limit, offset).await;
            }
        };

        let mut ids = Vec::with_capacity(members.len());
        for member in &members {
            match CommunityId::from_str(member) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    warn!(member, error = %e, "Invalid community id in leaderboard, skipping");
                }
            }
        }

        if ids.is_empty() {
            warn!("All leaderboard entries invalid, falling back to authoritative store");
            return self.store.list_by_momentum(limit, offset).await;
        }

        debug!(
            limit,
            offset,
            cached = ids.len(),
            "Leaderboard hit, fetching details from authoritative store"
        );

        // find_by_ids preserves leaderboard order (momentum descending)
        self.store.find_by_ids(&ids).await
    }

    async fn update_momentum(&self, id: CommunityId, momentum: Momentum) -> AppResult<()> {
        // index sync is owned by the calculator, not this wrapper
        self.store.update_momentum(id, momentum).await
    }
}

impl std::fmt::Debug for CachedCommunityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedCommunityStore")
            .field("index", &self.index.is_some())
            .finish()
    }
}
