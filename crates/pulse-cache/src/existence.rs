//! Community existence cache.
//!
//! The ingestion front-end checks "(exists, is_active)" on every request;
//! this TTL map keeps those checks off the authoritative store. Negative
//! results are cached too, so repeated events against unknown communities
//! stay cheap.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use pulse_core::result::AppResult;
use pulse_core::types::CommunityId;
use pulse_domain::community::{CommunityChecker, CommunityStore};

#[derive(Debug, Clone, Copy)]
struct Entry {
    exists: bool,
    is_active: bool,
    expires_at: Instant,
}

/// TTL membership cache over the authoritative community store.
///
/// Readers predominate; the write lock is held only while mutating the map,
/// never across a store call. Concurrent misses on the same cold key may
/// each hit the store — acceptable, the results converge.
pub struct CommunityExistsCache {
    entries: RwLock<HashMap<CommunityId, Entry>>,
    store: Arc<dyn CommunityStore>,
    ttl: Duration,
}

impl CommunityExistsCache {
    /// Create a new existence cache with the given entry TTL.
    pub fn new(store: Arc<dyn CommunityStore>, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            store,
            ttl,
        }
    }

    /// Remove a community from the cache.
    ///
    /// Call when a community is created or its active flag changes.
    pub fn invalidate(&self, id: CommunityId) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(&id);
        }
    }

    /// Current number of cached entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict expired entries.
    ///
    /// Intended for occasional sweeps to bound memory; lookups already
    /// ignore expired entries.
    pub fn cleanup(&self) {
        let now = Instant::now();
        if let Ok(mut entries) = self.entries.write() {
            let before = entries.len();
            entries.retain(|_, entry| entry.expires_at > now);
            let evicted = before - entries.len();
            if evicted > 0 {
                debug!(evicted, remaining = entries.len(), "Existence cache swept");
            }
        }
    }

    fn cached(&self, id: CommunityId) -> Option<(bool, bool)> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(&id)?;
        if entry.expires_at > Instant::now() {
            Some((entry.exists, entry.is_active))
        } else {
            None
        }
    }

    fn insert(&self, id: CommunityId, exists: bool, is_active: bool) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                id,
                Entry {
                    exists,
                    is_active,
                    expires_at: Instant::now() + self.ttl,
                },
            );
        }
    }
}

#[async_trait]
impl CommunityChecker for CommunityExistsCache {
    async fn check_active(&self, id: CommunityId) -> AppResult<(bool, bool)> {
        // fast path
        if let Some(hit) = self.cached(id) {
            return Ok(hit);
        }

        // slow path: consult the store, then cache the answer either way.
        // transport errors propagate uncached.
        match self.store.find_by_id(id).await? {
            Some(community) => {
                let is_active = community.is_active();
                self.insert(id, true, is_active);
                Ok((true, is_active))
            }
            None => {
                self.insert(id, false, false);
                Ok((false, false))
            }
        }
    }
}

impl std::fmt::Debug for CommunityExistsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommunityExistsCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}
