//! Redis and existence-cache configuration.

use serde::{Deserialize, Serialize};

/// Cache settings: the ranked leaderboard index and the community
/// existence cache used on the ingestion hot path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis connection URL. Empty disables the ranked index entirely.
    #[serde(default)]
    pub redis_url: String,
    /// TTL in seconds for community existence-cache entries.
    #[serde(default = "default_existence_ttl")]
    pub existence_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: String::new(),
            existence_ttl_seconds: default_existence_ttl(),
        }
    }
}

fn default_existence_ttl() -> u64 {
    60
}
