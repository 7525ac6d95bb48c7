//! # pulse-cache
//!
//! Caching layer for Pulse: the Redis-backed leaderboard implementing the
//! ranked index contract, the community existence cache used on the
//! ingestion hot path, and the ranked read-path wrapper around the
//! authoritative community store.

pub mod community;
pub mod existence;
pub mod redis;

pub use community::CachedCommunityStore;
pub use existence::CommunityExistsCache;
pub use self::redis::{RedisClient, RedisLeaderboard};
