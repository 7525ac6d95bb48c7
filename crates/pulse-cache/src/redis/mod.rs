//! Redis integration: connection management and the momentum leaderboard.

pub mod client;
pub mod leaderboard;

pub use client::RedisClient;
pub use leaderboard::{RedisLeaderboard, LEADERBOARD_KEY};
