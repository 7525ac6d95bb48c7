//! PostgreSQL connection pool configuration.

use serde::{Deserialize, Serialize};

/// Database connection settings for the authoritative store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of idle connections kept alive.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Timeout in seconds when acquiring a connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Seconds a connection may sit idle before being reaped.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    /// Maximum lifetime of a single connection in seconds.
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_seconds: u64,
    /// Prepared-statement cache size per connection.
    ///
    /// Set to 0 when connecting through an external pooler that cannot
    /// track session-level prepared statements.
    #[serde(default = "default_statement_cache_capacity")]
    pub statement_cache_capacity: usize,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_max_lifetime() -> u64 {
    3600
}

fn default_statement_cache_capacity() -> usize {
    100
}
