//! Event ingestion buffer configuration.

use serde::{Deserialize, Serialize};

/// Settings for the batch writer pool that drains the event channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Size of the in-process event channel buffer.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Number of events to accumulate before flushing.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum milliseconds to wait before flushing a partial batch.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Number of concurrent batch writer workers.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Whether the front-end hands events to the channel (true) or
    /// persists them directly per request (false).
    #[serde(default = "default_async_mode")]
    pub async_mode: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            batch_size: default_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            worker_count: default_worker_count(),
            async_mode: default_async_mode(),
        }
    }
}

fn default_buffer_size() -> usize {
    10_000
}

fn default_batch_size() -> usize {
    100
}

fn default_flush_interval_ms() -> u64 {
    500
}

fn default_worker_count() -> usize {
    4
}

fn default_async_mode() -> bool {
    true
}
