//! Webhook dispatch configuration.

use serde::{Deserialize, Serialize};

/// Settings for the spike notification dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Size of the spike channel buffer.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Number of concurrent webhook delivery workers.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Timeout in seconds for each outbound HTTP request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Minimum momentum value before a transition can qualify as a spike.
    #[serde(default = "default_absolute_threshold")]
    pub absolute_threshold: f64,
    /// Minimum relative growth before a transition qualifies as a spike.
    #[serde(default = "default_growth_percentage")]
    pub growth_percentage: f64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            worker_count: default_worker_count(),
            request_timeout_seconds: default_request_timeout(),
            absolute_threshold: default_absolute_threshold(),
            growth_percentage: default_growth_percentage(),
        }
    }
}

fn default_buffer_size() -> usize {
    1000
}

fn default_worker_count() -> usize {
    2
}

fn default_request_timeout() -> u64 {
    5
}

fn default_absolute_threshold() -> f64 {
    10.0
}

fn default_growth_percentage() -> f64 {
    0.20
}
