//! Momentum calculation configuration.

use serde::{Deserialize, Serialize};

/// Settings for the sliding-window momentum calculator and its scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumConfig {
    /// Sliding window length in seconds; events older than this are ignored.
    #[serde(default = "default_time_window")]
    pub time_window_seconds: u64,
    /// Decay applied to the aggregated window sum.
    ///
    /// 1.0 means no decay, 0.5 means events at the window edge count half.
    #[serde(default = "default_decay_factor")]
    pub decay_factor: f64,
    /// Seconds between full recalculation cycles.
    #[serde(default = "default_calculation_interval")]
    pub calculation_interval_seconds: u64,
    /// Maximum communities processed per cycle when the caller passes 0.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: i64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            time_window_seconds: default_time_window(),
            decay_factor: default_decay_factor(),
            calculation_interval_seconds: default_calculation_interval(),
            batch_limit: default_batch_limit(),
        }
    }
}

fn default_time_window() -> u64 {
    3600
}

fn default_decay_factor() -> f64 {
    0.7
}

fn default_calculation_interval() -> u64 {
    300
}

fn default_batch_limit() -> i64 {
    1000
}
