//! Momentum spike detection policy and notification contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::result::AppResult;
use pulse_core::types::CommunityId;
use serde::{Deserialize, Serialize};

/// Thresholds deciding when a momentum transition counts as a spike.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpikeThresholds {
    /// Minimum momentum value to trigger (the new score must exceed this).
    pub absolute_threshold: f64,
    /// Minimum growth rate to trigger (0.20 = 20%).
    pub growth_percentage: f64,
}

impl Default for SpikeThresholds {
    fn default() -> Self {
        Self {
            absolute_threshold: 10.0,
            growth_percentage: 0.20,
        }
    }
}

impl SpikeThresholds {
    /// Whether the transition from `old` to `new` constitutes a spike.
    pub fn is_spike(&self, old: f64, new: f64) -> bool {
        // must exceed the absolute threshold
        if new <= self.absolute_threshold {
            return false;
        }

        // must be growing, not shrinking
        if new <= old {
            return false;
        }

        // from zero or negative, any transition over the threshold counts
        if old <= 0.0 {
            return true;
        }

        let growth = (new - old) / old;
        growth >= self.growth_percentage
    }
}

/// A significant momentum transition, emitted by the detector and consumed
/// by the notification dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumSpike {
    /// The community whose momentum spiked.
    pub community_id: CommunityId,
    /// The community's display name at detection time.
    pub community_name: String,
    /// Momentum before the recalculation.
    pub old_momentum: f64,
    /// Momentum after the recalculation.
    pub new_momentum: f64,
    /// Relative growth `(new - old) / old` when `old > 0`.
    ///
    /// Zero when the previous momentum was zero or negative: consumers must
    /// treat that as "undefined growth", not "no growth".
    pub percent_change: f64,
    /// When the spike was detected.
    pub timestamp: DateTime<Utc>,
}

/// Delivery contract for momentum spike notifications.
#[async_trait]
pub trait SpikeNotifier: Send + Sync {
    /// Queue a spike for delivery; returns the number of notifications sent
    /// synchronously (zero when delivery is asynchronous).
    async fn notify_spike(&self, spike: MomentumSpike) -> AppResult<usize>;

    /// The threshold policy this notifier applies.
    fn thresholds(&self) -> SpikeThresholds;
}
