//! In-process pipeline metrics.
//!
//! Atomic counters with a serializable snapshot; no scrape endpoint lives
//! in this crate, consumers export the snapshot however they like.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use pulse_core::types::CommunityId;
use pulse_domain::event_kind::EventKind;

/// Upper bounds (seconds) for the cycle duration histogram: 0.1s doubling
/// up to ~51s, with an overflow bucket at the end.
const CYCLE_BUCKETS: [f64; 10] = [0.1, 0.2, 0.4, 0.8, 1.6, 3.2, 6.4, 12.8, 25.6, 51.2];

/// Pipeline metrics counters.
#[derive(Debug, Default)]
pub struct Metrics {
    /// Ingested events keyed by community and kind.
    events_ingested: DashMap<(CommunityId, EventKind), AtomicU64>,
    /// Current number of events waiting in the ingestion buffer.
    queue_depth: AtomicU64,
    /// Momentum calculation cycle durations.
    cycle_histogram: DurationHistogram,
}

impl Metrics {
    /// Create new zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one successfully persisted event.
    pub fn record_event_ingested(&self, community_id: CommunityId, kind: EventKind) {
        self.events_ingested
            .entry((community_id, kind))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Set the current ingestion queue depth.
    pub fn set_queue_depth(&self, depth: u64) {
        self.queue_depth.store(depth, Ordering::Relaxed);
    }

    /// Current ingestion queue depth.
    pub fn queue_depth(&self) -> u64 {
        self.queue_depth.load(Ordering::Relaxed)
    }

    /// Record the wall-clock duration of one momentum calculation cycle.
    pub fn observe_cycle_duration(&self, seconds: f64) {
        self.cycle_histogram.observe(seconds);
    }

    /// Total ingested events for a given community and kind.
    pub fn events_ingested(&self, community_id: CommunityId, kind: EventKind) -> u64 {
        self.events_ingested
            .get(&(community_id, kind))
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut events: Vec<EventCounterSnapshot> = self
            .events_ingested
            .iter()
            .map(|entry| {
                let (community_id, kind) = *entry.key();
                EventCounterSnapshot {
                    community_id,
                    kind,
                    count: entry.value().load(Ordering::Relaxed),
                }
            })
            .collect();
        events.sort_by(|a, b| b.count.cmp(&a.count));

        MetricsSnapshot {
            events_ingested: events,
            queue_depth: self.queue_depth(),
            momentum_cycles: self.cycle_histogram.snapshot(),
        }
    }
}

/// Fixed-bucket duration histogram.
#[derive(Debug)]
struct DurationHistogram {
    /// One counter per bucket, plus an overflow bucket.
    counts: [AtomicU64; CYCLE_BUCKETS.len() + 1],
    /// Total observations.
    count: AtomicU64,
    /// Sum of observed durations in microseconds.
    sum_micros: AtomicU64,
}

impl Default for DurationHistogram {
    fn default() -> Self {
        Self {
            counts: std::array::from_fn(|_| AtomicU64::new(0)),
            count: AtomicU64::new(0),
            sum_micros: AtomicU64::new(0),
        }
    }
}

impl DurationHistogram {
    fn observe(&self, seconds: f64) {
        let bucket = CYCLE_BUCKETS
            .iter()
            .position(|&bound| seconds <= bound)
            .unwrap_or(CYCLE_BUCKETS.len());
        self.counts[bucket].fetch_add(1, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum_micros
            .fetch_add((seconds * 1_000_000.0).max(0.0) as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> HistogramSnapshot {
        HistogramSnapshot {
            buckets: CYCLE_BUCKETS
                .iter()
                .enumerate()
                .map(|(i, &bound)| BucketSnapshot {
                    le_seconds: bound,
                    count: self.counts[i].load(Ordering::Relaxed),
                })
                .collect(),
            overflow: self.counts[CYCLE_BUCKETS.len()].load(Ordering::Relaxed),
            count: self.count.load(Ordering::Relaxed),
            sum_seconds: self.sum_micros.load(Ordering::Relaxed) as f64 / 1_000_000.0,
        }
    }
}

/// Serializable snapshot of all metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Per-community, per-kind ingestion counters, highest first.
    pub events_ingested: Vec<EventCounterSnapshot>,
    /// Current ingestion queue depth.
    pub queue_depth: u64,
    /// Momentum cycle duration distribution.
    pub momentum_cycles: HistogramSnapshot,
}

/// One ingestion counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCounterSnapshot {
    /// Community the events were ingested against.
    pub community_id: CommunityId,
    /// Event kind.
    pub kind: EventKind,
    /// Events persisted.
    pub count: u64,
}

/// Serializable histogram state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramSnapshot {
    /// Cumulative-style buckets: observations at or under each bound.
    pub buckets: Vec<BucketSnapshot>,
    /// Observations above the largest bound.
    pub overflow: u64,
    /// Total observations.
    pub count: u64,
    /// Sum of all observed durations.
    pub sum_seconds: f64,
}

/// One histogram bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketSnapshot {
    /// Upper bound in seconds.
    pub le_seconds: f64,
    /// Observations in this bucket.
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_counters_keyed_by_community_and_kind() {
        let metrics = Metrics::new();
        let a = CommunityId::new();
        let b = CommunityId::new();

        metrics.record_event_ingested(a, EventKind::Post);
        metrics.record_event_ingested(a, EventKind::Post);
        metrics.record_event_ingested(a, EventKind::View);
        metrics.record_event_ingested(b, EventKind::Post);

        assert_eq!(metrics.events_ingested(a, EventKind::Post), 2);
        assert_eq!(metrics.events_ingested(a, EventKind::View), 1);
        assert_eq!(metrics.events_ingested(b, EventKind::Post), 1);
        assert_eq!(metrics.events_ingested(b, EventKind::View), 0);
    }

    #[test]
    fn test_queue_depth_gauge() {
        let metrics = Metrics::new();
        metrics.set_queue_depth(42);
        assert_eq!(metrics.queue_depth(), 42);
        metrics.set_queue_depth(0);
        assert_eq!(metrics.queue_depth(), 0);
    }

    #[test]
    fn test_histogram_buckets() {
        let metrics = Metrics::new();
        metrics.observe_cycle_duration(0.05);
        metrics.observe_cycle_duration(0.3);
        metrics.observe_cycle_duration(100.0);

        let snapshot = metrics.snapshot().momentum_cycles;
        assert_eq!(snapshot.count, 3);
        assert_eq!(snapshot.buckets[0].count, 1);
        assert_eq!(snapshot.buckets[2].count, 1);
        assert_eq!(snapshot.overflow, 1);
        assert!((snapshot.sum_seconds - 100.35).abs() < 1e-3);
    }

    #[test]
    fn test_snapshot_sorts_by_count() {
        let metrics = Metrics::new();
        let a = CommunityId::new();
        let b = CommunityId::new();
        metrics.record_event_ingested(a, EventKind::View);
        metrics.record_event_ingested(b, EventKind::Post);
        metrics.record_event_ingested(b, EventKind::Post);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.events_ingested.len(), 2);
        assert_eq!(snapshot.events_ingested[0].count, 2);
    }
}
