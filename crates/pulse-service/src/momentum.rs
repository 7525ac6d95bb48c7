//! Momentum calculator.
//!
//! Recomputes a community's momentum from the windowed weighted sum the
//! store aggregates, persists the score, mirrors it into the ranked index,
//! and consults the spike policy. The authoritative write is the only step
//! allowed to abort; mirrors converge on the next cycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tracing::{info, warn};

use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_core::types::CommunityId;
use pulse_domain::activity_event::ActivityEventStore;
use pulse_domain::community::CommunityStore;
use pulse_domain::momentum::simple_momentum;
use pulse_domain::ranking::RankedIndex;
use pulse_domain::spike::{MomentumSpike, SpikeNotifier};

use crate::clock::Clock;

/// Calculation parameters.
#[derive(Debug, Clone, Copy)]
pub struct MomentumSettings {
    /// Sliding window; events older than this are ignored.
    pub time_window: Duration,
    /// Decay applied to the aggregated window sum.
    pub decay_factor: f64,
    /// Communities processed per batch when the caller passes 0.
    pub batch_limit: i64,
}

impl Default for MomentumSettings {
    fn default() -> Self {
        Self {
            time_window: Duration::from_secs(3600),
            decay_factor: 0.7,
            batch_limit: 1000,
        }
    }
}

/// Result of recalculating a single community.
#[derive(Debug, Clone, Copy)]
pub struct MomentumOutcome {
    /// The community recalculated.
    pub community_id: CommunityId,
    /// Momentum before this calculation.
    pub old_momentum: f64,
    /// Momentum after this calculation.
    pub new_momentum: f64,
    /// Events inside the window.
    pub event_count: i64,
    /// The window that was applied.
    pub time_window: Duration,
}

/// Summary of a full recalculation cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalculateAllSummary {
    /// Communities picked up by the cycle.
    pub processed: usize,
    /// Successful recalculations.
    pub succeeded: usize,
    /// Failed recalculations (skipped, never aborting the batch).
    pub failed: usize,
}

/// The momentum calculator.
pub struct MomentumService {
    event_store: Arc<dyn ActivityEventStore>,
    community_store: Arc<dyn CommunityStore>,
    index: Option<Arc<dyn RankedIndex>>,
    notifier: Option<Arc<dyn SpikeNotifier>>,
    settings: MomentumSettings,
    clock: Arc<dyn Clock>,
}

impl MomentumService {
    /// Create a calculator without mirrors or notifications.
    pub fn new(
        event_store: Arc<dyn ActivityEventStore>,
        community_store: Arc<dyn CommunityStore>,
        settings: MomentumSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            event_store,
            community_store,
            index: None,
            notifier: None,
            settings,
            clock,
        }
    }

    /// Mirror calculated scores into the ranked index (best effort).
    pub fn with_index(mut self, index: Arc<dyn RankedIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Consult the spike policy and notify on qualifying transitions.
    pub fn with_notifier(mut self, notifier: Arc<dyn SpikeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Recalculate and persist momentum for one community.
    pub async fn calculate(&self, community_id: CommunityId) -> AppResult<MomentumOutcome> {
        let now = self.clock.now();

        let community = self
            .community_store
            .find_by_id(community_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("community {community_id} not found")))?;

        let old_momentum = community.current_momentum().value();
        let since = now - ChronoDuration::from_std(self.settings.time_window).unwrap_or_default();

        let event_count = self.event_store.count_since(community_id, since).await?;
        let weighted_sum = self
            .event_store
            .sum_weights_since(community_id, since)
            .await?;

        // aggregated model: the store already summed signed weights
        let new_momentum = simple_momentum(weighted_sum, self.settings.decay_factor);

        self.community_store
            .update_momentum(community_id, new_momentum)
            .await?;

        let new_value = new_momentum.value();

        // best-effort mirror: postgres stays the source of truth
        if let Some(index) = &self.index {
            if let Err(e) = index
                .upsert_score(&community_id.to_string(), new_value)
                .await
            {
                warn!(
                    community_id = %community_id,
                    error = %e,
                    "Leaderboard upsert failed, continuing"
                );
            }
        }

        if let Some(notifier) = &self.notifier {
            if notifier.thresholds().is_spike(old_momentum, new_value) {
                let percent_change = if old_momentum > 0.0 {
                    (new_value - old_momentum) / old_momentum
                } else {
                    0.0
                };
                let spike = MomentumSpike {
                    community_id,
                    community_name: community.name().to_string(),
                    old_momentum,
                    new_momentum: new_value,
                    percent_change,
                    timestamp: now,
                };
                if let Err(e) = notifier.notify_spike(spike).await {
                    warn!(
                        community_id = %community_id,
                        error = %e,
                        "Spike notification failed, continuing"
                    );
                }
            }
        }

        info!(
            community_id = %community_id,
            old_momentum,
            new_momentum = new_value,
            event_count,
            time_window_seconds = self.settings.time_window.as_secs(),
            "Momentum calculated"
        );

        Ok(MomentumOutcome {
            community_id,
            old_momentum,
            new_momentum: new_value,
            event_count,
            time_window: self.settings.time_window,
        })
    }

    /// Recalculate every active community, highest momentum first.
    ///
    /// Individual failures are counted and skipped; the batch never aborts.
    pub async fn calculate_all(&self, limit: i64) -> AppResult<CalculateAllSummary> {
        let limit = if limit == 0 {
            self.settings.batch_limit
        } else {
            limit
        };

        let communities = self.community_store.list_by_momentum(limit, 0).await?;

        let mut summary = CalculateAllSummary {
            processed: communities.len(),
            ..Default::default()
        };

        for community in communities {
            match self.calculate(community.id()).await {
                Ok(_) => summary.succeeded += 1,
                Err(e) => {
                    warn!(
                        community_id = %community.id(),
                        error = %e,
                        "Momentum calculation failed, skipping"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Batch momentum calculation completed"
        );

        Ok(summary)
    }
}

impl std::fmt::Debug for MomentumService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MomentumService")
            .field("settings", &self.settings)
            .field("index", &self.index.is_some())
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use pulse_core::error::ErrorKind;
    use pulse_core::types::UserId;
    use pulse_domain::activity_event::ActivityEvent;
    use pulse_domain::community::Community;
    use pulse_domain::spike::SpikeThresholds;
    use pulse_domain::values::{Momentum, Slug};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Event store fake backed by a weighted-sum table.
    struct FakeEventStore {
        sums: HashMap<CommunityId, (f64, i64)>,
    }

    #[async_trait]
    impl ActivityEventStore for FakeEventStore {
        async fn save(&self, _event: &ActivityEvent) -> AppResult<()> {
            Ok(())
        }

        async fn save_batch(&self, _events: &[ActivityEvent]) -> AppResult<()> {
            Ok(())
        }

        async fn sum_weights_since(
            &self,
            community_id: CommunityId,
            _since: DateTime<Utc>,
        ) -> AppResult<f64> {
            Ok(self.sums.get(&community_id).map(|s| s.0).unwrap_or(0.0))
        }

        async fn count_since(
            &self,
            community_id: CommunityId,
            _since: DateTime<Utc>,
        ) -> AppResult<i64> {
            Ok(self.sums.get(&community_id).map(|s| s.1).unwrap_or(0))
        }
    }

    struct FakeCommunityStore {
        communities: Mutex<HashMap<CommunityId, Community>>,
        fail_update: bool,
    }

    impl FakeCommunityStore {
        fn with(communities: Vec<Community>) -> Self {
            Self {
                communities: Mutex::new(
                    communities.into_iter().map(|c| (c.id(), c)).collect(),
                ),
                fail_update: false,
            }
        }

        fn momentum_of(&self, id: CommunityId) -> f64 {
            self.communities
                .lock()
                .expect("lock")
                .get(&id)
                .map(|c| c.current_momentum().value())
                .unwrap_or(f64::NAN)
        }
    }

    #[async_trait]
    impl CommunityStore for FakeCommunityStore {
        async fn find_by_id(&self, id: CommunityId) -> AppResult<Option<Community>> {
            Ok(self.communities.lock().expect("lock").get(&id).cloned())
        }

        async fn find_by_ids(&self, _ids: &[CommunityId]) -> AppResult<Vec<Community>> {
            Ok(Vec::new())
        }

        async fn list_by_momentum(&self, limit: i64, _offset: i64) -> AppResult<Vec<Community>> {
            let mut all: Vec<Community> = self
                .communities
                .lock()
                .expect("lock")
                .values()
                .filter(|c| c.is_active())
                .cloned()
                .collect();
            all.sort_by(|a, b| {
                b.current_momentum()
                    .value()
                    .total_cmp(&a.current_momentum().value())
            });
            all.truncate(limit as usize);
            Ok(all)
        }

        async fn update_momentum(&self, id: CommunityId, momentum: Momentum) -> AppResult<()> {
            if self.fail_update {
                return Err(AppError::transient("write failed"));
            }
            let mut communities = self.communities.lock().expect("lock");
            let Some(community) = communities.get_mut(&id) else {
                return Err(AppError::not_found("missing community"));
            };
            community.update_momentum(momentum);
            Ok(())
        }
    }

    /// Index fake that can be told to fail, recording successful upserts.
    struct FakeIndex {
        fail: bool,
        upserts: Mutex<Vec<(String, f64)>>,
    }

    #[async_trait]
    impl RankedIndex for FakeIndex {
        async fn upsert_score(&self, member: &str, score: f64) -> AppResult<()> {
            if self.fail {
                return Err(AppError::transient("index down"));
            }
            self.upserts
                .lock()
                .expect("lock")
                .push((member.to_string(), score));
            Ok(())
        }

        async fn top_members(&self, _limit: i64, _offset: i64) -> AppResult<Vec<String>> {
            Ok(Vec::new())
        }

        async fn remove(&self, _member: &str) -> AppResult<()> {
            Ok(())
        }

        async fn rank_of(&self, _member: &str) -> AppResult<Option<i64>> {
            Ok(None)
        }

        async fn size(&self) -> AppResult<i64> {
            Ok(0)
        }

        async fn health(&self) -> AppResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        spikes: Mutex<Vec<MomentumSpike>>,
    }

    #[async_trait]
    impl SpikeNotifier for RecordingNotifier {
        async fn notify_spike(&self, spike: MomentumSpike) -> AppResult<usize> {
            self.spikes.lock().expect("lock").push(spike);
            Ok(0)
        }

        fn thresholds(&self) -> SpikeThresholds {
            SpikeThresholds::default()
        }
    }

    fn community(slug: &str, momentum: f64) -> Community {
        let mut c = Community::new(Slug::new(slug).expect("slug"), slug, UserId::new())
            .expect("community");
        if momentum > 0.0 {
            c.update_momentum(Momentum::new(momentum));
        }
        c
    }

    fn service(
        sums: Vec<(CommunityId, f64, i64)>,
        communities: Arc<FakeCommunityStore>,
    ) -> MomentumService {
        let events = FakeEventStore {
            sums: sums.into_iter().map(|(id, s, n)| (id, (s, n))).collect(),
        };
        MomentumService::new(
            Arc::new(events),
            communities,
            MomentumSettings::default(),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())),
        )
    }

    #[tokio::test]
    async fn test_calculate_applies_decay_and_persists() {
        let c = community("calc-target", 0.0);
        let id = c.id();
        let store = Arc::new(FakeCommunityStore::with(vec![c]));
        let service = service(vec![(id, 11.0, 3)], store.clone());

        let outcome = service.calculate(id).await.expect("calculated");
        assert_eq!(outcome.old_momentum, 0.0);
        assert!((outcome.new_momentum - 7.7).abs() < 1e-9);
        assert_eq!(outcome.event_count, 3);
        assert!((store.momentum_of(id) - 7.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_negative_sum_clamps_to_zero() {
        let c = community("declining", 4.0);
        let id = c.id();
        let store = Arc::new(FakeCommunityStore::with(vec![c]));
        let service = service(vec![(id, -6.0, 5)], store.clone());

        let outcome = service.calculate(id).await.expect("calculated");
        assert_eq!(outcome.new_momentum, 0.0);
        assert_eq!(store.momentum_of(id), 0.0);
    }

    #[tokio::test]
    async fn test_unknown_community_is_not_found() {
        let store = Arc::new(FakeCommunityStore::with(vec![]));
        let service = service(vec![], store);
        let err = service
            .calculate(CommunityId::new())
            .await
            .expect_err("must fail");
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_authoritative_write_failure_aborts() {
        let c = community("calc-target", 0.0);
        let id = c.id();
        let mut store = FakeCommunityStore::with(vec![c]);
        store.fail_update = true;
        let service = service(vec![(id, 11.0, 3)], Arc::new(store));

        let err = service.calculate(id).await.expect_err("must fail");
        assert_eq!(err.kind, ErrorKind::Transient);
    }

    #[tokio::test]
    async fn test_index_failure_is_swallowed() {
        let c = community("calc-target", 0.0);
        let id = c.id();
        let store = Arc::new(FakeCommunityStore::with(vec![c]));
        let service = service(vec![(id, 11.0, 3)], store.clone()).with_index(Arc::new(
            FakeIndex {
                fail: true,
                upserts: Mutex::new(Vec::new()),
            },
        ));

        let outcome = service.calculate(id).await.expect("calculated");
        assert!((outcome.new_momentum - 7.7).abs() < 1e-9);
        assert!((store.momentum_of(id) - 7.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_index_receives_upsert() {
        let c = community("calc-target", 0.0);
        let id = c.id();
        let index = Arc::new(FakeIndex {
            fail: false,
            upserts: Mutex::new(Vec::new()),
        });
        let store = Arc::new(FakeCommunityStore::with(vec![c]));
        let service = service(vec![(id, 10.0, 2)], store).with_index(index.clone());

        service.calculate(id).await.expect("calculated");
        let upserts = index.upserts.lock().expect("lock");
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].0, id.to_string());
        assert!((upserts[0].1 - 7.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_spike_notified_with_percent_change() {
        let c = community("spiking", 7.7);
        let id = c.id();
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(FakeCommunityStore::with(vec![c]));
        // 21 * 0.7 = 14.7; growth from 7.7 is ~0.909
        let service = service(vec![(id, 21.0, 5)], store).with_notifier(notifier.clone());

        service.calculate(id).await.expect("calculated");
        let spikes = notifier.spikes.lock().expect("lock");
        assert_eq!(spikes.len(), 1);
        assert!((spikes[0].new_momentum - 14.7).abs() < 1e-9);
        assert!((spikes[0].percent_change - (14.7 - 7.7) / 7.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_spike_from_zero_has_undefined_growth() {
        let c = community("fresh", 0.0);
        let id = c.id();
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(FakeCommunityStore::with(vec![c]));
        let service = service(vec![(id, 20.0, 4)], store).with_notifier(notifier.clone());

        service.calculate(id).await.expect("calculated");
        let spikes = notifier.spikes.lock().expect("lock");
        assert_eq!(spikes.len(), 1);
        assert_eq!(spikes[0].percent_change, 0.0);
    }

    #[tokio::test]
    async fn test_below_threshold_no_spike() {
        let c = community("quiet", 0.0);
        let id = c.id();
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(FakeCommunityStore::with(vec![c]));
        // 11 * 0.7 = 7.7, below the 10.0 absolute threshold
        let service = service(vec![(id, 11.0, 3)], store).with_notifier(notifier.clone());

        service.calculate(id).await.expect("calculated");
        assert!(notifier.spikes.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_calculate_all_counts_failures() {
        let healthy = community("healthy", 3.0);
        let healthy_id = healthy.id();
        let doomed = community("doomed", 2.0);
        let doomed_id = doomed.id();
        let store = Arc::new(FakeCommunityStore::with(vec![healthy, doomed]));

        // the doomed community's sum lookup explodes
        struct PartialEventStore {
            bad: CommunityId,
        }

        #[async_trait]
        impl ActivityEventStore for PartialEventStore {
            async fn save(&self, _event: &ActivityEvent) -> AppResult<()> {
                Ok(())
            }

            async fn save_batch(&self, _events: &[ActivityEvent]) -> AppResult<()> {
                Ok(())
            }

            async fn sum_weights_since(
                &self,
                community_id: CommunityId,
                _since: DateTime<Utc>,
            ) -> AppResult<f64> {
                if community_id == self.bad {
                    Err(AppError::transient("window scan failed"))
                } else {
                    Ok(4.0)
                }
            }

            async fn count_since(
                &self,
                _community_id: CommunityId,
                _since: DateTime<Utc>,
            ) -> AppResult<i64> {
                Ok(1)
            }
        }

        let service = MomentumService::new(
            Arc::new(PartialEventStore { bad: doomed_id }),
            store.clone(),
            MomentumSettings::default(),
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())),
        );

        let summary = service.calculate_all(0).await.expect("summary");
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!((store.momentum_of(healthy_id) - 2.8).abs() < 1e-9);
    }
}
