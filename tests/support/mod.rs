//! Shared in-memory fakes for the pipeline scenario tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_core::types::{CommunityId, UserId};
use pulse_domain::activity_event::{ActivityEvent, ActivityEventStore};
use pulse_domain::community::{Community, CommunityStore};
use pulse_domain::spike::{MomentumSpike, SpikeNotifier, SpikeThresholds};
use pulse_domain::subscription::{WebhookSubscription, WebhookSubscriptionStore};
use pulse_domain::user::UserStore;
use pulse_domain::values::Momentum;
use pulse_service::Clock;

/// In-memory community store.
#[derive(Default)]
pub struct InMemoryCommunityStore {
    communities: Mutex<HashMap<CommunityId, Community>>,
}

impl InMemoryCommunityStore {
    pub fn insert(&self, community: Community) {
        self.communities
            .lock()
            .expect("lock")
            .insert(community.id(), community);
    }

    pub fn momentum_of(&self, id: CommunityId) -> f64 {
        self.communities
            .lock()
            .expect("lock")
            .get(&id)
            .map(|c| c.current_momentum().value())
            .unwrap_or(f64::NAN)
    }
}

#[async_trait]
impl CommunityStore for InMemoryCommunityStore {
    async fn find_by_id(&self, id: CommunityId) -> AppResult<Option<Community>> {
        Ok(self.communities.lock().expect("lock").get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[CommunityId]) -> AppResult<Vec<Community>> {
        let communities = self.communities.lock().expect("lock");
        Ok(ids
            .iter()
            .filter_map(|id| communities.get(id).cloned())
            .collect())
    }

    async fn list_by_momentum(&self, limit: i64, offset: i64) -> AppResult<Vec<Community>> {
        let mut active: Vec<Community> = self
            .communities
            .lock()
            .expect("lock")
            .values()
            .filter(|c| c.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.current_momentum()
                .value()
                .total_cmp(&a.current_momentum().value())
        });
        Ok(active
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update_momentum(&self, id: CommunityId, momentum: Momentum) -> AppResult<()> {
        let mut communities = self.communities.lock().expect("lock");
        let Some(community) = communities.get_mut(&id) else {
            return Err(AppError::not_found(format!("community {id} not found")));
        };
        community.update_momentum(momentum);
        Ok(())
    }
}

/// In-memory append-only event log.
#[derive(Default)]
pub struct InMemoryEventStore {
    events: Mutex<Vec<ActivityEvent>>,
}

impl InMemoryEventStore {
    pub fn len(&self) -> usize {
        self.events.lock().expect("lock").len()
    }

    pub fn ids(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("lock")
            .iter()
            .map(|e| e.id().to_string())
            .collect()
    }

    pub fn push(&self, event: ActivityEvent) {
        self.events.lock().expect("lock").push(event);
    }
}

#[async_trait]
impl ActivityEventStore for InMemoryEventStore {
    async fn save(&self, event: &ActivityEvent) -> AppResult<()> {
        self.events.lock().expect("lock").push(event.clone());
        Ok(())
    }

    async fn save_batch(&self, events: &[ActivityEvent]) -> AppResult<()> {
        self.events.lock().expect("lock").extend_from_slice(events);
        Ok(())
    }

    async fn sum_weights_since(
        &self,
        community_id: CommunityId,
        since: DateTime<Utc>,
    ) -> AppResult<f64> {
        Ok(self
            .events
            .lock()
            .expect("lock")
            .iter()
            .filter(|e| e.community_id() == community_id && e.created_at() >= since)
            .map(|e| e.momentum_contribution())
            .sum())
    }

    async fn count_since(
        &self,
        community_id: CommunityId,
        since: DateTime<Utc>,
    ) -> AppResult<i64> {
        Ok(self
            .events
            .lock()
            .expect("lock")
            .iter()
            .filter(|e| e.community_id() == community_id && e.created_at() >= since)
            .count() as i64)
    }
}

/// In-memory user store.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<UserId>>,
}

impl InMemoryUserStore {
    pub fn insert(&self, id: UserId) {
        self.users.lock().expect("lock").push(id);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn exists(&self, id: UserId) -> AppResult<bool> {
        Ok(self.users.lock().expect("lock").contains(&id))
    }
}

/// In-memory subscription store.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: Mutex<Vec<WebhookSubscription>>,
}

impl InMemorySubscriptionStore {
    pub fn insert(&self, subscription: WebhookSubscription) {
        self.subscriptions.lock().expect("lock").push(subscription);
    }
}

#[async_trait]
impl WebhookSubscriptionStore for InMemorySubscriptionStore {
    async fn find_active_by_community(
        &self,
        community_id: CommunityId,
    ) -> AppResult<Vec<WebhookSubscription>> {
        Ok(self
            .subscriptions
            .lock()
            .expect("lock")
            .iter()
            .filter(|s| s.community_id == community_id && s.is_active)
            .cloned()
            .collect())
    }
}

/// Notifier fake that records every spike it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    spikes: Mutex<Vec<MomentumSpike>>,
}

impl RecordingNotifier {
    pub fn spikes(&self) -> Vec<MomentumSpike> {
        self.spikes.lock().expect("lock").clone()
    }
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

/// Clock pinned to a fixed instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
