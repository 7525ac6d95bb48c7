//! Activity events: append-only interaction signals.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_core::types::{CommunityId, EventId, UserId};
use serde_json::{Map, Value};

use crate::event_kind::EventKind;
use crate::values::Weight;

/// Event metadata: arbitrary keyed attributes, possibly empty.
pub type Metadata = Map<String, Value>;

/// A single user activity signal against a community.
///
/// Events are append-only and immutable once created. The metadata map is
/// owned on construction and cloned on every read, so no caller can mutate
/// the stored attributes after the fact.
#[derive(Debug, Clone)]
pub struct ActivityEvent {
    id: EventId,
    community_id: CommunityId,
    user_id: Option<UserId>,
    kind: EventKind,
    weight: Weight,
    metadata: Metadata,
    created_at: DateTime<Utc>,
}

impl ActivityEvent {
    /// Create a new event with a fresh id, stamped at the current time.
    pub fn new(
        community_id: CommunityId,
        user_id: Option<UserId>,
        kind: EventKind,
        weight: Weight,
        metadata: Metadata,
    ) -> AppResult<Self> {
        if community_id.is_nil() {
            return Err(AppError::invalid_input("event must have a community id"));
        }

        Ok(Self {
            id: EventId::new(),
            community_id,
            user_id,
            kind,
            weight,
            metadata,
            created_at: Utc::now(),
        })
    }

    /// Create a new event using the default weight for its kind.
    pub fn with_default_weight(
        community_id: CommunityId,
        user_id: Option<UserId>,
        kind: EventKind,
        metadata: Metadata,
    ) -> AppResult<Self> {
        Self::new(community_id, user_id, kind, kind.default_weight(), metadata)
    }

    /// Recreate an event from stored data.
    ///
    /// Use this when loading from the database, not for creating new events.
    pub fn reconstruct(
        id: EventId,
        community_id: CommunityId,
        user_id: Option<UserId>,
        kind: EventKind,
        weight: Weight,
        metadata: Metadata,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            community_id,
            user_id,
            kind,
            weight,
            metadata,
            created_at,
        }
    }

    /// The event's unique identifier.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// The community this event belongs to.
    pub fn community_id(&self) -> CommunityId {
        self.community_id
    }

    /// The user who generated this event, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The momentum weight of this event.
    pub fn weight(&self) -> Weight {
        self.weight
    }

    /// A copy of the event-specific metadata.
    ///
    /// Returns a fresh map on every call; mutating it does not affect the
    /// stored attributes.
    pub fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    /// When this event was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The signed momentum contribution of this event.
    ///
    /// Positive kinds add their weight, `leave` subtracts it.
    pub fn momentum_contribution(&self) -> f64 {
        if self.kind.is_positive_signal() {
            self.weight.value()
        } else {
            -self.weight.value()
        }
    }

    /// Whether this event has no associated user.
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

/// Persistence contract for activity events.
#[async_trait]
pub trait ActivityEventStore: Send + Sync {
    /// Persist a single event.
    async fn save(&self, event: &ActivityEvent) -> AppResult<()>;

    /// Persist a batch of events as a single multi-row insert.
    async fn save_batch(&self, events: &[ActivityEvent]) -> AppResult<()>;

    /// Sum the signed weights of a community's events since the given time.
    ///
    /// `leave` events count negatively, every other kind positively.
    async fn sum_weights_since(
        &self,
        community_id: CommunityId,
        since: DateTime<Utc>,
    ) -> AppResult<f64>;

    /// Count a community's events since the given time.
    async fn count_since(&self, community_id: CommunityId, since: DateTime<Utc>)
        -> AppResult<i64>;
}

/// The in-process hand-off queue between the ingestion front-end and the
/// batch writer pool.
///
/// Submission never blocks: a full queue yields `Overloaded` and a stopped
/// queue yields `Cancelled`.
pub trait EventQueue: Send + Sync {
    /// Attempt to enqueue an event without waiting.
    fn try_submit(&self, event: ActivityEvent) -> AppResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::error::ErrorKind;
    use serde_json::json;

    fn sample_metadata() -> Metadata {
        let mut map = Map::new();
        map.insert("source".to_string(), json!("mobile"));
        map.insert("session".to_string(), json!(42));
        map
    }

    #[test]
    fn test_new_rejects_nil_community() {
        let err = ActivityEvent::new(
            CommunityId::from_uuid(uuid::Uuid::nil()),
            None,
            EventKind::View,
            Weight::default(),
            Metadata::new(),
        )
        .expect_err("nil community must be rejected");
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_contribution_sign_follows_kind() {
        let community = CommunityId::new();
        for kind in EventKind::ALL {
            let event =
                ActivityEvent::with_default_weight(community, None, kind, Metadata::new())
                    .expect("event");
            let expected = if kind.is_positive_signal() {
                kind.default_weight().value()
            } else {
                -kind.default_weight().value()
            };
            assert_eq!(event.momentum_contribution(), expected, "kind {kind}");
        }
    }

    #[test]
    fn test_metadata_copied_on_construction() {
        let mut original = sample_metadata();
        let event = ActivityEvent::new(
            CommunityId::new(),
            None,
            EventKind::Post,
            Weight::default(),
            original.clone(),
        )
        .expect("event");

        original.insert("mutated".to_string(), json!(true));
        assert!(!event.metadata().contains_key("mutated"));
    }

    #[test]
    fn test_metadata_copied_on_read() {
        let event = ActivityEvent::new(
            CommunityId::new(),
            None,
            EventKind::Post,
            Weight::default(),
            sample_metadata(),
        )
        .expect("event");

        let mut first = event.metadata();
        first.insert("mutated".to_string(), json!(true));
        first.remove("source");

        let second = event.metadata();
        assert!(!second.contains_key("mutated"));
        assert!(second.contains_key("source"));
    }

    #[test]
    fn test_anonymous_events() {
        let community = CommunityId::new();
        let anon =
            ActivityEvent::with_default_weight(community, None, EventKind::View, Metadata::new())
                .expect("event");
        assert!(anon.is_anonymous());

        let user = UserId::new();
        let named = ActivityEvent::with_default_weight(
            community,
            Some(user),
            EventKind::View,
            Metadata::new(),
        )
        .expect("event");
        assert_eq!(named.user_id(), Some(user));
        assert!(!named.is_anonymous());
    }

    #[test]
    fn test_reconstruct_preserves_fields() {
        let id = EventId::new();
        let community = CommunityId::new();
        let created = Utc::now() - chrono::Duration::minutes(30);
        let weight = Weight::new(2.5).expect("weight");
        let event = ActivityEvent::reconstruct(
            id,
            community,
            None,
            EventKind::Leave,
            weight,
            Metadata::new(),
            created,
        );
        assert_eq!(event.id(), id);
        assert_eq!(event.created_at(), created);
        assert_eq!(event.momentum_contribution(), -2.5);
    }
}
