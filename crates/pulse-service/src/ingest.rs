//! Event ingestion front-end.
//!
//! Validates incoming signals and hands them off without holding the
//! request: in async mode events go to the in-process queue (non-blocking,
//! shed on overflow), in sync mode they are persisted directly.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};

use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_core::types::{CommunityId, EventId, UserId};
use pulse_domain::activity_event::{ActivityEvent, ActivityEventStore, EventQueue, Metadata};
use pulse_domain::community::{CommunityChecker, CommunityStore};
use pulse_domain::event_kind::EventKind;
use pulse_domain::user::UserStore;
use pulse_domain::values::Weight;

/// Raw ingestion request as it arrives from the transport layer.
#[derive(Debug, Clone, Default)]
pub struct IngestEventInput {
    /// Community id as a string.
    pub community_id: String,
    /// Optional user id as a string; absent means anonymous.
    pub user_id: Option<String>,
    /// Event kind name.
    pub kind: String,
    /// Optional explicit weight; the kind's default applies when absent.
    pub weight: Option<f64>,
    /// Optional metadata attributes.
    pub metadata: Option<Metadata>,
}

/// Result of an accepted ingestion.
#[derive(Debug, Clone)]
pub struct IngestEventOutput {
    /// The freshly assigned event id.
    pub event_id: EventId,
    /// The validated community id.
    pub community_id: CommunityId,
    /// The validated event kind.
    pub kind: EventKind,
    /// The effective weight.
    pub weight: f64,
    /// Always true on success.
    pub accepted: bool,
    /// True when the event was queued for async processing.
    pub queued: bool,
}

/// The ingestion front-end.
///
/// Stateless and safe for concurrent invocation; every collaborator arrives
/// through construction.
pub struct IngestEventService {
    event_store: Arc<dyn ActivityEventStore>,
    community_store: Arc<dyn CommunityStore>,
    user_store: Arc<dyn UserStore>,
    checker: Option<Arc<dyn CommunityChecker>>,
    queue: Option<Arc<dyn EventQueue>>,
}

impl IngestEventService {
    /// Create a front-end in synchronous mode (direct persistence).
    pub fn new(
        event_store: Arc<dyn ActivityEventStore>,
        community_store: Arc<dyn CommunityStore>,
        user_store: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            event_store,
            community_store,
            user_store,
            checker: None,
            queue: None,
        }
    }

    /// Enable async mode: accepted events are handed to the queue instead
    /// of being persisted in the request path.
    pub fn with_queue(mut self, queue: Arc<dyn EventQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Use a checker (typically the existence cache) for community
    /// active-state checks instead of the store.
    pub fn with_checker(mut self, checker: Arc<dyn CommunityChecker>) -> Self {
        self.checker = Some(checker);
        self
    }

    /// Whether accepted events are queued rather than persisted inline.
    pub fn is_async(&self) -> bool {
        self.queue.is_some()
    }

    /// Ingest a single activity event.
    pub async fn execute(&self, input: IngestEventInput) -> AppResult<IngestEventOutput> {
        let community_id = CommunityId::from_str(&input.community_id).map_err(|e| {
            warn!(
                community_id = %input.community_id,
                reason = %e,
                "Event rejected: invalid community id"
            );
            AppError::invalid_input(format!("invalid community id: {e}"))
        })?;

        let (exists, is_active) = self.check_community(community_id).await?;
        if !exists {
            warn!(community_id = %community_id, "Event rejected: community not found");
            return Err(AppError::not_found(format!(
                "community {community_id} not found"
            )));
        }
        if !is_active {
            warn!(community_id = %community_id, "Event rejected: community inactive");
            return Err(AppError::rejected_inactive(format!(
                "community {community_id} is not active"
            )));
        }

        let kind = EventKind::from_str(&input.kind).map_err(|e| {
            warn!(
                community_id = %community_id,
                kind = %input.kind,
                "Event rejected: invalid event kind"
            );
            e
        })?;

        let user_id = match &input.user_id {
            Some(raw) => Some(self.check_user(community_id, raw).await?),
            None => None,
        };

        let weight = match input.weight {
            Some(v) => Weight::new(v).map_err(|e| {
                warn!(
                    community_id = %community_id,
                    weight = v,
                    "Event rejected: invalid weight"
                );
                e
            })?,
            None => kind.default_weight(),
        };

        let event = ActivityEvent::new(
            community_id,
            user_id,
            kind,
            weight,
            input.metadata.unwrap_or_default(),
        )?;
        let event_id = event.id();

        // async mode: hand off without blocking; the queue sheds on overflow
        if let Some(queue) = &self.queue {
            queue.try_submit(event).map_err(|e| {
                warn!(
                    event_id = %event_id,
                    community_id = %community_id,
                    reason = %e,
                    "Event dropped at hand-off"
                );
                e
            })?;

            debug!(
                event_id = %event_id,
                community_id = %community_id,
                kind = %kind,
                "Event queued"
            );
            return Ok(IngestEventOutput {
                event_id,
                community_id,
                kind,
                weight: weight.value(),
                accepted: true,
                queued: true,
            });
        }

        // sync mode: persist in the request path
        self.event_store.save(&event).await?;

        debug!(
            event_id = %event_id,
            community_id = %community_id,
            kind = %kind,
            weight = weight.value(),
            "Event ingested"
        );
        Ok(IngestEventOutput {
            event_id,
            community_id,
            kind,
            weight: weight.value(),
            accepted: true,
            queued: false,
        })
    }

    async fn check_community(&self, id: CommunityId) -> AppResult<(bool, bool)> {
        if let Some(checker) = &self.checker {
            return checker.check_active(id).await;
        }
        match self.community_store.find_by_id(id).await? {
            Some(community) => Ok((true, community.is_active())),
            None => Ok((false, false)),
        }
    }

    async fn check_user(&self, community_id: CommunityId, raw: &str) -> AppResult<UserId> {
        let user_id = UserId::from_str(raw).map_err(|e| {
            warn!(
                community_id = %community_id,
                user_id = raw,
                reason = %e,
                "Event rejected: invalid user id"
            );
            AppError::invalid_input(format!("invalid user id: {e}"))
        })?;

        if !self.user_store.exists(user_id).await? {
            warn!(
                community_id = %community_id,
                user_id = %user_id,
                "Event rejected: user not found"
            );
            return Err(AppError::not_found(format!("user {user_id} not found")));
        }
        Ok(user_id)
    }
}

impl std::fmt::Debug for IngestEventService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestEventService")
            .field("async_mode", &self.is_async())
            .field("cached_checks", &self.checker.is_some())
            .finish()
    }
}
