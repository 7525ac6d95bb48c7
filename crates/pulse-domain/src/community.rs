//! Communities: long-lived thematic groupings ranked by momentum.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_core::types::{CommunityId, UserId};

use crate::values::{Momentum, Slug};

const NAME_MAX_LEN: usize = 255;

/// A named thematic grouping with a momentum score and an active flag.
///
/// The slug is immutable after creation; descriptive fields and the
/// active flag change only through the mutators below.
#[derive(Debug, Clone)]
pub struct Community {
    id: CommunityId,
    slug: Slug,
    name: String,
    description: String,
    creator_id: UserId,
    avatar_url: String,
    is_active: bool,
    current_momentum: Momentum,
    momentum_updated_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Community {
    /// Create a new active community with zero momentum.
    pub fn new(slug: Slug, name: impl Into<String>, creator_id: UserId) -> AppResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        if creator_id.is_nil() {
            return Err(AppError::invalid_input("community must have a creator"));
        }

        let now = Utc::now();
        Ok(Self {
            id: CommunityId::new(),
            slug,
            name,
            description: String::new(),
            creator_id,
            avatar_url: String::new(),
            is_active: true,
            current_momentum: Momentum::default(),
            momentum_updated_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Recreate a community from stored data.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstruct(
        id: CommunityId,
        slug: Slug,
        name: String,
        description: String,
        creator_id: UserId,
        avatar_url: String,
        is_active: bool,
        current_momentum: Momentum,
        momentum_updated_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            slug,
            name,
            description,
            creator_id,
            avatar_url,
            is_active,
            current_momentum,
            momentum_updated_at,
            created_at,
            updated_at,
        }
    }

    /// The community's unique identifier.
    pub fn id(&self) -> CommunityId {
        self.id
    }

    /// The community's URL-friendly slug.
    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    /// The community's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The community's description (may be empty).
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The user who created this community.
    pub fn creator_id(&self) -> UserId {
        self.creator_id
    }

    /// The community's avatar URL (may be empty).
    pub fn avatar_url(&self) -> &str {
        &self.avatar_url
    }

    /// Whether the community is active.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// The precomputed momentum score.
    pub fn current_momentum(&self) -> Momentum {
        self.current_momentum
    }

    /// When momentum was last recalculated, if ever.
    pub fn momentum_updated_at(&self) -> Option<DateTime<Utc>> {
        self.momentum_updated_at
    }

    /// When the community was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the community was last updated.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Set the current momentum score, stamping both update timestamps.
    ///
    /// Called by the momentum calculation cycle.
    pub fn update_momentum(&mut self, momentum: Momentum) {
        self.current_momentum = momentum;
        let now = Utc::now();
        self.momentum_updated_at = Some(now);
        self.updated_at = now;
    }

    /// Mark the community as inactive.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }

    /// Mark the community as active.
    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    /// Update the community's descriptive fields. The slug never changes.
    pub fn update_details(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> AppResult<()> {
        let name = name.into();
        validate_name(&name)?;
        self.name = name;
        self.description = description.into();
        self.avatar_url = avatar_url.into();
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.is_empty() {
        return Err(AppError::invalid_input("community name cannot be empty"));
    }
    if name.len() > NAME_MAX_LEN {
        return Err(AppError::invalid_input(
            "community name must be at most 255 characters",
        ));
    }
    Ok(())
}

/// Persistence contract for communities, limited to the operations the
/// momentum pipeline requires of the authoritative store.
#[async_trait]
pub trait CommunityStore: Send + Sync {
    /// Find a community by id. `None` means the row does not exist.
    async fn find_by_id(&self, id: CommunityId) -> AppResult<Option<Community>>;

    /// Fetch communities by id, preserving the input order and silently
    /// omitting ids that cannot be resolved.
    async fn find_by_ids(&self, ids: &[CommunityId]) -> AppResult<Vec<Community>>;

    /// List active communities ordered by momentum, highest first.
    async fn list_by_momentum(&self, limit: i64, offset: i64) -> AppResult<Vec<Community>>;

    /// Persist a newly calculated momentum score, stamping
    /// `momentum_updated_at` and `updated_at` atomically. Fails with
    /// `NotFound` when the row is missing.
    async fn update_momentum(&self, id: CommunityId, momentum: Momentum) -> AppResult<()>;
}

/// Answers "(exists, is_active)" for a community id.
///
/// Lets the ingestion front-end consult a cache instead of hitting the
/// authoritative store on every request.
#[async_trait]
pub trait CommunityChecker: Send + Sync {
    /// Check whether a community exists and is active.
    async fn check_active(&self, id: CommunityId) -> AppResult<(bool, bool)>;
}
