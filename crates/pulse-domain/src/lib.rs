//! # pulse-domain
//!
//! Domain layer for Pulse: value types with validated construction, the
//! entities of the momentum pipeline, the pure momentum algorithms, and the
//! contracts (store, queue, notifier traits) that infrastructure crates
//! implement.

pub mod activity_event;
pub mod community;
pub mod event_kind;
pub mod momentum;
pub mod ranking;
pub mod spike;
pub mod subscription;
pub mod user;
pub mod values;

pub use activity_event::{ActivityEvent, ActivityEventStore, EventQueue};
pub use community::{Community, CommunityChecker, CommunityStore};
pub use event_kind::EventKind;
pub use momentum::{calculate_momentum, simple_momentum, MomentumInput, MomentumResult};
pub use ranking::RankedIndex;
pub use spike::{MomentumSpike, SpikeNotifier, SpikeThresholds};
pub use subscription::{WebhookSubscription, WebhookSubscriptionStore};
pub use user::{User, UserStore};
pub use values::{Momentum, Slug, Username, Weight};
