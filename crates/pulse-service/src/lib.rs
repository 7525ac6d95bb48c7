//! # pulse-service
//!
//! Use cases of the momentum pipeline: the event ingestion front-end and
//! the momentum calculator. Both receive their collaborators through
//! construction and hold no global state.

pub mod clock;
pub mod ingest;
pub mod momentum;

pub use clock::{Clock, SystemClock};
pub use ingest::{IngestEventInput, IngestEventOutput, IngestEventService};
pub use momentum::{CalculateAllSummary, MomentumOutcome, MomentumService, MomentumSettings};
