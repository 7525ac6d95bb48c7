//! # pulse-worker
//!
//! Background workers of the momentum pipeline: the batch writer pool
//! draining the event channel into the store, the webhook dispatcher
//! fanning out signed spike notifications, the periodic momentum
//! scheduler, and the in-process metrics they report into.

pub mod batch_writer;
pub mod metrics;
pub mod scheduler;
pub mod webhook;

pub use batch_writer::BatchWriterPool;
pub use metrics::{Metrics, MetricsSnapshot};
pub use scheduler::MomentumScheduler;
pub use webhook::WebhookDispatcher;
