//! Time source abstraction.
//!
//! The momentum calculator defines its window relative to "now"; injecting
//! the clock keeps the calculation deterministic under test.

use chrono::{DateTime, Utc};

/// A substitutable source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
