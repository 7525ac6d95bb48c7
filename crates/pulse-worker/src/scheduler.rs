//! Periodic momentum scheduler.
//!
//! A single long-running task: one calculation cycle immediately on start,
//! then one per interval, exiting cleanly between ticks on cancellation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use pulse_service::momentum::MomentumService;

use crate::metrics::Metrics;

/// Drives full momentum recalculation on a fixed interval.
pub struct MomentumScheduler {
    service: Arc<MomentumService>,
    interval: Duration,
    metrics: Arc<Metrics>,
}

impl MomentumScheduler {
    /// Create a scheduler over the calculator.
    pub fn new(service: Arc<MomentumService>, interval: Duration, metrics: Arc<Metrics>) -> Self {
        Self {
            service,
            interval,
            metrics,
        }
    }

    /// Run until the token fires. The first cycle starts immediately.
    pub async fn run(self, token: CancellationToken) {
        info!(
            interval_seconds = self.interval.as_secs(),
            "Momentum scheduler started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Momentum scheduler stopping");
                    return;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }
    }

    /// Execute one full recalculation cycle and record its duration.
    async fn run_cycle(&self) {
        let started = Instant::now();
        let result = self.service.calculate_all(0).await;
        let elapsed = started.elapsed();

        self.metrics.observe_cycle_duration(elapsed.as_secs_f64());

        match result {
            Ok(summary) => {
                info!(
                    processed = summary.processed,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    duration_ms = elapsed.as_millis(),
                    "Momentum calculation cycle completed"
                );
            }
            Err(e) => {
                error!(
                    error = %e,
                    duration_ms = elapsed.as_millis(),
                    "Momentum calculation cycle failed"
                );
            }
        }
    }
}

impl std::fmt::Debug for MomentumScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MomentumScheduler")
            .field("interval", &self.interval)
            .finish()
    }
}
