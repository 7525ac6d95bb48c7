//! Batch writer pool.
//!
//! Owns the bounded event channel the ingestion front-end submits into and
//! a pool of workers that coalesce events into bulk inserts. Producers
//! never block: a full channel is the caller's signal to back off. Events
//! accepted by the channel are attempted for flush at least once, including
//! during shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use pulse_core::config::IngestionConfig;
use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_domain::activity_event::{ActivityEvent, ActivityEventStore, EventQueue};

use crate::metrics::Metrics;

/// The batch writer pool: one bounded MPMC channel, N draining workers.
pub struct BatchWriterPool {
    tx: mpsc::Sender<ActivityEvent>,
    rx: Arc<Mutex<mpsc::Receiver<ActivityEvent>>>,
    store: Arc<dyn ActivityEventStore>,
    config: IngestionConfig,
    metrics: Arc<Metrics>,
    token: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
    accepting: AtomicBool,
    stopped_tx: watch::Sender<bool>,
}

impl BatchWriterPool {
    /// Create a pool; call [`start`](Self::start) before submitting events.
    pub fn new(
        store: Arc<dyn ActivityEventStore>,
        config: IngestionConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.buffer_size);
        let (stopped_tx, _) = watch::channel(false);

        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            store,
            config,
            metrics,
            token: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
            accepting: AtomicBool::new(true),
            stopped_tx,
        }
    }

    /// Spawn the worker tasks.
    pub async fn start(&self) {
        info!(
            buffer_size = self.config.buffer_size,
            batch_size = self.config.batch_size,
            flush_interval_ms = self.config.flush_interval_ms,
            worker_count = self.config.worker_count,
            "Batch writer starting"
        );

        let mut handles = self.handles.lock().await;
        for worker_id in 0..self.config.worker_count {
            let worker = Worker {
                worker_id,
                rx: Arc::clone(&self.rx),
                tx: self.tx.clone(),
                store: Arc::clone(&self.store),
                config: self.config.clone(),
                metrics: Arc::clone(&self.metrics),
                token: self.token.clone(),
            };
            handles.push(tokio::spawn(worker.run()));
        }
    }

    /// Current number of events waiting in the channel.
    pub fn queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Stop the pool: close intake, let every worker drain and flush, and
    /// wait for them to exit. Idempotent; concurrent callers wait for the
    /// same completion.
    pub async fn stop(&self) {
        if self.accepting.swap(false, Ordering::SeqCst) {
            info!("Batch writer stopping, draining buffer...");
            self.token.cancel();

            let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
            for handle in handles {
                let _ = handle.await;
            }

            let _ = self.stopped_tx.send(true);
            info!("Batch writer stopped");
        } else {
            let mut stopped = self.stopped_tx.subscribe();
            let _ = stopped.wait_for(|done| *done).await;
        }
    }

    /// A signal that becomes ready once every worker has returned.
    pub fn stopped(&self) -> watch::Receiver<bool> {
        self.stopped_tx.subscribe()
    }
}

impl EventQueue for BatchWriterPool {
    fn try_submit(&self, event: ActivityEvent) -> AppResult<()> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(AppError::cancelled("batch writer stopped"));
        }

        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                Err(AppError::overloaded("event buffer full, try again later"))
            }
            Err(TrySendError::Closed(_)) => Err(AppError::cancelled("batch writer stopped")),
        }
    }
}

impl std::fmt::Debug for BatchWriterPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriterPool")
            .field("config", &self.config)
            .field("queue_depth", &self.queue_depth())
            .finish()
    }
}

/// One draining worker.
struct Worker {
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<ActivityEvent>>>,
    tx: mpsc::Sender<ActivityEvent>,
    store: Arc<dyn ActivityEventStore>,
    config: IngestionConfig,
    metrics: Arc<Metrics>,
    token: CancellationToken,
}

impl Worker {
    async fn run(self) {
        let mut batch: Vec<ActivityEvent> = Vec::with_capacity(self.config.batch_size);
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.flush_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = async { self.rx.lock().await.recv().await } => {
                    match received {
                        Some(event) => {
                            batch.push(event);
                            if batch.len() >= self.config.batch_size {
                                self.flush(&mut batch).await;
                            }
                        }
                        None => {
                            self.flush(&mut batch).await;
                            debug!(worker_id = self.worker_id, "Worker exiting after drain");
                            return;
                        }
                    }
                }
                _ = ticker.tick() => {
                    self.flush(&mut batch).await;
                }
                _ = self.token.cancelled() => {
                    self.drain(&mut batch).await;
                    self.flush(&mut batch).await;
                    debug!(worker_id = self.worker_id, "Worker exiting on cancellation");
                    return;
                }
            }
        }
    }

    /// Pull everything already accepted by the channel into the batch,
    /// flushing whenever it fills.
    async fn drain(&self, batch: &mut Vec<ActivityEvent>) {
        loop {
            let next = self.rx.lock().await.try_recv();
            match next {
                Ok(event) => {
                    batch.push(event);
                    if batch.len() >= self.config.batch_size {
                        self.flush(batch).await;
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return,
            }
        }
    }

    /// Bulk-write the accumulated batch. The buffer is reused: length
    /// resets, capacity stays.
    async fn flush(&self, batch: &mut Vec<ActivityEvent>) {
        if batch.is_empty() {
            return;
        }

        let started = std::time::Instant::now();
        let result = self.store.save_batch(batch).await;
        let elapsed_ms = started.elapsed().as_millis();

        match result {
            Ok(()) => {
                for event in batch.iter() {
                    self.metrics
                        .record_event_ingested(event.community_id(), event.kind());
                }
                self.metrics
                    .set_queue_depth((self.tx.max_capacity() - self.tx.capacity()) as u64);

                debug!(
                    worker_id = self.worker_id,
                    batch_size = batch.len(),
                    duration_ms = elapsed_ms,
                    "Batch flushed"
                );
            }
            Err(e) => {
                // at-most-once: the batch is lost, never re-queued
                error!(
                    worker_id = self.worker_id,
                    batch_size = batch.len(),
                    duration_ms = elapsed_ms,
                    error = %e,
                    "Batch save failed"
                );
            }
        }

        batch.clear();
    }
}
