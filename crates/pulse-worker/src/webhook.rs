//! Webhook dispatcher.
//!
//! Fans out momentum spike notifications to subscribed callbacks with
//! best-effort semantics: non-blocking enqueue (shed on overflow), one
//! signed POST per subscription, no retries, no persistent outbox.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use pulse_core::config::WebhookConfig;
use pulse_core::error::AppError;
use pulse_core::result::AppResult;
use pulse_domain::spike::{MomentumSpike, SpikeNotifier, SpikeThresholds};
use pulse_domain::subscription::{WebhookSubscription, WebhookSubscriptionStore};

type HmacSha256 = Hmac<Sha256>;

/// JSON payload delivered to webhook endpoints.
#[derive(Debug, Serialize)]
pub struct WebhookPayload {
    /// Always `momentum_spike`.
    pub event: &'static str,
    /// The spiking community.
    pub community_id: String,
    /// The community's display name.
    pub community_name: String,
    /// Momentum before the transition.
    pub old_momentum: f64,
    /// Momentum after the transition.
    pub new_momentum: f64,
    /// Relative growth, zero when the previous momentum was zero.
    pub percent_change: f64,
    /// Detection time, RFC 3339.
    pub timestamp: String,
}

impl WebhookPayload {
    fn from_spike(spike: &MomentumSpike) -> Self {
        Self {
            event: "momentum_spike",
            community_id: spike.community_id.to_string(),
            community_name: spike.community_name.clone(),
            old_momentum: spike.old_momentum,
            new_momentum: spike.new_momentum,
            percent_change: spike.percent_change,
            timestamp: spike.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Compute the signature header value for a payload:
/// `sha256=<hex HMAC-SHA256(secret, payload)>`.
///
/// Receivers recompute this over the exact bytes of the request body.
pub fn sign_payload(payload: &[u8], secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// The spike notification dispatcher.
pub struct WebhookDispatcher {
    tx: mpsc::Sender<MomentumSpike>,
    rx: Arc<Mutex<mpsc::Receiver<MomentumSpike>>>,
    subscriptions: Arc<dyn WebhookSubscriptionStore>,
    http: reqwest::Client,
    config: WebhookConfig,
    token: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
    accepting: AtomicBool,
    stopped_tx: watch::Sender<bool>,
}

impl WebhookDispatcher {
    /// Create a dispatcher; call [`start`](Self::start) before notifying.
    pub fn new(
        subscriptions: Arc<dyn WebhookSubscriptionStore>,
        config: WebhookConfig,
    ) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    pulse_core::error::ErrorKind::Configuration,
                    "Failed to build webhook HTTP client",
                    e,
                )
            })?;

        let (tx, rx) = mpsc::channel(config.buffer_size);
        let (stopped_tx, _) = watch::channel(false);

        Ok(Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
            subscriptions,
            http,
            config,
            token: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
            accepting: AtomicBool::new(true),
            stopped_tx,
        })
    }

    /// Spawn the delivery workers.
    pub async fn start(&self) {
        info!(
            buffer_size = self.config.buffer_size,
            worker_count = self.config.worker_count,
            request_timeout_seconds = self.config.request_timeout_seconds,
            "Webhook dispatcher starting"
        );

        let mut handles = self.handles.lock().await;
        for worker_id in 0..self.config.worker_count {
            let worker = DeliveryWorker {
                worker_id,
                rx: Arc::clone(&self.rx),
                subscriptions: Arc::clone(&self.subscriptions),
                http: self.http.clone(),
                token: self.token.clone(),
            };
            handles.push(tokio::spawn(worker.run()));
        }
    }

    /// Stop the dispatcher: close intake, let workers drain queued spikes
    /// (in-flight requests honor their own timeout), and wait for exit.
    /// Idempotent.
    pub async fn stop(&self) {
        if self.accepting.swap(false, Ordering::SeqCst) {
            info!("Webhook dispatcher stopping, draining buffer...");
            self.token.cancel();

            let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
            for handle in handles {
                let _ = handle.await;
            }

            let _ = self.stopped_tx.send(true);
            info!("Webhook dispatcher stopped");
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

#[async_trait]
impl SpikeNotifier for WebhookDispatcher {
    async fn notify_spike(&self, spike: MomentumSpike) -> AppResult<usize> {
        if !self.accepting.load(Ordering::SeqCst) || self.token.is_cancelled() {
            return Err(AppError::cancelled("webhook dispatcher stopped"));
        }

        match self.tx.try_send(spike) {
            Ok(()) => {
                // delivery count is determined asynchronously by the workers
                Ok(0)
            }
            Err(TrySendError::Full(spike)) => {
                // back-pressure policy is shed, not block
                warn!(
                    community_id = %spike.community_id,
                    "Webhook buffer full, spike dropped"
                );
                Ok(0)
            }
            Err(TrySendError::Closed(_)) => Err(AppError::cancelled("webhook dispatcher stopped")),
        }
    }

    fn thresholds(&self) -> SpikeThresholds {
        SpikeThresholds {
            absolute_threshold: self.config.absolute_threshold,
            growth_percentage: self.config.growth_percentage,
        }
    }
}

impl std::fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("config", &self.config)
            .finish()
    }
}

/// One delivery worker.
struct DeliveryWorker {
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<MomentumSpike>>>,
    subscriptions: Arc<dyn WebhookSubscriptionStore>,
    http: reqwest::Client,
    token: CancellationToken,
}

impl DeliveryWorker {
    async fn run(self) {
        loop {
            tokio::select! {
                received = async { self.rx.lock().await.recv().await } => {
                    match received {
                        Some(spike) => self.dispatch_spike(spike).await,
                        None => {
                            debug!(worker_id = self.worker_id, "Worker exiting after drain");
                            return;
                        }
                    }
                }
                _ = self.token.cancelled() => {
                    // stop consuming new spikes beyond what was accepted
                    loop {
                        let next = self.rx.lock().await.try_recv();
                        match next {
                            Ok(spike) => self.dispatch_spike(spike).await,
                            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                        }
                    }
                    debug!(worker_id = self.worker_id, "Worker exiting on cancellation");
                    return;
                }
            }
        }
    }

    /// Deliver one spike to every active subscription of its community.
    async fn dispatch_spike(&self, spike: MomentumSpike) {
        let subscriptions = match self
            .subscriptions
            .find_active_by_community(spike.community_id)
            .await
        {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!(
                    worker_id = self.worker_id,
                    community_id = %spike.community_id,
                    error = %e,
                    "Failed to fetch subscriptions"
                );
                return;
            }
        };

        if subscriptions.is_empty() {
            debug!(
                community_id = %spike.community_id,
                "No subscriptions for community"
            );
            return;
        }

        // serialize once; every target receives the identical bytes
        let payload = match serde_json::to_vec(&WebhookPayload::from_spike(&spike)) {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    worker_id = self.worker_id,
                    error = %e,
                    "Failed to serialize spike payload"
                );
                return;
            }
        };

        let mut sent = 0usize;
        let mut failed = 0usize;
        for subscription in &subscriptions {
            if self.send_webhook(subscription, &payload).await {
                sent += 1;
            } else {
                failed += 1;
            }
        }

        info!(
            worker_id = self.worker_id,
            community_id = %spike.community_id,
            sent,
            failed,
            "Spike notifications dispatched"
        );
    }

    /// Send a single signed webhook. Success means any 2xx status.
    async fn send_webhook(&self, subscription: &WebhookSubscription, payload: &[u8]) -> bool {
        let signature = sign_payload(payload, &subscription.secret);

        let response = self
            .http
            .post(&subscription.target_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("X-Pulse-Signature", signature)
            .header("X-Pulse-Event", "momentum_spike")
            .header(reqwest::header::USER_AGENT, "Pulse-Webhook/1.0")
            .body(payload.to_vec())
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                debug!(
                    target_url = %subscription.target_url,
                    status = %response.status(),
                    "Webhook delivered"
                );
                true
            }
            Ok(response) => {
                warn!(
                    worker_id = self.worker_id,
                    target_url = %subscription.target_url,
                    status = %response.status(),
                    "Webhook returned non-success status"
                );
                false
            }
            Err(e) => {
                warn!(
                    worker_id = self.worker_id,
                    target_url = %subscription.target_url,
                    error = %e,
                    "Webhook request failed"
                );
                false
            }
        }
    }
}
