//! Pulse — real-time community momentum discovery engine.
//!
//! Main entry point that wires all crates together and runs the pipeline
//! until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use pulse_cache::{CachedCommunityStore, CommunityExistsCache, RedisClient, RedisLeaderboard};
use pulse_core::config::AppConfig;
use pulse_core::error::AppError;
use pulse_database::repositories::{
    ActivityEventRepository, CommunityRepository, UserRepository, WebhookSubscriptionRepository,
};
use pulse_database::DatabasePool;
use pulse_domain::activity_event::ActivityEventStore;
use pulse_domain::community::CommunityStore;
use pulse_domain::ranking::RankedIndex;
use pulse_service::momentum::{MomentumService, MomentumSettings};
use pulse_service::{IngestEventService, SystemClock};
use pulse_worker::{BatchWriterPool, Metrics, MomentumScheduler, WebhookDispatcher};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Pulse failed: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("PULSE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Pulse starting up");

    // ── Authoritative store ──────────────────────────────────────
    let db = DatabasePool::connect(&config.database).await?;
    pulse_database::migration::run_migrations(db.pool()).await?;
    db.health_check().await?;
    tracing::info!("Pulse infrastructure ready");

    let metrics = Arc::new(Metrics::new());

    let community_repo = Arc::new(CommunityRepository::new(db.pool().clone()));
    let user_repo = Arc::new(UserRepository::new(db.pool().clone()));
    let event_repo: Arc<dyn ActivityEventStore> =
        Arc::new(ActivityEventRepository::new(db.pool().clone()));
    let subscription_repo = Arc::new(WebhookSubscriptionRepository::new(db.pool().clone()));

    // ── Ranked index (optional) ──────────────────────────────────
    let leaderboard: Option<Arc<dyn RankedIndex>> = if config.cache.redis_url.is_empty() {
        tracing::info!("Redis disabled: no redis_url configured");
        None
    } else {
        match RedisClient::connect(&config.cache.redis_url).await {
            Ok(client) => {
                let leaderboard = Arc::new(RedisLeaderboard::new(client));
                match leaderboard.health().await {
                    Ok(()) => {
                        let size = leaderboard.size().await.unwrap_or(0);
                        tracing::info!(size, "Redis leaderboard enabled");
                        Some(leaderboard as Arc<dyn RankedIndex>)
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "Redis ping failed, continuing without leaderboard"
                        );
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Redis connection failed, continuing without leaderboard"
                );
                None
            }
        }
    };

    // ranked read path falls back to postgres on every index miss
    let community_store: Arc<dyn CommunityStore> = Arc::new(CachedCommunityStore::new(
        community_repo.clone(),
        leaderboard.clone(),
    ));

    // ── Workers ──────────────────────────────────────────────────
    let batch_writer = Arc::new(BatchWriterPool::new(
        event_repo.clone(),
        config.ingestion.clone(),
        metrics.clone(),
    ));
    batch_writer.start().await;

    let dispatcher = Arc::new(WebhookDispatcher::new(
        subscription_repo,
        config.webhook.clone(),
    )?);
    dispatcher.start().await;

    // ── Use cases ────────────────────────────────────────────────
    let existence_cache = Arc::new(CommunityExistsCache::new(
        community_repo.clone(),
        Duration::from_secs(config.cache.existence_ttl_seconds),
    ));

    let mut ingest_service =
        IngestEventService::new(event_repo.clone(), community_store.clone(), user_repo)
            .with_checker(existence_cache);
    if config.ingestion.async_mode {
        ingest_service = ingest_service.with_queue(batch_writer.clone());
    }
    tracing::info!(
        async_mode = ingest_service.is_async(),
        "Ingestion front-end ready"
    );

    let mut momentum_service = MomentumService::new(
        event_repo,
        community_store,
        MomentumSettings {
            time_window: Duration::from_secs(config.momentum.time_window_seconds),
            decay_factor: config.momentum.decay_factor,
            batch_limit: config.momentum.batch_limit,
        },
        Arc::new(SystemClock),
    )
    .with_notifier(dispatcher.clone());
    if let Some(index) = leaderboard {
        momentum_service = momentum_service.with_index(index);
    }

    // ── Periodic scheduler ───────────────────────────────────────
    let scheduler = MomentumScheduler::new(
        Arc::new(momentum_service),
        Duration::from_secs(config.momentum.calculation_interval_seconds),
        metrics.clone(),
    );
    let scheduler_token = CancellationToken::new();
    let scheduler_handle = tokio::spawn(scheduler.run(scheduler_token.clone()));

    // ── Shutdown ─────────────────────────────────────────────────
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Pulse shutting down");

    // scheduler first, then drain the buffers, then close the pools
    scheduler_token.cancel();
    let _ = scheduler_handle.await;
    batch_writer.stop().await;
    dispatcher.stop().await;
    db.close().await;

    tracing::info!("Pulse shutdown complete");
    Ok(())
}
