//! LetUsConnect server: connection graph and notification engine.
//!
//! Wires the store, identity directory, delivery adapters, services and the
//! notification scheduler together, then runs until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use letusconnect_core::config::{AppConfig, LoggingConfig, PushBackend, PushConfig};
use letusconnect_core::traits::{Clock, SystemClock};
use letusconnect_delivery::{DeliveryRegistry, MemoryPubSub, PubSubBus};
use letusconnect_service::{
    CachedIdentityResolver, ConnectionGraphService, EventDispatcher, IdentityResolver,
    NotificationComposer, NotificationService, StaticIdentityDirectory,
};
use letusconnect_store::{
    ConnectionRepository, MemoryDocumentStore, NotificationRepository, StoreHandle,
};
use letusconnect_worker::NotificationScheduler;

#[tokio::main]
async fn main() {
    let env = std::env::var("LETUSCONNECT_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = run(config, &env).await {
        tracing::error!(error = ?e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(config: AppConfig, env: &str) -> anyhow::Result<()> {
    tracing::info!(env, "Starting LetUsConnect v{}", env!("CARGO_PKG_VERSION"));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // ── Step 1: Document store + repositories ────────────────────
    let store = StoreHandle::new(Arc::new(MemoryDocumentStore::new()), &config.store);
    if !store.health_check().await.context("Document store is not reachable")? {
        anyhow::bail!("Document store reported unhealthy");
    }
    let connection_repo = Arc::new(ConnectionRepository::new(store.clone()));
    let notification_repo = Arc::new(NotificationRepository::new(store));

    // ── Step 2: Identity resolver ────────────────────────────────
    let directory = match &config.identity.seed_file {
        Some(path) => StaticIdentityDirectory::load(path)
            .await
            .context("Failed to load identity seed")?,
        None => StaticIdentityDirectory::new(),
    };
    let identity: Arc<dyn IdentityResolver> = Arc::new(CachedIdentityResolver::new(
        Arc::new(directory),
        &config.identity,
    ));

    // ── Step 3: Delivery adapters ────────────────────────────────
    let bus = connect_bus(&config.delivery.push).await?;
    let registry = Arc::new(
        DeliveryRegistry::from_config(&config.delivery, bus)
            .context("Failed to configure delivery adapters")?,
    );

    // ── Step 4: Services ─────────────────────────────────────────
    let dispatcher = Arc::new(EventDispatcher::new(
        Arc::new(NotificationComposer::new(Arc::clone(&identity))),
        Arc::clone(&notification_repo),
        Arc::clone(&clock),
        config.notifications.dispatch_mode,
    ));
    let _connections = ConnectionGraphService::new(
        Arc::clone(&connection_repo),
        Arc::clone(&identity),
        Arc::clone(&dispatcher),
        Arc::clone(&clock),
        config.connections.clone(),
    );
    let _notifications = NotificationService::new(
        Arc::clone(&notification_repo),
        Arc::clone(&clock),
        config.notifications.clone(),
    );
    tracing::info!("Services initialized");

    // ── Step 5: Notification scheduler ───────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = NotificationScheduler::new(
        notification_repo,
        registry,
        identity,
        clock,
        config.scheduler.clone(),
    );
    let scheduler_handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    // ── Step 6: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    if let Err(e) = scheduler_handle.await {
        tracing::error!(error = %e, "Scheduler task panicked");
    }
    dispatcher.shutdown().await;

    tracing::info!("LetUsConnect shut down gracefully");
    Ok(())
}

/// Build the pub/sub bus used by push delivery.
async fn connect_bus(config: &PushConfig) -> anyhow::Result<Arc<dyn PubSubBus>> {
    match config.backend {
        PushBackend::Memory => Ok(Arc::new(MemoryPubSub::new(config.buffer_size))),
        #[cfg(feature = "redis-pubsub")]
        PushBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("delivery.push.redis_url is required for the redis backend")?;
            let bus = letusconnect_delivery::bus::redis_pubsub::RedisPubSub::connect(url).await?;
            Ok(Arc::new(bus))
        }
        #[cfg(not(feature = "redis-pubsub"))]
        PushBackend::Redis => {
            anyhow::bail!("Built without the `redis-pubsub` feature; use the memory push backend")
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
