use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fanray_api::background::CacheInvalidator;
use fanray_api::config::ServerConfig;
use fanray_api::router::build_app_router;
use fanray_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fanray_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = fanray_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    fanray_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    fanray_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Storage provider ---
    let storage = build_storage(&config).await;

    // --- Cache ---
    let cache: Arc<dyn fanray_cache::Cache> = Arc::new(fanray_cache::MemoryCache::new());

    // --- Event bus ---
    let event_bus = Arc::new(fanray_events::EventBus::default());
    tracing::info!("Event bus created");

    // Spawn event persistence (writes all events to the database).
    let persistence_handle = tokio::spawn(fanray_events::EventPersistence::run(
        pool.clone(),
        event_bus.subscribe(),
    ));

    // Spawn cache invalidation (maps events to cache removals).
    let invalidator_handle = tokio::spawn(CacheInvalidator::run(
        Arc::clone(&cache),
        event_bus.subscribe(),
    ));

    tracing::info!("Event services started (persistence, cache invalidation)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        cache,
        storage,
        event_bus: Arc::clone(&event_bus),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Drop the event bus sender to close the broadcast channel.
    // This signals persistence and the invalidator to shut down.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), persistence_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), invalidator_handle).await;
    tracing::info!("Event services shut down");

    tracing::info!("Graceful shutdown complete");
}

/// Build the configured storage provider.
async fn build_storage(config: &ServerConfig) -> Arc<dyn fanray_storage::StorageProvider> {
    match config.storage.provider.as_str() {
        "s3" => {
            let storage = fanray_storage::S3Storage::from_env(
                config.storage.s3_bucket.clone(),
                config.storage.base_url.clone(),
            )
            .await;
            tracing::info!(bucket = %config.storage.s3_bucket, "Using S3 media storage");
            Arc::new(storage)
        }
        "local" => {
            let storage = fanray_storage::LocalDiskStorage::new(
                config.storage.local_root.clone(),
                config.storage.base_url.clone(),
            );
            tracing::info!(root = %config.storage.local_root, "Using local disk media storage");
            Arc::new(storage)
        }
        other => panic!("Unknown STORAGE_PROVIDER '{other}' (expected 'local' or 's3')"),
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
