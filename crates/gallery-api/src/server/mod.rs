//! Server setup and initialization
//!
//! Picks the like store backend from the store URL scheme, wires its change
//! feed into the hub, and runs the HTTP server.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use gallery_cache::{
    LocalNotifier, MemoryLikeRepository, PubSubChannel, Publisher, RedisLikeRepository, RedisPool,
    SubscriberBuilder,
};
use gallery_common::{AppConfig, AppError, StoreBackend};
use gallery_core::{ChangeNotifier, LikeRepository};
use gallery_db::{create_pool, run_migrations, DatabaseConfig, DatabaseNotifier, PgChangeFeed, PgLikeRepository};
use gallery_service::{HttpImageCatalog, LikeHub, ServiceContextBuilder};
use tokio::net::TcpListener;
use tracing::info;

use crate::middleware::{apply_middleware, apply_middleware_with_config};
use crate::routes::{create_router, health_routes};
use crate::state::{AppState, FeedTasks};

/// Like store, its notifier, and the tasks feeding the hub
type StoreParts = (Arc<dyn LikeRepository>, Arc<dyn ChangeNotifier>, FeedTasks);

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let config = state.config();
    // Leave the image service its full timeout before answering 503
    let request_timeout = Duration::from_secs(config.image_service.timeout_secs + 5);

    let api = apply_middleware_with_config(
        create_router(config.image_service.max_upload_bytes()),
        &config.rate_limit,
        &config.cors,
        config.app.env.is_production(),
        request_timeout,
    );
    let health = apply_middleware(health_routes(), request_timeout);

    api.merge(health).with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: AppConfig) -> Result<AppState, AppError> {
    let hub = LikeHub::new(config.stream.buffer);
    let backend = config
        .store
        .backend()
        .map_err(|e| AppError::Config(e.to_string()))?;

    let (likes, notifier, feeds) = match backend {
        StoreBackend::Memory => memory_store(&hub),
        StoreBackend::Redis => redis_store(&config, &hub).await?,
        StoreBackend::Postgres => postgres_store(&config, &hub).await?,
    };
    info!(
        backend = likes.backend(),
        notifier = notifier.name(),
        feeds = feeds.len(),
        "Like store ready"
    );

    let catalog = Arc::new(HttpImageCatalog::new(&config.image_service)?);

    let service_context = ServiceContextBuilder::new()
        .likes(likes)
        .notifier(notifier)
        .catalog(catalog)
        .hub(hub)
        .max_upload_bytes(config.image_service.max_upload_bytes())
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context, config, feeds))
}

/// In-process store; events go straight into the hub
fn memory_store(hub: &LikeHub) -> StoreParts {
    info!("Using in-memory like store");
    (
        Arc::new(MemoryLikeRepository::new()),
        Arc::new(LocalNotifier::new(hub.sender())),
        FeedTasks::new(),
    )
}

/// Redis store with pub/sub fan-out across instances
async fn redis_store(config: &AppConfig, hub: &LikeHub) -> Result<StoreParts, AppError> {
    info!("Connecting to Redis...");
    let pool = RedisPool::from_config(&config.store).map_err(|e| AppError::Cache(e.to_string()))?;
    pool.health_check()
        .await
        .map_err(|e| AppError::Cache(e.to_string()))?;
    info!("Redis connection established");

    let channel = PubSubChannel::parse(&config.store.channel);
    let subscriber = SubscriberBuilder::new()
        .redis_url(&config.store.url)
        .password(config.store.token.clone())
        .broadcast_buffer(config.stream.buffer)
        .subscribe(channel.clone())
        .build()
        .await
        .map_err(|e| AppError::Cache(e.to_string()))?;
    let forwarder = subscriber.forward_events(hub.sender());

    Ok((
        Arc::new(RedisLikeRepository::new(pool.clone())),
        Arc::new(Publisher::with_channel(pool, channel)),
        FeedTasks::new().with_task(forwarder).with_subscriber(subscriber),
    ))
}

/// PostgreSQL store; the table trigger emits the change feed
async fn postgres_store(config: &AppConfig, hub: &LikeHub) -> Result<StoreParts, AppError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&DatabaseConfig::from(&config.store))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    run_migrations(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    let feed = PgChangeFeed::new(pool.clone()).spawn(hub.sender());

    Ok((
        Arc::new(PgLikeRepository::new(pool)),
        Arc::new(DatabaseNotifier),
        FeedTasks::new().with_task(feed),
    ))
}

/// Run the HTTP server until Ctrl-C
pub async fn run_server(app: Router, addr: &str, hub: LikeHub) -> Result<(), AppError> {
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    serve_until(listener, app, hub, shutdown_signal()).await
}

/// Serve until `signal` resolves, then close like streams and drain.
///
/// Open streams would otherwise keep graceful shutdown waiting forever.
pub async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    hub: LikeHub,
    signal: F,
) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            hub.shutdown();
        })
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.api.address();

    // Create app state
    let state = create_app_state(config).await?;
    let hub = state.hub().clone();

    // Build application
    let app = create_app(state);

    // Run server
    run_server(app, &addr, hub).await
}
