//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache and broker setup, and the Axum server
//! lifecycle.

use crate::config::Config;
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::infrastructure::broker::{EventBroker, RedisStreamBroker};
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{PgClickRepository, PgLinkRepository};
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Redis cache (or NullCache fallback)
/// - Event broker and the click queue
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - No broker is configured or the click queue cannot be declared
/// - Server bind fails
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;

    let cache: Arc<dyn CacheService> = if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        }
    } else {
        tracing::info!("Cache disabled (NullCache)");
        Arc::new(NullCache::new())
    };

    let broker = connect_broker(&config).await?;

    let pool = Arc::new(pool);
    let links: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(Arc::clone(&pool)));
    let clicks: Arc<dyn ClickRepository> = Arc::new(PgClickRepository::new(Arc::clone(&pool)));

    let state = AppState::new(
        links,
        clicks,
        cache,
        Arc::clone(&broker),
        config.cache_ttl(),
        config.click_queue.clone(),
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    broker.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Opens the connection pool and applies pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn connect_database(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(pool)
}

/// Connects the event broker and declares the click queue.
///
/// # Errors
///
/// Returns an error if no broker URL is configured or the broker is
/// unreachable. Startup cannot continue without it.
pub async fn connect_broker(config: &Config) -> Result<Arc<dyn EventBroker>> {
    let broker_url = config.require_broker_url()?;

    let broker = RedisStreamBroker::connect(broker_url, config.click_consumer_group.clone())
        .await
        .context("Failed to connect to event broker")?
        .with_claim_idle(config.click_claim_idle());

    broker
        .declare_queue(&config.click_queue)
        .await
        .with_context(|| format!("Failed to declare queue '{}'", config.click_queue))?;

    Ok(Arc::new(broker))
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to register SIGTERM handler: {}", e);
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

    tracing::info!("Shutting down gracefully...");
}
