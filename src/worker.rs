//! Analytics worker process.

use crate::config::Config;
use crate::domain::analytics_worker::{AnalyticsWorker, WorkerSettings};
use crate::domain::repositories::ClickRepository;
use crate::infrastructure::persistence::PgClickRepository;
use crate::server::{connect_broker, connect_database, shutdown_signal};

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs the click consumer until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns an error if the database or the broker is unreachable at startup.
/// Once consuming, broker disconnects are retried and never end the process.
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_database(&config).await?;
    let broker = connect_broker(&config).await?;

    let clicks: Arc<dyn ClickRepository> = Arc::new(PgClickRepository::new(Arc::new(pool)));
    let worker = AnalyticsWorker::new(
        Arc::clone(&broker),
        clicks,
        WorkerSettings::from_config(&config),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.cancel();
    });

    worker
        .run(cancel)
        .await
        .context("Analytics worker could not connect to the broker")?;

    broker.close().await;
    Ok(())
}
