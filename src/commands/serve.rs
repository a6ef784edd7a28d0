//! Serve command - Starts the HTTP server.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;
use crate::services::{SyncMode, SyncService};

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    // Connect and apply pending migrations
    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    tracing::info!("Database connected");

    let app_state = AppState::from_config(&db, &config)?;

    let sync_task = (config.sync_interval_secs > 0).then(|| {
        spawn_periodic_sync(
            app_state.sync_service.clone(),
            Duration::from_secs(config.sync_interval_secs),
        )
    });

    let app = create_router(app_state);

    if let Some(host) = args.host {
        config.server_host = host;
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }
    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(task) = sync_task {
        task.abort();
    }
    tracing::info!("Server stopped");

    Ok(())
}

/// Run a fast reconciliation every `period`, logging failures.
fn spawn_periodic_sync(sync: Arc<dyn SyncService>, period: Duration) -> JoinHandle<()> {
    tracing::info!(interval_secs = period.as_secs(), "Periodic order sync enabled");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match sync.reconcile(SyncMode::Fast).await {
                Ok(report) => tracing::info!(
                    fetched = report.fetched,
                    imported = report.imported,
                    updated = report.updated,
                    failed = report.failed,
                    "Periodic sync finished"
                ),
                Err(e) => tracing::error!(error = %e, "Periodic sync failed"),
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
