//! Sync command - One reconciliation run from the command line.

use crate::cli::args::SyncArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;
use crate::services::{ServiceContainer, Services, SyncMode};

/// Execute the sync command
pub async fn execute(args: SyncArgs, config: Config) -> AppResult<()> {
    let mode = if args.fast { SyncMode::Fast } else { SyncMode::Full };
    tracing::info!(?mode, "Reconciling order feed...");

    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let services = Services::from_connection(db.get_connection(), &config)?;

    let report = services.sync().reconcile(mode).await?;

    println!("fetched:   {}", report.fetched);
    println!("imported:  {}", report.imported);
    println!("updated:   {}", report.updated);
    println!("unchanged: {}", report.unchanged);
    println!("skipped:   {}", report.skipped);
    println!("failed:    {}", report.failed);

    Ok(())
}
