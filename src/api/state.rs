//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{Database, UnitOfWork};
use crate::services::{
    AuthService, OrderService, ReportService, ServiceContainer, Services, SyncService,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Stage progression and order mutations
    pub order_service: Arc<dyn OrderService>,
    /// Feed reconciliation
    pub sync_service: Arc<dyn SyncService>,
    /// Read-only reports
    pub report_service: Arc<dyn ReportService>,
    /// Credential check
    pub auth_service: Arc<dyn AuthService>,
    /// Directory served under the uploads route
    pub upload_dir: PathBuf,
    store: Arc<dyn UnitOfWork>,
}

impl AppState {
    /// Create application state from database connection and config.
    pub fn from_config(database: &Database, config: &Config) -> AppResult<Self> {
        let container = Services::from_connection(database.get_connection(), config)?;
        Ok(Self::from_container(&container, config.upload_dir.clone()))
    }

    /// Create application state from an already wired container.
    pub fn from_container(container: &dyn ServiceContainer, upload_dir: PathBuf) -> Self {
        Self {
            order_service: container.orders(),
            sync_service: container.sync(),
            report_service: container.reports(),
            auth_service: container.auth(),
            upload_dir,
            store: container.store(),
        }
    }

    /// Check store connectivity.
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}
