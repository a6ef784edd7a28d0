//! Service Container - Centralized service access.
//!
//! Builds every service over one shared Unit of Work and hands them out
//! behind their traits.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, OrderManager, OrderService, ReportManager, ReportService,
    SyncManager, SyncService, UserManager, UserService,
};
use crate::config::Config;
use crate::domain::LocalCalendar;
use crate::errors::AppResult;
use crate::infra::{DesignStorage, LocalDesignStorage, OrderFeed, Persistence, ShopifyFeed, UnitOfWork};

/// Service container trait for dependency injection.
///
/// Provides centralized access to all application services.
pub trait ServiceContainer: Send + Sync {
    fn orders(&self) -> Arc<dyn OrderService>;

    fn sync(&self) -> Arc<dyn SyncService>;

    fn reports(&self) -> Arc<dyn ReportService>;

    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    /// Store handle used for health checks
    fn store(&self) -> Arc<dyn UnitOfWork>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    order_service: Arc<dyn OrderService>,
    sync_service: Arc<dyn SyncService>,
    report_service: Arc<dyn ReportService>,
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    store: Arc<dyn UnitOfWork>,
}

impl Services {
    /// Wire every service over `uow`.
    pub fn build<U: UnitOfWork + 'static>(
        uow: Arc<U>,
        feed: Arc<dyn OrderFeed>,
        storage: Arc<dyn DesignStorage>,
        calendar: LocalCalendar,
        config: &Config,
    ) -> Self {
        Self {
            order_service: Arc::new(OrderManager::new(
                uow.clone(),
                storage,
                calendar.clone(),
                config.advance_policy,
            )),
            sync_service: Arc::new(SyncManager::new(
                uow.clone(),
                feed,
                calendar.clone(),
                config.sync_recent_days,
            )),
            report_service: Arc::new(ReportManager::new(uow.clone(), calendar)),
            auth_service: Arc::new(Authenticator::new(uow.clone())),
            user_service: Arc::new(UserManager::new(uow.clone())),
            store: uow,
        }
    }

    /// Create service container from database connection and config
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: &Config) -> AppResult<Self> {
        let uow = Arc::new(Persistence::new(db));
        let feed = Arc::new(ShopifyFeed::new(config.feed.clone())?);
        let storage = Arc::new(LocalDesignStorage::new(config.upload_dir.clone()));
        let calendar = LocalCalendar::system(config.local_offset);

        Ok(Self::build(uow, feed, storage, calendar, config))
    }
}

impl ServiceContainer for Services {
    fn orders(&self) -> Arc<dyn OrderService> {
        self.order_service.clone()
    }

    fn sync(&self) -> Arc<dyn SyncService> {
        self.sync_service.clone()
    }

    fn reports(&self) -> Arc<dyn ReportService> {
        self.report_service.clone()
    }

    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn store(&self) -> Arc<dyn UnitOfWork> {
        self.store.clone()
    }
}
