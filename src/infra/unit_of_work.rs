//! Unit of Work pattern implementation.
//!
//! Centralizes access to the repositories over one shared connection.
//! Every store write is a single keyed statement, so no multi-statement
//! transaction is exposed here.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use std::sync::Arc;

use super::repositories::{OrderRepository, OrderStore, UserRepository, UserStore};
use crate::errors::{AppResult, StoreResultExt};

/// Unit of Work trait for dependency injection.
///
/// Services are generic over this trait; tests substitute an in-memory
/// implementation.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Get order repository
    fn orders(&self) -> Arc<dyn OrderRepository>;

    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Check store connectivity
    async fn ping(&self) -> AppResult<()>;
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    order_repo: Arc<OrderStore>,
    user_repo: Arc<UserStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        let order_repo = Arc::new(OrderStore::new(db.clone()));
        let user_repo = Arc::new(UserStore::new(db.clone()));
        Self {
            db,
            order_repo,
            user_repo,
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn orders(&self) -> Arc<dyn OrderRepository> {
        self.order_repo.clone()
    }

    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    async fn ping(&self) -> AppResult<()> {
        self.db
            .execute(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await
            .store_context("ping", "-")?;
        Ok(())
    }
}
