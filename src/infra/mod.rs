//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connections, migrations and repositories
//! - The external order feed client
//! - Design image file storage

pub mod db;
pub mod feed;
pub mod repositories;
pub mod storage;
pub mod unit_of_work;

pub use db::{Database, Migrator};
pub use feed::{OrderFeed, ShopifyFeed};
pub use repositories::{OrderRepository, OrderStore, UserRepository, UserStore};
pub use storage::{DesignStorage, LocalDesignStorage};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use feed::MockOrderFeed;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{MockOrderRepository, MockUserRepository};
#[cfg(any(test, feature = "test-utils"))]
pub use storage::MockDesignStorage;
