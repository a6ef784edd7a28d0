//! External order feed.
//!
//! The feed is read-only: one bounded page of the most recent orders,
//! returned as raw JSON records so that each record can be decoded
//! (and rejected) on its own.

mod client;

use async_trait::async_trait;

use crate::errors::AppResult;

pub use client::ShopifyFeed;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Source of external orders for reconciliation.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderFeed: Send + Sync {
    /// Fetch the most recent page of orders, any status, newest first.
    ///
    /// Any non-success response fails the whole fetch.
    async fn fetch_recent(&self) -> AppResult<Vec<serde_json::Value>>;
}
