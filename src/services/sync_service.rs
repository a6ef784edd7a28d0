//! Sync service - Mirrors the external order feed into the order store.
//!
//! Only feed-owned fields are ever written for an existing order. Stage
//! flags, assignee, dispatch date and design image belong to staff.
//! A failing record is logged and skipped; a failing feed fetch aborts
//! the run before anything is written.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::domain::{ExternalOrder, LocalCalendar, Order};
use crate::errors::{AppError, AppResult};
use crate::infra::{OrderFeed, UnitOfWork};

/// How much of the fetched page to reconcile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Every record on the page
    #[default]
    Full,
    /// Only records created on or after the recent-days cutoff
    Fast,
}

impl std::str::FromStr for SyncMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(SyncMode::Full),
            "fast" => Ok(SyncMode::Fast),
            other => Err(AppError::validation(format!(
                "Unknown sync mode '{}', expected 'full' or 'fast'",
                other
            ))),
        }
    }
}

/// Outcome counts of one reconciliation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncReport {
    /// Records returned by the feed
    pub fetched: usize,
    /// New orders inserted
    pub imported: usize,
    /// Existing orders whose feed fields changed
    pub updated: usize,
    /// Existing orders already up to date
    pub unchanged: usize,
    /// Records older than the fast-mode cutoff
    pub skipped: usize,
    /// Malformed records or per-record store failures
    pub failed: usize,
}

enum RecordOutcome {
    Imported,
    Updated,
    Unchanged,
    Skipped,
}

/// Sync service trait for dependency injection.
#[async_trait]
pub trait SyncService: Send + Sync {
    /// Run one reconciliation pass against the feed
    async fn reconcile(&self, mode: SyncMode) -> AppResult<SyncReport>;
}

/// Concrete implementation of SyncService using Unit of Work.
pub struct SyncManager<U: UnitOfWork> {
    uow: Arc<U>,
    feed: Arc<dyn OrderFeed>,
    calendar: LocalCalendar,
    recent_days: u32,
}

impl<U: UnitOfWork> SyncManager<U> {
    pub fn new(
        uow: Arc<U>,
        feed: Arc<dyn OrderFeed>,
        calendar: LocalCalendar,
        recent_days: u32,
    ) -> Self {
        Self {
            uow,
            feed,
            calendar,
            recent_days,
        }
    }

    /// Start of the local day `recent_days` before today.
    fn fast_cutoff(&self) -> DateTime<Utc> {
        let first_day = self.calendar.today() - Duration::days(i64::from(self.recent_days));
        self.calendar.start_of_day(first_day)
    }

    async fn reconcile_record(
        &self,
        raw: serde_json::Value,
        cutoff: Option<DateTime<Utc>>,
    ) -> AppResult<RecordOutcome> {
        let record = ExternalOrder::from_json(raw)?.normalize()?;

        if cutoff.is_some_and(|cutoff| record.created_at < cutoff) {
            return Ok(RecordOutcome::Skipped);
        }

        let orders = self.uow.orders();
        let Some(existing) = orders.find_by_id(&record.order_id).await? else {
            let order_id = record.order_id.clone();
            // A concurrent run may have inserted the same id first
            return Ok(if orders.insert_if_absent(Order::from_feed(record)).await? {
                tracing::debug!(order_id = %order_id, "Imported order");
                RecordOutcome::Imported
            } else {
                RecordOutcome::Unchanged
            });
        };

        if existing.feed_fields() == record.fields {
            return Ok(RecordOutcome::Unchanged);
        }

        let written = orders
            .update_feed_fields(&record.order_id, record.fields, self.calendar.now())
            .await?;
        if !written {
            return Err(AppError::not_found("Order"));
        }
        tracing::debug!(order_id = %record.order_id, "Refreshed feed fields");
        Ok(RecordOutcome::Updated)
    }
}

#[async_trait]
impl<U: UnitOfWork> SyncService for SyncManager<U> {
    async fn reconcile(&self, mode: SyncMode) -> AppResult<SyncReport> {
        let records = self.feed.fetch_recent().await?;

        let cutoff = match mode {
            SyncMode::Full => None,
            SyncMode::Fast => Some(self.fast_cutoff()),
        };

        let mut report = SyncReport {
            fetched: records.len(),
            ..SyncReport::default()
        };

        for raw in records {
            let hint = raw.get("id").map(|id| id.to_string()).unwrap_or_default();
            match self.reconcile_record(raw, cutoff).await {
                Ok(RecordOutcome::Imported) => report.imported += 1,
                Ok(RecordOutcome::Updated) => report.updated += 1,
                Ok(RecordOutcome::Unchanged) => report.unchanged += 1,
                Ok(RecordOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(order_id = %hint, error = %e, "Skipping feed record");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            ?mode,
            fetched = report.fetched,
            imported = report.imported,
            updated = report.updated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            failed = report.failed,
            "Order sync finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FixedClock;
    use crate::infra::{MockOrderFeed, MockOrderRepository, MockUserRepository};
    use crate::services::test_support::{order, StubUnitOfWork};
    use chrono::FixedOffset;
    use mockall::predicate::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2024-06-10T06:00:00Z".parse().unwrap()
    }

    fn manager(orders: MockOrderRepository, feed: MockOrderFeed) -> SyncManager<StubUnitOfWork> {
        SyncManager::new(
            Arc::new(StubUnitOfWork::new(orders, MockUserRepository::new())),
            Arc::new(feed),
            LocalCalendar::new(
                FixedOffset::east_opt(330 * 60).unwrap(),
                Arc::new(FixedClock(now())),
            ),
            1,
        )
    }

    fn feed_with(records: Vec<serde_json::Value>) -> MockOrderFeed {
        let mut feed = MockOrderFeed::new();
        feed.expect_fetch_recent()
            .returning(move || Ok(records.clone()));
        feed
    }

    fn record(id: u64, created_at: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": format!("#{}", id),
            "customer": {"first_name": "Test", "last_name": "Customer"},
            "total_price": "999.00",
            "fulfillment_status": null,
            "financial_status": "paid",
            "shipping_lines": [{"title": "Standard"}],
            "line_items": [{"quantity": 1}],
            "tags": "",
            "shipping_address": null,
            "created_at": created_at,
        })
    }

    #[tokio::test]
    async fn test_new_order_inserted_with_feed_timestamps() {
        let mut orders = MockOrderRepository::new();
        orders.expect_find_by_id().returning(|_| Ok(None));
        orders
            .expect_insert_if_absent()
            .withf(|o| {
                o.order_id == "1001"
                    && o.created_at == o.updated_at
                    && o.created_at.to_rfc3339() == "2024-06-09T22:00:00+00:00"
                    && o.pending_stage() == Some(crate::domain::Stage::Design)
            })
            .times(1)
            .returning(|_| Ok(true));

        let service = manager(orders, feed_with(vec![record(1001, "2024-06-10T03:30:00+05:30")]));
        let report = service.reconcile(SyncMode::Full).await.unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.fetched, 1);
    }

    #[tokio::test]
    async fn test_unchanged_order_is_not_written() {
        let created = "2024-06-09T22:00:00Z".parse().unwrap();
        let stored = order("1001", "#1001", created);

        let mut orders = MockOrderRepository::new();
        orders
            .expect_find_by_id()
            .with(eq("1001"))
            .returning(move |_| Ok(Some(stored.clone())));
        orders.expect_update_feed_fields().never();
        orders.expect_insert_if_absent().never();

        let service = manager(orders, feed_with(vec![record(1001, "2024-06-09T22:00:00Z")]));
        let report = service.reconcile(SyncMode::Full).await.unwrap();

        assert_eq!(report.unchanged, 1);
        assert_eq!(report.imported, 0);
    }

    #[tokio::test]
    async fn test_changed_order_updates_feed_fields_only() {
        let created = "2024-06-09T22:00:00Z".parse().unwrap();
        let mut stored = order("1001", "#1001", created);
        stored.payment_status = "pending".into();

        let mut orders = MockOrderRepository::new();
        orders
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        orders
            .expect_update_feed_fields()
            .withf(|id, fields, at| id == "1001" && fields.payment_status == "paid" && *at == now())
            .times(1)
            .returning(|_, _, _| Ok(true));

        let service = manager(orders, feed_with(vec![record(1001, "2024-06-09T22:00:00Z")]));
        let report = service.reconcile(SyncMode::Full).await.unwrap();

        assert_eq!(report.updated, 1);
    }

    #[tokio::test]
    async fn test_update_matching_no_row_counts_as_failed() {
        let created = "2024-06-09T22:00:00Z".parse().unwrap();
        let mut stored = order("1001", "#1001", created);
        stored.payment_status = "pending".into();

        let mut orders = MockOrderRepository::new();
        orders
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        // Row deleted between the read and the write
        orders
            .expect_update_feed_fields()
            .times(1)
            .returning(|_, _, _| Ok(false));

        let service = manager(orders, feed_with(vec![record(1001, "2024-06-09T22:00:00Z")]));
        let report = service.reconcile(SyncMode::Full).await.unwrap();

        assert_eq!((report.updated, report.failed), (0, 1));
    }

    #[tokio::test]
    async fn test_sub_cent_price_matches_stored_total() {
        let created = "2024-06-09T22:00:00Z".parse().unwrap();
        let mut stored = order("1001", "#1001", created);
        stored.total_price = Decimal::new(1235, 2);

        let mut orders = MockOrderRepository::new();
        orders
            .expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        orders.expect_update_feed_fields().never();

        let mut raw = record(1001, "2024-06-09T22:00:00Z");
        raw["total_price"] = json!("12.345");
        let service = manager(orders, feed_with(vec![raw]));
        let report = service.reconcile(SyncMode::Full).await.unwrap();

        assert_eq!((report.unchanged, report.updated), (1, 0));
    }

    #[tokio::test]
    async fn test_malformed_record_does_not_abort_batch() {
        let mut orders = MockOrderRepository::new();
        orders.expect_find_by_id().returning(|_| Ok(None));
        orders.expect_insert_if_absent().times(1).returning(|_| Ok(true));

        let records = vec![
            json!({"id": 1, "name": "#1"}),
            json!("not an order"),
            record(1002, "2024-06-10T01:00:00Z"),
        ];
        let service = manager(orders, feed_with(records));
        let report = service.reconcile(SyncMode::Full).await.unwrap();

        assert_eq!(report.failed, 2);
        assert_eq!(report.imported, 1);
    }

    #[tokio::test]
    async fn test_store_failure_on_one_record_is_isolated() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_find_by_id()
            .with(eq("1"))
            .returning(|_| Err(AppError::internal("connection reset")));
        orders
            .expect_find_by_id()
            .with(eq("2"))
            .returning(|_| Ok(None));
        orders.expect_insert_if_absent().times(1).returning(|_| Ok(true));

        let service = manager(
            orders,
            feed_with(vec![
                record(1, "2024-06-10T01:00:00Z"),
                record(2, "2024-06-10T01:00:00Z"),
            ]),
        );
        let report = service.reconcile(SyncMode::Full).await.unwrap();

        assert_eq!((report.failed, report.imported), (1, 1));
    }

    #[tokio::test]
    async fn test_fast_mode_skips_records_before_cutoff() {
        // Cutoff: start of 2024-06-09 local = 2024-06-08T18:30:00Z
        let mut orders = MockOrderRepository::new();
        orders
            .expect_find_by_id()
            .with(eq("2"))
            .returning(|_| Ok(None));
        orders.expect_insert_if_absent().times(1).returning(|_| Ok(true));

        let service = manager(
            orders,
            feed_with(vec![
                record(1, "2024-06-08T18:29:59Z"),
                record(2, "2024-06-08T18:30:00Z"),
            ]),
        );
        let report = service.reconcile(SyncMode::Fast).await.unwrap();

        assert_eq!((report.skipped, report.imported), (1, 1));
    }

    #[tokio::test]
    async fn test_feed_failure_aborts_before_any_write() {
        let mut orders = MockOrderRepository::new();
        orders.expect_find_by_id().never();

        let mut feed = MockOrderFeed::new();
        feed.expect_fetch_recent()
            .returning(|| Err(AppError::upstream("HTTP 401")));

        let service = manager(orders, feed);
        let err = service.reconcile(SyncMode::Full).await.unwrap_err();

        assert!(matches!(err, AppError::UpstreamFeed(_)));
    }

    #[test]
    fn test_sync_mode_parse() {
        assert_eq!("fast".parse::<SyncMode>().unwrap(), SyncMode::Fast);
        assert_eq!("full".parse::<SyncMode>().unwrap(), SyncMode::Full);
        assert!("FAST".parse::<SyncMode>().is_err());
    }

    #[tokio::test]
    async fn test_insert_conflict_counts_as_unchanged() {
        let mut orders = MockOrderRepository::new();
        orders.expect_find_by_id().returning(|_| Ok(None));
        orders.expect_insert_if_absent().returning(|_| Ok(false));

        let service = manager(orders, feed_with(vec![record(7, "2024-06-10T01:00:00Z")]));
        let report = service.reconcile(SyncMode::Full).await.unwrap();

        assert_eq!((report.imported, report.unchanged, report.failed), (0, 1, 0));
    }
}
