//! Order record store.
//!
//! Every write is a single statement keyed by `order_id`, so each one is
//! atomic on its own. Feed writes and staff writes touch disjoint columns.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, OnConflict, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, TryInsertResult,
};

use super::entities::order_progress::{self, done_column, ActiveModel, Entity as OrderEntity};
use crate::domain::{FeedFields, Order, OrderKey, Stage};
use crate::errors::{AppResult, StoreResultExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Order repository trait for dependency injection.
///
/// Mutations return `false` when no row matched `order_id`.
/// List queries are ordered most-recently-updated first.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Find an order by external id or display name
    async fn find_by_key(&self, key: &OrderKey) -> AppResult<Option<Order>>;

    /// Find an order by exact external id
    async fn find_by_id(&self, order_id: &str) -> AppResult<Option<Order>>;

    /// Insert a new order unless one with the same id exists.
    /// Returns `true` only when a row was inserted.
    async fn insert_if_absent(&self, order: Order) -> AppResult<bool>;

    /// Overwrite feed-owned fields and `updated_at`
    async fn update_feed_fields(
        &self,
        order_id: &str,
        fields: FeedFields,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Set one stage flag
    async fn mark_stage_done(&self, order_id: &str, stage: Stage, at: DateTime<Utc>)
        -> AppResult<bool>;

    async fn set_design_assignee(
        &self,
        order_id: &str,
        username: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    async fn set_dispatch_date(
        &self,
        order_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Store the design image reference and mark design done
    async fn attach_design_image(
        &self,
        order_id: &str,
        file: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// All orders
    async fn list_all(&self) -> AppResult<Vec<Order>>;

    /// Orders whose first unfinished stage is `stage`
    async fn list_pending_at(&self, stage: Stage) -> AppResult<Vec<Order>>;

    /// Number of orders pending at `stage`, optionally restricted to
    /// `start <= updated_at < end`
    async fn count_pending_at(
        &self,
        stage: Stage,
        updated_within: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> AppResult<u64>;

    /// Number of orders with every stage done and `start <= updated_at < end`
    async fn count_complete(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<u64>;

    /// Orders pending at design, counted per assignee; unassigned orders
    /// are left out
    async fn count_design_pending_by_assignee(&self) -> AppResult<Vec<(String, u64)>>;

    /// Orders with `start <= created_at < end`
    async fn list_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Order>>;

    /// Orders with `first <= dispatch_date <= last`
    async fn list_dispatch_between(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> AppResult<Vec<Order>>;
}

/// Concrete implementation of OrderRepository
pub struct OrderStore {
    db: DatabaseConnection,
}

impl OrderStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn list_where(&self, condition: Condition, operation: &'static str) -> AppResult<Vec<Order>> {
        let models = OrderEntity::find()
            .filter(condition)
            .order_by_desc(order_progress::Column::UpdatedAt)
            .all(&self.db)
            .await
            .store_context(operation, "*")?;

        Ok(models.into_iter().map(Order::from).collect())
    }

    async fn count_where(&self, condition: Condition, operation: &'static str) -> AppResult<u64> {
        OrderEntity::find()
            .filter(condition)
            .count(&self.db)
            .await
            .store_context(operation, "*")
    }

    async fn update_where_id(
        &self,
        order_id: &str,
        operation: &'static str,
        columns: Vec<(order_progress::Column, SimpleExpr)>,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut update = OrderEntity::update_many()
            .col_expr(order_progress::Column::UpdatedAt, Expr::value(at));
        for (column, value) in columns {
            update = update.col_expr(column, value);
        }

        let result = update
            .filter(order_progress::Column::OrderId.eq(order_id))
            .exec(&self.db)
            .await
            .store_context(operation, order_id)?;

        Ok(result.rows_affected > 0)
    }
}

/// Condition selecting orders pending at `stage`.
pub fn pending_condition(stage: Stage) -> Condition {
    stage
        .predecessors()
        .iter()
        .fold(Condition::all().add(done_column(stage).eq(false)), |cond, prior| {
            cond.add(done_column(*prior).eq(true))
        })
}

/// Condition selecting `start <= updated_at < end`.
fn updated_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(order_progress::Column::UpdatedAt.gte(start))
        .add(order_progress::Column::UpdatedAt.lt(end))
}

/// `design_assignee, COUNT(order_id)` over design-pending orders.
fn design_backlog_query() -> Select<OrderEntity> {
    use order_progress::Column;

    OrderEntity::find()
        .select_only()
        .column(Column::DesignAssignee)
        .column_as(Expr::col((OrderEntity, Column::OrderId)).count(), "pending")
        .filter(pending_condition(Stage::Design))
        .filter(Column::DesignAssignee.is_not_null())
        .group_by(Column::DesignAssignee)
}

#[async_trait]
impl OrderRepository for OrderStore {
    async fn find_by_key(&self, key: &OrderKey) -> AppResult<Option<Order>> {
        let matches = OrderEntity::find()
            .filter(
                Condition::any()
                    .add(order_progress::Column::OrderId.eq(key.as_order_id()))
                    .add(order_progress::Column::OrderName.eq(key.as_display_name())),
            )
            .all(&self.db)
            .await
            .store_context("find_order_by_key", key.as_order_id())?;

        // An exact id match wins over a display-name match
        let mut orders: Vec<Order> = matches.into_iter().map(Order::from).collect();
        orders.sort_by_key(|o| o.order_id != key.as_order_id());
        Ok(orders.into_iter().next())
    }

    async fn find_by_id(&self, order_id: &str) -> AppResult<Option<Order>> {
        let model = OrderEntity::find_by_id(order_id.to_string())
            .one(&self.db)
            .await
            .store_context("find_order_by_id", order_id)?;

        Ok(model.map(Order::from))
    }

    async fn insert_if_absent(&self, order: Order) -> AppResult<bool> {
        let order_id = order.order_id.clone();
        let active: ActiveModel = order.into();

        let result = OrderEntity::insert(active)
            .on_conflict(
                OnConflict::column(order_progress::Column::OrderId)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await
            .store_context("insert_order", &order_id)?;

        Ok(matches!(result, TryInsertResult::Inserted(_)))
    }

    async fn update_feed_fields(
        &self,
        order_id: &str,
        fields: FeedFields,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        use order_progress::Column;

        let columns = vec![
            (Column::CustomerName, Expr::value(fields.customer_name)),
            (Column::TotalPrice, Expr::value(fields.total_price)),
            (Column::FulfillmentStatus, Expr::value(fields.fulfillment_status)),
            (Column::PaymentStatus, Expr::value(fields.payment_status)),
            (Column::ShippingMethod, Expr::value(fields.shipping_method)),
            (Column::ItemCount, Expr::value(fields.item_count)),
            (Column::Tags, Expr::value(fields.tags)),
            (Column::Address, Expr::value(fields.address)),
        ];
        self.update_where_id(order_id, "update_feed_fields", columns, at)
            .await
    }

    async fn mark_stage_done(
        &self,
        order_id: &str,
        stage: Stage,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let columns = vec![(done_column(stage), Expr::value(true))];
        self.update_where_id(order_id, "mark_stage_done", columns, at)
            .await
    }

    async fn set_design_assignee(
        &self,
        order_id: &str,
        username: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let columns = vec![(
            order_progress::Column::DesignAssignee,
            Expr::value(username.to_string()),
        )];
        self.update_where_id(order_id, "set_design_assignee", columns, at)
            .await
    }

    async fn set_dispatch_date(
        &self,
        order_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let columns = vec![(order_progress::Column::DispatchDate, Expr::value(date))];
        self.update_where_id(order_id, "set_dispatch_date", columns, at)
            .await
    }

    async fn attach_design_image(
        &self,
        order_id: &str,
        file: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let columns = vec![
            (order_progress::Column::DesignImage, Expr::value(file.to_string())),
            (order_progress::Column::DesignDone, Expr::value(true)),
        ];
        self.update_where_id(order_id, "attach_design_image", columns, at)
            .await
    }

    async fn list_all(&self) -> AppResult<Vec<Order>> {
        self.list_where(Condition::all(), "list_orders").await
    }

    async fn list_pending_at(&self, stage: Stage) -> AppResult<Vec<Order>> {
        self.list_where(pending_condition(stage), "list_pending_orders")
            .await
    }

    async fn count_pending_at(
        &self,
        stage: Stage,
        updated_within: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> AppResult<u64> {
        let mut condition = pending_condition(stage);
        if let Some((start, end)) = updated_within {
            condition = condition.add(updated_between(start, end));
        }
        self.count_where(condition, "count_pending_orders").await
    }

    async fn count_complete(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<u64> {
        let condition = Stage::ALL
            .into_iter()
            .fold(Condition::all(), |cond, stage| cond.add(done_column(stage).eq(true)))
            .add(updated_between(start, end));
        self.count_where(condition, "count_complete_orders").await
    }

    async fn count_design_pending_by_assignee(&self) -> AppResult<Vec<(String, u64)>> {
        let rows: Vec<(String, i64)> = design_backlog_query()
            .into_tuple()
            .all(&self.db)
            .await
            .store_context("count_design_pending_by_assignee", "*")?;

        Ok(rows
            .into_iter()
            .map(|(assignee, pending)| (assignee, u64::try_from(pending).unwrap_or(0)))
            .collect())
    }

    async fn list_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Order>> {
        let condition = Condition::all()
            .add(order_progress::Column::CreatedAt.gte(start))
            .add(order_progress::Column::CreatedAt.lt(end));
        self.list_where(condition, "list_orders_created_between")
            .await
    }

    async fn list_dispatch_between(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> AppResult<Vec<Order>> {
        let condition = Condition::all()
            .add(order_progress::Column::DispatchDate.gte(first))
            .add(order_progress::Column::DispatchDate.lte(last));
        self.list_where(condition, "list_orders_by_dispatch_date")
            .await
    }
}
