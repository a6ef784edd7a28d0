//! Order service - Stage progression and staff-facing order mutations.
//!
//! Every mutation resolves the lookup key first and then writes by
//! `order_id`. The read side never infers a stage as done: an order is
//! pending at its first unfinished stage regardless of later flags.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::calendar::parse_iso_date;
use crate::domain::{LocalCalendar, Order, OrderKey, Stage, StageAdvancePolicy, UserRole};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{DesignStorage, UnitOfWork};

/// Order service trait for dependency injection.
///
/// Order keys accept either the raw external id or the display name
/// (`1023` and `#1023` resolve to the same order).
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Mark `stage` done and return the updated order
    async fn advance(&self, key: &str, stage: &str) -> AppResult<Order>;

    /// Assign an existing design-role user to the order
    async fn assign_designer(&self, key: &str, designer: &str) -> AppResult<Order>;

    /// Store a strict `YYYY-MM-DD` dispatch date
    async fn set_dispatch_date(&self, key: &str, date: &str) -> AppResult<Order>;

    /// Orders waiting on the stage owned by `role`
    async fn worklist(&self, role: &str, username: Option<&str>) -> AppResult<Vec<Order>>;

    /// Find a single order by id or display name
    async fn lookup(&self, key: &str) -> AppResult<Order>;

    /// Store a design image and mark design done; returns the file reference
    async fn attach_design(
        &self,
        key: &str,
        original_name: Option<String>,
        bytes: Vec<u8>,
    ) -> AppResult<String>;
}

/// Concrete implementation of OrderService using Unit of Work.
pub struct OrderManager<U: UnitOfWork> {
    uow: Arc<U>,
    storage: Arc<dyn DesignStorage>,
    calendar: LocalCalendar,
    policy: StageAdvancePolicy,
}

impl<U: UnitOfWork> OrderManager<U> {
    pub fn new(
        uow: Arc<U>,
        storage: Arc<dyn DesignStorage>,
        calendar: LocalCalendar,
        policy: StageAdvancePolicy,
    ) -> Self {
        Self {
            uow,
            storage,
            calendar,
            policy,
        }
    }

    async fn resolve(&self, key: &OrderKey) -> AppResult<Order> {
        self.uow
            .orders()
            .find_by_key(key)
            .await?
            .ok_or_not_found("Order")
    }

    /// Re-read after a keyed write; the row vanishing in between is a 404.
    async fn reload(&self, order_id: &str, written: bool) -> AppResult<Order> {
        if !written {
            return Err(AppError::not_found("Order"));
        }
        self.uow
            .orders()
            .find_by_id(order_id)
            .await?
            .ok_or_not_found("Order")
    }

    /// Design worklist rule: the designer's own orders, plus unassigned
    /// orders created today (local time) that nobody has claimed yet.
    fn visible_to_designer(&self, order: &Order, username: &str) -> bool {
        match order.design_assignee.as_deref() {
            Some(assignee) => assignee == username,
            None => self.calendar.local_date(order.created_at) == self.calendar.today(),
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> OrderService for OrderManager<U> {
    async fn advance(&self, key: &str, stage: &str) -> AppResult<Order> {
        let stage: Stage = stage.trim().parse()?;
        let key = OrderKey::parse(key)?;
        let order = self.resolve(&key).await?;

        self.policy.check(&order.stages, stage)?;

        let written = self
            .uow
            .orders()
            .mark_stage_done(&order.order_id, stage, self.calendar.now())
            .await?;

        tracing::info!(order_id = %order.order_id, stage = %stage, "Stage marked done");
        self.reload(&order.order_id, written).await
    }

    async fn assign_designer(&self, key: &str, designer: &str) -> AppResult<Order> {
        let key = OrderKey::parse(key)?;
        let designer = designer.trim();
        if designer.is_empty() {
            return Err(AppError::validation("Designer username is required"));
        }

        let order = self.resolve(&key).await?;

        let user = self
            .uow
            .users()
            .find_with_role(designer, UserRole::Design)
            .await?;
        if user.is_none() {
            tracing::warn!(order_id = %order.order_id, designer, "Rejected designer assignment");
            return Err(AppError::InvalidAssignee(designer.to_string()));
        }

        let written = self
            .uow
            .orders()
            .set_design_assignee(&order.order_id, designer, self.calendar.now())
            .await?;

        tracing::info!(order_id = %order.order_id, designer, "Designer assigned");
        self.reload(&order.order_id, written).await
    }

    async fn set_dispatch_date(&self, key: &str, date: &str) -> AppResult<Order> {
        let date = parse_iso_date(date, "date")?;
        let key = OrderKey::parse(key)?;
        let order = self.resolve(&key).await?;

        let written = self
            .uow
            .orders()
            .set_dispatch_date(&order.order_id, date, self.calendar.now())
            .await?;

        tracing::info!(order_id = %order.order_id, dispatch_date = %date, "Dispatch date set");
        self.reload(&order.order_id, written).await
    }

    async fn worklist(&self, role: &str, username: Option<&str>) -> AppResult<Vec<Order>> {
        let role: UserRole = role.trim().parse()?;
        let username = username.map(str::trim).filter(|u| !u.is_empty());

        let Some(stage) = role.stage() else {
            return self.uow.orders().list_all().await;
        };

        let pending = self.uow.orders().list_pending_at(stage).await?;
        if role != UserRole::Design {
            return Ok(pending);
        }

        let username = username
            .ok_or_else(|| AppError::validation("user is required for the design role"))?;
        Ok(pending
            .into_iter()
            .filter(|order| self.visible_to_designer(order, username))
            .collect())
    }

    async fn lookup(&self, key: &str) -> AppResult<Order> {
        let key = OrderKey::parse(key)?;
        self.resolve(&key).await
    }

    async fn attach_design(
        &self,
        key: &str,
        original_name: Option<String>,
        bytes: Vec<u8>,
    ) -> AppResult<String> {
        let key = OrderKey::parse(key)?;
        let order = self.resolve(&key).await?;

        let file = self.storage.store(original_name, bytes).await?;
        let written = self
            .uow
            .orders()
            .attach_design_image(&order.order_id, &file, self.calendar.now())
            .await?;
        if !written {
            return Err(AppError::not_found("Order"));
        }

        tracing::info!(order_id = %order.order_id, file = %file, "Design image attached");
        Ok(file)
    }
}
