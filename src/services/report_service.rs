//! Report service - Read-only aggregates over the order store.
//!
//! Calendar tables are built first from the local calendar and then
//! filled from the data, so a window of N days always yields N rows.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::domain::calendar::{parse_iso_date, rolling_window, window_days, WindowDirection};
use crate::domain::{LocalCalendar, Stage, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// Orders pending at each stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StageCounts {
    pub design: u64,
    pub printing: u64,
    pub fusing: u64,
    pub stitching: u64,
    pub shipping: u64,
}

impl StageCounts {
    fn set(&mut self, stage: Stage, count: u64) {
        let slot = match stage {
            Stage::Design => &mut self.design,
            Stage::Printing => &mut self.printing,
            Stage::Fusing => &mut self.fusing,
            Stage::Stitching => &mut self.stitching,
            Stage::Shipping => &mut self.shipping,
        };
        *slot = count;
    }

    pub fn total(&self) -> u64 {
        self.design + self.printing + self.fusing + self.stitching + self.shipping
    }
}

/// Pending work among orders touched on one local day.
///
/// Each order is counted once, at its first unfinished stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PendingSummary {
    #[schema(value_type = String, example = "2024-07-01")]
    pub date: NaiveDate,
    pub pending: StageCounts,
    /// Sum of `pending`
    pub total: u64,
    /// Orders with every stage done
    pub complete: u64,
}

/// Open work for one staff member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserPending {
    pub username: String,
    pub role: UserRole,
    pub pending: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeeklyDay {
    #[schema(value_type = String, example = "2024-07-01")]
    pub date: NaiveDate,
    /// Orders created that day
    pub received: u64,
    /// Of those, orders already shipped
    pub completed: u64,
    pub pending: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeeklySummary {
    pub days: Vec<WeeklyDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DispatchDay {
    #[schema(value_type = String, example = "2024-07-01")]
    pub date: NaiveDate,
    pub count: u64,
    /// Display names of unshipped orders due that day
    pub orders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DispatchSchedule {
    pub days: Vec<DispatchDay>,
}

/// Report service trait for dependency injection.
#[async_trait]
pub trait ReportService: Send + Sync {
    /// Per-stage pending counts for orders updated on local `date`
    async fn pending_summary(&self, date: &str) -> AppResult<PendingSummary>;

    /// Pending count per stage-role user
    async fn user_pending(&self) -> AppResult<Vec<UserPending>>;

    /// Trailing window of received/completed counts
    async fn weekly_summary(&self, days: Option<u32>) -> AppResult<WeeklySummary>;

    /// Leading window of unshipped orders by dispatch date
    async fn dispatch_upcoming(&self, days: Option<u32>) -> AppResult<DispatchSchedule>;
}

/// Concrete implementation of ReportService using Unit of Work.
pub struct ReportManager<U: UnitOfWork> {
    uow: Arc<U>,
    calendar: LocalCalendar,
}

impl<U: UnitOfWork> ReportManager<U> {
    pub fn new(uow: Arc<U>, calendar: LocalCalendar) -> Self {
        Self { uow, calendar }
    }
}

#[async_trait]
impl<U: UnitOfWork> ReportService for ReportManager<U> {
    async fn pending_summary(&self, date: &str) -> AppResult<PendingSummary> {
        let date = date.trim();
        if date.is_empty() {
            return Err(AppError::validation("Date is required"));
        }
        let date = parse_iso_date(date, "date")?;

        let window = self.calendar.day_bounds(date);
        let orders = self.uow.orders();

        let counts = try_join_all(
            Stage::ALL
                .into_iter()
                .map(|stage| orders.count_pending_at(stage, Some(window))),
        )
        .await?;
        let complete = orders.count_complete(window.0, window.1).await?;

        let mut pending = StageCounts::default();
        for (stage, count) in Stage::ALL.into_iter().zip(counts) {
            pending.set(stage, count);
        }

        Ok(PendingSummary {
            date,
            total: pending.total(),
            pending,
            complete,
        })
    }

    async fn user_pending(&self) -> AppResult<Vec<UserPending>> {
        let users = self.uow.users().list().await?;

        let mut stages: Vec<Stage> = users
            .iter()
            .filter_map(|user| user.role.stage())
            .filter(|stage| *stage != Stage::Design)
            .collect();
        stages.sort();
        stages.dedup();

        // Design work is per assignee, every other stage is shared
        let orders = self.uow.orders();
        let counts =
            try_join_all(stages.iter().map(|&stage| orders.count_pending_at(stage, None))).await?;
        let by_stage: HashMap<Stage, u64> = stages.into_iter().zip(counts).collect();

        let by_assignee: HashMap<String, u64> =
            if users.iter().any(|user| user.role.stage() == Some(Stage::Design)) {
                orders.count_design_pending_by_assignee().await?.into_iter().collect()
            } else {
                HashMap::new()
            };

        let mut rows = Vec::new();
        for user in users {
            let Some(stage) = user.role.stage() else {
                continue;
            };
            let pending = if stage == Stage::Design {
                by_assignee.get(&user.username).copied().unwrap_or(0)
            } else {
                by_stage.get(&stage).copied().unwrap_or(0)
            };

            rows.push(UserPending {
                username: user.username,
                role: user.role,
                pending,
            });
        }

        Ok(rows)
    }

    async fn weekly_summary(&self, days: Option<u32>) -> AppResult<WeeklySummary> {
        let dates = rolling_window(self.calendar.today(), window_days(days)?, WindowDirection::Trailing);
        let (Some(first), Some(last)) = (dates.first().copied(), dates.last().copied()) else {
            return Ok(WeeklySummary { days: Vec::new() });
        };

        let start = self.calendar.start_of_day(first);
        let end = self.calendar.start_of_day(last + Duration::days(1));
        let orders = self.uow.orders().list_created_between(start, end).await?;

        let mut tally: HashMap<NaiveDate, (u64, u64)> = HashMap::new();
        for order in &orders {
            let entry = tally.entry(self.calendar.local_date(order.created_at)).or_default();
            entry.0 += 1;
            if order.stages.shipping_done {
                entry.1 += 1;
            }
        }

        let days = dates
            .into_iter()
            .map(|date| {
                let (received, completed) = tally.get(&date).copied().unwrap_or_default();
                WeeklyDay {
                    date,
                    received,
                    completed,
                    pending: received - completed,
                }
            })
            .collect();

        Ok(WeeklySummary { days })
    }

    async fn dispatch_upcoming(&self, days: Option<u32>) -> AppResult<DispatchSchedule> {
        let dates = rolling_window(self.calendar.today(), window_days(days)?, WindowDirection::Leading);
        let (Some(first), Some(last)) = (dates.first().copied(), dates.last().copied()) else {
            return Ok(DispatchSchedule { days: Vec::new() });
        };

        let orders = self.uow.orders().list_dispatch_between(first, last).await?;

        let mut due: HashMap<NaiveDate, Vec<String>> = HashMap::new();
        for order in orders.into_iter().filter(|o| !o.stages.shipping_done) {
            if let Some(date) = order.dispatch_date {
                due.entry(date).or_default().push(order.order_name);
            }
        }

        let days = dates
            .into_iter()
            .map(|date| {
                let mut orders = due.remove(&date).unwrap_or_default();
                orders.sort();
                DispatchDay {
                    date,
                    count: orders.len() as u64,
                    orders,
                }
            })
            .collect();

        Ok(DispatchSchedule { days })
    }
}
