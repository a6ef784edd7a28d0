//! Shared fixtures for integration tests.
//!
//! An in-memory unit of work, a scripted order feed and in-memory design
//! storage, wired through the same container the server uses.

#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use production_tracker::api::{create_router, AppState};
use production_tracker::config::{Config, PRICE_SCALE};
use production_tracker::domain::{
    FeedFields, FeedOrder, FixedClock, LocalCalendar, Order, OrderKey, Password, Stage,
    StageAdvancePolicy, User, UserRole,
};
use production_tracker::errors::{AppError, AppResult};
use production_tracker::infra::{
    DesignStorage, OrderFeed, OrderRepository, UnitOfWork, UserRepository,
};
use production_tracker::services::{ServiceContainer, Services};

/// 11:30 local time on 2024-06-10 at +05:30.
pub fn now() -> DateTime<Utc> {
    "2024-06-10T06:00:00Z".parse().unwrap()
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    rfc3339.parse().unwrap()
}

pub fn calendar() -> LocalCalendar {
    LocalCalendar::new(
        FixedOffset::east_opt(330 * 60).unwrap(),
        Arc::new(FixedClock(now())),
    )
}

// =============================================================================
// In-memory store
// =============================================================================

/// Prices land in a `NUMERIC(12, 2)` column, which rounds half away from zero.
fn to_column_scale(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Default)]
pub struct MemoryOrders {
    rows: Mutex<Vec<Order>>,
}

impl MemoryOrders {
    pub fn snapshot(&self) -> Vec<Order> {
        self.rows.lock().unwrap().clone()
    }

    pub fn get(&self, order_id: &str) -> Option<Order> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.order_id == order_id)
            .cloned()
    }

    pub fn put(&self, order: Order) {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|o| o.order_id != order.order_id);
        rows.push(order);
    }

    fn update(&self, order_id: &str, f: impl FnOnce(&mut Order)) -> bool {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|o| o.order_id == order_id) {
            Some(order) => {
                f(order);
                true
            }
            None => false,
        }
    }

    fn select(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        let mut rows: Vec<Order> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|o| keep(o))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        rows
    }
}

#[async_trait]
impl OrderRepository for MemoryOrders {
    async fn find_by_key(&self, key: &OrderKey) -> AppResult<Option<Order>> {
        let rows = self.rows.lock().unwrap();
        let by_id = rows.iter().find(|o| o.order_id == key.as_order_id());
        Ok(by_id
            .or_else(|| rows.iter().find(|o| key.matches(o)))
            .cloned())
    }

    async fn find_by_id(&self, order_id: &str) -> AppResult<Option<Order>> {
        Ok(self.get(order_id))
    }

    async fn insert_if_absent(&self, order: Order) -> AppResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|o| o.order_id == order.order_id) {
            return Ok(false);
        }
        rows.push(Order {
            total_price: to_column_scale(order.total_price),
            ..order
        });
        Ok(true)
    }

    async fn update_feed_fields(
        &self,
        order_id: &str,
        fields: FeedFields,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let fields = FeedFields {
            total_price: to_column_scale(fields.total_price),
            ..fields
        };
        Ok(self.update(order_id, |o| o.apply_feed_fields(fields, at)))
    }

    async fn mark_stage_done(
        &self,
        order_id: &str,
        stage: Stage,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.update(order_id, |o| {
            o.stages.mark_done(stage);
            o.updated_at = at;
        }))
    }

    async fn set_design_assignee(
        &self,
        order_id: &str,
        username: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.update(order_id, |o| {
            o.design_assignee = Some(username.to_string());
            o.updated_at = at;
        }))
    }

    async fn set_dispatch_date(
        &self,
        order_id: &str,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.update(order_id, |o| {
            o.dispatch_date = Some(date);
            o.updated_at = at;
        }))
    }

    async fn attach_design_image(
        &self,
        order_id: &str,
        file: &str,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        Ok(self.update(order_id, |o| {
            o.design_image = Some(file.to_string());
            o.stages.mark_done(Stage::Design);
            o.updated_at = at;
        }))
    }

    async fn list_all(&self) -> AppResult<Vec<Order>> {
        Ok(self.select(|_| true))
    }

    async fn list_pending_at(&self, stage: Stage) -> AppResult<Vec<Order>> {
        Ok(self.select(|o| o.is_pending_at(stage)))
    }

    async fn count_pending_at(
        &self,
        stage: Stage,
        updated_within: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> AppResult<u64> {
        let in_window = |o: &Order| {
            updated_within.map_or(true, |(start, end)| o.updated_at >= start && o.updated_at < end)
        };
        Ok(self.select(|o| o.is_pending_at(stage) && in_window(o)).len() as u64)
    }

    async fn count_complete(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<u64> {
        Ok(self
            .select(|o| o.stages.is_complete() && o.updated_at >= start && o.updated_at < end)
            .len() as u64)
    }

    async fn count_design_pending_by_assignee(&self) -> AppResult<Vec<(String, u64)>> {
        let mut counts: Vec<(String, u64)> = Vec::new();
        for order in self.select(|o| o.is_pending_at(Stage::Design)) {
            let Some(assignee) = order.design_assignee else {
                continue;
            };
            match counts.iter_mut().find(|(name, _)| *name == assignee) {
                Some((_, n)) => *n += 1,
                None => counts.push((assignee, 1)),
            }
        }
        Ok(counts)
    }

    async fn list_created_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Order>> {
        Ok(self.select(|o| o.created_at >= start && o.created_at < end))
    }

    async fn list_dispatch_between(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> AppResult<Vec<Order>> {
        Ok(self.select(|o| o.dispatch_date.is_some_and(|d| d >= first && d <= last)))
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    rows: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_with_role(&self, username: &str, role: UserRole) -> AppResult<Option<User>> {
        Ok(self
            .find_by_username(username)
            .await?
            .filter(|u| u.role == role))
    }

    async fn create(
        &self,
        username: String,
        password_hash: String,
        role: UserRole,
    ) -> AppResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            username,
            password_hash,
            role,
            created_at: now(),
        };
        self.rows.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(rows)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    pub orders: Arc<MemoryOrders>,
    pub users: Arc<MemoryUsers>,
}

#[async_trait]
impl UnitOfWork for MemoryStore {
    fn orders(&self) -> Arc<dyn OrderRepository> {
        self.orders.clone()
    }

    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

// =============================================================================
// Scripted collaborators
// =============================================================================

/// Feed returning whatever page was last scripted.
#[derive(Default)]
pub struct ScriptedFeed {
    page: Mutex<Vec<serde_json::Value>>,
    outage: Mutex<Option<String>>,
}

impl ScriptedFeed {
    pub fn set_page(&self, records: Vec<serde_json::Value>) {
        *self.page.lock().unwrap() = records;
    }

    pub fn fail_with(&self, reason: &str) {
        *self.outage.lock().unwrap() = Some(reason.to_string());
    }
}

#[async_trait]
impl OrderFeed for ScriptedFeed {
    async fn fetch_recent(&self) -> AppResult<Vec<serde_json::Value>> {
        if let Some(reason) = self.outage.lock().unwrap().clone() {
            return Err(AppError::upstream(reason));
        }
        Ok(self.page.lock().unwrap().clone())
    }
}

/// Design storage keeping blobs in memory.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryStorage {
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files.lock().unwrap().clone()
    }
}

#[async_trait]
impl DesignStorage for MemoryStorage {
    async fn store(&self, _original_name: Option<String>, bytes: Vec<u8>) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::validation("Uploaded image is empty"));
        }
        let mut files = self.files.lock().unwrap();
        let file = format!("design_{}.png", files.len() + 1);
        files.push((file.clone(), bytes));
        Ok(file)
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub feed: Arc<ScriptedFeed>,
    pub storage: Arc<MemoryStorage>,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(StageAdvancePolicy::Unconditional)
    }

    pub fn with_policy(policy: StageAdvancePolicy) -> Self {
        let store = Arc::new(MemoryStore::default());
        let feed = Arc::new(ScriptedFeed::default());
        let storage = Arc::new(MemoryStorage::default());
        let config = Config {
            advance_policy: policy,
            sync_recent_days: 1,
            ..Config::default()
        };

        let services = Services::build(
            store.clone(),
            feed.clone(),
            storage.clone(),
            calendar(),
            &config,
        );

        Self {
            store,
            feed,
            storage,
            services,
        }
    }

    pub fn state(&self) -> AppState {
        AppState::from_container(&self.services, PathBuf::from("target/test-uploads"))
    }

    pub fn router(&self) -> Router {
        create_router(self.state())
    }

    pub fn seed_order(&self, order: Order) {
        self.store.orders.put(order);
    }

    pub async fn seed_user(&self, username: &str, password: &str, role: UserRole) -> User {
        let hash = Password::new(password).unwrap().into_string();
        self.services
            .store()
            .users()
            .create(username.to_string(), hash, role)
            .await
            .unwrap()
    }

    pub fn order(&self, order_id: &str) -> Order {
        self.store.orders.get(order_id).unwrap()
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Fresh order as the feed would import it.
pub fn order(order_id: &str, order_name: &str, created_at: DateTime<Utc>) -> Order {
    Order::from_feed(FeedOrder {
        order_id: order_id.to_string(),
        order_name: order_name.to_string(),
        created_at,
        fields: FeedFields {
            customer_name: "Asha Verma".to_string(),
            total_price: Decimal::from_str("1499.00").unwrap(),
            fulfillment_status: String::new(),
            payment_status: "paid".to_string(),
            shipping_method: "Standard".to_string(),
            item_count: 1,
            tags: String::new(),
            address: String::new(),
        },
    })
}

/// Order with the given stages already done.
pub fn order_with(order_id: &str, created_at: DateTime<Utc>, done: &[Stage]) -> Order {
    let mut order = order(order_id, &format!("#{}", order_id), created_at);
    for stage in done {
        order.stages.mark_done(*stage);
    }
    order
}

/// Raw feed record in the shape the order feed returns.
pub fn feed_record(id: u64, created_at: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": format!("#{}", id),
        "customer": {"first_name": "Asha", "last_name": "Verma"},
        "total_price": "1499.00",
        "fulfillment_status": null,
        "financial_status": "paid",
        "shipping_lines": [{"title": "Standard"}],
        "line_items": [{"quantity": 1}],
        "tags": "",
        "shipping_address": null,
        "created_at": created_at,
    })
}
