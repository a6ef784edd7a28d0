//! Order domain entity and related types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::stage::{Stage, StageFlags};
use crate::errors::{AppError, AppResult};

/// Production record for one external order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    /// Immutable external order identifier
    #[schema(example = "5512309876543")]
    pub order_id: String,
    /// Human-readable display name
    #[schema(example = "#1023")]
    pub order_name: String,
    #[schema(example = "Asha Verma")]
    pub customer_name: String,
    #[schema(value_type = String, example = "1499.00")]
    pub total_price: Decimal,
    pub fulfillment_status: String,
    pub payment_status: String,
    pub shipping_method: String,
    /// Sum of line-item quantities
    pub item_count: i32,
    pub tags: String,
    pub address: String,
    /// Username of the designer working on the order
    pub design_assignee: Option<String>,
    #[schema(value_type = Option<String>, example = "2024-07-01")]
    pub dispatch_date: Option<NaiveDate>,
    /// Stored design image reference
    pub design_image: Option<String>,
    #[serde(flatten)]
    pub stages: StageFlags,
    /// Creation time reported by the order feed
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a fresh row from a feed record: no stage done, both timestamps
    /// taken from the feed's own creation time.
    pub fn from_feed(record: FeedOrder) -> Self {
        let FeedOrder {
            order_id,
            order_name,
            created_at,
            fields,
        } = record;

        Self {
            order_id,
            order_name,
            customer_name: fields.customer_name,
            total_price: fields.total_price,
            fulfillment_status: fields.fulfillment_status,
            payment_status: fields.payment_status,
            shipping_method: fields.shipping_method,
            item_count: fields.item_count,
            tags: fields.tags,
            address: fields.address,
            design_assignee: None,
            dispatch_date: None,
            design_image: None,
            stages: StageFlags::default(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn pending_stage(&self) -> Option<Stage> {
        self.stages.pending_stage()
    }

    pub fn is_pending_at(&self, stage: Stage) -> bool {
        self.stages.is_pending_at(stage)
    }

    /// Current values of the fields the feed owns.
    pub fn feed_fields(&self) -> FeedFields {
        FeedFields {
            customer_name: self.customer_name.clone(),
            total_price: self.total_price,
            fulfillment_status: self.fulfillment_status.clone(),
            payment_status: self.payment_status.clone(),
            shipping_method: self.shipping_method.clone(),
            item_count: self.item_count,
            tags: self.tags.clone(),
            address: self.address.clone(),
        }
    }

    /// Overwrite feed-owned fields; production fields are left alone.
    pub fn apply_feed_fields(&mut self, fields: FeedFields, at: DateTime<Utc>) {
        self.customer_name = fields.customer_name;
        self.total_price = fields.total_price;
        self.fulfillment_status = fields.fulfillment_status;
        self.payment_status = fields.payment_status;
        self.shipping_method = fields.shipping_method;
        self.item_count = fields.item_count;
        self.tags = fields.tags;
        self.address = fields.address;
        self.updated_at = at;
    }
}

/// Fields mirrored from the order feed and refreshed on every sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFields {
    pub customer_name: String,
    pub total_price: Decimal,
    pub fulfillment_status: String,
    pub payment_status: String,
    pub shipping_method: String,
    pub item_count: i32,
    pub tags: String,
    pub address: String,
}

/// Normalized feed record, ready to insert or reconcile.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOrder {
    pub order_id: String,
    pub order_name: String,
    pub created_at: DateTime<Utc>,
    pub fields: FeedFields,
}

/// Lookup key accepting either the raw external id or the display name.
///
/// `"#1023"` and `"1023"` resolve to the same key; it matches an order
/// whose `order_id` is `1023` or whose `order_name` is `#1023`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    bare: String,
}

impl OrderKey {
    pub fn parse(raw: &str) -> AppResult<Self> {
        let bare = raw.trim().trim_start_matches('#').trim();
        if bare.is_empty() {
            return Err(AppError::validation("Order id is required"));
        }
        Ok(Self {
            bare: bare.to_string(),
        })
    }

    /// Candidate value for the `order_id` column.
    pub fn as_order_id(&self) -> &str {
        &self.bare
    }

    /// Candidate value for the `order_name` column.
    pub fn as_display_name(&self) -> String {
        format!("#{}", self.bare)
    }

    pub fn matches(&self, order: &Order) -> bool {
        order.order_id == self.bare || order.order_name == self.as_display_name()
    }
}

impl std::fmt::Display for OrderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.bare)
    }
}
