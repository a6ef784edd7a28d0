//! External order feed records and their normalization.
//!
//! The feed returns loosely-typed JSON; everything here turns one record
//! into a [`FeedOrder`] or rejects it as malformed.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use super::order::{FeedFields, FeedOrder};
use crate::config::PRICE_SCALE;
use crate::errors::{AppError, AppResult};

/// Feed ids arrive as JSON numbers but are stored as text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExternalId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalId::Number(n) => write!(f, "{}", n),
            ExternalId::Text(s) => f.write_str(s.trim()),
        }
    }
}

/// Money is a decimal string in the feed, occasionally a bare number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExternalPrice {
    Text(String),
    Number(serde_json::Number),
}

impl ExternalPrice {
    fn to_decimal(&self) -> Option<Decimal> {
        let raw = match self {
            ExternalPrice::Text(s) => s.trim().to_string(),
            ExternalPrice::Number(n) => n.to_string(),
        };
        if raw.is_empty() {
            return Some(Decimal::ZERO);
        }
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .ok()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalCustomer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalShippingLine {
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalLineItem {
    #[serde(default)]
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalAddress {
    pub address1: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub zip: Option<String>,
}

/// One order as returned by the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ExternalOrder {
    pub id: ExternalId,
    pub name: String,
    #[serde(default)]
    pub customer: Option<ExternalCustomer>,
    #[serde(default)]
    pub total_price: Option<ExternalPrice>,
    #[serde(default)]
    pub fulfillment_status: Option<String>,
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default)]
    pub shipping_lines: Option<Vec<ExternalShippingLine>>,
    #[serde(default)]
    pub line_items: Option<Vec<ExternalLineItem>>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<ExternalAddress>,
    pub created_at: DateTime<FixedOffset>,
}

impl ExternalOrder {
    /// Decode one raw feed record.
    pub fn from_json(value: serde_json::Value) -> AppResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| AppError::validation(format!("Malformed feed record: {}", e)))
    }

    /// Normalize into the shape stored locally.
    pub fn normalize(self) -> AppResult<FeedOrder> {
        let order_id = self.id.to_string();
        if order_id.is_empty() {
            return Err(AppError::validation("Feed record has an empty id"));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::validation(format!(
                "Feed record {} has an empty name",
                order_id
            )));
        }

        // Rounded the way the store rounds, so a re-fetched record compares equal
        let total_price = match &self.total_price {
            Some(price) => price
                .to_decimal()
                .ok_or_else(|| {
                    AppError::validation(format!("Feed record {} has an invalid price", order_id))
                })?
                .round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero),
            None => Decimal::ZERO,
        };

        let item_count = total_quantity(self.line_items.as_deref().unwrap_or_default())
            .ok_or_else(|| {
                AppError::validation(format!("Feed record {} has an invalid quantity", order_id))
            })?;

        let fields = FeedFields {
            customer_name: customer_name(self.customer.as_ref()),
            total_price,
            fulfillment_status: self.fulfillment_status.unwrap_or_default(),
            payment_status: self.financial_status.unwrap_or_default(),
            shipping_method: self
                .shipping_lines
                .as_deref()
                .and_then(|lines| lines.first())
                .and_then(|line| line.title.clone())
                .unwrap_or_default(),
            item_count,
            tags: self.tags.unwrap_or_default(),
            address: flatten_address(self.shipping_address.as_ref()),
        };

        Ok(FeedOrder {
            order_id,
            order_name: self.name.trim().to_string(),
            created_at: self.created_at.with_timezone(&Utc),
            fields,
        })
    }
}

/// `"first last"`, trimmed; empty when the customer is missing.
pub fn customer_name(customer: Option<&ExternalCustomer>) -> String {
    let Some(customer) = customer else {
        return String::new();
    };
    format!(
        "{} {}",
        customer.first_name.as_deref().unwrap_or(""),
        customer.last_name.as_deref().unwrap_or("")
    )
    .trim()
    .to_string()
}

/// Sum of line-item quantities (not the number of line items).
///
/// `None` when a quantity is negative or the sum overflows.
pub fn total_quantity(items: &[ExternalLineItem]) -> Option<i32> {
    items.iter().try_fold(0i32, |acc, item| {
        let quantity = i32::try_from(item.quantity.unwrap_or(0)).ok()?;
        if quantity < 0 {
            return None;
        }
        acc.checked_add(quantity)
    })
}

/// `address1, city, province, country, zip`, each part defaulting to empty.
pub fn flatten_address(address: Option<&ExternalAddress>) -> String {
    let Some(address) = address else {
        return String::new();
    };
    [
        &address.address1,
        &address.city,
        &address.province,
        &address.country,
        &address.zip,
    ]
    .iter()
    .map(|part| part.as_deref().unwrap_or(""))
    .collect::<Vec<_>>()
    .join(", ")
}
