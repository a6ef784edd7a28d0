//! HTTP client for the commerce platform's orders endpoint.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::{sleep, Duration};

use super::OrderFeed;
use crate::config::{FeedSettings, FEED_ACCESS_TOKEN_HEADER, MAX_FEED_RETRY_DELAY_MS};
use crate::errors::{AppError, AppResult};

/// Response body of the orders endpoint
#[derive(Debug, Deserialize)]
struct OrdersPage {
    #[serde(default)]
    orders: Vec<serde_json::Value>,
}

/// Outcome of one failed attempt.
#[derive(Debug)]
enum AttemptError {
    /// Worth retrying: connect/timeout failure, 429 or 5xx
    Transient(String),
    /// Any other failure; retrying will not help
    Fatal(String),
}

/// Order feed backed by the Shopify Admin REST API.
#[derive(Clone)]
pub struct ShopifyFeed {
    http: Client,
    settings: FeedSettings,
}

impl ShopifyFeed {
    /// Build the client; the per-request timeout comes from `settings`.
    pub fn new(settings: FeedSettings) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build feed client: {}", e)))?;

        Ok(Self { http, settings })
    }

    /// Orders endpoint for the configured shop, or `None` when unconfigured.
    fn orders_url(&self) -> Option<String> {
        if !self.settings.is_configured() {
            return None;
        }
        let domain = self.settings.store_domain.as_deref()?;
        Some(format!(
            "https://{}/admin/api/{}/orders.json?status=any&limit={}",
            domain.trim_end_matches('/'),
            self.settings.api_version,
            self.settings.page_size
        ))
    }

    async fn attempt(&self, url: &str, token: &str) -> Result<Vec<serde_json::Value>, AttemptError> {
        let response = self
            .http
            .get(url)
            .header(FEED_ACCESS_TOKEN_HEADER, token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    AttemptError::Transient(e.to_string())
                } else {
                    AttemptError::Fatal(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = format!("HTTP {}", status.as_u16());
            return Err(if is_transient_status(status) {
                AttemptError::Transient(detail)
            } else {
                AttemptError::Fatal(detail)
            });
        }

        let page: OrdersPage = response
            .json()
            .await
            .map_err(|e| AttemptError::Fatal(format!("undecodable orders page: {}", e)))?;

        Ok(page.orders)
    }
}

#[async_trait]
impl OrderFeed for ShopifyFeed {
    async fn fetch_recent(&self) -> AppResult<Vec<serde_json::Value>> {
        let (Some(url), Some(token)) = (self.orders_url(), self.settings.access_token()) else {
            return Err(AppError::upstream("order feed is not configured"));
        };

        let max_retries = self.settings.max_retries;
        for attempt in 0..=max_retries {
            match self.attempt(&url, token).await {
                Ok(orders) => {
                    tracing::debug!(count = orders.len(), attempt, "Fetched order feed page");
                    return Ok(orders);
                }
                Err(AttemptError::Fatal(detail)) => {
                    return Err(AppError::upstream(detail));
                }
                Err(AttemptError::Transient(detail)) if attempt < max_retries => {
                    let delay = backoff_delay(self.settings.retry_base_ms, attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %detail,
                        "Order feed request failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(AttemptError::Transient(detail)) => {
                    tracing::warn!(attempts = max_retries + 1, "Order feed retries exhausted");
                    return Err(AppError::upstream(detail));
                }
            }
        }

        Err(AppError::upstream("order feed retries exhausted"))
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// `base * 2^attempt`, capped.
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor).min(MAX_FEED_RETRY_DELAY_MS))
}
