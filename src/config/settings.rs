//! Application settings loaded from environment variables.

use std::env;
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};

use super::constants::{
    DEFAULT_DATABASE_URL, DEFAULT_FEED_API_VERSION, DEFAULT_FEED_MAX_RETRIES,
    DEFAULT_FEED_PAGE_SIZE, DEFAULT_FEED_RETRY_BASE_MS, DEFAULT_FEED_TIMEOUT_SECS,
    DEFAULT_LOCAL_UTC_OFFSET_MINUTES, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    DEFAULT_SYNC_INTERVAL_SECS, DEFAULT_SYNC_RECENT_DAYS, DEFAULT_UPLOAD_DIR, MAX_FEED_PAGE_SIZE,
};
use crate::domain::StageAdvancePolicy;

/// Order feed connection settings
#[derive(Clone)]
pub struct FeedSettings {
    /// Shop domain, e.g. `my-shop.myshopify.com`
    pub store_domain: Option<String>,
    access_token: Option<String>,
    pub api_version: String,
    pub page_size: u32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_ms: u64,
}

impl std::fmt::Debug for FeedSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSettings")
            .field("store_domain", &self.store_domain)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("page_size", &self.page_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_base_ms", &self.retry_base_ms)
            .finish()
    }
}

impl FeedSettings {
    /// Settings for a feed at `store_domain` authenticated with `access_token`.
    pub fn new(store_domain: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            store_domain: Some(store_domain.into()),
            access_token: Some(access_token.into()),
            ..Self::default()
        }
    }

    /// Static credential sent with every feed request.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Whether both the shop domain and credential are present.
    pub fn is_configured(&self) -> bool {
        self.store_domain.as_deref().is_some_and(|d| !d.is_empty())
            && self.access_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            store_domain: None,
            access_token: None,
            api_version: DEFAULT_FEED_API_VERSION.to_string(),
            page_size: DEFAULT_FEED_PAGE_SIZE,
            timeout_secs: DEFAULT_FEED_TIMEOUT_SECS,
            max_retries: DEFAULT_FEED_MAX_RETRIES,
            retry_base_ms: DEFAULT_FEED_RETRY_BASE_MS,
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub feed: FeedSettings,
    pub sync_interval_secs: u64,
    pub sync_recent_days: u32,
    pub local_offset: FixedOffset,
    pub advance_policy: StageAdvancePolicy,
    pub upload_dir: PathBuf,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("feed", &self.feed)
            .field("sync_interval_secs", &self.sync_interval_secs)
            .field("sync_recent_days", &self.sync_recent_days)
            .field("local_offset", &self.local_offset)
            .field("advance_policy", &self.advance_policy)
            .field("upload_dir", &self.upload_dir)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unparsable numeric values fall back to their defaults with a warning.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let feed = FeedSettings {
            store_domain: non_empty_var("SHOPIFY_STORE"),
            access_token: non_empty_var("SHOPIFY_ADMIN_API_TOKEN"),
            api_version: env::var("SHOPIFY_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_FEED_API_VERSION.to_string()),
            page_size: parsed_var("FEED_PAGE_SIZE", DEFAULT_FEED_PAGE_SIZE)
                .clamp(1, MAX_FEED_PAGE_SIZE),
            timeout_secs: parsed_var("FEED_TIMEOUT_SECS", DEFAULT_FEED_TIMEOUT_SECS),
            max_retries: parsed_var("FEED_MAX_RETRIES", DEFAULT_FEED_MAX_RETRIES),
            retry_base_ms: parsed_var("FEED_RETRY_BASE_MS", DEFAULT_FEED_RETRY_BASE_MS),
        };

        if !feed.is_configured() {
            tracing::warn!("SHOPIFY_STORE or SHOPIFY_ADMIN_API_TOKEN not set, order sync disabled");
        }

        let local_offset = offset_from_minutes(parsed_var(
            "LOCAL_UTC_OFFSET_MINUTES",
            DEFAULT_LOCAL_UTC_OFFSET_MINUTES,
        ));

        let advance_policy = match env::var("STAGE_ADVANCE_POLICY") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Unknown STAGE_ADVANCE_POLICY, using default");
                StageAdvancePolicy::default()
            }),
            Err(_) => StageAdvancePolicy::default(),
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: parsed_var("SERVER_PORT", DEFAULT_SERVER_PORT),
            feed,
            sync_interval_secs: parsed_var("SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS),
            sync_recent_days: parsed_var("SYNC_RECENT_DAYS", DEFAULT_SYNC_RECENT_DAYS),
            local_offset,
            advance_policy,
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.to_string())
                .into(),
        }
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            feed: FeedSettings::default(),
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            sync_recent_days: DEFAULT_SYNC_RECENT_DAYS,
            local_offset: default_offset(),
            advance_policy: StageAdvancePolicy::default(),
            upload_dir: DEFAULT_UPLOAD_DIR.into(),
        }
    }
}

/// Offset east of UTC, falling back to the default when out of range.
fn offset_from_minutes(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            tracing::warn!(minutes, "LOCAL_UTC_OFFSET_MINUTES out of range, using default");
            default_offset()
        })
}

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_LOCAL_UTC_OFFSET_MINUTES * 60)
        .unwrap_or_else(|| Utc.fix())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
