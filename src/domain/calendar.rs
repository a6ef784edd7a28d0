//! Local-time calendar helpers.
//!
//! All day bucketing happens in one fixed UTC offset so that "today" and
//! "created on D" mean the same thing for every query.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{DEFAULT_REPORT_WINDOW_DAYS, MAX_REPORT_WINDOW_DAYS};
use crate::errors::{AppError, AppResult};

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern"));

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Calendar anchored on a fixed local offset.
#[derive(Clone)]
pub struct LocalCalendar {
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for LocalCalendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCalendar")
            .field("offset", &self.offset)
            .finish()
    }
}

impl LocalCalendar {
    pub fn new(offset: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self { offset, clock }
    }

    /// Calendar driven by the system clock.
    pub fn system(offset: FixedOffset) -> Self {
        Self::new(offset, Arc::new(SystemClock))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }

    /// Local calendar date of an instant.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// Instant at which local `date` begins.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_time(NaiveTime::MIN);
        (local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()))).and_utc()
    }

    /// Half-open UTC range `[start, end)` covering local `date`.
    pub fn day_bounds(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start_of_day(date);
        (start, start + Duration::days(1))
    }
}

/// Which side of the anchor day a rolling window extends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDirection {
    /// `anchor - (n - 1) ..= anchor`
    Trailing,
    /// `anchor ..= anchor + (n - 1)`
    Leading,
}

/// Exactly `days` consecutive dates in ascending order.
pub fn rolling_window(anchor: NaiveDate, days: u32, direction: WindowDirection) -> Vec<NaiveDate> {
    let span = i64::from(days.saturating_sub(1));
    let first = match direction {
        WindowDirection::Trailing => anchor - Duration::days(span),
        WindowDirection::Leading => anchor,
    };
    first.iter_days().take(days as usize).collect()
}

/// Parse a strict `YYYY-MM-DD` date.
///
/// Shape is checked first, then the value must be a real calendar day.
pub fn parse_iso_date(raw: &str, field: &str) -> AppResult<NaiveDate> {
    let invalid = || AppError::validation(format!("{} must be a date in YYYY-MM-DD format", field));

    if !ISO_DATE.is_match(raw) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())
}

/// Resolve an optional report window length.
pub fn window_days(requested: Option<u32>) -> AppResult<u32> {
    let days = requested.unwrap_or(DEFAULT_REPORT_WINDOW_DAYS);
    if days == 0 || days > MAX_REPORT_WINDOW_DAYS {
        return Err(AppError::validation(format!(
            "days must be between 1 and {}",
            MAX_REPORT_WINDOW_DAYS
        )));
    }
    Ok(days)
}
