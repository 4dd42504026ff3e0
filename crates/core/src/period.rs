//! Order review periods and staff date input.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Date format staff type when choosing a range.
pub const DATE_INPUT_FORMAT: &str = "%d.%m.%Y";

/// Errors from date entry.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DateInputError {
    #[error("date must look like DD.MM.YYYY")]
    BadFormat,
    #[error("end date {to} is before start date {from}")]
    EndBeforeStart { from: NaiveDate, to: NaiveDate },
}

/// Which orders to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderPeriod {
    /// Orders placed today (local date).
    Today,
    /// From `today - n` at midnight onward.
    LastDays(u32),
    /// Inclusive local date range.
    Range { from: NaiveDate, to: NaiveDate },
    /// No filter.
    All,
}

impl OrderPeriod {
    /// The three-day preset.
    pub const LAST_3_DAYS: Self = Self::LastDays(3);
    /// The one-week preset.
    pub const LAST_WEEK: Self = Self::LastDays(7);

    /// Build a validated range.
    ///
    /// # Errors
    ///
    /// Returns [`DateInputError::EndBeforeStart`] when `to < from`.
    pub fn range(from: NaiveDate, to: NaiveDate) -> Result<Self, DateInputError> {
        if to < from {
            return Err(DateInputError::EndBeforeStart { from, to });
        }
        Ok(Self::Range { from, to })
    }

    /// Inclusive lower and upper bounds on `created_at`, relative to `today`.
    #[must_use]
    pub fn bounds(&self, today: NaiveDate) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        match *self {
            Self::Today => (Some(start_of(today)), Some(end_of(today))),
            Self::LastDays(days) => (
                Some(start_of(today - Duration::days(i64::from(days)))),
                None,
            ),
            Self::Range { from, to } => (Some(start_of(from)), Some(end_of(to))),
            Self::All => (None, None),
        }
    }

    /// Whether `created_at` falls inside this period.
    #[must_use]
    pub fn contains(&self, created_at: NaiveDateTime, today: NaiveDate) -> bool {
        let (from, to) = self.bounds(today);
        from.is_none_or(|from| created_at >= from) && to.is_none_or(|to| created_at <= to)
    }

    /// Short label for headings.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Today => "today".to_string(),
            Self::LastDays(7) => "last week".to_string(),
            Self::LastDays(days) => format!("last {days} days"),
            Self::Range { from, to } => format!(
                "{} - {}",
                from.format(DATE_INPUT_FORMAT),
                to.format(DATE_INPUT_FORMAT)
            ),
            Self::All => "all time".to_string(),
        }
    }
}

fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| start_of(date + Duration::days(1)) - Duration::seconds(1))
}

/// Parse a `DD.MM.YYYY` date typed by staff.
///
/// # Errors
///
/// Returns [`DateInputError::BadFormat`] for anything else, including
/// impossible dates like `31.02.2024`.
pub fn parse_date_input(input: &str) -> Result<NaiveDate, DateInputError> {
    NaiveDate::parse_from_str(input.trim(), DATE_INPUT_FORMAT).map_err(|_| DateInputError::BadFormat)
}
