//! Per-user domain model.
//!
//! # Responsibility
//! - Define the serde shapes persisted under a user's document root.
//! - Validate field formats before any write reaches the store.
//!
//! # Invariants
//! - Every entity is owned by exactly one `UserId`.
//! - Field names serialize in camelCase to match the persisted layout.
//! - Timestamps are epoch milliseconds assigned by the store, never by callers.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod celestial;
pub mod energy;
pub mod intention;
pub mod profile;

/// Provider-issued opaque user identifier.
pub type UserId = String;

/// Store-assigned timestamp in Unix epoch milliseconds.
pub type EpochMs = i64;

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso date regex"));
static CLOCK_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid clock time regex"));

/// Field-level validation failure raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value is not a real `YYYY-MM-DD` calendar date.
    InvalidDate(String),
    /// Value is not a 24h `HH:MM` time.
    InvalidTime(String),
    /// A percentage-like field is outside `0..=100`.
    LevelOutOfRange { field: &'static str, value: u8 },
    /// An hour of day is outside `0..=23`.
    HourOutOfRange(u8),
    /// A day of week is outside `0..=6`.
    DayOutOfRange(u8),
    /// A required text field is blank.
    EmptyField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => write!(f, "invalid ISO date `{value}`"),
            Self::InvalidTime(value) => write!(f, "invalid HH:MM time `{value}`"),
            Self::LevelOutOfRange { field, value } => {
                write!(f, "{field} must be within 0..=100, got {value}")
            }
            Self::HourOutOfRange(value) => write!(f, "hour must be within 0..=23, got {value}"),
            Self::DayOutOfRange(value) => {
                write!(f, "day of week must be within 0..=6, got {value}")
            }
            Self::EmptyField(field) => write!(f, "{field} cannot be empty"),
        }
    }
}

impl Error for ValidationError {}

/// Checks that `value` is a real calendar date in `YYYY-MM-DD` form.
pub fn validate_iso_date(value: &str) -> Result<(), ValidationError> {
    if ISO_DATE_RE.is_match(value) && NaiveDate::parse_from_str(value, ISO_DATE_FORMAT).is_ok() {
        Ok(())
    } else {
        Err(ValidationError::InvalidDate(value.to_string()))
    }
}

/// Checks that `value` is a 24h `HH:MM` clock time.
pub fn validate_clock_time(value: &str) -> Result<(), ValidationError> {
    if CLOCK_TIME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidTime(value.to_string()))
    }
}

/// Formats a calendar date the way it is persisted (`YYYY-MM-DD`).
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

pub(crate) fn validate_percent(field: &'static str, value: u8) -> Result<(), ValidationError> {
    if value > 100 {
        return Err(ValidationError::LevelOutOfRange { field, value });
    }
    Ok(())
}
