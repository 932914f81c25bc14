//! Time sources for store timestamps and "today" resolution.
//!
//! # Invariants
//! - `today()` is the reader's local calendar date.
//! - `now_ms()` is Unix epoch milliseconds.

use chrono::{Local, NaiveDate, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// Abstract clock so staleness and "today" queries are testable.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
    fn today(&self) -> NaiveDate;
}

/// Wall clock backed by the system time and local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Settable clock for deterministic tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
    today: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(today: NaiveDate, now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
            today: Mutex::new(today),
        }
    }

    /// Clock pinned to `YYYY-MM-DD`; falls back to the Unix epoch day when
    /// `date` does not parse.
    pub fn on(date: &str) -> Self {
        let today = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap_or_default();
        Self::new(today, 1_000)
    }

    pub fn advance_ms(&self, delta: i64) {
        self.now_ms.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn set_today(&self, today: NaiveDate) {
        match self.today.lock() {
            Ok(mut guard) => *guard = today,
            Err(poisoned) => *poisoned.into_inner() = today,
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn today(&self) -> NaiveDate {
        match self.today.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, ManualClock};
    use chrono::NaiveDate;

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::on("2025-06-01");
        let start = clock.now_ms();
        assert_eq!(clock.now_ms(), start);
        clock.advance_ms(250);
        assert_eq!(clock.now_ms(), start + 250);

        let next_day = NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date");
        clock.set_today(next_day);
        assert_eq!(clock.today(), next_day);
    }
}
