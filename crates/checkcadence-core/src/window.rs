//! Opening, closing and expiry instants of one occurrence.
//!
//! ```text
//!   open ............ close ........ expire
//!    |  on time        |   overdue    |   expired
//! ```
//!
//! A closing time earlier than the opening time belongs to the next calendar
//! day (overnight window).

use serde::{Deserialize, Serialize};

use crate::checklist::Schedule;
use crate::time::{parse_hhmm, EpochMs, WallClock, DAY_MS, HOUR_MS};

/// Resolved window of one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceWindow {
    /// Absent when the schedule has no opening time.
    pub open: Option<EpochMs>,
    pub close: EpochMs,
    /// Absent when the schedule has no grace period.
    pub expire: Option<EpochMs>,
}

impl OccurrenceWindow {
    pub fn is_expired_at(&self, ts: EpochMs) -> bool {
        self.expire.is_some_and(|expire| ts > expire)
    }

    /// The same window moved by `ms`.
    pub fn shifted(self, ms: i64) -> Self {
        Self {
            open: self.open.map(|open| open.saturating_add(ms)),
            close: self.close.saturating_add(ms),
            expire: self.expire.map(|expire| expire.saturating_add(ms)),
        }
    }
}

/// Resolves schedule time-of-day settings against a concrete day.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowResolver {
    clock: WallClock,
}

impl WindowResolver {
    pub fn new(clock: WallClock) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &WallClock {
        &self.clock
    }

    /// Window of the occurrence on the calendar day of `anchor`.
    ///
    /// Returns `None` when the schedule has no closing time.
    pub fn resolve(&self, anchor: EpochMs, schedule: &Schedule) -> Option<OccurrenceWindow> {
        let closing = schedule.closing_time.as_deref()?;

        let open = schedule
            .opening_time
            .as_deref()
            .map(|t| self.clock.at_minutes(anchor, parse_hhmm(t)));
        let mut close = self.clock.at_minutes(anchor, parse_hhmm(closing));

        if open.is_some_and(|open| close < open) {
            close += DAY_MS;
        }

        // Negative or non-finite grace periods are ignored; huge ones saturate.
        let expire = schedule
            .expire_time
            .filter(|hours| hours.is_finite() && *hours >= 0.0)
            .map(|hours| close.saturating_add((hours * HOUR_MS as f64) as i64));

        Some(OccurrenceWindow {
            open,
            close,
            expire,
        })
    }
}
