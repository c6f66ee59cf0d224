//! Wall-clock helpers.
//!
//! Every instant in this crate is an epoch-millisecond value. Calendar
//! questions ("which day is this?", "when did this week start?") are answered
//! against a [`WallClock`] holding a fixed UTC offset, so the same inputs
//! always produce the same answer regardless of the host time zone.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveTime, Offset, Utc, Weekday};

/// Milliseconds since the Unix epoch.
pub type EpochMs = i64;

pub const MINUTE_MS: i64 = 60 * 1000;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;
pub const WEEK_MS: i64 = 7 * DAY_MS;
/// Length of one 4-week cycle.
pub const CYCLE_MS: i64 = 28 * DAY_MS;

/// Parse an `HH:MM` string into minutes since midnight.
///
/// Each part is coerced independently: a missing or non-numeric part counts
/// as zero, so `"18"` is 18:00 and `"ab:cd"` is 00:00. Values past 23:59 are
/// kept as-is and roll into the next day when applied.
pub fn parse_hhmm(time_str: &str) -> i64 {
    let mut parts = time_str.trim().split(':');
    let hours: i64 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0);
    let minutes: i64 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0);
    hours.max(0) * 60 + minutes.max(0)
}

/// Calendar view of epoch-millisecond instants at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    offset: FixedOffset,
}

impl WallClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Clock at UTC+0.
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Clock at the host's current local offset.
    pub fn system() -> Self {
        Self::new(*Local::now().offset())
    }

    /// Clock at `minutes` east of UTC. Out-of-range offsets fall back to UTC.
    pub fn from_offset_minutes(minutes: i32) -> Self {
        FixedOffset::east_opt(minutes.saturating_mul(60))
            .map(Self::new)
            .unwrap_or_else(Self::utc)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The instant as a local date-time.
    pub fn local(&self, ts: EpochMs) -> DateTime<FixedOffset> {
        DateTime::<Utc>::from_timestamp_millis(ts)
            .unwrap_or_default()
            .with_timezone(&self.offset)
    }

    /// Local calendar date of the instant.
    pub fn date(&self, ts: EpochMs) -> NaiveDate {
        self.local(ts).date_naive()
    }

    /// Local midnight of the given calendar date.
    pub fn midnight(&self, date: NaiveDate) -> EpochMs {
        let naive_utc_ms = date.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
        naive_utc_ms - i64::from(self.offset.local_minus_utc()) * 1000
    }

    /// Local midnight of the day containing `ts`.
    pub fn start_of_day(&self, ts: EpochMs) -> EpochMs {
        self.midnight(self.date(ts))
    }

    /// `minutes` past local midnight of the day containing `ts`.
    pub fn at_minutes(&self, ts: EpochMs, minutes: i64) -> EpochMs {
        self.start_of_day(ts) + minutes * MINUTE_MS
    }

    /// Monday 00:00 of the ISO week containing `ts`.
    pub fn start_of_iso_week(&self, ts: EpochMs) -> EpochMs {
        let days_back = i64::from(self.weekday(ts).num_days_from_monday());
        self.start_of_day(ts) - days_back * DAY_MS
    }

    pub fn weekday(&self, ts: EpochMs) -> Weekday {
        self.local(ts).weekday()
    }

    pub fn same_day(&self, a: EpochMs, b: EpochMs) -> bool {
        self.date(a) == self.date(b)
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::system()
    }
}
