//! Next-due-date arithmetic per cadence.
//!
//! | Cadence      | No completion          | With completion `c`                         |
//! |--------------|------------------------|---------------------------------------------|
//! | continuous   | now                    | now                                         |
//! | daily        | now                    | `c + 24h`                                   |
//! | weekly       | Monday 00:00 this week | `c + 7d`, or Monday 00:00 if `c` is stale   |
//! | 4week        | current cycle start    | current or next cycle start                 |
//! | 4week legacy | `now + 28d`            | `c + 28d`                                   |
//! | monthly      | now                    | `c + 30d`                                   |
//! | yearly       | now                    | `c + 365d`                                  |

use crate::checklist::{Cadence, Checklist, Completion};
use crate::time::{EpochMs, WallClock, CYCLE_MS, WEEK_MS};

/// Computes when a checklist next falls due.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleCalculator {
    clock: WallClock,
}

impl ScheduleCalculator {
    pub fn new(clock: WallClock) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &WallClock {
        &self.clock
    }

    /// Spacing between occurrences; checklists without a schedule are treated
    /// as daily.
    pub fn cadence_interval(checklist: &Checklist) -> i64 {
        checklist.cadence().unwrap_or_default().interval_ms()
    }

    /// Start of the 4-week cycle containing `now`.
    ///
    /// Before the first cycle has begun this is the first cycle's start.
    pub fn cycle_start(start_date: EpochMs, now: EpochMs) -> EpochMs {
        if now < start_date {
            return start_date;
        }
        let cycles_passed = (now - start_date).div_euclid(CYCLE_MS);
        start_date + cycles_passed * CYCLE_MS
    }

    /// Next due instant for `checklist` given its most recent completion.
    pub fn next_due_date(
        &self,
        checklist: &Checklist,
        last_completion: Option<&Completion>,
        now: EpochMs,
    ) -> EpochMs {
        let Some(schedule) = &checklist.schedule else {
            return now;
        };
        let last_at = last_completion.map(|c| c.completed_at);

        match schedule.cadence {
            Cadence::Continuous => now,
            Cadence::Weekly => match last_at {
                Some(at) if now - at <= WEEK_MS => at + WEEK_MS,
                _ => self.clock.start_of_iso_week(now),
            },
            Cadence::FourWeek => match schedule.start_date {
                Some(start_date) => {
                    let current = Self::cycle_start(start_date, now);
                    match last_at {
                        Some(at) if at >= current => current + CYCLE_MS,
                        _ => current,
                    }
                }
                None => last_at.unwrap_or(now) + CYCLE_MS,
            },
            Cadence::Daily | Cadence::Monthly | Cadence::Yearly | Cadence::Unknown => {
                last_at.map_or(now, |at| at + schedule.cadence.interval_ms())
            }
        }
    }
}
