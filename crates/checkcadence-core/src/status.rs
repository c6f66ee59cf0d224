//! Checklist status state machine.
//!
//! The engine is queried, never run: every call maps `(now, checklist,
//! completions)` to one of six states.
//!
//! ## Status ladder for one occurrence window
//!
//! ```text
//!            close - lead        close           expire
//! ---------------|---------------|-----------------|--------->
//!    Upcoming          Due           Overdue          Expired
//! ```
//!
//! Without a closing time the ladder collapses to calendar days: a future day
//! is `Upcoming`, today is `Due`, a past day is `Overdue`. The current
//! occurrence never escalates that way and reads `Upcoming` once its day has
//! passed.
//!
//! ## Precedence
//!
//! Status resolution is a two-step pipeline. [`StatusEngine::compute_base_status`]
//! (or [`StatusEngine::compute_instance_status`]) derives a status from the
//! clock and names the completion that satisfies the occurrence, if any.
//! [`StatusEngine::override_with_stored_completion`] then lets the status
//! stored on that completion win, so a `late` or `expired` completion stays
//! marked as such.

use serde::{Deserialize, Serialize};

use crate::calculator::ScheduleCalculator;
use crate::checklist::{latest_completion, Cadence, Checklist, Completion, CompletionStatus, Schedule};
use crate::config::StatusConfig;
use crate::time::{EpochMs, WallClock, DAY_MS};
use crate::window::{OccurrenceWindow, WindowResolver};

/// Status of a checklist occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Completed,
    Due,
    Overdue,
    Upcoming,
    Late,
    Expired,
}

impl Status {
    /// Whether the occurrence has been satisfied, on time or not.
    pub fn is_done(&self) -> bool {
        matches!(self, Status::Completed | Status::Late)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Completed => "completed",
            Status::Due => "due",
            Status::Overdue => "overdue",
            Status::Upcoming => "upcoming",
            Status::Late => "late",
            Status::Expired => "expired",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl CompletionStatus {
    /// The occurrence status a stored completion status stands for.
    ///
    /// `in_progress` reads as `due`; unknown values carry no status.
    pub fn as_status(&self) -> Option<Status> {
        match self {
            CompletionStatus::Completed => Some(Status::Completed),
            CompletionStatus::Late => Some(Status::Late),
            CompletionStatus::Expired => Some(Status::Expired),
            CompletionStatus::Overdue => Some(Status::Overdue),
            CompletionStatus::Due | CompletionStatus::InProgress => Some(Status::Due),
            CompletionStatus::Unknown => None,
        }
    }
}

/// Output of the first pipeline step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment<'a> {
    /// Status derived from the clock and the occurrence window.
    pub status: Status,
    /// Completion that satisfies the assessed occurrence, whose stored status
    /// takes precedence.
    pub satisfied_by: Option<&'a Completion>,
}

impl<'a> Assessment<'a> {
    pub fn computed(status: Status) -> Self {
        Self {
            status,
            satisfied_by: None,
        }
    }

    pub fn satisfied(status: Status, completion: &'a Completion) -> Self {
        Self {
            status,
            satisfied_by: Some(completion),
        }
    }
}

/// Classifies checklists and checklist occurrences.
#[derive(Debug, Clone)]
pub struct StatusEngine {
    config: StatusConfig,
    calculator: ScheduleCalculator,
    resolver: WindowResolver,
}

impl StatusEngine {
    pub fn new(config: StatusConfig, clock: WallClock) -> Self {
        Self {
            config,
            calculator: ScheduleCalculator::new(clock),
            resolver: WindowResolver::new(clock),
        }
    }

    pub fn calculator(&self) -> &ScheduleCalculator {
        &self.calculator
    }

    pub fn resolver(&self) -> &WindowResolver {
        &self.resolver
    }

    pub fn config(&self) -> &StatusConfig {
        &self.config
    }

    fn clock(&self) -> &WallClock {
        self.calculator.clock()
    }

    // ── Current status ───────────────────────────────────────────────

    /// Status of the checklist's current occurrence.
    pub fn current_status(
        &self,
        checklist: &Checklist,
        completions: &[Completion],
        now: EpochMs,
    ) -> Status {
        let last = latest_completion(checklist, completions);
        let status =
            Self::override_with_stored_completion(self.compute_base_status(checklist, last, now));
        tracing::trace!(checklist = %checklist.id, %status, "current status");
        status
    }

    /// First pipeline step for the current occurrence.
    pub fn compute_base_status<'a>(
        &self,
        checklist: &Checklist,
        last: Option<&'a Completion>,
        now: EpochMs,
    ) -> Assessment<'a> {
        let Some(schedule) = &checklist.schedule else {
            return Assessment::computed(Status::Upcoming);
        };

        if schedule.cadence == Cadence::Continuous {
            // Stored statuses are not consulted: a continuous checklist is
            // either freshly done or due.
            let fresh = last.is_some_and(|c| {
                c.completed_at <= now && now - c.completed_at <= self.config.continuous_fresh_ms()
            });
            return Assessment::computed(if fresh { Status::Completed } else { Status::Due });
        }

        let due = self.calculator.next_due_date(checklist, last, now);
        let window = self.occurrence_window(schedule, due, now);

        if window.is_some_and(|w| schedule.can_expire() && w.is_expired_at(now)) {
            tracing::trace!(checklist = %checklist.id, due, "next occurrence expired");
            return Assessment::computed(Status::Expired);
        }

        if let Some(completion) = last {
            let interval = schedule.cadence.interval_ms();
            let covers_period = now <= due
                && completion.completed_at >= due - interval
                && completion.completed_at <= due;
            if covers_period {
                let status = self.classify_completion(schedule, completion, due - interval);
                return Assessment::satisfied(status, completion);
            }
        }

        match window {
            Some(_) => Assessment::computed(self.ladder(window, due, now)),
            // Without a window the occurrence is due on its own day and
            // upcoming on any other.
            None if self.clock().same_day(due, now) => Assessment::computed(Status::Due),
            None => Assessment::computed(Status::Upcoming),
        }
    }

    // ── Instance status ──────────────────────────────────────────────

    /// Status of the occurrence on `instance_date`.
    ///
    /// A completion recorded for that occurrence decides the status; otherwise
    /// the occurrence's own window is laddered against `now`.
    pub fn status_for_instance(
        &self,
        checklist: &Checklist,
        completions: &[Completion],
        instance_date: EpochMs,
        now: EpochMs,
    ) -> Status {
        let Some(schedule) = &checklist.schedule else {
            return Status::Upcoming;
        };
        if schedule.cadence == Cadence::Continuous {
            return self.current_status(checklist, completions, now);
        }

        let stored = self.matching_completion(checklist, completions, instance_date);
        Self::override_with_stored_completion(self.compute_instance_status(
            schedule,
            instance_date,
            stored,
            now,
        ))
    }

    /// First pipeline step for a specific occurrence.
    pub fn compute_instance_status<'a>(
        &self,
        schedule: &Schedule,
        instance_date: EpochMs,
        satisfied_by: Option<&'a Completion>,
        now: EpochMs,
    ) -> Assessment<'a> {
        match satisfied_by {
            Some(completion) => Assessment::satisfied(
                self.classify_completion(schedule, completion, instance_date),
                completion,
            ),
            None => {
                let window = self.resolver.resolve(instance_date, schedule);
                Assessment::computed(self.ladder(window, instance_date, now))
            }
        }
    }

    /// Second pipeline step: a status stored on the satisfying completion wins.
    pub fn override_with_stored_completion(assessment: Assessment<'_>) -> Status {
        assessment
            .satisfied_by
            .and_then(|c| c.status)
            .and_then(|stored| stored.as_status())
            .unwrap_or(assessment.status)
    }

    /// Completion recorded for the occurrence on `instance_date`.
    ///
    /// Day-granular cadences match on calendar day, all others on the exact
    /// timestamp.
    pub fn matching_completion<'a>(
        &self,
        checklist: &Checklist,
        completions: &'a [Completion],
        instance_date: EpochMs,
    ) -> Option<&'a Completion> {
        let day_granular = checklist.cadence().is_some_and(|c| c.is_day_granular());
        completions
            .iter()
            .filter(|c| c.belongs_to(checklist))
            .filter(|c| match c.scheduled_for {
                Some(scheduled) if day_granular => self.clock().same_day(scheduled, instance_date),
                Some(scheduled) => scheduled == instance_date,
                None => false,
            })
            .max_by_key(|c| c.completed_at)
    }

    // ── Predicates ───────────────────────────────────────────────────

    /// Whether the next occurrence is past its grace period.
    ///
    /// Always false unless the schedule has both a closing time and an expire
    /// time.
    pub fn is_expired(
        &self,
        checklist: &Checklist,
        last: Option<&Completion>,
        now: EpochMs,
    ) -> bool {
        let Some(schedule) = &checklist.schedule else {
            return false;
        };
        if schedule.cadence == Cadence::Continuous || !schedule.can_expire() {
            return false;
        }
        let due = self.calculator.next_due_date(checklist, last, now);
        self.occurrence_window(schedule, due, now)
            .is_some_and(|w| w.is_expired_at(now))
    }

    /// Whether the checklist has missed its next due date.
    pub fn is_overdue(
        &self,
        checklist: &Checklist,
        last: Option<&Completion>,
        now: EpochMs,
    ) -> bool {
        match checklist.cadence() {
            None | Some(Cadence::Continuous) => false,
            Some(_) => match last {
                None => true,
                Some(_) => now > self.calculator.next_due_date(checklist, last, now),
            },
        }
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Window of the occurrence falling due at `due`.
    ///
    /// An occurrence that is due right now is pinned to the current business
    /// day, so an evening window missed before midnight stays current until
    /// the rollover. A closing time earlier than the rollover ends that
    /// business day, on the following calendar day.
    fn occurrence_window(
        &self,
        schedule: &Schedule,
        due: EpochMs,
        now: EpochMs,
    ) -> Option<OccurrenceWindow> {
        if due != now {
            return self.resolver.resolve(due, schedule);
        }

        let day_start = self.config.business_day_start_ms();
        let anchor = now - day_start;
        let window = self.resolver.resolve(anchor, schedule)?;
        if window.close < self.clock().start_of_day(anchor) + day_start {
            Some(window.shifted(DAY_MS))
        } else {
            Some(window)
        }
    }

    /// Completed or late, judged against the window of the occurrence anchored
    /// at `occurrence`. Without a closing time nothing is ever late.
    fn classify_completion(
        &self,
        schedule: &Schedule,
        completion: &Completion,
        occurrence: EpochMs,
    ) -> Status {
        match self.resolver.resolve(occurrence, schedule) {
            Some(window) if completion.completed_at > window.close => Status::Late,
            _ => Status::Completed,
        }
    }

    fn ladder(&self, window: Option<OccurrenceWindow>, due: EpochMs, now: EpochMs) -> Status {
        match window {
            Some(w) => {
                if now > w.close {
                    if w.is_expired_at(now) {
                        Status::Expired
                    } else {
                        Status::Overdue
                    }
                } else {
                    let due_from = w
                        .open
                        .map_or(w.close - self.config.due_lead_ms(), |open| {
                            open.max(w.close - self.config.due_lead_ms())
                        });
                    if now >= due_from {
                        Status::Due
                    } else {
                        Status::Upcoming
                    }
                }
            }
            None => {
                if self.clock().same_day(due, now) {
                    Status::Due
                } else if due > now {
                    Status::Upcoming
                } else {
                    Status::Overdue
                }
            }
        }
    }
}

impl Default for StatusEngine {
    fn default() -> Self {
        Self::new(StatusConfig::default(), WallClock::default())
    }
}
