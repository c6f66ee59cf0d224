//! Calendar instances of a checklist.
//!
//! An [`Instance`] is a throwaway projection: it borrows the checklist, is
//! recomputed on every call and never persisted. Generation is bounded by
//! the requested day span and by the checklist's creation time.

use serde::Serialize;

use crate::calculator::ScheduleCalculator;
use crate::checklist::{latest_completion, Cadence, Checklist, Completion, Schedule};
use crate::status::{Status, StatusEngine};
use crate::time::{EpochMs, CYCLE_MS, DAY_MS};

/// One checklist occurrence as shown on a calendar or task list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance<'a> {
    pub checklist: &'a Checklist,
    pub instance_date: EpochMs,
    pub status: Status,
}

impl<'a> Instance<'a> {
    fn new(checklist: &'a Checklist, instance_date: EpochMs, status: Status) -> Self {
        Self {
            checklist,
            instance_date,
            status,
        }
    }
}

/// Produces the bounded instance list of a checklist.
#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    status: StatusEngine,
    days_to_show: u32,
}

impl InstanceGenerator {
    pub fn new(status: StatusEngine, days_to_show: u32) -> Self {
        Self {
            status,
            days_to_show,
        }
    }

    pub fn days_to_show(&self) -> u32 {
        self.days_to_show
    }

    /// Instances with the configured day span, oldest first.
    pub fn generate<'a>(
        &self,
        checklist: &'a Checklist,
        completions: &[Completion],
        now: EpochMs,
    ) -> Vec<Instance<'a>> {
        self.generate_with_days(checklist, completions, now, self.days_to_show)
    }

    /// Instances spanning `days_to_show` days either side of today (daily
    /// cadences only), oldest first.
    pub fn generate_with_days<'a>(
        &self,
        checklist: &'a Checklist,
        completions: &[Completion],
        now: EpochMs,
        days_to_show: u32,
    ) -> Vec<Instance<'a>> {
        let mut instances = match &checklist.schedule {
            None => vec![Instance::new(
                checklist,
                now.max(checklist.created_at),
                Status::Upcoming,
            )],
            Some(schedule) => match schedule.cadence {
                Cadence::Continuous => vec![Instance::new(
                    checklist,
                    now,
                    self.status.current_status(checklist, completions, now),
                )],
                Cadence::Daily | Cadence::Unknown => {
                    self.daily(checklist, schedule, completions, now, days_to_show)
                }
                Cadence::FourWeek => self.four_week(checklist, schedule, completions, now),
                Cadence::Weekly | Cadence::Monthly | Cadence::Yearly => {
                    let last = latest_completion(checklist, completions);
                    let due = self.status.calculator().next_due_date(checklist, last, now);
                    self.single(checklist, completions, due, now)
                }
            },
        };

        instances.sort_by_key(|i| i.instance_date);
        tracing::debug!(
            checklist = %checklist.id,
            count = instances.len(),
            "generated instances"
        );
        instances
    }

    fn single<'a>(
        &self,
        checklist: &'a Checklist,
        completions: &[Completion],
        occurrence: EpochMs,
        now: EpochMs,
    ) -> Vec<Instance<'a>> {
        if occurrence < checklist.created_at {
            return Vec::new();
        }
        let status = self
            .status
            .status_for_instance(checklist, completions, occurrence, now);
        vec![Instance::new(checklist, occurrence, status)]
    }

    fn daily<'a>(
        &self,
        checklist: &'a Checklist,
        schedule: &Schedule,
        completions: &[Completion],
        now: EpochMs,
        days_to_show: u32,
    ) -> Vec<Instance<'a>> {
        let clock = self.status.calculator().clock();
        let today = clock.start_of_day(now);
        let first_day = clock.start_of_day(checklist.created_at);
        let mut instances = Vec::new();

        if today >= first_day {
            let (status, _) = self.daily_status(checklist, schedule, completions, today, now);
            instances.push(Instance::new(checklist, today.max(checklist.created_at), status));

            for offset in 1..=i64::from(days_to_show) {
                let day = today - offset * DAY_MS;
                if day < first_day {
                    break;
                }
                let (status, missed) =
                    self.daily_status(checklist, schedule, completions, day, now);
                if missed {
                    tracing::trace!(checklist = %checklist.id, day, "stopping at expired day");
                    break;
                }
                instances.push(Instance::new(checklist, day.max(checklist.created_at), status));
            }
        }

        for offset in 1..=i64::from(days_to_show) {
            let day = today + offset * DAY_MS;
            if day < first_day {
                continue;
            }
            instances.push(Instance::new(
                checklist,
                day.max(checklist.created_at),
                Status::Upcoming,
            ));
        }

        instances
    }

    /// Status of one day, aware of completions made that day even when they
    /// were not recorded against it. The flag is set when the day expired
    /// without any completion.
    fn daily_status(
        &self,
        checklist: &Checklist,
        schedule: &Schedule,
        completions: &[Completion],
        day: EpochMs,
        now: EpochMs,
    ) -> (Status, bool) {
        let clock = self.status.calculator().clock();
        let satisfied_by = self
            .status
            .matching_completion(checklist, completions, day)
            .or_else(|| {
                completions
                    .iter()
                    .filter(|c| c.belongs_to(checklist) && c.scheduled_for.is_none())
                    .filter(|c| clock.same_day(c.completed_at, day))
                    .max_by_key(|c| c.completed_at)
            });

        let assessment = self
            .status
            .compute_instance_status(schedule, day, satisfied_by, now);
        let missed = assessment.satisfied_by.is_none() && assessment.status == Status::Expired;
        (StatusEngine::override_with_stored_completion(assessment), missed)
    }

    fn four_week<'a>(
        &self,
        checklist: &'a Checklist,
        schedule: &Schedule,
        completions: &[Completion],
        now: EpochMs,
    ) -> Vec<Instance<'a>> {
        let Some(start_date) = schedule.start_date else {
            let last = latest_completion(checklist, completions);
            let due = last.map_or(now, |c| c.completed_at) + CYCLE_MS;
            return self.single(checklist, completions, due, now);
        };

        let cycle_start = ScheduleCalculator::cycle_start(start_date, now);
        let next_start = cycle_start + CYCLE_MS;
        let satisfied_by = completions
            .iter()
            .filter(|c| c.belongs_to(checklist))
            .filter(|c| {
                c.scheduled_for == Some(cycle_start)
                    || (c.completed_at >= cycle_start && c.completed_at < next_start)
            })
            .max_by_key(|c| c.completed_at);

        let assessment = self
            .status
            .compute_instance_status(schedule, cycle_start, satisfied_by, now);
        let mut instances = vec![Instance::new(
            checklist,
            cycle_start,
            StatusEngine::override_with_stored_completion(assessment),
        )];

        if satisfied_by.is_some() {
            let status = if next_start <= now {
                Status::Due
            } else {
                Status::Upcoming
            };
            instances.push(Instance::new(checklist, next_start, status));
        }

        instances.retain(|i| i.instance_date >= checklist.created_at);
        instances
    }
}
