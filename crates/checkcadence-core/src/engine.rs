//! One-stop wiring of the engines from a single [`EngineConfig`].

use serde::Serialize;

use crate::calculator::ScheduleCalculator;
use crate::checklist::{latest_completion, Snapshot};
use crate::config::EngineConfig;
use crate::instances::InstanceGenerator;
use crate::scoring::ScoringEngine;
use crate::status::{Status, StatusEngine};
use crate::time::{EpochMs, WallClock};
use crate::window::WindowResolver;

/// Per-checklist summary for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistOverview {
    pub checklist_id: String,
    pub status: Status,
    /// Absent for checklists without a schedule.
    pub next_due: Option<EpochMs>,
    pub streak: u32,
}

/// All components sharing one configuration and wall clock.
#[derive(Debug, Clone)]
pub struct ChecklistEngine {
    config: EngineConfig,
    clock: WallClock,
    instances: InstanceGenerator,
    scoring: ScoringEngine,
}

impl ChecklistEngine {
    pub fn new(config: EngineConfig) -> Self {
        let clock = config.wall_clock();
        let status = StatusEngine::new(config.status.clone(), clock);
        Self {
            instances: InstanceGenerator::new(status, config.instances.days_to_show),
            scoring: ScoringEngine::new(config.scoring.clone()),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> WallClock {
        self.clock
    }

    pub fn calculator(&self) -> ScheduleCalculator {
        ScheduleCalculator::new(self.clock)
    }

    pub fn windows(&self) -> WindowResolver {
        WindowResolver::new(self.clock)
    }

    pub fn status(&self) -> StatusEngine {
        StatusEngine::new(self.config.status.clone(), self.clock)
    }

    pub fn instances(&self) -> &InstanceGenerator {
        &self.instances
    }

    pub fn scoring(&self) -> &ScoringEngine {
        &self.scoring
    }

    /// Status, next due date and streak of every checklist in the snapshot.
    pub fn overview(&self, snapshot: &Snapshot, now: EpochMs) -> Vec<ChecklistOverview> {
        let status = self.status();
        let calculator = self.calculator();

        snapshot
            .checklists
            .iter()
            .map(|checklist| {
                let last = latest_completion(checklist, &snapshot.completions);
                ChecklistOverview {
                    checklist_id: checklist.id.clone(),
                    status: status.current_status(checklist, &snapshot.completions, now),
                    next_due: checklist
                        .schedule
                        .as_ref()
                        .map(|_| calculator.next_due_date(checklist, last, now)),
                    streak: self.scoring.streak(checklist, &snapshot.completions, now),
                }
            })
            .collect()
    }
}

impl Default for ChecklistEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::{Cadence, Checklist, Completion, Schedule};
    use crate::config::ClockConfig;
    use crate::time::HOUR_MS;

    fn utc_engine() -> ChecklistEngine {
        ChecklistEngine::new(EngineConfig {
            clock: ClockConfig {
                utc_offset_minutes: Some(0),
            },
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_engine_uses_configured_clock() {
        assert_eq!(utc_engine().clock(), WallClock::utc());
        assert_eq!(utc_engine().instances().days_to_show(), 7);
    }

    #[test]
    fn test_overview() {
        let now = 1_000 * HOUR_MS;
        let snapshot = Snapshot::new(
            vec![
                Checklist::new("adhoc", 0),
                Checklist::new("pulse", 0).with_schedule(Schedule::new(Cadence::Continuous)),
            ],
            vec![Completion::new("pulse", now - HOUR_MS / 2)],
        );

        let overview = utc_engine().overview(&snapshot, now);
        assert_eq!(overview.len(), 2);

        assert_eq!(overview[0].status, Status::Upcoming);
        assert_eq!(overview[0].next_due, None);
        assert_eq!(overview[0].streak, 0);

        assert_eq!(overview[1].status, Status::Completed);
        assert_eq!(overview[1].next_due, Some(now));
        assert_eq!(overview[1].streak, 1);
    }
}
