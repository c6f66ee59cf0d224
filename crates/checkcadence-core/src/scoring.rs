//! Completion scoring, validation, streaks and dashboard aggregates.
//!
//! Scoring reads completions and checklists only; it never consults the
//! status state machine. Stored completion statuses are taken at face value.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::checklist::{Checklist, Completion, CompletionStatus, Item, ItemType, Response};
use crate::config::ScoringConfig;
use crate::time::EpochMs;

/// Required items left unanswered in a completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub missing_required: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.missing_required.is_empty()
    }
}

/// Aggregate figures over the completions in a time range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_completions: usize,
    pub on_time: usize,
    pub late: usize,
    pub expired: usize,
    /// Share of rated completions that were on time. Only on-time, late and
    /// expired completions are rated; 0.0 when there is nothing to rate.
    pub on_time_rate: f64,
    /// Mean completion score (0-100) over the range.
    pub average_score: f64,
    /// Completions per checklist id.
    pub per_checklist: HashMap<String, usize>,
}

/// Scores and aggregates checklist completions.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Percentage (0-100) of responses marked completed.
    ///
    /// Responses to items in log sections are left out. An empty response set
    /// scores 0; one that only held log responses scores 100.
    pub fn completion_score(
        &self,
        responses: &HashMap<String, Response>,
        checklist: Option<&Checklist>,
    ) -> u8 {
        if responses.is_empty() {
            return 0;
        }

        let gradeable: Vec<&Response> = responses
            .iter()
            .filter(|(item_id, _)| checklist.map_or(true, |c| !c.is_log_item(item_id)))
            .map(|(_, response)| response)
            .collect();

        if gradeable.is_empty() {
            return 100;
        }

        let completed = gradeable.iter().filter(|r| r.completed).count();
        percentage(completed, gradeable.len())
    }

    /// Percentage (0-100) of checklist items satisfied by `completion`. Log
    /// sections do not count.
    pub fn progress(&self, checklist: &Checklist, completion: &Completion) -> u8 {
        let items: Vec<&Item> = checklist.gradeable_items().collect();
        if items.is_empty() {
            return 0;
        }
        let satisfied = items
            .iter()
            .filter(|item| is_satisfied(item, completion.responses.get(&item.id)))
            .count();
        percentage(satisfied, items.len())
    }

    /// Required items of `checklist` that `completion` leaves unsatisfied.
    pub fn validate(&self, checklist: &Checklist, completion: &Completion) -> ValidationReport {
        let missing_required = checklist
            .all_items()
            .filter(|item| item.required)
            .filter(|item| !is_satisfied(item, completion.responses.get(&item.id)))
            .map(|item| item.id.clone())
            .collect();
        ValidationReport { missing_required }
    }

    /// Number of consecutive cadence periods, counting back from `now`, that
    /// each have a completion within the streak tolerance of the expected time.
    pub fn streak(&self, checklist: &Checklist, completions: &[Completion], now: EpochMs) -> u32 {
        let Some(cadence) = checklist.cadence() else {
            return 0;
        };
        let interval = cadence.interval_ms();
        let tolerance = self.config.streak_tolerance_ms();

        let mut ordered: Vec<&Completion> = completions
            .iter()
            .filter(|c| c.belongs_to(checklist))
            .collect();
        ordered.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

        let mut streak = 0;
        for (i, completion) in ordered.iter().enumerate() {
            let expected = now - i as i64 * interval;
            if (completion.completed_at - expected).abs() > tolerance {
                break;
            }
            streak += 1;
        }
        streak
    }

    /// Aggregates over completions with `from <= completed_at < to`.
    pub fn dashboard_metrics(
        &self,
        checklists: &[Checklist],
        completions: &[Completion],
        from: EpochMs,
        to: EpochMs,
    ) -> DashboardMetrics {
        let in_range: Vec<&Completion> = completions
            .iter()
            .filter(|c| c.completed_at >= from && c.completed_at < to)
            .collect();

        let mut metrics = DashboardMetrics {
            total_completions: in_range.len(),
            ..Default::default()
        };
        if in_range.is_empty() {
            return metrics;
        }

        let mut score_sum = 0u64;
        for completion in &in_range {
            // A completion saved without a status was on time.
            match completion.status {
                None | Some(CompletionStatus::Completed) => metrics.on_time += 1,
                Some(CompletionStatus::Late) => metrics.late += 1,
                Some(CompletionStatus::Expired) => metrics.expired += 1,
                Some(_) => {}
            }
            *metrics
                .per_checklist
                .entry(completion.checklist_id.clone())
                .or_insert(0) += 1;

            let checklist = checklists.iter().find(|c| completion.belongs_to(c));
            score_sum += u64::from(self.completion_score(&completion.responses, checklist));
        }

        let rated = metrics.on_time + metrics.late + metrics.expired;
        if rated > 0 {
            metrics.on_time_rate = metrics.on_time as f64 / rated as f64;
        }
        metrics.average_score = score_sum as f64 / in_range.len() as f64;
        metrics
    }
}

fn percentage(part: usize, total: usize) -> u8 {
    ((part as f64 / total as f64) * 100.0).round() as u8
}

/// Type-specific answer check.
fn is_satisfied(item: &Item, response: Option<&Response>) -> bool {
    let Some(response) = response else {
        return false;
    };
    match item.item_type {
        ItemType::YesNo => response
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .is_some_and(|v| v.eq_ignore_ascii_case("yes")),
        ItemType::Number => response.value.as_ref().is_some_and(|v| !v.is_null()),
        ItemType::Text => response
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .is_some_and(|v| !v.trim().is_empty()),
        ItemType::Photo => !response.photos.is_empty(),
        ItemType::Checkbox | ItemType::Other => response.completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::{Cadence, Schedule, Section, SectionType};
    use crate::time::{DAY_MS, HOUR_MS};
    use serde_json::json;

    fn responses(entries: &[(&str, bool)]) -> HashMap<String, Response> {
        entries
            .iter()
            .map(|(id, done)| {
                let r = if *done { Response::checked() } else { Response::unchecked() };
                (id.to_string(), r)
            })
            .collect()
    }

    fn with_log_section() -> Checklist {
        Checklist::new("c1", 0)
            .with_items(vec![Item::new("a", ItemType::Checkbox), Item::new("b", ItemType::Checkbox)])
            .with_section(Section {
                id: "temps".to_string(),
                title: "Fridge temperatures".to_string(),
                section_type: SectionType::Logs,
                items: vec![Item::new("t1", ItemType::Number), Item::new("t2", ItemType::Number)],
            })
    }

    #[test]
    fn test_completion_score() {
        let engine = ScoringEngine::default();
        let r = responses(&[("a", true), ("b", false), ("c", true), ("d", true)]);
        assert_eq!(engine.completion_score(&r, None), 75);
        assert_eq!(engine.completion_score(&HashMap::new(), None), 0);
    }

    #[test]
    fn test_completion_score_excludes_log_sections() {
        let engine = ScoringEngine::default();
        let checklist = with_log_section();
        let r = responses(&[("a", true), ("b", false), ("t1", false), ("t2", false)]);
        assert_eq!(engine.completion_score(&r, Some(&checklist)), 50);
    }

    #[test]
    fn test_completion_score_only_logs_is_full() {
        let engine = ScoringEngine::default();
        let checklist = with_log_section();
        let r = responses(&[("t1", false), ("t2", false)]);
        assert_eq!(engine.completion_score(&r, Some(&checklist)), 100);
    }

    #[test]
    fn test_progress_type_rules() {
        let engine = ScoringEngine::default();
        let checklist = Checklist::new("c1", 0).with_items(vec![
            Item::new("yn", ItemType::YesNo),
            Item::new("num", ItemType::Number),
            Item::new("txt", ItemType::Text),
            Item::new("pic", ItemType::Photo),
        ]);

        let partial = Completion::new("c1", 0)
            .with_response("yn", Response::default().with_value(json!("no")))
            .with_response("num", Response::default().with_value(json!(0)))
            .with_response("txt", Response::default().with_value(json!("   ")))
            .with_response("pic", Response::default().with_photo("gs://a.jpg"));
        assert_eq!(engine.progress(&checklist, &partial), 50);

        let full = Completion::new("c1", 0)
            .with_response("yn", Response::default().with_value(json!("yes")))
            .with_response("num", Response::default().with_value(json!(3.5)))
            .with_response("txt", Response::default().with_value(json!("wiped down")))
            .with_response("pic", Response::default().with_photo("gs://a.jpg"));
        assert_eq!(engine.progress(&checklist, &full), 100);

        assert_eq!(engine.progress(&Checklist::new("c2", 0), &full), 0);
    }

    #[test]
    fn test_progress_skips_log_sections() {
        let engine = ScoringEngine::default();
        let completion = Completion::new("c1", 0)
            .with_response("a", Response::checked())
            .with_response("b", Response::checked());
        assert_eq!(engine.progress(&with_log_section(), &completion), 100);
    }

    #[test]
    fn test_validate_lists_missing_required() {
        let engine = ScoringEngine::default();
        let checklist = Checklist::new("c1", 0).with_items(vec![
            Item::new("temp", ItemType::Number).required(),
            Item::new("note", ItemType::Text),
            Item::new("sign", ItemType::Checkbox).required(),
        ]);
        let completion = Completion::new("c1", 0)
            .with_response("temp", Response::default().with_value(json!(4)))
            .with_response("sign", Response::unchecked());

        let report = engine.validate(&checklist, &completion);
        assert!(!report.is_valid());
        assert_eq!(report.missing_required, vec!["sign".to_string()]);
    }

    #[test]
    fn test_streak() {
        let engine = ScoringEngine::default();
        let checklist = Checklist::new("c1", 0).with_schedule(Schedule::new(Cadence::Daily));
        let now = 100 * DAY_MS;
        let completions = vec![
            Completion::new("c1", now - HOUR_MS),
            Completion::new("c1", now - DAY_MS + 2 * HOUR_MS),
            Completion::new("c1", now - 2 * DAY_MS - 5 * HOUR_MS),
            // gap: nothing near now - 3d
            Completion::new("c1", now - 5 * DAY_MS),
            Completion::new("c2", now),
        ];
        assert_eq!(engine.streak(&checklist, &completions, now), 3);
    }

    #[test]
    fn test_streak_broken_by_stale_latest() {
        let engine = ScoringEngine::default();
        let checklist = Checklist::new("c1", 0).with_schedule(Schedule::new(Cadence::Daily));
        let now = 100 * DAY_MS;
        let completions = vec![Completion::new("c1", now - 7 * HOUR_MS)];
        assert_eq!(engine.streak(&checklist, &completions, now), 0);
        assert_eq!(engine.streak(&Checklist::new("c1", 0), &completions, now), 0);
    }

    #[test]
    fn test_dashboard_metrics() {
        let engine = ScoringEngine::default();
        let checklist = with_log_section();
        let completions = vec![
            Completion::new("c1", 10)
                .with_status(CompletionStatus::Completed)
                .with_response("a", Response::checked())
                .with_response("b", Response::checked()),
            Completion::new("c1", 20)
                .with_status(CompletionStatus::Late)
                .with_response("a", Response::checked())
                .with_response("b", Response::unchecked()),
            Completion::new("c2", 30).with_status(CompletionStatus::Expired),
            Completion::new("c1", 99),
        ];

        let metrics = engine.dashboard_metrics(&[checklist], &completions, 0, 50);
        assert_eq!(metrics.total_completions, 3);
        assert_eq!(metrics.on_time, 1);
        assert_eq!(metrics.late, 1);
        assert_eq!(metrics.expired, 1);
        assert!((metrics.on_time_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!((metrics.average_score - 50.0).abs() < 1e-9);
        assert_eq!(metrics.per_checklist.get("c1"), Some(&2));
    }

    #[test]
    fn test_dashboard_metrics_rates_only_final_statuses() {
        let engine = ScoringEngine::default();
        let completions = vec![
            Completion::new("c1", 1),
            Completion::new("c1", 2).with_status(CompletionStatus::Late),
            Completion::new("c1", 3).with_status(CompletionStatus::Overdue),
            Completion::new("c1", 4).with_status(CompletionStatus::Due),
            Completion::new("c1", 5).with_status(CompletionStatus::InProgress),
        ];

        let metrics = engine.dashboard_metrics(&[], &completions, 0, 10);
        assert_eq!(metrics.total_completions, 5);
        assert_eq!(metrics.on_time, 1);
        assert_eq!(metrics.late, 1);
        assert_eq!(metrics.expired, 0);
        assert!((metrics.on_time_rate - 0.5).abs() < 1e-9);

        let pending = vec![Completion::new("c1", 1).with_status(CompletionStatus::InProgress)];
        let metrics = engine.dashboard_metrics(&[], &pending, 0, 10);
        assert_eq!(metrics.on_time, 0);
        assert_eq!(metrics.on_time_rate, 0.0);
    }

    #[test]
    fn test_dashboard_metrics_empty_range() {
        let metrics = ScoringEngine::default().dashboard_metrics(&[], &[], 0, 10);
        assert_eq!(metrics, DashboardMetrics::default());
    }
}
