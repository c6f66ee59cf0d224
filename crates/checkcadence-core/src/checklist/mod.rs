//! Checklist, schedule and completion types.
//!
//! These mirror the snapshots handed over by the persistence layer (camelCase
//! JSON field names). The engine only ever reads them.

mod snapshot;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::time::{EpochMs, CYCLE_MS, DAY_MS, HOUR_MS, WEEK_MS};

pub use snapshot::Snapshot;

/// Repeat pattern of a checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    #[default]
    Daily,
    Weekly,
    Monthly,
    Yearly,
    #[serde(rename = "4week")]
    FourWeek,
    /// Always due; satisfied for a short time after each completion.
    Continuous,
    /// Any type string this crate does not know. Behaves like `Daily`.
    #[serde(other)]
    Unknown,
}

impl Cadence {
    /// Spacing between two occurrences.
    ///
    /// Months and years are fixed at 30 and 365 days; calendar drift is not
    /// corrected.
    pub fn interval_ms(&self) -> i64 {
        match self {
            Cadence::Daily | Cadence::Unknown => DAY_MS,
            Cadence::Weekly => WEEK_MS,
            Cadence::FourWeek => CYCLE_MS,
            Cadence::Monthly => 30 * DAY_MS,
            Cadence::Yearly => 365 * DAY_MS,
            Cadence::Continuous => HOUR_MS,
        }
    }

    /// Whether occurrences are identified by calendar day rather than by
    /// exact timestamp.
    pub fn is_day_granular(&self) -> bool {
        matches!(self, Cadence::Daily | Cadence::Unknown)
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cadence::Daily => write!(f, "daily"),
            Cadence::Weekly => write!(f, "weekly"),
            Cadence::Monthly => write!(f, "monthly"),
            Cadence::Yearly => write!(f, "yearly"),
            Cadence::FourWeek => write!(f, "4week"),
            Cadence::Continuous => write!(f, "continuous"),
            Cadence::Unknown => write!(f, "unknown"),
        }
    }
}

/// When a checklist repeats and during which part of the day it may be done.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(rename = "type", default)]
    pub cadence: Cadence,
    /// HH:mm local
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<String>,
    /// HH:mm local. Without it there is no window gating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<String>,
    /// Grace period after closing, in hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<f64>,
    /// Anchor of the 4-week cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<EpochMs>,
}

impl Schedule {
    pub fn new(cadence: Cadence) -> Self {
        Self {
            cadence,
            ..Default::default()
        }
    }

    pub fn with_opening_time(mut self, time: impl Into<String>) -> Self {
        self.opening_time = Some(time.into());
        self
    }

    pub fn with_closing_time(mut self, time: impl Into<String>) -> Self {
        self.closing_time = Some(time.into());
        self
    }

    pub fn with_expire_hours(mut self, hours: f64) -> Self {
        self.expire_time = Some(hours);
        self
    }

    pub fn with_start_date(mut self, start: EpochMs) -> Self {
        self.start_date = Some(start);
        self
    }

    /// A schedule can only expire when it has both a closing time and a grace period.
    pub fn can_expire(&self) -> bool {
        self.closing_time.is_some() && self.expire_time.is_some()
    }
}

/// Kind of answer an item expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Checkbox,
    #[serde(alias = "yesno", alias = "yes-no")]
    YesNo,
    Number,
    Text,
    Photo,
    #[serde(other)]
    Other,
}

/// A single gradeable or informational line of a checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub item_type: ItemType,
    #[serde(default)]
    pub required: bool,
}

impl Item {
    pub fn new(id: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            item_type,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Section kind. Log sections are informational and never graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    #[default]
    Standard,
    Logs,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub section_type: SectionType,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// A recurring compliance checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// No schedule means the checklist is never overdue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    /// Items outside any section.
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub sections: Vec<Section>,
    /// No instance is ever produced before this instant.
    #[serde(default)]
    pub created_at: EpochMs,
}

impl Checklist {
    pub fn new(id: impl Into<String>, created_at: EpochMs) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            schedule: None,
            items: Vec::new(),
            sections: Vec::new(),
            created_at,
        }
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn with_items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    pub fn cadence(&self) -> Option<Cadence> {
        self.schedule.as_ref().map(|s| s.cadence)
    }

    /// Every item, unsectioned first, then section by section.
    pub fn all_items(&self) -> impl Iterator<Item = &Item> {
        self.items
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.items.iter()))
    }

    /// Items that count towards scores (everything outside log sections).
    pub fn gradeable_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().chain(
            self.sections
                .iter()
                .filter(|s| s.section_type != SectionType::Logs)
                .flat_map(|s| s.items.iter()),
        )
    }

    /// Whether the item lives in a log section.
    pub fn is_log_item(&self, item_id: &str) -> bool {
        self.sections
            .iter()
            .filter(|s| s.section_type == SectionType::Logs)
            .any(|s| s.items.iter().any(|i| i.id == item_id))
    }
}

/// Status recorded on a completion when it was saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    Late,
    Expired,
    Overdue,
    Due,
    InProgress,
    #[serde(other)]
    Unknown,
}

/// Answer given for one item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Response {
    pub fn checked() -> Self {
        Self {
            completed: true,
            ..Default::default()
        }
    }

    pub fn unchecked() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_photo(mut self, url: impl Into<String>) -> Self {
        self.photos.push(url.into());
        self
    }
}

/// A persisted record of one checklist run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub checklist_id: String,
    pub completed_at: EpochMs,
    /// The occurrence this completion satisfies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<EpochMs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CompletionStatus>,
    #[serde(default)]
    pub responses: HashMap<String, Response>,
}

impl Completion {
    pub fn new(checklist_id: impl Into<String>, completed_at: EpochMs) -> Self {
        Self {
            id: None,
            checklist_id: checklist_id.into(),
            completed_at,
            scheduled_for: None,
            status: None,
            responses: HashMap::new(),
        }
    }

    pub fn scheduled_for(mut self, occurrence: EpochMs) -> Self {
        self.scheduled_for = Some(occurrence);
        self
    }

    pub fn with_status(mut self, status: CompletionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_response(mut self, item_id: impl Into<String>, response: Response) -> Self {
        self.responses.insert(item_id.into(), response);
        self
    }

    pub fn belongs_to(&self, checklist: &Checklist) -> bool {
        self.checklist_id == checklist.id
    }
}

/// Most recent completion of `checklist` among `completions`.
pub fn latest_completion<'a>(
    checklist: &Checklist,
    completions: &'a [Completion],
) -> Option<&'a Completion> {
    completions
        .iter()
        .filter(|c| c.belongs_to(checklist))
        .max_by_key(|c| c.completed_at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_deserializes_from_snapshot_json() {
        let json = r#"{"type":"4week","closingTime":"18:00","expireTime":1.5,"startDate":1700000000000}"#;
        let schedule: Schedule = serde_json::from_str(json).unwrap();
        assert_eq!(schedule.cadence, Cadence::FourWeek);
        assert_eq!(schedule.closing_time.as_deref(), Some("18:00"));
        assert_eq!(schedule.expire_time, Some(1.5));
        assert_eq!(schedule.start_date, Some(1_700_000_000_000));
        assert!(schedule.opening_time.is_none());
    }

    #[test]
    fn test_unknown_cadence_behaves_as_daily() {
        let schedule: Schedule = serde_json::from_str(r#"{"type":"fortnightly"}"#).unwrap();
        assert_eq!(schedule.cadence, Cadence::Unknown);
        assert_eq!(schedule.cadence.interval_ms(), Cadence::Daily.interval_ms());
        assert!(schedule.cadence.is_day_granular());
    }

    #[test]
    fn test_cadence_display_matches_wire_name() {
        assert_eq!(Cadence::FourWeek.to_string(), "4week");
        assert_eq!(
            serde_json::to_string(&Cadence::FourWeek).unwrap(),
            "\"4week\""
        );
    }

    #[test]
    fn test_can_expire_needs_closing_and_expire() {
        assert!(!Schedule::new(Cadence::Daily).with_expire_hours(2.0).can_expire());
        assert!(!Schedule::new(Cadence::Daily).with_closing_time("18:00").can_expire());
        assert!(Schedule::new(Cadence::Daily)
            .with_closing_time("18:00")
            .with_expire_hours(2.0)
            .can_expire());
    }

    #[test]
    fn test_gradeable_items_skip_log_sections() {
        let checklist = Checklist::new("c1", 0)
            .with_items(vec![Item::new("a", ItemType::Checkbox)])
            .with_section(Section {
                id: "s1".to_string(),
                title: "Temperatures".to_string(),
                section_type: SectionType::Logs,
                items: vec![Item::new("log1", ItemType::Number)],
            })
            .with_section(Section {
                id: "s2".to_string(),
                title: "Cleaning".to_string(),
                section_type: SectionType::Standard,
                items: vec![Item::new("b", ItemType::YesNo)],
            });

        let ids: Vec<_> = checklist.gradeable_items().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(checklist.all_items().count(), 3);
        assert!(checklist.is_log_item("log1"));
        assert!(!checklist.is_log_item("b"));
    }

    #[test]
    fn test_completion_status_in_progress_wire_name() {
        let status: CompletionStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, CompletionStatus::InProgress);
        let status: CompletionStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(status, CompletionStatus::Unknown);
    }

    #[test]
    fn test_latest_completion_ignores_other_checklists() {
        let checklist = Checklist::new("c1", 0);
        let completions = vec![
            Completion::new("c1", 100),
            Completion::new("c2", 500),
            Completion::new("c1", 300),
        ];
        let latest = latest_completion(&checklist, &completions).unwrap();
        assert_eq!(latest.completed_at, 300);
        assert!(latest_completion(&Checklist::new("c3", 0), &completions).is_none());
    }
}
