//! # Checkcadence Core Library
//!
//! This library decides what state a recurring compliance checklist is in at
//! any instant, when it next falls due, and which calendar instances of it
//! should be shown. It is a set of pure computations over read-only
//! snapshots: persistence, permissions and rendering live elsewhere.
//!
//! ## Architecture
//!
//! - **ScheduleCalculator**: next due date per cadence (daily, weekly,
//!   4-week, monthly, yearly, continuous)
//! - **WindowResolver**: opening / closing / expiry instants of an occurrence,
//!   including overnight windows
//! - **StatusEngine**: six-way status state machine with stored-completion
//!   precedence
//! - **InstanceGenerator**: bounded calendar projection of a checklist
//! - **ScoringEngine**: completion scores, validation, streaks and dashboard
//!   aggregates
//!
//! Every entry point takes `now` explicitly; nothing reads the system clock
//! during a computation.
//!
//! ## Key Components
//!
//! - [`ChecklistEngine`]: all components wired from one [`EngineConfig`]
//! - [`StatusEngine`]: current and per-instance status
//! - [`InstanceGenerator`]: calendar instances
//! - [`ScoringEngine`]: scoring and aggregates

pub mod calculator;
pub mod checklist;
pub mod config;
pub mod engine;
pub mod error;
pub mod instances;
pub mod scoring;
pub mod status;
pub mod time;
pub mod window;

pub use calculator::ScheduleCalculator;
pub use checklist::{
    latest_completion, Cadence, Checklist, Completion, CompletionStatus, Item, ItemType, Response,
    Schedule, Section, SectionType, Snapshot,
};
pub use config::{ClockConfig, EngineConfig, InstancesConfig, ScoringConfig, StatusConfig};
pub use engine::{ChecklistEngine, ChecklistOverview};
pub use error::{ConfigError, CoreError, Result};
pub use instances::{Instance, InstanceGenerator};
pub use scoring::{DashboardMetrics, ScoringEngine, ValidationReport};
pub use status::{Assessment, Status, StatusEngine};
pub use time::{EpochMs, WallClock};
pub use window::{OccurrenceWindow, WindowResolver};
