//! TOML-based engine configuration.
//!
//! Holds the tunables of the status, instance and scoring engines:
//! - Lead time of the pre-close "due" notice
//! - Freshness of continuous completions
//! - Business-day rollover for occurrences that are due immediately
//! - Default calendar span and streak tolerance
//! - Optional fixed UTC offset for the wall clock
//!
//! The default location is `<config dir>/checkcadence/engine.toml`; the
//! `CHECKCADENCE_CONFIG` environment variable overrides it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::time::{parse_hhmm, WallClock, HOUR_MS, MINUTE_MS};

/// Status engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_due_lead_hours")]
    pub due_lead_hours: u32,
    #[serde(default = "default_continuous_fresh_minutes")]
    pub continuous_fresh_minutes: u32,
    /// HH:mm. An occurrence due "right now" belongs to the operating day that
    /// started at this time.
    #[serde(default = "default_business_day_start")]
    pub business_day_start: String,
}

/// Instance generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstancesConfig {
    #[serde(default = "default_days_to_show")]
    pub days_to_show: u32,
}

/// Scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_streak_tolerance_hours")]
    pub streak_tolerance_hours: u32,
}

/// Wall clock configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Minutes east of UTC. The host's local offset is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub instances: InstancesConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub clock: ClockConfig,
}

// Default functions
fn default_due_lead_hours() -> u32 {
    24
}
fn default_continuous_fresh_minutes() -> u32 {
    60
}
fn default_business_day_start() -> String {
    "04:00".into()
}
fn default_days_to_show() -> u32 {
    7
}
fn default_streak_tolerance_hours() -> u32 {
    6
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            due_lead_hours: default_due_lead_hours(),
            continuous_fresh_minutes: default_continuous_fresh_minutes(),
            business_day_start: default_business_day_start(),
        }
    }
}

impl Default for InstancesConfig {
    fn default() -> Self {
        Self {
            days_to_show: default_days_to_show(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            streak_tolerance_hours: default_streak_tolerance_hours(),
        }
    }
}

impl StatusConfig {
    pub fn due_lead_ms(&self) -> i64 {
        i64::from(self.due_lead_hours) * HOUR_MS
    }

    pub fn continuous_fresh_ms(&self) -> i64 {
        i64::from(self.continuous_fresh_minutes) * MINUTE_MS
    }

    pub fn business_day_start_ms(&self) -> i64 {
        parse_hhmm(&self.business_day_start) * MINUTE_MS
    }
}

impl ScoringConfig {
    pub fn streak_tolerance_ms(&self) -> i64 {
        i64::from(self.streak_tolerance_hours) * HOUR_MS
    }
}

impl ClockConfig {
    pub fn wall_clock(&self) -> WallClock {
        match self.utc_offset_minutes {
            Some(minutes) => WallClock::from_offset_minutes(minutes),
            None => WallClock::system(),
        }
    }
}

impl EngineConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::InvalidValue {
            key: key.to_string(),
            message: "unknown config key".to_string(),
        };
        let unparsable = |kind: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("cannot parse '{value}' as {kind}"),
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let new_value = match obj.get(part) {
                    Some(serde_json::Value::Number(_)) => value
                        .parse::<i64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| unparsable("integer"))?,
                    Some(serde_json::Value::String(_)) => serde_json::Value::String(value.into()),
                    // Unset optionals (the clock offset) are integers.
                    None if part == "utc_offset_minutes" => value
                        .parse::<i64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| unparsable("integer"))?,
                    _ => return Err(unknown()),
                };
                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default config file location.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("CHECKCADENCE_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("checkcadence")
            .join("engine.toml")
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: EngineConfig = toml::from_str(content).map_err(ConfigError::from)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, cannot be parsed, or holds
    /// invalid values.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(cfg)
    }

    /// Persist to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from the default location, returning defaults on any error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        let path = Self::default_path();
        match Self::load_from(&path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "using default engine config");
                Self::default()
            }
        }
    }

    /// Reject values that would make the engines meaningless.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let positive = [
            ("status.due_lead_hours", self.status.due_lead_hours),
            (
                "status.continuous_fresh_minutes",
                self.status.continuous_fresh_minutes,
            ),
            ("instances.days_to_show", self.instances.days_to_show),
            (
                "scoring.streak_tolerance_hours",
                self.scoring.streak_tolerance_hours,
            ),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed, or
    /// the result fails validation. The config is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: EngineConfig = serde_json::from_value(json)?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn wall_clock(&self) -> WallClock {
        self.clock.wall_clock()
    }
}
