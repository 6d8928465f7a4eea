//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Focus / short break / long break lengths
//! - Auto-start of the next interval and the tick cadence
//! - Daily and weekly goals
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{Durations, SessionSequencer};

/// Interval lengths, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_focus_duration")]
    pub focus_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
    #[serde(default = "default_pomodoros_before_long_break")]
    pub pomodoros_before_long_break: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Start the next interval by itself after a completion.
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Completed-pomodoro targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalsConfig {
    #[serde(default = "default_daily_goal")]
    pub daily: u32,
    #[serde(default = "default_weekly_goal")]
    pub weekly: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub goals: GoalsConfig,
}

fn default_focus_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_pomodoros_before_long_break() -> u32 {
    4
}
fn default_tick_interval_ms() -> u64 {
    200
}
fn default_daily_goal() -> u32 {
    8
}
fn default_weekly_goal() -> u32 {
    40
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            focus_duration: default_focus_duration(),
            short_break: default_short_break(),
            long_break: default_long_break(),
            pomodoros_before_long_break: default_pomodoros_before_long_break(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            auto_start: false,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            daily: default_daily_goal(),
            weekly: default_weekly_goal(),
        }
    }
}

impl Config {
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
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let existing = Self::get_json_value_by_path(root, key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            serde_json::Value::Number(_) => value
                .parse::<u64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?,
            serde_json::Value::Object(_) => {
                return Err(invalid("cannot replace a whole section".into()));
            }
            _ => serde_json::Value::String(value.into()),
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        let mut parent = root;
        if let Some(path) = parent_path {
            for part in path.split('.') {
                parent = parent
                    .get_mut(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
            }
        }
        parent
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?
            .insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path` or create it with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or fails
    /// validation, or if the default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                debug!(path = %path.display(), "config loaded");
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            warn!(%err, "falling back to default config");
            Self::default()
        })
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
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
    /// The value must parse as the type already stored under the key, and
    /// the resulting config must pass [`Config::validate`]. On error the
    /// config is left unchanged. Does not write to disk.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject settings the timer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("schedule.focus_duration", self.schedule.focus_duration as u64),
            ("schedule.short_break", self.schedule.short_break as u64),
            ("schedule.long_break", self.schedule.long_break as u64),
            (
                "schedule.pomodoros_before_long_break",
                self.schedule.pomodoros_before_long_break as u64,
            ),
            ("timer.tick_interval_ms", self.timer.tick_interval_ms),
            ("goals.daily", self.goals.daily as u64),
            ("goals.weekly", self.goals.weekly as u64),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be at least 1".into(),
                });
            }
        }
        Ok(())
    }

    /// Interval lengths in seconds, as the engine consumes them.
    pub fn durations(&self) -> Durations {
        Durations::from_minutes(
            self.schedule.focus_duration as u64,
            self.schedule.short_break as u64,
            self.schedule.long_break as u64,
        )
    }

    pub fn sequencer(&self) -> SessionSequencer {
        SessionSequencer::new(self.schedule.pomodoros_before_long_break)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.timer.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.schedule.focus_duration, 25);
        assert_eq!(parsed.goals.weekly, 40);
        assert!(!parsed.timer.auto_start);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[schedule]\nfocus_duration = 50\n").unwrap();
        assert_eq!(parsed.schedule.focus_duration, 50);
        assert_eq!(parsed.schedule.short_break, 5);
        assert_eq!(parsed.timer.tick_interval_ms, 200);
        assert_eq!(parsed.goals.daily, 8);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.auto_start").as_deref(), Some("false"));
        assert_eq!(cfg.get("schedule.focus_duration").as_deref(), Some("25"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("timer.auto_start", "true").unwrap();
        cfg.set("schedule.long_break", "20").unwrap();
        assert!(cfg.timer.auto_start);
        assert_eq!(cfg.schedule.long_break, 20);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timer.nonexistent_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.auto_start", "not_a_bool").is_err());
        assert!(cfg.set("schedule.focus_duration", "-3").is_err());
        assert!(cfg.set("schedule", "1").is_err());
    }

    #[test]
    fn set_rejects_zero_duration_and_keeps_old_value() {
        let mut cfg = Config::default();
        assert!(cfg.set("schedule.focus_duration", "0").is_err());
        assert_eq!(cfg.schedule.focus_duration, 25);
    }

    #[test]
    fn durations_are_in_seconds() {
        let mut cfg = Config::default();
        cfg.schedule.focus_duration = 50;
        let d = cfg.durations();
        assert_eq!(d.focus, 3000);
        assert_eq!(d.short_break, 300);
        assert_eq!(d.long_break, 900);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.schedule.focus_duration, 25);
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = Config::default();
        cfg.set("goals.daily", "12").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.goals.daily, 12);
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[schedule]\nshort_break = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        std::fs::write(&path, "this is not toml =").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
