use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Focus, Mode::ShortBreak, Mode::LongBreak];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Focus => "focus",
            Mode::ShortBreak => "short_break",
            Mode::LongBreak => "long_break",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Focus => "Focus Time",
            Mode::ShortBreak => "Short Break",
            Mode::LongBreak => "Long Break",
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, Mode::Focus)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "focus" | "pomodoro" => Ok(Mode::Focus),
            "short_break" | "short" => Ok(Mode::ShortBreak),
            "long_break" | "long" => Ok(Mode::LongBreak),
            other => Err(ValidationError::InvalidValue {
                field: "mode".into(),
                message: format!("unknown mode '{other}'"),
            }),
        }
    }
}

/// Length of each mode, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub focus: u64,
    pub short_break: u64,
    pub long_break: u64,
}

impl Durations {
    pub fn from_minutes(focus: u64, short_break: u64, long_break: u64) -> Self {
        Self {
            focus: focus.saturating_mul(60),
            short_break: short_break.saturating_mul(60),
            long_break: long_break.saturating_mul(60),
        }
    }

    pub fn get(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Focus => self.focus,
            Mode::ShortBreak => self.short_break,
            Mode::LongBreak => self.long_break,
        }
    }
}

impl Default for Durations {
    fn default() -> Self {
        Self {
            focus: 1500,
            short_break: 300,
            long_break: 900,
        }
    }
}
