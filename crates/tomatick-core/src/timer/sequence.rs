use serde::{Deserialize, Serialize};

use super::mode::Mode;

pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;

/// Picks the mode that follows a completed interval.
///
/// Every `long_break_interval`-th completed focus session is followed by a
/// long break, other focus sessions by a short break, and every break by
/// focus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSequencer {
    completed_focus: u32,
    long_break_interval: u32,
}

impl SessionSequencer {
    pub fn new(long_break_interval: u32) -> Self {
        Self {
            completed_focus: 0,
            long_break_interval: long_break_interval.max(1),
        }
    }

    pub fn completed_focus(&self) -> u32 {
        self.completed_focus
    }

    pub fn long_break_interval(&self) -> u32 {
        self.long_break_interval
    }

    pub fn set_long_break_interval(&mut self, interval: u32) {
        self.long_break_interval = interval.max(1);
    }

    /// Record that `finished` ran to completion and return the next mode.
    pub fn record_completion(&mut self, finished: Mode) -> Mode {
        if finished.is_break() {
            return Mode::Focus;
        }
        self.completed_focus = self.completed_focus.saturating_add(1);
        if self.completed_focus % self.long_break_interval == 0 {
            Mode::LongBreak
        } else {
            Mode::ShortBreak
        }
    }
}

impl Default for SessionSequencer {
    fn default() -> Self {
        Self::new(DEFAULT_LONG_BREAK_INTERVAL)
    }
}
