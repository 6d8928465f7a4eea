//! Countdown engine implementation.
//!
//! The engine is a pure wall-clock-based state machine. It owns no thread
//! and never reads the clock itself: every operation that needs the time
//! takes `now_ms` (milliseconds since the Unix epoch) from the caller.
//!
//! While running, the remaining time is always recomputed from the instant
//! the countdown was started, never decremented per tick:
//!
//! ```text
//! remaining = initial_remaining_at_start - floor((now - started_at) / 1000)
//! ```
//!
//! so a late, throttled or skipped `tick()` cannot introduce drift.
//!
//! ## State Transitions
//!
//! ```text
//! Idle | Paused --start--> Running --pause--> Paused
//! Running --tick (remaining == 0)--> Completed --switch_mode | reset--> Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = CountdownEngine::new(Durations::default());
//! engine.start(now_ms())?;
//! // Periodically:
//! if let Some(Event::Completed { mode }) = engine.tick(now_ms()) { ... }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::mode::{Durations, Mode};
use crate::error::TransitionError;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    /// Countdown reached zero; waits for the next mode to be selected.
    Completed,
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::Completed => "completed",
        })
    }
}

/// Core countdown engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownEngine {
    durations: Durations,
    mode: Mode,
    phase: TimerPhase,
    remaining_secs: u64,
    /// Wall-clock instant of the last `start`, only set while running.
    #[serde(default)]
    started_at_epoch_ms: Option<u64>,
    /// Value of `remaining_secs` captured by the last `start`.
    #[serde(default)]
    initial_remaining_at_start: u64,
}

impl CountdownEngine {
    /// Create an idle engine in Focus mode with a full countdown.
    pub fn new(durations: Durations) -> Self {
        Self {
            durations,
            mode: Mode::Focus,
            phase: TimerPhase::Idle,
            remaining_secs: durations.focus,
            started_at_epoch_ms: None,
            initial_remaining_at_start: durations.focus,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    pub fn started_at_epoch_ms(&self) -> Option<u64> {
        self.started_at_epoch_ms
    }

    pub fn total_secs(&self) -> u64 {
        self.durations.get(self.mode)
    }

    /// 0.0 .. 1.0 progress within the current mode.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        (1.0 - (self.remaining_secs as f64 / total as f64)).clamp(0.0, 1.0)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::Snapshot {
            phase: self.phase,
            mode: self.mode,
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs(),
            progress: self.progress(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now_ms: u64) -> Result<Event, TransitionError> {
        match self.phase {
            TimerPhase::Idle | TimerPhase::Paused => {
                self.phase = TimerPhase::Running;
                self.started_at_epoch_ms = Some(now_ms);
                self.initial_remaining_at_start = self.remaining_secs;
                debug!(mode = %self.mode, remaining = self.remaining_secs, "countdown started");
                Ok(Event::Started {
                    mode: self.mode,
                    remaining_secs: self.remaining_secs,
                })
            }
            TimerPhase::Running | TimerPhase::Completed => Err(self.reject("start")),
        }
    }

    /// Freeze the countdown at its last computed value.
    ///
    /// Does not consult the clock; callers that have not ticked recently
    /// should `tick(now)` first.
    pub fn pause(&mut self) -> Result<Event, TransitionError> {
        if self.phase != TimerPhase::Running {
            return Err(self.reject("pause"));
        }
        self.phase = TimerPhase::Paused;
        self.started_at_epoch_ms = None;
        debug!(mode = %self.mode, remaining = self.remaining_secs, "countdown paused");
        Ok(Event::Paused {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
        })
    }

    pub fn reset(&mut self) -> Event {
        self.phase = TimerPhase::Idle;
        self.started_at_epoch_ms = None;
        self.remaining_secs = self.durations.get(self.mode);
        self.initial_remaining_at_start = self.remaining_secs;
        debug!(mode = %self.mode, "countdown reset");
        Event::Reset {
            mode: self.mode,
            remaining_secs: self.remaining_secs,
        }
    }

    pub fn switch_mode(&mut self, mode: Mode) -> Result<Event, TransitionError> {
        if self.is_running() {
            return Err(self.reject("switch mode"));
        }
        self.mode = mode;
        self.reset();
        debug!(%mode, "mode switched");
        Ok(Event::ModeSwitched {
            mode,
            remaining_secs: self.remaining_secs,
        })
    }

    /// Replace the per-mode durations.
    ///
    /// An idle countdown picks up the new length at once. A paused or
    /// completed one keeps its remaining time until the next reset or
    /// mode switch.
    pub fn configure_durations(&mut self, durations: Durations) -> Result<Event, TransitionError> {
        if self.is_running() {
            return Err(self.reject("change durations"));
        }
        self.durations = durations;
        if self.phase == TimerPhase::Idle {
            self.remaining_secs = durations.get(self.mode);
            self.initial_remaining_at_start = self.remaining_secs;
        }
        debug!(?durations, "durations configured");
        Ok(Event::DurationsConfigured { durations })
    }

    /// Recompute the remaining time from the wall clock.
    ///
    /// Returns `Some(Event::Completed)` exactly once per countdown, when the
    /// remaining time reaches zero, `Some(Event::Tick)` otherwise while
    /// running, and `None` in every other phase.
    pub fn tick(&mut self, now_ms: u64) -> Option<Event> {
        if self.phase != TimerPhase::Running {
            return None;
        }
        let started = self.started_at_epoch_ms?;
        let elapsed_secs = now_ms.saturating_sub(started) / 1000;
        self.remaining_secs = self.initial_remaining_at_start.saturating_sub(elapsed_secs);

        if self.remaining_secs == 0 {
            return Some(self.complete());
        }
        Some(Event::Tick {
            remaining_secs: self.remaining_secs,
            mode: self.mode,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Event {
        self.phase = TimerPhase::Completed;
        self.started_at_epoch_ms = None;
        self.remaining_secs = 0;
        debug!(mode = %self.mode, "countdown completed");
        Event::Completed { mode: self.mode }
    }

    fn reject(&self, action: &'static str) -> TransitionError {
        debug!(action, phase = %self.phase, "transition rejected");
        TransitionError::InvalidTransition {
            action,
            phase: self.phase,
        }
    }
}

impl Default for CountdownEngine {
    fn default() -> Self {
        Self::new(Durations::default())
    }
}
