use serde::{Deserialize, Serialize};

use crate::timer::{Durations, Mode, TimerPhase};

/// Every state change of the countdown produces an Event.
/// Display renderers consume `Tick`; stats and sequencing consume `Completed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Started {
        mode: Mode,
        remaining_secs: u64,
    },
    Paused {
        mode: Mode,
        remaining_secs: u64,
    },
    Reset {
        mode: Mode,
        remaining_secs: u64,
    },
    ModeSwitched {
        mode: Mode,
        remaining_secs: u64,
    },
    DurationsConfigured {
        durations: Durations,
    },
    Tick {
        remaining_secs: u64,
        mode: Mode,
    },
    /// Countdown reached zero. Carries the mode that just finished.
    Completed {
        mode: Mode,
    },
    /// Next interval will start on its own after `delay_ms`.
    AutoStartScheduled {
        mode: Mode,
        delay_ms: u64,
    },
    Snapshot {
        phase: TimerPhase,
        mode: Mode,
        remaining_secs: u64,
        total_secs: u64,
        progress: f64,
    },
}

impl Event {
    /// Mode named by the event, if any.
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Event::Started { mode, .. }
            | Event::Paused { mode, .. }
            | Event::Reset { mode, .. }
            | Event::ModeSwitched { mode, .. }
            | Event::Tick { mode, .. }
            | Event::Completed { mode }
            | Event::AutoStartScheduled { mode, .. }
            | Event::Snapshot { mode, .. } => Some(*mode),
            Event::DurationsConfigured { .. } => None,
        }
    }
}
