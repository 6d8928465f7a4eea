mod engine;
mod mode;
mod sequence;

pub use engine::{CountdownEngine, TimerPhase};
pub use mode::{Durations, Mode};
pub use sequence::{SessionSequencer, DEFAULT_LONG_BREAK_INTERVAL};
