//! # Tomatick Core Library
//!
//! This library provides the core logic for the Tomatick Pomodoro timer.
//! The `tomatick` CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Countdown Engine**: A pure wall-clock-based state machine. The caller
//!   hands it the current time; remaining time is always recomputed from the
//!   start instant, so late or skipped ticks cannot drift.
//! - **Scheduler**: Clock sources and cancellable repeating/delayed tasks on
//!   the Tokio runtime.
//! - **Service**: The engine driven by one repeating task, emitting events on
//!   a channel, plus the controller that sequences modes and auto-starts.
//! - **Storage**: SQLite-based completion storage and TOML-based configuration
//! - **Stats / Calendar**: Achievements, goal progress and `.ics` export
//!
//! ## Key Components
//!
//! - [`CountdownEngine`]: Core timer state machine
//! - [`CountdownService`]: Engine + ticker + event channel
//! - [`SessionController`]: Next-mode selection and auto-start
//! - [`Database`]: Completion and statistics persistence
//! - [`Config`]: Application configuration management

pub mod calendar;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod service;
pub mod stats;
pub mod storage;
pub mod timer;

pub use calendar::FocusDayExport;
pub use error::{ConfigError, CoreError, DatabaseError, TransitionError, ValidationError};
pub use events::Event;
pub use scheduler::{Clock, ManualClock, ScheduledTask, SystemClock, TokioClock};
pub use service::{CountdownService, SessionController, AUTO_START_DELAY, DEFAULT_TICK_INTERVAL};
pub use stats::{achievements, Achievement, GoalProgress};
pub use storage::{Config, Database, Stats};
pub use timer::{CountdownEngine, Durations, Mode, SessionSequencer, TimerPhase};
