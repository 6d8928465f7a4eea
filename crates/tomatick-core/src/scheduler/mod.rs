//! Time sources and task scheduling for the countdown service.
//!
//! - [`Clock`]: where "now" comes from. The engine only ever sees the
//!   epoch milliseconds a clock hands it.
//! - [`ScheduledTask`]: a handle to one repeating or delayed callback on the
//!   Tokio runtime, cancelled synchronously by [`ScheduledTask::cancel`] or
//!   by dropping the handle.

mod clock;
mod task;

pub use clock::{Clock, ManualClock, SystemClock, TokioClock};
pub use task::ScheduledTask;
