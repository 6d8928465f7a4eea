//! Async countdown service.
//!
//! [`CountdownService`] wraps a [`CountdownEngine`] with a [`Clock`] and a
//! single repeating [`ScheduledTask`] that recomputes the countdown every
//! `tick_interval`. Events produced by the engine are sent on an unbounded
//! channel in the order the transitions happened.
//!
//! Engine, task handles and a generation counter share one mutex. Every
//! command that stops the countdown bumps the generation, so a callback that
//! was already in flight when the task got cancelled finds a stale
//! generation under the lock and does nothing.

mod controller;

pub use controller::{SessionController, AUTO_START_DELAY};

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::error::TransitionError;
use crate::events::Event;
use crate::scheduler::{Clock, ScheduledTask};
use crate::timer::{CountdownEngine, Durations, Mode};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Cloneable handle to a running countdown.
///
/// All methods are synchronous and must be called from within a Tokio
/// runtime.
#[derive(Debug, Clone)]
pub struct CountdownService {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
    events: mpsc::UnboundedSender<Event>,
    tick_interval: Duration,
}

#[derive(Debug)]
struct State {
    engine: CountdownEngine,
    generation: u64,
    ticker: Option<ScheduledTask>,
    pending_start: Option<ScheduledTask>,
}

impl State {
    /// Invalidate and drop every scheduled callback.
    fn cancel_tasks(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.ticker = None;
        self.pending_start = None;
    }
}

impl CountdownService {
    pub fn new(
        engine: CountdownEngine,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events, rx) = mpsc::unbounded_channel();
        let inner = Inner {
            state: Mutex::new(State {
                engine,
                generation: 0,
                ticker: None,
                pending_start: None,
            }),
            clock,
            events,
            tick_interval,
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            rx,
        )
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Event {
        self.inner.lock().engine.snapshot()
    }

    pub fn mode(&self) -> Mode {
        self.inner.lock().engine.mode()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.inner.lock().engine.remaining_secs()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().engine.is_running()
    }

    /// Whether a repeating tick task is currently installed.
    pub fn has_active_ticker(&self) -> bool {
        self.inner.lock().ticker.as_ref().is_some_and(ScheduledTask::is_active)
    }

    /// Whether an auto-start is still waiting to fire.
    pub fn has_pending_start(&self) -> bool {
        self.inner
            .lock()
            .pending_start
            .as_ref()
            .is_some_and(ScheduledTask::is_active)
    }

    /// Copy of the engine, e.g. for persisting it.
    pub fn engine(&self) -> CountdownEngine {
        self.inner.lock().engine.clone()
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&self) -> Result<Event, TransitionError> {
        let mut state = self.inner.lock();
        self.inner.start_locked(&mut state)
    }

    /// Pause the countdown.
    ///
    /// A pending auto-start is dropped even when there is nothing to pause.
    pub fn pause(&self) -> Result<Event, TransitionError> {
        let mut state = self.inner.lock();
        state.cancel_tasks();
        let event = state.engine.pause()?;
        self.inner.emit(&event);
        Ok(event)
    }

    pub fn reset(&self) -> Event {
        let mut state = self.inner.lock();
        let event = state.engine.reset();
        state.cancel_tasks();
        self.inner.emit(&event);
        event
    }

    pub fn switch_mode(&self, mode: Mode) -> Result<Event, TransitionError> {
        let mut state = self.inner.lock();
        let event = state.engine.switch_mode(mode)?;
        state.cancel_tasks();
        self.inner.emit(&event);
        Ok(event)
    }

    pub fn configure_durations(&self, durations: Durations) -> Result<Event, TransitionError> {
        let mut state = self.inner.lock();
        let event = state.engine.configure_durations(durations)?;
        self.inner.emit(&event);
        Ok(event)
    }

    /// Start the countdown after `delay` unless another command comes first.
    ///
    /// Replaces any start already pending.
    pub fn schedule_start(&self, delay: Duration) -> Event {
        let mut state = self.inner.lock();
        let generation = state.generation;
        let weak = Arc::downgrade(&self.inner);
        state.pending_start = Some(ScheduledTask::delayed(delay, move || {
            if let Some(inner) = weak.upgrade() {
                inner.scheduled_start(generation);
            }
        }));
        let event = Event::AutoStartScheduled {
            mode: state.engine.mode(),
            delay_ms: delay.as_millis() as u64,
        };
        info!(mode = %state.engine.mode(), delay_ms = delay.as_millis() as u64, "auto-start scheduled");
        self.inner.emit(&event);
        event
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: &Event) {
        if self.events.send(event.clone()).is_err() {
            trace!("event receiver dropped");
        }
    }

    fn start_locked(self: &Arc<Self>, state: &mut State) -> Result<Event, TransitionError> {
        let event = state.engine.start(self.clock.now_ms())?;
        state.cancel_tasks();

        let generation = state.generation;
        let weak = Arc::downgrade(self);
        state.ticker = Some(ScheduledTask::repeating(self.tick_interval, move || {
            match weak.upgrade() {
                Some(inner) => inner.tick(generation),
                None => ControlFlow::Break(()),
            }
        }));
        self.emit(&event);
        Ok(event)
    }

    fn tick(&self, generation: u64) -> ControlFlow<()> {
        let mut state = self.lock();
        if state.generation != generation {
            trace!(generation, "stale tick ignored");
            return ControlFlow::Break(());
        }
        match state.engine.tick(self.clock.now_ms()) {
            Some(event @ Event::Completed { .. }) => {
                state.cancel_tasks();
                info!(mode = ?event.mode(), "countdown finished");
                self.emit(&event);
                ControlFlow::Break(())
            }
            Some(event) => {
                self.emit(&event);
                ControlFlow::Continue(())
            }
            None => ControlFlow::Break(()),
        }
    }

    fn scheduled_start(self: &Arc<Self>, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            trace!(generation, "stale auto-start ignored");
            return;
        }
        match self.start_locked(&mut state) {
            Ok(_) => info!(mode = %state.engine.mode(), "auto-started next interval"),
            Err(err) => debug!(%err, "auto-start skipped"),
        }
    }
}
