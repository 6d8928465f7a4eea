use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a callback running on the Tokio runtime.
///
/// Cancellation is synchronous with respect to scheduling: once `cancel`
/// returns, the callback is never invoked again. Dropping the handle
/// cancels it.
#[derive(Debug)]
pub struct ScheduledTask {
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Invoke `callback` immediately and then every `period` until it
    /// returns `ControlFlow::Break` or the task is cancelled.
    ///
    /// Late ticks are skipped rather than replayed in a burst.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn repeating<F>(period: Duration, mut callback: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period.max(MIN_PERIOD));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if flag.load(Ordering::Acquire) || callback().is_break() {
                    break;
                }
            }
        });
        Self { cancelled, handle }
    }

    /// Invoke `callback` once after `delay` unless cancelled first.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn delayed<F>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::Acquire) {
                callback();
            }
        });
        Self { cancelled, handle }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        self.handle.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Neither cancelled nor run to its end.
    pub fn is_active(&self) -> bool {
        !self.is_cancelled() && !self.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
