use std::time::Duration;

use tracing::{info, warn};

use super::CountdownService;
use crate::events::Event;
use crate::timer::{Mode, SessionSequencer};

/// Pause between one interval completing and the next starting on its own.
pub const AUTO_START_DELAY: Duration = Duration::from_millis(3000);

/// Reacts to completions: selects the next mode and, when enabled,
/// schedules it to start after [`AUTO_START_DELAY`].
#[derive(Debug, Clone)]
pub struct SessionController {
    sequencer: SessionSequencer,
    auto_start: bool,
}

impl SessionController {
    pub fn new(sequencer: SessionSequencer, auto_start: bool) -> Self {
        Self {
            sequencer,
            auto_start,
        }
    }

    pub fn sequencer(&self) -> &SessionSequencer {
        &self.sequencer
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn set_auto_start(&mut self, enabled: bool) {
        self.auto_start = enabled;
    }

    /// Handle one event from the service. Returns the next mode when the
    /// event was a completion and the switch succeeded.
    pub fn handle_event(&mut self, service: &CountdownService, event: &Event) -> Option<Mode> {
        let Event::Completed { mode: finished } = event else {
            return None;
        };
        let next = self.sequencer.record_completion(*finished);
        info!(
            %finished,
            %next,
            completed_focus = self.sequencer.completed_focus(),
            "interval completed"
        );

        if let Err(err) = service.switch_mode(next) {
            warn!(%err, "could not select next mode");
            return None;
        }
        if self.auto_start {
            service.schedule_start(AUTO_START_DELAY);
        }
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::scheduler::TokioClock;
    use crate::service::DEFAULT_TICK_INTERVAL;
    use crate::timer::{CountdownEngine, Durations};

    fn tiny() -> Durations {
        Durations {
            focus: 2,
            short_break: 1,
            long_break: 3,
        }
    }

    async fn next_completion(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Event>) -> Event {
        loop {
            let event = rx.recv().await.expect("service dropped");
            if matches!(event, Event::Completed { .. }) {
                return event;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fourth_focus_routes_to_long_break() {
        let (svc, mut rx) = CountdownService::new(
            CountdownEngine::new(tiny()),
            Arc::new(TokioClock::anchored_at(0)),
            DEFAULT_TICK_INTERVAL,
        );
        let mut controller = SessionController::new(SessionSequencer::default(), false);

        let mut picks = Vec::new();
        for _ in 0..4 {
            svc.switch_mode(Mode::Focus).unwrap();
            svc.start().unwrap();
            let event = next_completion(&mut rx).await;
            picks.push(controller.handle_event(&svc, &event).unwrap());
            assert!(!svc.is_running());
        }
        assert_eq!(
            picks,
            vec![Mode::ShortBreak, Mode::ShortBreak, Mode::ShortBreak, Mode::LongBreak]
        );
        assert_eq!(svc.mode(), Mode::LongBreak);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_start_waits_three_seconds() {
        let (svc, mut rx) = CountdownService::new(
            CountdownEngine::new(tiny()),
            Arc::new(TokioClock::anchored_at(0)),
            DEFAULT_TICK_INTERVAL,
        );
        let mut controller = SessionController::new(SessionSequencer::default(), true);

        svc.start().unwrap();
        let event = next_completion(&mut rx).await;
        assert_eq!(controller.handle_event(&svc, &event), Some(Mode::ShortBreak));
        assert!(svc.has_pending_start());

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert!(!svc.is_running());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(svc.is_running());
        assert_eq!(svc.mode(), Mode::ShortBreak);
    }

    #[tokio::test(start_paused = true)]
    async fn non_completion_events_are_ignored() {
        let (svc, _rx) = CountdownService::new(
            CountdownEngine::default(),
            Arc::new(TokioClock::anchored_at(0)),
            DEFAULT_TICK_INTERVAL,
        );
        let mut controller = SessionController::new(SessionSequencer::default(), true);
        let event = Event::Tick {
            remaining_secs: 10,
            mode: Mode::Focus,
        };
        assert_eq!(controller.handle_event(&svc, &event), None);
        assert!(!svc.has_pending_start());
        assert_eq!(controller.sequencer().completed_focus(), 0);
    }
}
