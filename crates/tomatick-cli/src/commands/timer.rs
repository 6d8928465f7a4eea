use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use chrono::Utc;
use clap::Subcommand;
use tomatick_core::{
    Clock, Config, CountdownEngine, CountdownService, Database, Event, Mode, SessionController,
    SessionSequencer, SystemClock, TimerPhase,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const ENGINE_KEY: &str = "timer_engine";
const SEQUENCER_KEY: &str = "timer_sequencer";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the countdown in the foreground, printing events as JSON lines
    Run {
        /// Switch to this mode before starting
        #[arg(long)]
        mode: Option<Mode>,
        /// Keep going: start each next interval after a 3 second pause
        #[arg(long)]
        auto_start: bool,
    },
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Reset the current mode to its full length
    Reset,
    /// Switch mode (rejected while running)
    Switch {
        /// focus, short_break or long_break
        mode: Mode,
    },
    /// Print current timer state as JSON
    Status,
}

fn load_engine(db: &Database, config: &Config) -> CountdownEngine {
    let mut engine = match db.kv_get_json::<CountdownEngine>(ENGINE_KEY) {
        Ok(Some(engine)) => engine,
        Ok(None) => CountdownEngine::new(config.durations()),
        Err(err) => {
            warn!(%err, "discarding unreadable timer state");
            CountdownEngine::new(config.durations())
        }
    };
    if engine.durations() != config.durations() {
        if let Err(err) = engine.configure_durations(config.durations()) {
            debug!(%err, "new durations deferred until the countdown stops");
        }
    }
    engine
}

fn load_sequencer(db: &Database, config: &Config) -> SessionSequencer {
    let mut sequencer = match db.kv_get_json::<SessionSequencer>(SEQUENCER_KEY) {
        Ok(Some(sequencer)) => sequencer,
        Ok(None) => config.sequencer(),
        Err(err) => {
            warn!(%err, "discarding unreadable sequencer state");
            config.sequencer()
        }
    };
    sequencer.set_long_break_interval(config.schedule.pomodoros_before_long_break);
    sequencer
}

fn save_state(
    db: &Database,
    engine: &CountdownEngine,
    sequencer: &SessionSequencer,
) -> Result<(), Box<dyn std::error::Error>> {
    db.kv_set_json(ENGINE_KEY, engine)?;
    db.kv_set_json(SEQUENCER_KEY, sequencer)?;
    Ok(())
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

/// `MM:SS`, minutes not wrapped at the hour.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Record a finished interval and select the next mode.
fn finish_interval(
    db: &Database,
    engine: &mut CountdownEngine,
    sequencer: &mut SessionSequencer,
    finished: Mode,
) -> Result<Event, Box<dyn std::error::Error>> {
    db.record_completion(finished, engine.durations().get(finished), Utc::now())?;
    let next = sequencer.record_completion(finished);
    Ok(engine.switch_mode(next)?)
}

/// Bring a persisted engine up to date. Prints and records a completion
/// that happened since the last command.
fn catch_up(
    db: &Database,
    engine: &mut CountdownEngine,
    sequencer: &mut SessionSequencer,
    now_ms: u64,
) -> Result<bool, Box<dyn std::error::Error>> {
    if let Some(Event::Completed { mode }) = engine.tick(now_ms) {
        print_event(&Event::Completed { mode })?;
        let switched = finish_interval(db, engine, sequencer, mode)?;
        print_event(&switched)?;
        return Ok(true);
    }
    Ok(false)
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let mut engine = load_engine(&db, &config);
    let mut sequencer = load_sequencer(&db, &config);
    let clock = SystemClock;

    let completed = catch_up(&db, &mut engine, &mut sequencer, clock.now_ms())?;
    let result = match action {
        TimerAction::Run { mode, auto_start } => {
            let auto_start = auto_start || config.timer.auto_start;
            return run_foreground(&db, &config, engine, sequencer, mode, auto_start);
        }
        TimerAction::Start => engine.start(clock.now_ms()).map(Some),
        TimerAction::Pause if completed => Ok(None),
        TimerAction::Pause => engine.pause().map(Some),
        TimerAction::Reset => Ok(Some(engine.reset())),
        TimerAction::Switch { mode } => engine.switch_mode(mode).map(Some),
        TimerAction::Status => Ok(Some(engine.snapshot())),
    };

    save_state(&db, &engine, &sequencer)?;
    match result? {
        Some(event) => print_event(&event),
        None => Ok(()),
    }
}

fn run_foreground(
    db: &Database,
    config: &Config,
    mut engine: CountdownEngine,
    sequencer: SessionSequencer,
    mode: Option<Mode>,
    auto_start: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if engine.is_running() {
        return Err(
            "a countdown is already running; see `tomatick timer status` or `tomatick timer reset`"
                .into(),
        );
    }
    if engine.phase() == TimerPhase::Completed {
        engine.reset();
    }
    if let Some(mode) = mode {
        engine.switch_mode(mode)?;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (service, mut events) =
            CountdownService::new(engine, Arc::new(SystemClock), config.tick_interval());
        let mut controller = SessionController::new(sequencer, auto_start);
        service.start()?;
        save_state(db, &service.engine(), controller.sequencer())?;

        drive(db, &service, &mut controller, &mut events, tokio::signal::ctrl_c()).await
    })
}

/// Process service events until the run ends or `stop` resolves.
///
/// The stored engine follows every state change, so other `timer`
/// commands see the live countdown and refuse to start a second one.
async fn drive<F: Future>(
    db: &Database,
    service: &CountdownService,
    controller: &mut SessionController,
    events: &mut mpsc::UnboundedReceiver<Event>,
    stop: F,
) -> Result<(), Box<dyn std::error::Error>> {
    tokio::pin!(stop);
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if !on_event(db, service, controller, &event)? {
                    // The next mode is already queued; report it before leaving.
                    while let Ok(event) = events.try_recv() {
                        on_event(db, service, controller, &event)?;
                    }
                    break;
                }
            }
            _ = &mut stop => {
                eprintln!();
                if service.is_running() {
                    print_event(&service.pause()?)?;
                } else {
                    service.reset();
                }
                break;
            }
        }
    }
    save_state(db, &service.engine(), controller.sequencer())
}

/// Print and persist one event. Returns `false` once the run is over.
fn on_event(
    db: &Database,
    service: &CountdownService,
    controller: &mut SessionController,
    event: &Event,
) -> Result<bool, Box<dyn std::error::Error>> {
    match event {
        Event::Tick { remaining_secs, mode } => {
            eprint!("\r{:<12} {}", mode.label(), format_clock(*remaining_secs));
            std::io::stderr().flush()?;
            Ok(true)
        }
        Event::Completed { mode } => {
            eprintln!();
            print_event(event)?;
            db.record_completion(*mode, service.engine().durations().get(*mode), Utc::now())?;
            controller.handle_event(service, event);
            save_state(db, &service.engine(), controller.sequencer())?;
            Ok(controller.auto_start())
        }
        _ => {
            print_event(event)?;
            db.kv_set_json(ENGINE_KEY, &service.engine())?;
            Ok(true)
        }
    }
}
