use clap::Subcommand;
use pulsefocus_core::biometrics::{SimulatedVitals, VitalSigns};
use pulsefocus_core::notify::{ConsoleNotifier, NotificationSink};
use pulsefocus_core::session::{FocusMode, Role, SessionConfig, SessionStateMachine};
use pulsefocus_core::storage::{Config, Database};
use pulsefocus_core::{Event, Phase};

const MACHINE_KEY: &str = "session_machine";

/// Focus seconds between encouragement notifications during `timer run`.
const ENCOURAGE_EVERY_SECS: u32 = 300;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session
    Start {
        /// Focus minutes (overrides config)
        #[arg(long)]
        focus: Option<u32>,
        /// Rest minutes (overrides config)
        #[arg(long)]
        rest: Option<u32>,
        /// Use the durations as-is instead of adapting to biometrics
        #[arg(long)]
        fixed: bool,
    },
    /// Pause the active countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Abandon the session without archiving
    Reset,
    /// Print current session state as JSON
    Status,
    /// Archive the elapsed focus time and return to idle
    Save,
    /// Run the session in the foreground until it completes
    Run {
        #[arg(long)]
        focus: Option<u32>,
        #[arg(long)]
        rest: Option<u32>,
        #[arg(long)]
        fixed: bool,
    },
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

fn session_config(config: &Config, focus: Option<u32>, rest: Option<u32>, fixed: bool) -> SessionConfig {
    let mut sc = config.timer.session_config();
    if let Some(f) = focus {
        sc = SessionConfig::new(f, sc.rest_minutes, sc.mode);
    }
    if let Some(r) = rest {
        sc = SessionConfig::new(sc.focus_minutes, r, sc.mode);
    }
    if fixed {
        sc = SessionConfig::new(sc.focus_minutes, sc.rest_minutes, FocusMode::Fixed);
    }
    sc
}

fn current_vitals(config: &Config) -> VitalSigns {
    if config.timer.simulated_vitals {
        SimulatedVitals::new(now_unix() as u64).sample()
    } else {
        // No sensor wired up: a neutral sample, zero pressure.
        VitalSigns {
            bpm: 64.0,
            hrv: 60.0,
            resting_hr: 64.0,
        }
    }
}

fn load_machine(db: &Database, config: &Config) -> SessionStateMachine {
    if let Ok(Some(json)) = db.kv_get(MACHINE_KEY) {
        if let Ok(machine) = serde_json::from_str::<SessionStateMachine>(&json) {
            return machine;
        }
    }
    SessionStateMachine::new(Role::Driver, config.timer.session_config())
}

fn save_machine(db: &Database, machine: &SessionStateMachine) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(machine)?;
    db.kv_set(MACHINE_KEY, &json)?;
    Ok(())
}

/// Persist the archival record carried by a completion/save event.
fn archive_event(db: &Database, event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    match event {
        Event::SessionCompleted { session, .. } | Event::SessionSaved { session, .. } => {
            db.insert_session(session)?;
        }
        _ => {}
    }
    Ok(())
}

/// Replay the wall-clock time since the last invocation and archive any
/// completion that happened while no process was running.
fn catch_up(
    db: &Database,
    machine: &mut SessionStateMachine,
    now: i64,
) -> Result<Vec<Event>, Box<dyn std::error::Error>> {
    let events = machine.fast_forward(now);
    for event in &events {
        archive_event(db, event)?;
    }
    // Messages produced offline have no link to travel; drop them.
    machine.drain_outbox();
    Ok(events)
}

fn print_status(machine: &SessionStateMachine, now: i64) -> Result<(), Box<dyn std::error::Error>> {
    let status = serde_json::json!({
        "phase": machine.phase(),
        "running": machine.is_running(),
        "remaining_secs": machine.remaining_at(now),
        "focus_minutes": machine.config().focus_minutes,
        "rest_minutes": machine.config().rest_minutes,
        "mode": machine.config().mode,
        "score": machine.score(),
        "pause_count": machine.pause_count(),
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let mut machine = load_machine(&db, &config);
    let now = now_unix();

    for event in catch_up(&db, &mut machine, now)? {
        println!("{}", serde_json::to_string_pretty(&event)?);
    }

    match action {
        TimerAction::Start { focus, rest, fixed } => {
            if machine.phase() != Phase::Idle {
                eprintln!("a session is already running; `timer reset` first");
                std::process::exit(1);
            }
            machine =
                SessionStateMachine::new(Role::Driver, session_config(&config, focus, rest, fixed));
            let vitals = current_vitals(&config);
            if let Some(event) = machine.begin(&vitals, now) {
                println!("{}", serde_json::to_string_pretty(&event)?);
            }
            machine.drain_outbox();
        }
        TimerAction::Pause => {
            if let Some(event) = machine.pause(now) {
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                print_status(&machine, now)?;
            }
            machine.drain_outbox();
        }
        TimerAction::Resume => {
            if let Some(event) = machine.resume(now) {
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                print_status(&machine, now)?;
            }
            machine.drain_outbox();
        }
        TimerAction::Reset => {
            machine.reset(now);
            machine.drain_outbox();
            println!("{{\"type\": \"timer_reset\"}}");
        }
        TimerAction::Status => {
            print_status(&machine, now)?;
        }
        TimerAction::Save => {
            if let Some(event) = machine.save_now(now) {
                archive_event(&db, &event)?;
                println!("{}", serde_json::to_string_pretty(&event)?);
            } else {
                eprintln!("nothing to save: no active session");
            }
            machine.drain_outbox();
        }
        TimerAction::Run { focus, rest, fixed } => {
            if machine.phase() == Phase::Idle {
                machine = SessionStateMachine::new(
                    Role::Driver,
                    session_config(&config, focus, rest, fixed),
                );
                let vitals = current_vitals(&config);
                if let Some(event) = machine.begin(&vitals, now) {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
            }
            run_foreground(&config, &db, &mut machine)?;
        }
    }

    save_machine(&db, &machine)?;
    Ok(())
}

/// Tick the machine once per second until the session finishes.
fn run_foreground(
    config: &Config,
    db: &Database,
    machine: &mut SessionStateMachine,
) -> Result<(), Box<dyn std::error::Error>> {
    let notifier = ConsoleNotifier;
    let mut sim = config
        .timer
        .simulated_vitals
        .then(|| SimulatedVitals::new(now_unix() as u64));
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        interval.tick().await; // first tick fires immediately
        let mut focus_ticks: u32 = 0;
        loop {
            interval.tick().await;
            let now = now_unix();
            let sample = sim.as_mut().map(|s| s.sample());
            let in_focus = machine.phase() == Phase::Focus && machine.is_running();
            let event = machine.tick(now, sample.as_ref());
            machine.drain_outbox();

            if in_focus {
                focus_ticks += 1;
                if focus_ticks % ENCOURAGE_EVERY_SECS == 0 {
                    notifier.schedule("Still going strong", Some("Keep your eyes on it."), 0);
                }
            }

            if let Some(event) = event {
                archive_event(db, &event)?;
                println!("{}", serde_json::to_string_pretty(&event)?);
                match &event {
                    Event::RestStarted { rest_minutes, .. } => {
                        notifier.schedule(
                            "Focus complete",
                            Some(&format!("Rest for {rest_minutes} minutes.")),
                            0,
                        );
                    }
                    Event::SessionCompleted { .. } => {
                        notifier.schedule("Session complete", Some("Archived."), 0);
                        break;
                    }
                    _ => {}
                }
            }

            if machine.phase() == Phase::Idle {
                break;
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
