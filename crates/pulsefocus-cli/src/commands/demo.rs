use clap::Subcommand;
use pulsefocus_core::biometrics::SimulatedVitals;
use pulsefocus_core::session::{FocusMode, Role, SessionConfig, SessionStateMachine};
use pulsefocus_core::sync::{InMemoryLink, Reconciler, SyncChannel, SyncMessage};
use pulsefocus_core::Phase;

#[derive(Subcommand)]
pub enum DemoAction {
    /// Two in-process devices over an in-memory link, with a mid-run
    /// disconnect showing store-and-forward plus snapshot resync
    Sync,
}

pub fn run(action: DemoAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DemoAction::Sync => run_sync_demo(),
    }
}

const T0: i64 = 1_700_000_000;
const SNAPSHOT_EVERY: i64 = 5;
const DISCONNECT_AT: i64 = 60;
const RECONNECT_AT: i64 = 160;

fn run_sync_demo() -> Result<(), Box<dyn std::error::Error>> {
    // Device A drives the session; device B mirrors it. The logical clock
    // is accelerated: one loop iteration per second, no sleeping.
    let (link, far) = InMemoryLink::pair();
    let mut chan_a = SyncChannel::new(link.clone());
    let mut chan_b = SyncChannel::new(far);

    let mut driver = SessionStateMachine::new(
        Role::Driver,
        SessionConfig::new(15, 3, FocusMode::Adaptive),
    );
    let mut mirror = SessionStateMachine::new(Role::Mirror, SessionConfig::default());
    let mut policy = Reconciler::new();
    let mut sim = SimulatedVitals::new(7);
    let mut sequence: u64 = 0;

    println!("demo: driver A and mirror B, 15/3 adaptive session");
    let vitals = sim.sample();
    driver.begin(&vitals, T0);
    for msg in driver.drain_outbox() {
        chan_a.send(msg);
    }

    // The 20 paused seconds (t+70 to t+90) push completion out by 20.
    let total_ticks = i64::from(driver.config().focus_secs() + driver.config().rest_secs()) + 20;
    for t in 1..=total_ticks {
        let now = T0 + t;
        let sample = sim.sample();
        let driver_event = driver.tick(now, Some(&sample));

        match t {
            DISCONNECT_AT => {
                link.set_reachable(false);
                println!("t+{t}s  link down; messages queue from here");
            }
            RECONNECT_AT => {
                link.set_reachable(true);
                let backlog = chan_a.pending_len();
                chan_a.poll_reachability();
                println!("t+{t}s  link up; snapshot resync, then {backlog} queued messages");
            }
            70 => {
                driver.pause(now);
                println!("t+{t}s  driver pauses (offline)");
            }
            90 => {
                driver.resume(now);
                println!("t+{t}s  driver resumes (offline)");
            }
            _ => {}
        }

        if let Some(event) = driver_event {
            println!("t+{t}s  driver: {}", serde_json::to_string(&event)?);
        }

        for msg in driver.drain_outbox() {
            chan_a.send(msg);
        }
        if t % SNAPSHOT_EVERY == 0 {
            sequence += 1;
            chan_a.send(SyncMessage::HeartRateSample {
                bpm: sample.bpm as u32,
                sequence,
                timestamp: now,
            });
            chan_a.update_snapshot(driver.snapshot(now));
        }

        for msg in link.take_delivered() {
            chan_b.receive(msg);
        }
        for msg in chan_b.drain_inbox() {
            if let Some(event) = policy.apply(&mut mirror, &msg, now) {
                println!("t+{t}s  mirror: {}", serde_json::to_string(&event)?);
            }
        }

        if t == RECONNECT_AT {
            println!(
                "t+{t}s  mirror remaining after resync: {}s (driver: {}s)",
                mirror.remaining_at(now),
                driver.remaining_at(now)
            );
        }
    }

    let end = T0 + total_ticks;
    println!(
        "done  driver phase: {:?}, mirror phase: {:?}",
        driver.phase(),
        mirror.phase()
    );
    debug_assert_eq!(driver.phase(), Phase::Idle);
    debug_assert_eq!(mirror.remaining_at(end), driver.remaining_at(end));
    Ok(())
}
