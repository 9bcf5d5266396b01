use crate::biometrics::VitalSigns;
use crate::events::Event;
use crate::session::{FocusMode, Phase, Role, SessionConfig, SessionStateMachine};
use crate::sync::channel::{InMemoryLink, SyncChannel};
use crate::sync::message::{ContextSnapshot, StateKind, SyncMessage};
use crate::sync::reconcile::Reconciler;

const T0: i64 = 1_700_000_000;

fn mirror() -> SessionStateMachine {
    SessionStateMachine::new(
        Role::Mirror,
        SessionConfig::new(25, 5, FocusMode::Fixed),
    )
}

fn driver() -> SessionStateMachine {
    SessionStateMachine::new(
        Role::Driver,
        SessionConfig::new(25, 5, FocusMode::Fixed),
    )
}

fn calm() -> VitalSigns {
    VitalSigns {
        bpm: 60.0,
        hrv: 50.0,
        resting_hr: 62.0,
    }
}

fn hr(bpm: u32, sequence: u64) -> SyncMessage {
    SyncMessage::HeartRateSample {
        bpm,
        sequence,
        timestamp: T0,
    }
}

fn start_msg(epoch_start: i64) -> SyncMessage {
    SyncMessage::StateChange {
        kind: StateKind::Start,
        remaining: Some(1500),
        epoch_start: Some(epoch_start),
        focus: Some(25),
        rest: Some(5),
    }
}

#[test]
fn stale_sequence_is_discarded() {
    let mut m = mirror();
    let mut policy = Reconciler::new();
    policy.apply(&mut m, &hr(80, 7), T0);
    assert_eq!(policy.mirrored_bpm(T0), Some(80));
    // A reordered sample with a lower sequence must not regress the value.
    policy.apply(&mut m, &hr(95, 5), T0 + 1);
    assert_eq!(policy.mirrored_bpm(T0 + 1), Some(80));
    assert_eq!(policy.last_accepted_sequence(), Some(7));
    // Equal sequence is a duplicate.
    policy.apply(&mut m, &hr(95, 7), T0 + 2);
    assert_eq!(policy.mirrored_bpm(T0 + 2), Some(80));
}

#[test]
fn hr_override_window_expires() {
    let mut m = mirror();
    let mut policy = Reconciler::new();
    policy.apply(&mut m, &hr(90, 1), T0);
    assert_eq!(policy.effective_bpm(65.0, T0 + 14), 90.0);
    // 15 seconds later the local (simulated) value wins again.
    assert_eq!(policy.effective_bpm(65.0, T0 + 15), 65.0);
    assert_eq!(policy.mirrored_bpm(T0 + 15), None);
}

#[test]
fn start_reconciles_against_receiver_clock() {
    // Device A starts a 1500s focus at T0; B reconciles 10 seconds later.
    let mut m = mirror();
    let mut policy = Reconciler::new();
    let ev = policy.apply(&mut m, &start_msg(T0), T0 + 10);
    assert!(matches!(ev, Some(Event::FocusStarted { .. })));
    assert_eq!(m.phase(), Phase::Focus);
    assert_eq!(m.remaining_secs(), 1490);
}

#[test]
fn transmitted_remaining_is_not_trusted() {
    // The sender lies about remaining; the epoch anchor governs.
    let mut m = mirror();
    let mut policy = Reconciler::new();
    let msg = SyncMessage::StateChange {
        kind: StateKind::Start,
        remaining: Some(42),
        epoch_start: Some(T0),
        focus: Some(25),
        rest: Some(5),
    };
    policy.apply(&mut m, &msg, T0 + 10);
    assert_eq!(m.remaining_secs(), 1490);
}

#[test]
fn start_without_epoch_anchors_at_arrival() {
    let mut m = mirror();
    let mut policy = Reconciler::new();
    let msg = SyncMessage::StateChange {
        kind: StateKind::Start,
        remaining: None,
        epoch_start: None,
        focus: Some(20),
        rest: None,
    };
    policy.apply(&mut m, &msg, T0);
    // Present fields applied, absent ones left alone.
    assert_eq!(m.config().focus_minutes, 20);
    assert_eq!(m.config().rest_minutes, 5);
    assert_eq!(m.remaining_secs(), 1200);
}

#[test]
fn pause_and_resume_mirror_the_peer() {
    let mut m = mirror();
    let mut policy = Reconciler::new();
    policy.apply(&mut m, &start_msg(T0), T0);
    let ev = policy.apply(&mut m, &SyncMessage::state(StateKind::Pause), T0 + 60);
    assert!(matches!(ev, Some(Event::TimerPaused { .. })));
    assert!(!m.is_running());

    // Resume carries a fresh anchor: 100s elapsed at the resume instant.
    let resume = SyncMessage::StateChange {
        kind: StateKind::Resume,
        remaining: None,
        epoch_start: Some(T0 + 200 - 100),
        focus: None,
        rest: None,
    };
    policy.apply(&mut m, &resume, T0 + 200);
    assert!(m.is_running());
    assert_eq!(m.remaining_secs(), 1400);
}

#[test]
fn complete_forces_idle_exactly_once() {
    let mut m = mirror();
    let mut policy = Reconciler::new();
    policy.apply(&mut m, &start_msg(T0), T0);
    let first = policy.apply(&mut m, &SyncMessage::state(StateKind::Complete), T0 + 100);
    assert!(matches!(first, Some(Event::SummaryReady { .. })));
    assert_eq!(m.phase(), Phase::Idle);
    // A duplicate complete is silent.
    let second = policy.apply(&mut m, &SyncMessage::state(StateKind::Complete), T0 + 101);
    assert!(second.is_none());
}

#[test]
fn pause_after_complete_is_ignored() {
    let mut m = mirror();
    let mut policy = Reconciler::new();
    policy.apply(&mut m, &start_msg(T0), T0);
    policy.apply(&mut m, &SyncMessage::state(StateKind::Complete), T0 + 100);
    // A pause delayed past the completion never moves the mirror backward.
    let ev = policy.apply(&mut m, &SyncMessage::state(StateKind::Pause), T0 + 110);
    assert!(ev.is_none());
    assert_eq!(m.phase(), Phase::Idle);
}

#[test]
fn redelivered_start_does_not_resurrect_completed_run() {
    let mut m = mirror();
    let mut policy = Reconciler::new();
    policy.apply(&mut m, &start_msg(T0), T0);
    policy.apply(&mut m, &SyncMessage::state(StateKind::Complete), T0 + 100);
    // The same start, re-delivered by the store-and-forward queue.
    let ev = policy.apply(&mut m, &start_msg(T0), T0 + 120);
    assert!(ev.is_none());
    assert_eq!(m.phase(), Phase::Idle);
    // A genuinely new run (different epoch) starts fine.
    let ev = policy.apply(&mut m, &start_msg(T0 + 200), T0 + 200);
    assert!(matches!(ev, Some(Event::FocusStarted { .. })));
}

#[test]
fn snapshot_overwrites_unconditionally() {
    let mut m = mirror();
    let mut policy = Reconciler::new();
    policy.apply(&mut m, &start_msg(T0), T0);
    policy.apply(&mut m, &SyncMessage::state(StateKind::Pause), T0 + 30);

    // Authoritative resync: rest phase, different durations.
    let snapshot = ContextSnapshot {
        phase: Phase::Rest,
        remaining_secs: 999, // ignored; epoch governs
        focus_minutes: 30,
        rest_minutes: 6,
        timestamp: T0 + 2000,
        epoch_start: T0 + 1900,
    };
    let ev = policy.apply(&mut m, &SyncMessage::Snapshot(snapshot), T0 + 2000);
    assert!(matches!(ev, Some(Event::RestStarted { .. })));
    assert_eq!(m.phase(), Phase::Rest);
    assert_eq!(m.config().focus_minutes, 30);
    assert_eq!(m.config().rest_minutes, 6);
    // 100s into a 360s rest.
    assert_eq!(m.remaining_secs(), 260);
}

#[test]
fn idle_snapshot_clears_the_mirror() {
    let mut m = mirror();
    let mut policy = Reconciler::new();
    policy.apply(&mut m, &start_msg(T0), T0);
    let snapshot = ContextSnapshot {
        phase: Phase::Idle,
        remaining_secs: 0,
        focus_minutes: 25,
        rest_minutes: 5,
        timestamp: T0 + 50,
        epoch_start: T0 + 50,
    };
    policy.apply(&mut m, &SyncMessage::Snapshot(snapshot), T0 + 50);
    assert_eq!(m.phase(), Phase::Idle);
    assert!(!m.is_running());
}

#[test]
fn disconnect_then_snapshot_resync_end_to_end() {
    // Driver device A and mirror device B, joined by an in-memory pair.
    let (link_ab, link_ba) = InMemoryLink::pair();
    let mut chan_a = SyncChannel::new(link_ab.clone());
    let mut chan_b = SyncChannel::new(link_ba);

    let mut a = driver();
    let mut b = mirror();
    let mut policy = Reconciler::new();

    // A begins; state change flows to B while connected.
    a.begin(&calm(), T0);
    for msg in a.drain_outbox() {
        chan_a.send(msg);
    }
    for msg in link_ab.take_delivered() {
        chan_b.receive(msg);
    }
    for msg in chan_b.drain_inbox() {
        policy.apply(&mut b, &msg, T0);
    }
    assert_eq!(b.phase(), Phase::Focus);
    assert_eq!(b.remaining_secs(), 1500);

    // Link drops. A keeps ticking; pause/resume land in the queue and
    // the snapshot slot keeps being replaced.
    link_ab.set_reachable(false);
    for i in 0..100 {
        a.tick(T0 + i + 1, None);
    }
    a.pause(T0 + 100);
    a.resume(T0 + 130);
    for msg in a.drain_outbox() {
        chan_a.send(msg);
    }
    for i in 100..200 {
        a.tick(T0 + 30 + i + 1, None);
    }
    chan_a.update_snapshot(a.snapshot(T0 + 230));
    assert_eq!(chan_a.pending_len(), 2);
    assert!(link_ab.take_delivered().is_empty());

    // Reconnect: snapshot first, then the stale queue; the policy makes
    // that ordering harmless.
    link_ab.set_reachable(true);
    chan_a.poll_reachability();
    for msg in link_ab.take_delivered() {
        chan_b.receive(msg);
    }
    for msg in chan_b.drain_inbox() {
        policy.apply(&mut b, &msg, T0 + 230);
    }
    assert_eq!(b.phase(), Phase::Focus);
    // Snapshot anchored at the resume re-anchor (T0+30): 200s elapsed
    // by T0+230. The stale queued pause/resume replay behind it without
    // rewinding the mirror.
    assert_eq!(b.remaining_at(T0 + 230), 1300);
}
