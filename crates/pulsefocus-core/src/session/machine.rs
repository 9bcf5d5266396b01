//! Session state machine: idle -> focus -> rest -> idle.
//!
//! One machine serves both devices, parameterized by [`Role`]. The driver
//! ticks its own countdown and appends outbound [`SyncMessage`]s to an
//! outbox; the mirror is mutated only through the reconciliation policy in
//! [`crate::sync`] and never emits messages or archives on its own.
//!
//! Every operation is infallible: illegal transitions (begin while running,
//! pause while idle) are silent no-ops, which is what prevents
//! double-started timers when the same command arrives from both the local
//! user and the peer.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::advisor;
use crate::biometrics::{VitalSigns, VitalsAggregate};
use crate::events::Event;
use crate::storage::Session;
use crate::sync::{ContextSnapshot, StateKind, SyncMessage};
use crate::timer::{PhaseTimer, Tick};

use super::{FocusMode, Phase, Role, SessionConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStateMachine {
    role: Role,
    phase: Phase,
    config: SessionConfig,
    timer: PhaseTimer,
    /// Readiness score from the advisor at session start.
    score: f64,
    pause_count: u32,
    /// Epoch anchor of the focus start; doubles as the per-run identity
    /// for backward-transition suppression on the mirror.
    session_epoch: Option<i64>,
    /// Session epoch whose completion was already handled (mirror side).
    completed_epoch: Option<i64>,
    started_at_unix: Option<i64>,
    vitals: VitalsAggregate,
    /// Outbound messages produced by driver operations; drained by the
    /// caller into a `SyncChannel`. Transient, not persisted.
    #[serde(skip)]
    outbox: Vec<SyncMessage>,
}

fn at(now_unix: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(now_unix, 0).single().unwrap_or_else(Utc::now)
}

impl SessionStateMachine {
    pub fn new(role: Role, config: SessionConfig) -> Self {
        Self {
            role,
            phase: Phase::Idle,
            config,
            timer: PhaseTimer::new(),
            score: 100.0,
            pause_count: 0,
            session_epoch: None,
            completed_epoch: None,
            started_at_unix: None,
            vitals: VitalsAggregate::new(),
            outbox: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn pause_count(&self) -> u32 {
        self.pause_count
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.timer.remaining_secs()
    }

    /// Remaining time recomputed from the epoch anchor.
    pub fn remaining_at(&self, now_unix: i64) -> u32 {
        self.timer.remaining_at(now_unix)
    }

    pub fn session_epoch(&self) -> Option<i64> {
        self.session_epoch
    }

    pub fn vitals(&self) -> &VitalsAggregate {
        &self.vitals
    }

    /// Build the full-state snapshot for the peer.
    pub fn snapshot(&self, now_unix: i64) -> ContextSnapshot {
        ContextSnapshot {
            phase: self.phase,
            remaining_secs: self.timer.remaining_at(now_unix),
            focus_minutes: self.config.focus_minutes,
            rest_minutes: self.config.rest_minutes,
            timestamp: now_unix,
            epoch_start: self.timer.epoch_start().unwrap_or(now_unix),
        }
    }

    /// Take the outbound messages accumulated by driver operations.
    pub fn drain_outbox(&mut self) -> Vec<SyncMessage> {
        std::mem::take(&mut self.outbox)
    }

    // ── Driver commands ──────────────────────────────────────────────

    /// Start a session. Only meaningful from idle on the driver; anything
    /// else is a no-op. In adaptive mode the advisor rewrites the
    /// configured durations from the supplied vitals.
    pub fn begin(&mut self, vitals: &VitalSigns, now_unix: i64) -> Option<Event> {
        if self.role != Role::Driver || self.phase != Phase::Idle {
            return None;
        }
        let advice = advisor::advise(
            self.config.focus_minutes,
            self.config.rest_minutes,
            vitals.resting_hr,
            vitals.hrv,
            vitals.bpm,
        );
        if self.config.mode == FocusMode::Adaptive {
            self.config.focus_minutes = advice.focus_minutes;
            self.config.rest_minutes = advice.rest_minutes;
        }
        self.score = advice.score;
        self.phase = Phase::Focus;
        self.pause_count = 0;
        self.session_epoch = Some(now_unix);
        self.completed_epoch = None;
        self.started_at_unix = Some(now_unix);
        self.vitals.reset();
        self.vitals.observe(vitals);
        self.timer.start(self.config.focus_secs(), now_unix);
        self.outbox.push(SyncMessage::StateChange {
            kind: StateKind::Start,
            remaining: Some(self.config.focus_secs()),
            epoch_start: Some(now_unix),
            focus: Some(self.config.focus_minutes),
            rest: Some(self.config.rest_minutes),
        });
        Some(Event::FocusStarted {
            focus_minutes: self.config.focus_minutes,
            rest_minutes: self.config.rest_minutes,
            score: self.score,
            at: at(now_unix),
        })
    }

    /// Count one logical second; feed the optional biometric sample into
    /// the session aggregate. Returns the transition event when a phase
    /// ends.
    pub fn tick(&mut self, now_unix: i64, sample: Option<&VitalSigns>) -> Option<Event> {
        if self.phase != Phase::Idle {
            if let Some(s) = sample {
                self.vitals.observe(s);
            }
        }
        match self.timer.tick() {
            Tick::Completed => match self.phase {
                Phase::Focus => Some(self.enter_rest(now_unix)),
                Phase::Rest => Some(self.enter_idle(now_unix)),
                Phase::Idle => None,
            },
            _ => None,
        }
    }

    fn enter_rest(&mut self, now_unix: i64) -> Event {
        self.phase = Phase::Rest;
        self.timer.start(self.config.rest_secs(), now_unix);
        Event::RestStarted {
            rest_minutes: self.config.rest_minutes,
            at: at(now_unix),
        }
    }

    fn enter_idle(&mut self, now_unix: i64) -> Event {
        self.phase = Phase::Idle;
        self.timer.reset();
        if self.role == Role::Driver {
            let session = self.archive_record(now_unix, self.config.focus_minutes);
            self.outbox.push(SyncMessage::state(StateKind::Complete));
            self.session_epoch = None;
            Event::SessionCompleted {
                session,
                at: at(now_unix),
            }
        } else {
            // A mirror whose display countdown ran out surfaces the summary
            // itself and latches the epoch, so the peer's own `complete`
            // (possibly still in flight) stays a duplicate.
            self.completed_epoch = self.session_epoch;
            self.session_epoch = None;
            Event::SummaryReady { at: at(now_unix) }
        }
    }

    /// Pause the active countdown. No-op while idle or already paused.
    pub fn pause(&mut self, now_unix: i64) -> Option<Event> {
        if self.role != Role::Driver || self.phase == Phase::Idle || !self.timer.is_running() {
            return None;
        }
        self.timer.pause();
        self.pause_count += 1;
        self.outbox.push(SyncMessage::StateChange {
            kind: StateKind::Pause,
            remaining: Some(self.timer.remaining_secs()),
            epoch_start: None,
            focus: None,
            rest: None,
        });
        Some(Event::TimerPaused {
            remaining_secs: self.timer.remaining_secs(),
            at: at(now_unix),
        })
    }

    /// Resume a paused countdown; re-anchors the epoch so the peer can
    /// recompute remaining from `now - epoch_start`.
    pub fn resume(&mut self, now_unix: i64) -> Option<Event> {
        if self.role != Role::Driver
            || self.phase == Phase::Idle
            || self.timer.is_running()
            || self.timer.remaining_secs() == 0
        {
            return None;
        }
        self.timer.resume(now_unix);
        if !self.timer.is_running() {
            return None;
        }
        self.outbox.push(SyncMessage::StateChange {
            kind: StateKind::Resume,
            remaining: Some(self.timer.remaining_secs()),
            epoch_start: self.timer.epoch_start(),
            focus: None,
            rest: None,
        });
        Some(Event::TimerResumed {
            remaining_secs: self.timer.remaining_secs(),
            at: at(now_unix),
        })
    }

    /// Abandon the session: cancel the countdown, back to idle, no
    /// archival.
    pub fn reset(&mut self, now_unix: i64) -> Option<Event> {
        if self.role != Role::Driver || self.phase == Phase::Idle {
            return None;
        }
        self.phase = Phase::Idle;
        self.timer.reset();
        self.session_epoch = None;
        self.outbox.push(SyncMessage::StateChange {
            kind: StateKind::Reset,
            remaining: Some(0),
            epoch_start: None,
            focus: None,
            rest: None,
        });
        Some(Event::TimerReset { at: at(now_unix) })
    }

    /// Archive whatever has elapsed and return to idle. Elapsed time only
    /// counts while focused; saving during rest records zero focus.
    pub fn save_now(&mut self, now_unix: i64) -> Option<Event> {
        if self.role != Role::Driver || self.phase == Phase::Idle {
            return None;
        }
        let elapsed_secs = if self.phase == Phase::Focus {
            self.timer.elapsed_secs()
        } else {
            0
        };
        let focus_minutes = (elapsed_secs / 60).max(1);
        self.phase = Phase::Idle;
        self.timer.reset();
        self.session_epoch = None;
        let session = self.archive_record(now_unix, focus_minutes);
        self.outbox.push(SyncMessage::StateChange {
            kind: StateKind::Reset,
            remaining: Some(0),
            epoch_start: None,
            focus: None,
            rest: None,
        });
        Some(Event::SessionSaved {
            session,
            at: at(now_unix),
        })
    }

    /// Replay the wall-clock seconds that passed since the last tick, in
    /// order, so phase transitions land at their logical instants. Lets a
    /// machine persisted between CLI invocations catch up on load.
    pub fn fast_forward(&mut self, now_unix: i64) -> Vec<Event> {
        let mut events = Vec::new();
        loop {
            if !self.timer.is_running() {
                break;
            }
            let Some(epoch) = self.timer.epoch_start() else {
                break;
            };
            let wall_elapsed =
                (now_unix - epoch).max(0).min(i64::from(u32::MAX)) as u32;
            let target = wall_elapsed.min(self.timer.total_secs());
            let ticked = self.timer.elapsed_secs();
            if ticked >= target {
                break;
            }
            let logical_now = epoch + i64::from(ticked) + 1;
            if let Some(ev) = self.tick(logical_now, None) {
                events.push(ev);
            }
        }
        events
    }

    fn archive_record(&self, now_unix: i64, focus_minutes: u32) -> Session {
        let started = self.started_at_unix.unwrap_or(now_unix);
        Session {
            id: Uuid::new_v4(),
            started_at: at(started),
            ended_at: Some(at(now_unix)),
            mode: self.config.mode,
            focus_minutes,
            rest_minutes: self.config.rest_minutes,
            heart_rate_avg: self.vitals.bpm_avg(),
            hrv_avg: self.vitals.hrv_avg(),
            resting_heart_rate: self.vitals.resting_hr(),
            score: self.score,
            pause_count: self.pause_count,
        }
    }

    // ── Mirror application (reconciliation policy only) ──────────────

    pub(crate) fn mirror_start(
        &mut self,
        focus: Option<u32>,
        rest: Option<u32>,
        epoch_start: Option<i64>,
        now_unix: i64,
    ) -> Option<Event> {
        let epoch = epoch_start.unwrap_or(now_unix);
        // A re-delivered start for an already-completed run must not
        // resurrect the session.
        if self.completed_epoch == Some(epoch) {
            return None;
        }
        if let Some(f) = focus {
            self.config.focus_minutes = f.max(1);
        }
        if let Some(r) = rest {
            self.config.rest_minutes = r.max(1);
        }
        self.phase = Phase::Focus;
        self.pause_count = 0;
        self.session_epoch = Some(epoch);
        self.completed_epoch = None;
        self.started_at_unix = Some(epoch);
        self.vitals.reset();
        self.timer
            .start_anchored(self.config.focus_secs(), epoch, now_unix);
        Some(Event::FocusStarted {
            focus_minutes: self.config.focus_minutes,
            rest_minutes: self.config.rest_minutes,
            score: self.score,
            at: at(now_unix),
        })
    }

    pub(crate) fn mirror_pause(&mut self, now_unix: i64) -> Option<Event> {
        if self.phase == Phase::Idle || !self.timer.is_running() {
            return None;
        }
        self.timer.pause();
        Some(Event::TimerPaused {
            remaining_secs: self.timer.remaining_secs(),
            at: at(now_unix),
        })
    }

    pub(crate) fn mirror_resume(
        &mut self,
        epoch_start: Option<i64>,
        now_unix: i64,
    ) -> Option<Event> {
        if self.phase == Phase::Idle {
            return None;
        }
        match epoch_start {
            Some(epoch) => self.timer.resume_anchored(epoch, now_unix),
            None => self.timer.resume(now_unix),
        }
        if !self.timer.is_running() {
            return None;
        }
        Some(Event::TimerResumed {
            remaining_secs: self.timer.remaining_secs(),
            at: at(now_unix),
        })
    }

    pub(crate) fn mirror_reset(&mut self, now_unix: i64) -> Option<Event> {
        if self.phase == Phase::Idle {
            return None;
        }
        self.phase = Phase::Idle;
        self.timer.reset();
        self.session_epoch = None;
        Some(Event::TimerReset { at: at(now_unix) })
    }

    /// Peer reported completion: force idle and surface the summary
    /// signal exactly once per session epoch.
    pub(crate) fn mirror_complete(&mut self, now_unix: i64) -> Option<Event> {
        if self.phase == Phase::Idle {
            return None;
        }
        self.completed_epoch = self.session_epoch;
        self.phase = Phase::Idle;
        self.timer.reset();
        self.session_epoch = None;
        Some(Event::SummaryReady { at: at(now_unix) })
    }

    /// Snapshot application: unconditional overwrite of phase, durations
    /// and remaining time (recomputed from the epoch anchor).
    pub(crate) fn apply_snapshot(
        &mut self,
        snapshot: &ContextSnapshot,
        now_unix: i64,
    ) -> Option<Event> {
        self.config.focus_minutes = snapshot.focus_minutes.max(1);
        self.config.rest_minutes = snapshot.rest_minutes.max(1);
        let was = self.phase;
        self.phase = snapshot.phase;
        match snapshot.phase {
            Phase::Idle => {
                self.timer.reset();
                self.session_epoch = None;
            }
            Phase::Focus | Phase::Rest => {
                let total = if snapshot.phase == Phase::Focus {
                    self.config.focus_secs()
                } else {
                    self.config.rest_secs()
                };
                self.timer
                    .start_anchored(total, snapshot.epoch_start, now_unix);
                self.session_epoch = Some(snapshot.epoch_start);
                self.completed_epoch = None;
            }
        }
        if was == snapshot.phase {
            return None;
        }
        match snapshot.phase {
            Phase::Focus => Some(Event::FocusStarted {
                focus_minutes: self.config.focus_minutes,
                rest_minutes: self.config.rest_minutes,
                score: self.score,
                at: at(now_unix),
            }),
            Phase::Rest => Some(Event::RestStarted {
                rest_minutes: self.config.rest_minutes,
                at: at(now_unix),
            }),
            Phase::Idle => Some(Event::TimerReset { at: at(now_unix) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::StateKind;

    const T0: i64 = 1_700_000_000;

    fn calm() -> VitalSigns {
        VitalSigns {
            bpm: 60.0,
            hrv: 50.0,
            resting_hr: 62.0,
        }
    }

    fn fixed_machine(focus: u32, rest: u32) -> SessionStateMachine {
        SessionStateMachine::new(
            Role::Driver,
            SessionConfig::new(focus, rest, FocusMode::Fixed),
        )
    }

    #[test]
    fn begin_only_from_idle() {
        let mut m = fixed_machine(25, 5);
        assert!(m.begin(&calm(), T0).is_some());
        assert_eq!(m.phase(), Phase::Focus);
        let remaining = m.remaining_secs();
        // begin while focused is a silent no-op: same phase, same remaining.
        assert!(m.begin(&calm(), T0 + 1).is_none());
        assert_eq!(m.phase(), Phase::Focus);
        assert_eq!(m.remaining_secs(), remaining);
    }

    #[test]
    fn full_cycle_archives_exactly_once() {
        let mut m = fixed_machine(25, 5);
        m.begin(&calm(), T0);
        let mut rest_started = 0;
        let mut completed = 0;
        let mut archived = Vec::new();
        for i in 0..1800 {
            match m.tick(T0 + i + 1, None) {
                Some(Event::RestStarted { .. }) => rest_started += 1,
                Some(Event::SessionCompleted { session, .. }) => {
                    completed += 1;
                    archived.push(session);
                }
                _ => {}
            }
            if i == 1499 {
                assert_eq!(m.phase(), Phase::Rest);
            }
        }
        assert_eq!(rest_started, 1);
        assert_eq!(completed, 1);
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].focus_minutes, 25);
        assert_eq!(archived[0].pause_count, 0);
    }

    #[test]
    fn adaptive_begin_applies_advisor() {
        let mut m = SessionStateMachine::new(
            Role::Driver,
            SessionConfig::new(25, 5, FocusMode::Adaptive),
        );
        // pressure = (100 - 60) / 2 = 20 -> floor focus, cap rest.
        let stressed = VitalSigns {
            bpm: 100.0,
            hrv: 2.0,
            resting_hr: 60.0,
        };
        m.begin(&stressed, T0);
        assert_eq!(m.config().focus_minutes, 15);
        assert_eq!(m.config().rest_minutes, 10);
        assert_eq!(m.score(), 0.0);
    }

    #[test]
    fn fixed_begin_keeps_durations() {
        let mut m = fixed_machine(30, 6);
        let stressed = VitalSigns {
            bpm: 120.0,
            hrv: 2.0,
            resting_hr: 60.0,
        };
        m.begin(&stressed, T0);
        assert_eq!(m.config().focus_minutes, 30);
        assert_eq!(m.config().rest_minutes, 6);
    }

    #[test]
    fn pause_resume_counts_pauses() {
        let mut m = fixed_machine(25, 5);
        m.begin(&calm(), T0);
        for i in 0..10 {
            m.tick(T0 + i + 1, None);
        }
        assert!(m.pause(T0 + 10).is_some());
        // Paused ticks count nothing.
        for i in 0..5 {
            assert!(m.tick(T0 + 11 + i, None).is_none());
        }
        assert_eq!(m.remaining_secs(), 1490);
        assert!(m.resume(T0 + 15).is_some());
        assert!(m.pause(T0 + 16).is_some());
        assert_eq!(m.pause_count(), 2);
        // pause while already paused is a no-op.
        assert!(m.pause(T0 + 17).is_none());
        assert_eq!(m.pause_count(), 2);
    }

    #[test]
    fn reset_discards_without_archiving() {
        let mut m = fixed_machine(25, 5);
        m.begin(&calm(), T0);
        m.tick(T0 + 1, None);
        assert!(matches!(m.reset(T0 + 2), Some(Event::TimerReset { .. })));
        assert_eq!(m.phase(), Phase::Idle);
        assert!(m.reset(T0 + 3).is_none());
    }

    #[test]
    fn save_now_records_elapsed_focus() {
        let mut m = fixed_machine(25, 5);
        m.begin(&calm(), T0);
        for i in 0..600 {
            m.tick(T0 + i + 1, None);
        }
        let ev = m.save_now(T0 + 600);
        match ev {
            Some(Event::SessionSaved { session, .. }) => {
                assert_eq!(session.focus_minutes, 10);
            }
            other => panic!("expected SessionSaved, got {other:?}"),
        }
        assert_eq!(m.phase(), Phase::Idle);
        assert!(m.save_now(T0 + 601).is_none());
    }

    #[test]
    fn save_now_during_rest_records_zero_elapsed() {
        let mut m = fixed_machine(25, 5);
        m.begin(&calm(), T0);
        for i in 0..1505 {
            m.tick(T0 + i + 1, None);
        }
        assert_eq!(m.phase(), Phase::Rest);
        match m.save_now(T0 + 1505) {
            Some(Event::SessionSaved { session, .. }) => {
                // Elapsed only counts while focused; floor of one minute.
                assert_eq!(session.focus_minutes, 1);
            }
            other => panic!("expected SessionSaved, got {other:?}"),
        }
    }

    #[test]
    fn driver_outbox_carries_state_changes() {
        let mut m = fixed_machine(25, 5);
        m.begin(&calm(), T0);
        m.tick(T0 + 1, None);
        m.pause(T0 + 1);
        m.resume(T0 + 4);
        let out = m.drain_outbox();
        let kinds: Vec<StateKind> = out
            .iter()
            .filter_map(|msg| match msg {
                SyncMessage::StateChange { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![StateKind::Start, StateKind::Pause, StateKind::Resume]
        );
        match &out[0] {
            SyncMessage::StateChange {
                epoch_start, focus, ..
            } => {
                assert_eq!(*epoch_start, Some(T0));
                assert_eq!(*focus, Some(25));
            }
            other => panic!("unexpected message {other:?}"),
        }
        // Resume re-anchors: epoch = resume instant minus one elapsed tick.
        match &out[2] {
            SyncMessage::StateChange { epoch_start, .. } => {
                assert_eq!(*epoch_start, Some(T0 + 3));
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert!(m.drain_outbox().is_empty());
    }

    #[test]
    fn mirror_ignores_driver_commands() {
        let mut m = SessionStateMachine::new(Role::Mirror, SessionConfig::default());
        assert!(m.begin(&calm(), T0).is_none());
        assert!(m.pause(T0).is_none());
        assert!(m.save_now(T0).is_none());
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn fast_forward_replays_elapsed_time() {
        let mut m = fixed_machine(25, 5);
        m.begin(&calm(), T0);
        // 100 wall seconds pass with no ticks delivered.
        let events = m.fast_forward(T0 + 100);
        assert!(events.is_empty());
        assert_eq!(m.remaining_secs(), 1400);
        // Jump past the focus/rest boundary: transition events replay in order.
        let events = m.fast_forward(T0 + 1500 + 120);
        assert!(matches!(events[0], Event::RestStarted { .. }));
        assert_eq!(m.phase(), Phase::Rest);
        assert_eq!(m.remaining_secs(), 180);
        // And through the end of rest.
        let events = m.fast_forward(T0 + 1500 + 400);
        assert!(matches!(
            events.last(),
            Some(Event::SessionCompleted { .. })
        ));
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn snapshot_reflects_current_state() {
        let mut m = fixed_machine(25, 5);
        m.begin(&calm(), T0);
        let snap = m.snapshot(T0 + 10);
        assert_eq!(snap.phase, Phase::Focus);
        assert_eq!(snap.remaining_secs, 1490);
        assert_eq!(snap.epoch_start, T0);
        assert_eq!(snap.focus_minutes, 25);
    }
}
