//! Single-phase countdown primitive.
//!
//! The timer has no internal thread -- the caller invokes `tick()` once per
//! logical second. Each run keeps a wall-clock epoch anchor (unix seconds of
//! the logical start) so remaining time can always be recomputed on the
//! receiving clock instead of trusting a transmitted delta.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running -> (Paused | Stopped)
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Stopped,
    Running,
    Paused,
}

/// Outcome of a single `tick()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running; nothing counted.
    Idle,
    /// Counted one second.
    Counting { remaining_secs: u32 },
    /// Countdown reached zero. Reported exactly once per `start`.
    Completed,
}

/// Tick-driven countdown with an epoch anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTimer {
    state: TimerState,
    total_secs: u32,
    remaining_secs: u32,
    /// Unix seconds of the logical start of the current run, re-anchored
    /// on resume. `None` while stopped.
    epoch_start: Option<i64>,
    /// Completion latch: cleared by `start`, set when the run finishes.
    completed: bool,
}

impl Default for PhaseTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Stopped,
            total_secs: 0,
            remaining_secs: 0,
            epoch_start: None,
            completed: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.total_secs - self.remaining_secs
    }

    pub fn epoch_start(&self) -> Option<i64> {
        self.epoch_start
    }

    /// Remaining time recomputed from the epoch anchor and the caller's
    /// clock. While paused or stopped this is the tick-counted value.
    pub fn remaining_at(&self, now_unix: i64) -> u32 {
        match (self.state, self.epoch_start) {
            (TimerState::Running, Some(epoch)) => {
                let elapsed = (now_unix - epoch).max(0).min(i64::from(u32::MAX)) as u32;
                self.total_secs.saturating_sub(elapsed)
            }
            _ => self.remaining_secs,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a fresh countdown. Always fully supersedes a prior run: the
    /// completion latch is cleared and any old remaining time is replaced.
    pub fn start(&mut self, duration_secs: u32, now_unix: i64) {
        self.total_secs = duration_secs;
        self.remaining_secs = duration_secs;
        self.epoch_start = Some(now_unix);
        self.completed = false;
        self.state = TimerState::Running;
    }

    /// Begin a countdown whose logical start is in the past. Used by the
    /// mirror side: remaining is derived from the anchor, so delivery
    /// latency does not corrupt the countdown.
    pub fn start_anchored(&mut self, duration_secs: u32, epoch_start: i64, now_unix: i64) {
        let elapsed = (now_unix - epoch_start).max(0).min(i64::from(u32::MAX)) as u32;
        self.total_secs = duration_secs;
        self.remaining_secs = duration_secs.saturating_sub(elapsed);
        self.epoch_start = Some(epoch_start);
        if self.remaining_secs == 0 {
            // Already over by the time the message landed; the peer's own
            // completion message governs the summary.
            self.completed = true;
            self.state = TimerState::Stopped;
        } else {
            self.completed = false;
            self.state = TimerState::Running;
        }
    }

    /// Running -> Paused. Takes effect synchronously: a tick arriving
    /// after pause counts nothing.
    pub fn pause(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
        }
    }

    /// Paused -> Running, only while time remains. Re-anchors the epoch
    /// so `now - epoch` equals the elapsed tick count again.
    pub fn resume(&mut self, now_unix: i64) {
        if self.state == TimerState::Paused && self.remaining_secs > 0 {
            self.epoch_start = Some(now_unix - i64::from(self.elapsed_secs()));
            self.state = TimerState::Running;
        }
    }

    /// Resume against an explicit anchor (mirror side): remaining is
    /// recomputed from the anchor and the local clock.
    pub fn resume_anchored(&mut self, epoch_start: i64, now_unix: i64) {
        if self.state == TimerState::Stopped {
            return;
        }
        let elapsed = (now_unix - epoch_start).max(0).min(i64::from(u32::MAX)) as u32;
        self.remaining_secs = self.total_secs.saturating_sub(elapsed);
        self.epoch_start = Some(epoch_start);
        if self.remaining_secs > 0 {
            self.state = TimerState::Running;
        } else {
            self.completed = true;
            self.state = TimerState::Stopped;
        }
    }

    /// Cancel the countdown entirely.
    pub fn reset(&mut self) {
        self.state = TimerState::Stopped;
        self.total_secs = 0;
        self.remaining_secs = 0;
        self.epoch_start = None;
        self.completed = false;
    }

    /// Count one second. Returns [`Tick::Completed`] the moment remaining
    /// reaches zero, and never again for the same run.
    pub fn tick(&mut self) -> Tick {
        if self.state != TimerState::Running {
            return Tick::Idle;
        }
        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
        }
        if self.remaining_secs == 0 {
            self.state = TimerState::Stopped;
            if !self.completed {
                self.completed = true;
                return Tick::Completed;
            }
            return Tick::Idle;
        }
        Tick::Counting {
            remaining_secs: self.remaining_secs,
        }
    }
}
