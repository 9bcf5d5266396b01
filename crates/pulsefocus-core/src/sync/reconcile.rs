//! Reconciliation policy for inbound peer payloads.
//!
//! Every payload off the channel goes through [`Reconciler::apply`],
//! which enforces the mirror invariants: sequence-stale samples are
//! discarded, state changes never move the mirror backward within a
//! session epoch, and a context snapshot always fully supersedes the
//! local mirror. Remaining time is recomputed from the message's epoch
//! anchor against the receiver's clock -- a transmitted "remaining"
//! field is never trusted, so queuing and retry latency cannot corrupt
//! the countdown.

use crate::events::Event;
use crate::session::SessionStateMachine;

use super::message::{StateKind, SyncMessage};

/// How long a peer heart-rate sample overrides locally produced values,
/// in seconds.
pub const HR_OVERRIDE_SECS: i64 = 15;

#[derive(Debug, Default)]
pub struct Reconciler {
    last_accepted_seq: Option<u64>,
    mirrored_bpm: Option<u32>,
    hr_override_until: Option<i64>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one inbound payload to the mirrored machine. Returns the
    /// transition event when the mirror visibly changed; stale and
    /// redundant payloads return `None` and leave the mirror untouched.
    pub fn apply(
        &mut self,
        machine: &mut SessionStateMachine,
        message: &SyncMessage,
        now_unix: i64,
    ) -> Option<Event> {
        match message {
            SyncMessage::HeartRateSample { bpm, sequence, .. } => {
                if let Some(last) = self.last_accepted_seq {
                    if *sequence <= last {
                        return None;
                    }
                }
                self.last_accepted_seq = Some(*sequence);
                self.mirrored_bpm = Some(*bpm);
                self.hr_override_until = Some(now_unix + HR_OVERRIDE_SECS);
                None
            }
            SyncMessage::StateChange {
                kind,
                epoch_start,
                focus,
                rest,
                ..
            } => match kind {
                StateKind::Start => {
                    machine.mirror_start(*focus, *rest, *epoch_start, now_unix)
                }
                StateKind::Pause => machine.mirror_pause(now_unix),
                StateKind::Resume => machine.mirror_resume(*epoch_start, now_unix),
                StateKind::Reset => machine.mirror_reset(now_unix),
                StateKind::Complete => machine.mirror_complete(now_unix),
            },
            SyncMessage::Snapshot(snapshot) => machine.apply_snapshot(snapshot, now_unix),
        }
    }

    /// Peer heart rate while its override window is open.
    pub fn mirrored_bpm(&self, now_unix: i64) -> Option<u32> {
        match (self.mirrored_bpm, self.hr_override_until) {
            (Some(bpm), Some(until)) if now_unix < until => Some(bpm),
            _ => None,
        }
    }

    /// Peer heart rate if still valid, otherwise the locally produced
    /// value. This is what suppresses contradicting simulated readings
    /// while real samples stream in from the other device.
    pub fn effective_bpm(&self, local_bpm: f64, now_unix: i64) -> f64 {
        self.mirrored_bpm(now_unix)
            .map(f64::from)
            .unwrap_or(local_bpm)
    }

    pub fn last_accepted_sequence(&self) -> Option<u64> {
        self.last_accepted_seq
    }
}
