//! Wire types exchanged between the two devices.

use serde::{Deserialize, Serialize};

use crate::session::Phase;

/// Which transition a `StateChange` message announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Start,
    Pause,
    Resume,
    Reset,
    Complete,
}

/// Full-state snapshot: the authoritative resync mechanism. Always fully
/// supersedes a stale mirror. `remaining_secs` is carried for display
/// only -- receivers recompute remaining from `epoch_start` and their own
/// clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub phase: Phase,
    pub remaining_secs: u32,
    pub focus_minutes: u32,
    pub rest_minutes: u32,
    /// Sender clock at snapshot time (unix seconds).
    pub timestamp: i64,
    /// Epoch anchor of the current countdown.
    pub epoch_start: i64,
}

/// One message on the sync channel.
///
/// `StateChange` fields are individually optional: receivers apply what is
/// present and skip the rest rather than rejecting the whole message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncMessage {
    StateChange {
        kind: StateKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remaining: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        epoch_start: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        focus: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest: Option<u32>,
    },
    HeartRateSample {
        bpm: u32,
        /// Strictly increasing per sending device session; receivers
        /// discard anything at or below the last accepted value.
        sequence: u64,
        timestamp: i64,
    },
    Snapshot(ContextSnapshot),
}

impl SyncMessage {
    /// Shorthand for a state change carrying nothing but the kind.
    pub fn state(kind: StateKind) -> Self {
        SyncMessage::StateChange {
            kind,
            remaining: None,
            epoch_start: None,
            focus: None,
            rest: None,
        }
    }
}
