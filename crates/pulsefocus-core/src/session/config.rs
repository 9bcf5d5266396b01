//! Session value objects: phase, mode, role and duration configuration.

use serde::{Deserialize, Serialize};

/// What the current countdown represents. `Idle` is both the initial
/// phase and the phase entered after rest completes -- a cycle, not a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Focus,
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusMode {
    /// Use the configured durations as-is.
    Fixed,
    /// Let the advisor adjust durations from biometrics at session start.
    Adaptive,
}

/// Which side of the sync pair this machine plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Actively ticking the countdown; the source of truth.
    Driver,
    /// Reconstructing the same state from received messages.
    Mirror,
}

/// Target durations for one session. Mutated only between sessions,
/// never mid-timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub focus_minutes: u32,
    pub rest_minutes: u32,
    pub mode: FocusMode,
}

impl SessionConfig {
    /// Manual bounds; the advisor applies its own tighter output clamp.
    pub const FOCUS_RANGE: std::ops::RangeInclusive<u32> = 15..=60;
    pub const REST_RANGE: std::ops::RangeInclusive<u32> = 3..=15;

    /// Build a config with user-supplied minutes clamped into the manual
    /// ranges (15..=60 focus, 3..=15 rest).
    pub fn new(focus_minutes: u32, rest_minutes: u32, mode: FocusMode) -> Self {
        Self {
            focus_minutes: focus_minutes.clamp(
                *Self::FOCUS_RANGE.start(),
                *Self::FOCUS_RANGE.end(),
            ),
            rest_minutes: rest_minutes.clamp(
                *Self::REST_RANGE.start(),
                *Self::REST_RANGE.end(),
            ),
            mode,
        }
    }

    pub fn focus_secs(&self) -> u32 {
        self.focus_minutes * 60
    }

    pub fn rest_secs(&self) -> u32 {
        self.rest_minutes * 60
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            rest_minutes: 5,
            mode: FocusMode::Adaptive,
        }
    }
}
