use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Session;

/// Every phase transition in the system produces an Event.
/// The CLI polls for events; notification sinks subscribe to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    FocusStarted {
        focus_minutes: u32,
        rest_minutes: u32,
        score: f64,
        at: DateTime<Utc>,
    },
    RestStarted {
        rest_minutes: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    /// Full cycle finished (rest ran out). Carries the archival record.
    SessionCompleted {
        session: Session,
        at: DateTime<Utc>,
    },
    /// User saved mid-session. Carries the archival record.
    SessionSaved {
        session: Session,
        at: DateTime<Utc>,
    },
    /// Mirror-side summary signal: the peer reported completion.
    /// Emitted at most once per session epoch; the mirror never archives.
    SummaryReady {
        at: DateTime<Utc>,
    },
}
