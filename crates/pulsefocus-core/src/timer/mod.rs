mod phase_timer;

pub use phase_timer::{PhaseTimer, Tick, TimerState};
