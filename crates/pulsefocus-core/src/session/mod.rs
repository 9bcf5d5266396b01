mod config;
mod machine;

pub use config::{FocusMode, Phase, Role, SessionConfig};
pub use machine::SessionStateMachine;
