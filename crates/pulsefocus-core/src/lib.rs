//! # PulseFocus Core Library
//!
//! This library provides the core business logic for PulseFocus, a
//! biometric-adaptive work/rest timer. It implements a CLI-first philosophy
//! where all operations are available via a standalone CLI binary; any GUI
//! would be a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Session Engine**: A tick-driven phase state machine (idle, focus,
//!   rest) that requires the caller to invoke `tick()` once per second
//! - **Advisor**: Heart-rate-pressure heuristic that sizes each session
//! - **Sync**: Best-effort peer channel with store-and-forward queueing
//!   plus a reconciliation policy for out-of-order delivery
//! - **Storage**: SQLite-based session archive and TOML-based configuration
//! - **Coach**: Optional remote recommendation endpoint with local fallback
//!
//! ## Key Components
//!
//! - [`SessionStateMachine`]: Phase state machine, one per device
//! - [`SyncChannel`] / [`Reconciler`]: Cross-device state reconciliation
//! - [`Database`]: Session archive persistence
//! - [`Config`]: Application configuration management

pub mod advisor;
pub mod biometrics;
pub mod coach;
pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod storage;
pub mod sync;
pub mod timer;

pub use advisor::Advice;
pub use biometrics::{SimulatedVitals, VitalSigns, VitalsAggregate};
pub use error::{CoachError, ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use session::{FocusMode, Phase, Role, SessionConfig, SessionStateMachine};
pub use storage::{Config, Database, Session};
pub use sync::{Reconciler, SyncChannel, SyncMessage};
pub use timer::{PhaseTimer, Tick, TimerState};
