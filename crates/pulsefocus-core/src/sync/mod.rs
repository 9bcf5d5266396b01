//! Cross-device synchronization layer.
//!
//! Wire types, the best-effort channel with store-and-forward queueing,
//! and the reconciliation policy the receiving side applies to every
//! inbound payload.

pub mod channel;
pub mod message;
pub mod reconcile;

#[cfg(test)]
mod reconcile_tests;

pub use channel::{InMemoryLink, PeerLink, SyncChannel};
pub use message::{ContextSnapshot, StateKind, SyncMessage};
pub use reconcile::{Reconciler, HR_OVERRIDE_SECS};
