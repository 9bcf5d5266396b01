//! Best-effort bidirectional messaging between the two devices.
//!
//! Messages are delivered immediately while the peer is reachable and
//! queued FIFO otherwise (store-and-forward, in-memory only; the queue
//! does not survive a restart and is never bounded or expired). The
//! single outstanding context snapshot takes a short-circuit path: only
//! the latest one matters, and it is re-pushed ahead of the queue when
//! reachability returns. Consumers therefore cannot assume arrival order
//! equals send order and must route every payload through the
//! reconciliation policy.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::message::{ContextSnapshot, SyncMessage};

/// Transport boundary: one direction of the device pair.
///
/// `deliver` is fire-and-forget; the channel never awaits a response.
pub trait PeerLink {
    fn is_reachable(&self) -> bool;
    fn deliver(&self, message: &SyncMessage);
}

/// Sending and receiving half of the sync pair on one device.
pub struct SyncChannel<L: PeerLink> {
    link: L,
    pending: VecDeque<SyncMessage>,
    /// The single outstanding context snapshot; replaced, never queued.
    snapshot: Option<ContextSnapshot>,
    reachable_seen: bool,
    inbox: VecDeque<SyncMessage>,
    last_received: Option<SyncMessage>,
    handler: Option<Box<dyn FnMut(&SyncMessage)>>,
}

impl<L: PeerLink> SyncChannel<L> {
    pub fn new(link: L) -> Self {
        let reachable_seen = link.is_reachable();
        Self {
            link,
            pending: VecDeque::new(),
            snapshot: None,
            reachable_seen,
            inbox: VecDeque::new(),
            last_received: None,
            handler: None,
        }
    }

    /// Deliver now if the peer is reachable, else enqueue for
    /// store-and-forward in FIFO order.
    pub fn send(&mut self, message: SyncMessage) {
        self.poll_reachability();
        if self.link.is_reachable() {
            self.link.deliver(&message);
        } else {
            self.pending.push_back(message);
        }
    }

    /// Replace the outstanding snapshot and push it if reachable. The
    /// snapshot bypasses the pending queue entirely.
    pub fn update_snapshot(&mut self, snapshot: ContextSnapshot) {
        self.snapshot = Some(snapshot);
        self.poll_reachability();
        if self.link.is_reachable() {
            self.link.deliver(&SyncMessage::Snapshot(snapshot));
        }
    }

    /// Observe reachability; on a false -> true transition re-push the
    /// outstanding snapshot first, then drain the queue in enqueue order.
    pub fn poll_reachability(&mut self) {
        let reachable = self.link.is_reachable();
        if reachable && !self.reachable_seen {
            if let Some(snapshot) = self.snapshot {
                self.link.deliver(&SyncMessage::Snapshot(snapshot));
            }
            while let Some(message) = self.pending.pop_front() {
                self.link.deliver(&message);
            }
        }
        self.reachable_seen = reachable;
    }

    /// Register a consumer that every inbound payload is pushed to as it
    /// arrives. Payloads still land in the inbox and `last_received`, so
    /// polling keeps working alongside the handler.
    pub fn on_receive<F>(&mut self, handler: F)
    where
        F: FnMut(&SyncMessage) + 'static,
    {
        self.handler = Some(Box::new(handler));
    }

    /// Accept an inbound payload from the transport.
    pub fn receive(&mut self, message: SyncMessage) {
        if let Some(handler) = self.handler.as_mut() {
            handler(&message);
        }
        self.last_received = Some(message.clone());
        self.inbox.push_back(message);
    }

    /// Drain everything received since the last call, in arrival order.
    pub fn drain_inbox(&mut self) -> Vec<SyncMessage> {
        self.inbox.drain(..).collect()
    }

    /// Most recently received payload, exposed for polling.
    pub fn last_received(&self) -> Option<&SyncMessage> {
        self.last_received.as_ref()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn outstanding_snapshot(&self) -> Option<&ContextSnapshot> {
        self.snapshot.as_ref()
    }
}

/// In-process transport for tests and the sync demo. Reachability is
/// shared between both directions of a pair; delivered messages pile up
/// until the harness pumps them into the far channel.
#[derive(Clone)]
pub struct InMemoryLink {
    reachable: Arc<AtomicBool>,
    delivered: Arc<Mutex<VecDeque<SyncMessage>>>,
}

impl InMemoryLink {
    /// Two directions of one connection, initially reachable.
    pub fn pair() -> (InMemoryLink, InMemoryLink) {
        let reachable = Arc::new(AtomicBool::new(true));
        let a = InMemoryLink {
            reachable: reachable.clone(),
            delivered: Arc::new(Mutex::new(VecDeque::new())),
        };
        let b = InMemoryLink {
            reachable,
            delivered: Arc::new(Mutex::new(VecDeque::new())),
        };
        (a, b)
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Take the messages delivered through this direction so far.
    pub fn take_delivered(&self) -> Vec<SyncMessage> {
        let mut guard = self.delivered.lock().unwrap_or_else(|e| e.into_inner());
        guard.drain(..).collect()
    }
}

impl PeerLink for InMemoryLink {
    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    fn deliver(&self, message: &SyncMessage) {
        let mut guard = self.delivered.lock().unwrap_or_else(|e| e.into_inner());
        guard.push_back(message.clone());
    }
}
