//! ---
//! simcon_section: "02-messaging-ipc-data-model"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Message schema helpers and transport seam."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::{Message, Result};

/// Transport abstraction used by all messaging backends.
///
/// The broker client that delivers inbound actions and carries outbound
/// state notifications lives outside this workspace; it plugs in here.
pub trait Transport: Send + Sync {
    /// Send a message into the transport.
    fn send(&self, msg: Message) -> Result<()>;
    /// Receive the next message from the transport, if available.
    fn recv(&self) -> Option<Message>;
    /// Human-readable transport name for logging.
    fn name(&self) -> &'static str;
}

/// In-memory transport backed by a mutex protected queue.
///
/// Primarily for tests and single-process integration.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    queue: Arc<Mutex<VecDeque<Message>>>,
}

impl InMemoryTransport {
    /// Create a new in-memory transport channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued messages not yet received.
    pub fn pending(&self) -> usize {
        let guard = self.queue.lock().expect("queue poisoned");
        guard.len()
    }

    /// Drain every queued message.
    pub fn drain(&self) -> Vec<Message> {
        let mut guard = self.queue.lock().expect("queue poisoned");
        guard.drain(..).collect()
    }
}

impl Transport for InMemoryTransport {
    fn send(&self, msg: Message) -> Result<()> {
        let mut guard = self.queue.lock().expect("queue poisoned");
        guard.push_back(msg);
        Ok(())
    }

    fn recv(&self) -> Option<Message> {
        let mut guard = self.queue.lock().expect("queue poisoned");
        guard.pop_front()
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
