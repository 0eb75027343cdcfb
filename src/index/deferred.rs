//! A transport that queues tickets for the host to answer.
//!
//! Useful when the host owns its own event loop: the loop drains the queue,
//! performs the requests however it likes and completes each ticket. Tests
//! use it to resolve responses out of order.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::index::{IndexTransport, RequestTicket};

/// Queue-backed [`IndexTransport`]. Clones share the same queue.
#[derive(Debug, Clone)]
pub struct DeferredTransport {
    sender: Sender<RequestTicket>,
    receiver: Receiver<RequestTicket>,
}

impl Default for DeferredTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredTransport {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        DeferredTransport { sender, receiver }
    }

    /// Take the oldest queued ticket, if any.
    pub fn try_next(&self) -> Option<RequestTicket> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next ticket.
    pub fn next_timeout(&self, timeout: Duration) -> Option<RequestTicket> {
        match self.receiver.recv_timeout(timeout) {
            Ok(ticket) => Some(ticket),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take every queued ticket, oldest first.
    pub fn drain(&self) -> Vec<RequestTicket> {
        self.receiver.try_iter().collect()
    }

    /// Number of tickets waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl IndexTransport for DeferredTransport {
    fn submit(&self, ticket: RequestTicket) {
        log::debug!(
            "queued request {} for generation {}",
            ticket.id(),
            ticket.generation()
        );
        // both ends live in self, so the channel cannot be disconnected here
        let _ = self.sender.send(ticket);
    }
}
