//! Request lifecycle bookkeeping.
//!
//! Every mutation begins a new generation and supersedes the outstanding one.
//! A response is applied only when it carries the current generation and that
//! generation is still pending; anything else is dropped.

use crate::store::state::{Generation, RequestStatus};

/// What to do with a response that just arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Current and pending: merge it.
    Apply,
    /// A newer generation has been issued since.
    Superseded { current: Generation },
    /// Current, but already resolved, failed, or expired.
    Settled,
}

/// Tracks the current generation and its phase.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    current: Generation,
    status: RequestStatus,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Generation {
        self.current
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    /// Issue the next generation and mark it pending.
    pub fn begin(&mut self) -> Generation {
        if self.status == RequestStatus::Pending {
            log::debug!("generation {} superseded", self.current);
        }
        self.current = self.current.next();
        self.status = RequestStatus::Pending;
        self.current
    }

    /// Judge a response tagged with `generation`.
    pub fn verdict(&self, generation: Generation) -> Verdict {
        if generation != self.current {
            Verdict::Superseded {
                current: self.current,
            }
        } else if self.status != RequestStatus::Pending {
            Verdict::Settled
        } else {
            Verdict::Apply
        }
    }

    /// Record the outcome of the current generation.
    pub fn settle(&mut self, status: RequestStatus) {
        debug_assert!(matches!(
            status,
            RequestStatus::Resolved | RequestStatus::Failed
        ));
        self.status = status;
    }
}
