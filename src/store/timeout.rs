//! Pluggable request timeouts.
//!
//! The store has no timer of its own. A [`TimeoutPolicy`] is armed for every
//! issued generation and may later call [`Expiry::expire`], which fails the
//! generation if it is still current and pending.

use std::fmt;
use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;

use crate::error::{FacetStateError, Result};
use crate::store::Shared;
use crate::store::state::Generation;

/// Decides when an unanswered request should be failed.
pub trait TimeoutPolicy: Send + Sync {
    /// Called once per issued generation, right after it is issued.
    fn arm(&self, expiry: Expiry);
}

/// Fails one generation with a timeout when invoked.
pub struct Expiry {
    generation: Generation,
    shared: Weak<Shared>,
}

impl Expiry {
    pub(crate) fn new(generation: Generation, shared: Weak<Shared>) -> Self {
        Expiry { generation, shared }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Fail the generation if it is still waiting. Otherwise a no-op.
    pub fn expire(self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.expire(self.generation);
        }
    }
}

impl fmt::Debug for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expiry")
            .field("generation", &self.generation)
            .finish()
    }
}

/// Expires requests after a fixed duration using tokio's timer.
#[derive(Debug, Clone)]
pub struct TokioTimeout {
    duration: Duration,
    handle: Handle,
}

impl TokioTimeout {
    /// Create a policy on the current tokio runtime.
    pub fn new(duration: Duration) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| FacetStateError::other(format!("no tokio runtime available: {e}")))?;
        Ok(Self::with_handle(duration, handle))
    }

    pub fn with_handle(duration: Duration, handle: Handle) -> Self {
        TokioTimeout { duration, handle }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl TimeoutPolicy for TokioTimeout {
    fn arm(&self, expiry: Expiry) {
        let duration = self.duration;
        self.handle.spawn(async move {
            tokio::time::sleep(duration).await;
            expiry.expire();
        });
    }
}
