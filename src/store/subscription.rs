//! Observer registration.

use std::fmt;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::store::Shared;
use crate::store::state::Snapshot;

pub(crate) type Callback = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// The registered observers of one store.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: AtomicU64,
    entries: RwLock<Vec<(u64, Callback)>>,
}

impl Subscribers {
    pub(crate) fn add(&self, callback: Callback) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.write().push((id, callback));
        id
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub(crate) fn clear(&self) {
        self.entries.write().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Copy of the current callbacks, so none is called under the lock.
    pub(crate) fn callbacks(&self) -> Vec<Callback> {
        self.entries
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }
}

/// Handle returned by [`SearchStore::subscribe`](crate::store::SearchStore::subscribe).
///
/// Dropping the handle keeps the callback registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it. Unsubscribing is
/// idempotent and may be done from inside a callback or after teardown.
pub struct Subscription {
    id: u64,
    active: AtomicBool,
    shared: Weak<Shared>,
}

impl Subscription {
    pub(crate) fn new(id: u64, shared: Weak<Shared>) -> Self {
        Subscription {
            id,
            active: AtomicBool::new(true),
            shared,
        }
    }

    /// Stop receiving snapshots.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            shared.subscribers.remove(self.id);
        }
    }

    /// Whether `unsubscribe` has not been called yet.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
