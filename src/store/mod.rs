//! The search state store.
//!
//! [`SearchStore`] owns the single `{query, results, generation}` tuple.
//! Actions update the query model synchronously and issue a request through
//! the configured [`IndexTransport`]; the eventual answer is merged only if it
//! belongs to the current generation. Every committed transition is published
//! to subscribers as an immutable [`Snapshot`].
//!
//! ```
//! use facetstate::config::ControllerConfig;
//! use facetstate::index::{MemoryIndex, MemoryTransport};
//! use facetstate::query::{FieldSpec, FieldValue};
//! use facetstate::store::SearchStore;
//!
//! let index = MemoryIndex::from_json_str(r#"[
//!     {"id": "1", "color": "red"},
//!     {"id": "2", "color": "blue"}
//! ]"#).unwrap();
//! let store = SearchStore::builder(MemoryTransport::new(index)).build();
//!
//! let config = ControllerConfig::new("memory://colors")
//!     .with_search_fields(vec![FieldSpec::list_facet("color")]);
//! store.init(config).unwrap();
//! store.set_search_field("color", FieldValue::list(["red"]));
//!
//! let snapshot = store.snapshot();
//! assert_eq!(snapshot.results.num_found, 1);
//! assert_eq!(snapshot.facets("color").len(), 2);
//! ```

pub mod lifecycle;
pub mod state;
pub mod subscription;
pub mod timeout;

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::action::Action;
use crate::error::{FacetStateError, Result};
use crate::index::{IndexTransport, RequestTicket, Responder};
use crate::query::{IndexRequest, QueryModel, compile};
use crate::response::{ResponseMapper, ResultPage};

pub use self::lifecycle::{Lifecycle, Verdict};
pub use self::state::{ErrorInfo, ErrorKind, Generation, RequestStatus, ResultModel, Snapshot};
pub use self::subscription::Subscription;
pub use self::timeout::{Expiry, TimeoutPolicy, TokioTimeout};

use self::subscription::Subscribers;

/// Builder for [`SearchStore`].
pub struct SearchStoreBuilder {
    transport: Arc<dyn IndexTransport>,
    timeout: Option<Arc<dyn TimeoutPolicy>>,
    mapper: ResponseMapper,
}

impl SearchStoreBuilder {
    /// Fail requests that get no answer in time.
    pub fn timeout<P: TimeoutPolicy + 'static>(mut self, policy: P) -> Self {
        self.timeout = Some(Arc::new(policy));
        self
    }

    /// Read document ids from `id_field` (default `"id"`).
    pub fn id_field<S: Into<String>>(mut self, id_field: S) -> Self {
        self.mapper = self.mapper.with_id_field(id_field);
        self
    }

    pub fn build(self) -> SearchStore {
        SearchStore {
            shared: Arc::new(Shared {
                state: Mutex::new(StoreState::default()),
                subscribers: Subscribers::default(),
                transport: self.transport,
                timeout: self.timeout,
                mapper: self.mapper,
            }),
        }
    }
}

/// Handle to a search state store. Clones refer to the same store.
#[derive(Clone)]
pub struct SearchStore {
    shared: Arc<Shared>,
}

impl fmt::Debug for SearchStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("SearchStore")
            .field("generation", &snapshot.generation)
            .field("status", &snapshot.status)
            .field("subscribers", &self.shared.subscribers.len())
            .finish()
    }
}

impl SearchStore {
    /// Start building a store that sends requests through `transport`.
    pub fn builder<T: IndexTransport + 'static>(transport: T) -> SearchStoreBuilder {
        SearchStoreBuilder {
            transport: Arc::new(transport),
            timeout: None,
            mapper: ResponseMapper::new(),
        }
    }

    /// The current state.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.shared.state.lock().snapshot)
    }

    /// Register `callback` for every subsequent transition.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let id = self.shared.subscribers.add(Arc::new(callback));
        Subscription::new(id, Arc::downgrade(&self.shared))
    }

    /// Apply `action` and issue its request.
    ///
    /// Returns the new generation, or `None` when the action was ignored:
    /// the store is torn down, not initialized yet, or the action does not
    /// fit the current query model.
    pub fn dispatch(&self, action: Action) -> Option<Generation> {
        self.try_dispatch(action).ok()
    }

    /// Like [`SearchStore::dispatch`], but says why an action was ignored.
    pub fn try_dispatch(&self, action: Action) -> Result<Generation> {
        let (request, generation) = {
            let mut state = self.shared.state.lock();
            if state.closed {
                log::debug!("ignoring {} after teardown", action.name());
                return Err(FacetStateError::other(format!(
                    "{} after teardown",
                    action.name()
                )));
            }
            if !state.initialized && !action.is_init() {
                log::warn!("ignoring {} before init", action.name());
                return Err(FacetStateError::invalid_action(format!(
                    "{} before init",
                    action.name()
                )));
            }

            let query = match action.apply(&state.snapshot.query) {
                Ok(query) => query,
                Err(e) => {
                    log::warn!("ignoring {}: {e}", action.name());
                    return Err(e);
                }
            };

            let generation = state.lifecycle.begin();
            let (request, plan) = plan_request(&query, state.loaded.as_ref());
            let results = if action.is_init() {
                log::info!("initialized search over {}", query.index_url);
                state.initialized = true;
                state.loaded = None;
                ResultModel {
                    pending: true,
                    ..ResultModel::default()
                }
            } else {
                ResultModel {
                    pending: true,
                    ..state.snapshot.results.clone()
                }
            };

            state.plan = plan;
            let status = state.lifecycle.status();
            state.commit(Snapshot {
                generation,
                status,
                query,
                results,
            });
            (request, generation)
        };

        log::debug!("issuing generation {generation}: {}", request.description());
        let weak = Arc::downgrade(&self.shared);
        if let Some(policy) = &self.shared.timeout {
            policy.arm(Expiry::new(generation, weak.clone()));
        }
        self.shared
            .transport
            .submit(RequestTicket::new(request, Responder::new(generation, weak)));
        self.shared.flush();

        Ok(generation)
    }

    /// Fail `generation` with a timeout if it is still current and pending.
    pub fn expire(&self, generation: Generation) {
        self.shared.expire(generation);
    }

    /// Drop every subscriber and ignore all later actions and responses.
    /// The last snapshot stays readable.
    pub fn teardown(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.outbox.clear();
        }
        self.shared.subscribers.clear();
        log::info!("search store torn down");
    }

    /// Whether [`teardown`](Self::teardown) has been called.
    pub fn is_torn_down(&self) -> bool {
        self.shared.state.lock().closed
    }
}

/// How the answer to the current generation folds into the results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum MergePlan {
    /// The page replaces the documents.
    #[default]
    Replace,
    /// The page continues the loaded documents.
    Append,
    /// The page holds every document from offset 0 up to the cursor's end.
    Backfill,
}

/// The query (cursor excluded) the loaded documents belong to.
#[derive(Debug)]
struct LoadedDocs {
    base: QueryModel,
    count: u64,
}

#[derive(Default)]
struct StoreState {
    snapshot: Arc<Snapshot>,
    lifecycle: Lifecycle,
    initialized: bool,
    closed: bool,
    outbox: VecDeque<Arc<Snapshot>>,
    delivering: bool,
    plan: MergePlan,
    loaded: Option<LoadedDocs>,
}

impl StoreState {
    fn commit(&mut self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        self.snapshot = Arc::clone(&snapshot);
        self.outbox.push_back(snapshot);
    }
}

/// State shared between a store handle and its in-flight responders.
pub(crate) struct Shared {
    state: Mutex<StoreState>,
    pub(crate) subscribers: Subscribers,
    transport: Arc<dyn IndexTransport>,
    timeout: Option<Arc<dyn TimeoutPolicy>>,
    mapper: ResponseMapper,
}

impl Shared {
    /// Merge the outcome of `generation`'s request, if it is still wanted.
    pub(crate) fn complete(&self, generation: Generation, outcome: Result<Value>) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            match state.lifecycle.verdict(generation) {
                Verdict::Apply => {}
                Verdict::Superseded { current } => {
                    log::debug!("dropping response for {generation}, current is {current}");
                    return;
                }
                Verdict::Settled => {
                    log::debug!("dropping late response for settled {generation}");
                    return;
                }
            }

            let previous = Arc::clone(&state.snapshot);
            let plan = state.plan;
            let backfill_query;
            let mapping_query = if plan == MergePlan::Backfill {
                backfill_query = previous.query.with_start(0);
                &backfill_query
            } else {
                &previous.query
            };
            let mapped = outcome.and_then(|raw| self.mapper.map(raw, mapping_query));
            let (status, results) = match mapped {
                Ok(page) => {
                    let results = merge(&previous, page, plan);
                    state.loaded = Some(LoadedDocs {
                        base: previous.query.with_start(0),
                        count: results.docs.len() as u64,
                    });
                    (RequestStatus::Resolved, results)
                }
                Err(e) => {
                    log::warn!("request for {generation} failed: {e}");
                    let results = ResultModel {
                        pending: false,
                        error: Some(ErrorInfo::from(&e)),
                        ..previous.results.clone()
                    };
                    (RequestStatus::Failed, results)
                }
            };

            state.lifecycle.settle(status);
            state.commit(Snapshot {
                generation,
                status,
                query: previous.query.clone(),
                results,
            });
        }
        self.flush();
    }

    pub(crate) fn expire(&self, generation: Generation) {
        self.complete(
            generation,
            Err(FacetStateError::timeout(format!(
                "no response for generation {generation}"
            ))),
        );
    }

    /// Deliver queued snapshots in commit order.
    ///
    /// Only one thread delivers at a time; others just queue. A callback that
    /// dispatches has its transitions delivered after it returns. A panicking
    /// callback releases delivery so later flushes resume with the queue.
    fn flush(&self) {
        {
            let mut state = self.state.lock();
            if state.delivering {
                return;
            }
            state.delivering = true;
        }

        let mut guard = DeliveryGuard {
            state: &self.state,
            armed: true,
        };
        loop {
            let next = {
                let mut state = self.state.lock();
                match state.outbox.pop_front() {
                    Some(snapshot) => snapshot,
                    None => {
                        state.delivering = false;
                        guard.armed = false;
                        return;
                    }
                }
            };
            for callback in self.subscribers.callbacks() {
                callback(&next);
            }
        }
    }
}

/// Clears the delivering flag if a callback unwinds out of [`Shared::flush`].
struct DeliveryGuard<'a> {
    state: &'a Mutex<StoreState>,
    armed: bool,
}

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().delivering = false;
        }
    }
}

/// Compile `query` and decide how its answer merges.
///
/// An incremental page is appended only when the loaded documents come from
/// the same query and end exactly at the cursor. Otherwise every document up
/// to the cursor's end is requested again from offset 0.
fn plan_request(query: &QueryModel, loaded: Option<&LoadedDocs>) -> (IndexRequest, MergePlan) {
    let mut request = compile(query);
    if !query.appends_results() {
        return (request, MergePlan::Replace);
    }

    let continues = loaded
        .is_some_and(|loaded| loaded.count == query.start && loaded.base == query.with_start(0));
    if continues {
        return (request, MergePlan::Append);
    }

    log::debug!(
        "loaded documents do not end at offset {}, reloading from 0",
        query.start
    );
    request.offset = 0;
    request.limit = usize::try_from(query.start)
        .unwrap_or(usize::MAX)
        .saturating_add(query.rows);
    (request, MergePlan::Backfill)
}

/// Fold a resolved page into the previous results.
fn merge(previous: &Snapshot, page: ResultPage, plan: MergePlan) -> ResultModel {
    let docs = if plan == MergePlan::Append {
        let mut docs = previous.results.docs.clone();
        docs.extend(page.docs);
        docs
    } else {
        page.docs
    };

    ResultModel {
        pending: false,
        num_found: page.num_found,
        docs,
        facets: page.facets,
        error: None,
    }
}
