//! The boundary between the store and whatever answers index requests.
//!
//! The store hands every compiled request to an [`IndexTransport`] as a
//! [`RequestTicket`]. The transport may answer immediately, on another thread,
//! or from an event loop; whichever it picks, it completes the ticket exactly
//! once and the answer re-enters the store through the ticket's [`Responder`].

pub mod deferred;
pub mod memory;
pub mod service;

use std::fmt;
use std::sync::Weak;

use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::query::IndexRequest;
use crate::store::{Generation, Shared};

pub use self::deferred::DeferredTransport;
pub use self::memory::{MemoryIndex, MemoryTransport};
pub use self::service::{IndexService, TokioTransport};

/// Sends index requests on behalf of a store.
pub trait IndexTransport: Send + Sync {
    /// Issue the ticket's request and eventually complete the ticket.
    ///
    /// Called without any store lock held, so completing the ticket from
    /// inside `submit` is allowed.
    fn submit(&self, ticket: RequestTicket);
}

/// Completion handle for one issued request.
///
/// Holds only a weak reference to the store: completing it after the store
/// was dropped or torn down does nothing.
pub struct Responder {
    generation: Generation,
    shared: Weak<Shared>,
}

impl Responder {
    pub(crate) fn new(generation: Generation, shared: Weak<Shared>) -> Self {
        Responder { generation, shared }
    }

    /// The generation this responder belongs to.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Hand the raw response, or the transport failure, to the store.
    pub fn respond(self, outcome: Result<Value>) {
        if let Some(shared) = self.shared.upgrade() {
            shared.complete(self.generation, outcome);
        }
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("generation", &self.generation)
            .finish()
    }
}

/// A request issued by the store, tagged with its generation.
#[derive(Debug)]
pub struct RequestTicket {
    id: Uuid,
    request: IndexRequest,
    responder: Responder,
}

impl RequestTicket {
    pub(crate) fn new(request: IndexRequest, responder: Responder) -> Self {
        RequestTicket {
            id: Uuid::new_v4(),
            request,
            responder,
        }
    }

    /// Unique id, for correlating log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn generation(&self) -> Generation {
        self.responder.generation()
    }

    pub fn request(&self) -> &IndexRequest {
        &self.request
    }

    /// Split into the request and its completion handle.
    pub fn into_parts(self) -> (IndexRequest, Responder) {
        (self.request, self.responder)
    }

    /// Complete with a raw response or a failure.
    pub fn respond(self, outcome: Result<Value>) {
        self.responder.respond(outcome);
    }

    /// Complete with a raw response.
    pub fn resolve(self, raw: Value) {
        self.respond(Ok(raw));
    }

    /// Complete with a failure.
    pub fn fail(self, error: crate::error::FacetStateError) {
        self.respond(Err(error));
    }
}
