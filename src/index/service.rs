//! Adapter running async index services on a tokio runtime.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::runtime::Handle;

use crate::error::{FacetStateError, Result};
use crate::index::{IndexTransport, RequestTicket};
use crate::query::IndexRequest;

/// An asynchronous index client, e.g. an HTTP client bound to one endpoint.
pub trait IndexService: Send + Sync + 'static {
    /// Run `request` and return the raw JSON response.
    fn search(&self, request: IndexRequest) -> impl Future<Output = anyhow::Result<Value>> + Send;
}

/// [`IndexTransport`] that spawns each request of an [`IndexService`] as a
/// tokio task. Superseded requests still run to completion; their answers
/// are dropped by the store.
pub struct TokioTransport<S> {
    service: Arc<S>,
    handle: Handle,
}

impl<S: IndexService> TokioTransport<S> {
    /// Create a transport on the current tokio runtime.
    pub fn new(service: S) -> Result<Self> {
        let handle = Handle::try_current()
            .map_err(|e| FacetStateError::other(format!("no tokio runtime available: {e}")))?;
        Ok(Self::with_handle(service, handle))
    }

    /// Create a transport spawning onto `handle`.
    pub fn with_handle(service: S, handle: Handle) -> Self {
        TokioTransport {
            service: Arc::new(service),
            handle,
        }
    }
}

impl<S> Clone for TokioTransport<S> {
    fn clone(&self) -> Self {
        TokioTransport {
            service: Arc::clone(&self.service),
            handle: self.handle.clone(),
        }
    }
}

impl<S: IndexService> IndexTransport for TokioTransport<S> {
    fn submit(&self, ticket: RequestTicket) {
        let service = Arc::clone(&self.service);
        let id = ticket.id();
        self.handle.spawn(async move {
            let (request, responder) = ticket.into_parts();
            let outcome = service.search(request).await.map_err(|e| {
                log::warn!("index request {id} failed: {e:#}");
                FacetStateError::transport(format!("{e:#}"))
            });
            responder.respond(outcome);
        });
    }
}
