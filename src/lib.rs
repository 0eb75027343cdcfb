//! # facetstate
//!
//! A state controller for faceted search user interfaces.
//!
//! ## Features
//!
//! - Immutable query model: free text, list and range facets, sort, paging
//! - Pure compilation of the model into index requests
//! - Normalization of raw index responses into documents and facet counts
//! - Generation tokens that discard superseded responses
//! - Page-based or incremental ("load more") pagination
//! - Subscribe/notify protocol with immutable snapshots
//! - Pluggable transports and timeout policies

pub mod action;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod response;
pub mod store;

pub mod prelude {
    pub use crate::action::Action;
    pub use crate::config::ControllerConfig;
    pub use crate::error::{FacetStateError, Result};
    pub use crate::index::{
        DeferredTransport, IndexTransport, MemoryIndex, MemoryTransport, RequestTicket,
    };
    pub use crate::query::{
        FieldKind, FieldSpec, FieldValue, PageStrategy, QueryModel, RangeSelection, SortField,
    };
    pub use crate::store::{
        ErrorKind, Generation, RequestStatus, SearchStore, Snapshot, Subscription,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
