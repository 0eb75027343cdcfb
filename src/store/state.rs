//! Snapshot types published by the store.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FacetStateError;
use crate::query::QueryModel;
use crate::response::{Document, FacetValue};

/// Identifies which query model a request and its response belong to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    pub const ZERO: Generation = Generation(0);

    pub fn new(value: u64) -> Self {
        Generation(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// The following generation.
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle phase of the current generation's request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Nothing issued yet.
    #[default]
    Idle,
    /// Waiting for the index.
    Pending,
    /// The response was merged.
    Resolved,
    /// The request failed; previous results are kept.
    Failed,
}

/// Class of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Transport,
    MalformedResponse,
    Timeout,
    Other,
}

/// Failure details published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&FacetStateError> for ErrorInfo {
    fn from(error: &FacetStateError) -> Self {
        let kind = match error {
            FacetStateError::Transport(_) | FacetStateError::Io(_) | FacetStateError::Anyhow(_) => {
                ErrorKind::Transport
            }
            FacetStateError::MalformedResponse(_) | FacetStateError::Json(_) => {
                ErrorKind::MalformedResponse
            }
            FacetStateError::Timeout(_) => ErrorKind::Timeout,
            FacetStateError::Configuration(_)
            | FacetStateError::InvalidAction(_)
            | FacetStateError::Other(_) => ErrorKind::Other,
        };
        ErrorInfo {
            kind,
            message: error.to_string(),
        }
    }
}

/// What the index last returned, plus the request flags.
///
/// While `pending` is set, `docs` and `facets` still describe the last
/// resolved query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultModel {
    pub pending: bool,
    pub num_found: u64,
    pub docs: Vec<Document>,
    pub facets: BTreeMap<String, Vec<FacetValue>>,
    pub error: Option<ErrorInfo>,
}

/// An immutable view of the whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub generation: Generation,
    pub status: RequestStatus,
    pub query: QueryModel,
    pub results: ResultModel,
}

impl Snapshot {
    /// Facet values for `field`; empty when the index reported none.
    pub fn facets(&self, field: &str) -> &[FacetValue] {
        self.results
            .facets
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
