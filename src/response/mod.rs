//! Normalized index results.

pub mod mapper;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use self::mapper::{DEFAULT_ID_FIELD, ResponseMapper};

/// A result document: its stored fields plus a stable identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Get a stored field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// A facet value and the number of matching documents carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

impl FacetValue {
    pub fn new<S: Into<String>>(value: S, count: u64) -> Self {
        FacetValue {
            value: value.into(),
            count,
        }
    }
}

/// One normalized response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    pub num_found: u64,
    pub docs: Vec<Document>,
    pub facets: BTreeMap<String, Vec<FacetValue>>,
}
