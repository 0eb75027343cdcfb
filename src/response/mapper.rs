//! Normalizes raw index responses.
//!
//! The raw wire shape is a JSON object:
//!
//! ```json
//! {
//!   "numFound": 57,
//!   "docs": [{"id": "a1", "title": "..."}],
//!   "facetCounts": {"color": ["red", 12, "blue", 3]}
//! }
//! ```
//!
//! Facet lists may be flat alternating `value, count` lists, lists of
//! `[value, count]` pairs, or lists of `{"value", "count"}` objects.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{FacetStateError, Result};
use crate::query::{FieldSpec, QueryModel};
use crate::response::{Document, FacetValue, ResultPage};

/// Default name of the document identifier field.
pub const DEFAULT_ID_FIELD: &str = "id";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    num_found: u64,
    #[serde(default)]
    docs: Vec<Map<String, Value>>,
    #[serde(default)]
    facet_counts: HashMap<String, Vec<Value>>,
}

/// Maps raw responses to [`ResultPage`]s for a given query model.
#[derive(Debug, Clone)]
pub struct ResponseMapper {
    id_field: String,
}

impl Default for ResponseMapper {
    fn default() -> Self {
        ResponseMapper {
            id_field: DEFAULT_ID_FIELD.to_string(),
        }
    }
}

impl ResponseMapper {
    /// Create a mapper reading document ids from `"id"`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read document ids from `id_field` instead.
    pub fn with_id_field<S: Into<String>>(mut self, id_field: S) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Normalize `raw`, the answer to the request compiled from `model`.
    ///
    /// Facets are reported for every declared facet field, empty when the
    /// index sent none; counts for undeclared fields are dropped.
    pub fn map(&self, raw: Value, model: &QueryModel) -> Result<ResultPage> {
        let wire: WireResponse = serde_json::from_value(raw)
            .map_err(|e| FacetStateError::malformed(format!("unexpected response shape: {e}")))?;

        let offset = model.offset();
        let docs = wire
            .docs
            .into_iter()
            .enumerate()
            .map(|(position, fields)| self.document(fields, offset + position as u64))
            .collect::<Result<Vec<_>>>()?;

        let mut facets = BTreeMap::new();
        for spec in &model.search_fields {
            let field = match spec {
                FieldSpec::Text { .. } => continue,
                FieldSpec::ListFacet { field, .. } | FieldSpec::RangeFacet { field, .. } => field,
            };
            let entries = match wire.facet_counts.get(field) {
                Some(entries) => parse_facet_entries(field, entries)?,
                None => Vec::new(),
            };
            facets.insert(field.clone(), entries);
        }

        Ok(ResultPage {
            num_found: wire.num_found,
            docs,
            facets,
        })
    }

    fn document(&self, fields: Map<String, Value>, position: u64) -> Result<Document> {
        let id = match fields.get(&self.id_field) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            Some(other) => {
                return Err(FacetStateError::malformed(format!(
                    "document id field '{}' has unsupported value {other}",
                    self.id_field
                )));
            }
            // no stored id: fall back to the absolute row position
            None => position.to_string(),
        };
        Ok(Document { id, fields })
    }
}

fn parse_facet_entries(field: &str, entries: &[Value]) -> Result<Vec<FacetValue>> {
    let flat = entries
        .first()
        .is_some_and(|first| matches!(first, Value::String(_) | Value::Number(_) | Value::Bool(_)));

    if flat {
        if entries.len() % 2 != 0 {
            return Err(FacetStateError::malformed(format!(
                "facet '{field}' has an odd number of value/count entries"
            )));
        }
        return entries
            .chunks(2)
            .map(|pair| facet_value(field, &pair[0], &pair[1]))
            .collect();
    }

    entries
        .iter()
        .map(|entry| match entry {
            Value::Array(pair) if pair.len() == 2 => facet_value(field, &pair[0], &pair[1]),
            Value::Object(object) => match (object.get("value"), object.get("count")) {
                (Some(value), Some(count)) => facet_value(field, value, count),
                _ => Err(FacetStateError::malformed(format!(
                    "facet '{field}' entry is missing value or count"
                ))),
            },
            other => Err(FacetStateError::malformed(format!(
                "facet '{field}' has unsupported entry {other}"
            ))),
        })
        .collect()
}

fn facet_value(field: &str, value: &Value, count: &Value) -> Result<FacetValue> {
    let value = match value {
        Value::String(value) => value.clone(),
        Value::Number(value) => value.to_string(),
        Value::Bool(value) => value.to_string(),
        other => {
            return Err(FacetStateError::malformed(format!(
                "facet '{field}' has unsupported value {other}"
            )));
        }
    };
    let count = count.as_u64().ok_or_else(|| {
        FacetStateError::malformed(format!(
            "facet '{field}' count for '{value}' is not a non-negative integer"
        ))
    })?;
    Ok(FacetValue { value, count })
}
