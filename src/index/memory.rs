//! An in-memory document index answering [`IndexRequest`]s.
//!
//! Documents are plain JSON objects. Scalar and array field values are both
//! supported; an array counts as a multi-valued field.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value, json};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{FacetStateError, Result};
use crate::index::{IndexService, IndexTransport, RequestTicket};
use crate::query::{
    CATCH_ALL_FIELD, FacetRequest, FieldKind, FilterClause, IndexRequest, SortClause,
    SortDirection,
};

/// A fixed set of documents held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    docs: Vec<Map<String, Value>>,
}

impl MemoryIndex {
    /// Create an index over `docs`.
    pub fn new(docs: Vec<Map<String, Value>>) -> Self {
        MemoryIndex { docs }
    }

    /// Parse a JSON array of objects, or JSON Lines with one object per line.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('[') {
            let docs: Vec<Map<String, Value>> = serde_json::from_str(trimmed)?;
            return Ok(MemoryIndex::new(docs));
        }

        let mut docs = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let doc: Map<String, Value> = serde_json::from_str(line).map_err(|e| {
                FacetStateError::other(format!("line {}: invalid document: {e}", line_no + 1))
            })?;
            docs.push(doc);
        }
        Ok(MemoryIndex::new(docs))
    }

    /// Load documents from a JSON or JSON Lines file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Evaluate `request` and build the raw wire response.
    pub fn execute(&self, request: &IndexRequest) -> Value {
        let mut matched: Vec<&Map<String, Value>> = self
            .docs
            .iter()
            .filter(|doc| request.filters.iter().all(|clause| clause_matches(doc, clause)))
            .collect();

        let mut facet_counts = Map::new();
        for facet in &request.facet_fields {
            facet_counts.insert(facet.field.clone(), Value::Array(self.facet_counts(facet, request)));
        }

        if !request.sort.is_empty() {
            matched.sort_by(|a, b| compare_docs(a, b, &request.sort));
        }

        let num_found = matched.len();
        let docs: Vec<Value> = matched
            .into_iter()
            .skip(usize::try_from(request.offset).unwrap_or(usize::MAX))
            .take(request.limit)
            .map(|doc| Value::Object(doc.clone()))
            .collect();

        json!({
            "numFound": num_found,
            "docs": docs,
            "facetCounts": facet_counts,
        })
    }

    /// Flat `value, count, value, count` list for one facet.
    fn facet_counts(&self, facet: &FacetRequest, request: &IndexRequest) -> Vec<Value> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for doc in &self.docs {
            let included = request
                .filters
                .iter()
                .filter(|clause| !(facet.exclude_own_filter && clause.field() == facet.field))
                .all(|clause| clause_matches(doc, clause));
            if !included {
                continue;
            }

            let distinct: HashSet<String> = field_terms(doc, &facet.field).collect();
            for term in distinct {
                *counts.entry(term).or_insert(0) += 1;
            }
        }

        let mut counts: Vec<(String, u64)> = counts.into_iter().collect();
        match facet.kind {
            FieldKind::RangeFacet => counts.sort_by(|a, b| compare_terms(&a.0, &b.0)),
            FieldKind::ListFacet | FieldKind::Text => {
                counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            }
        }

        counts
            .into_iter()
            .flat_map(|(value, count)| [Value::String(value), Value::from(count)])
            .collect()
    }
}

/// Answers every ticket synchronously from a shared [`MemoryIndex`].
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    index: Arc<MemoryIndex>,
}

impl MemoryTransport {
    pub fn new(index: MemoryIndex) -> Self {
        MemoryTransport {
            index: Arc::new(index),
        }
    }

    pub fn index(&self) -> &MemoryIndex {
        &self.index
    }
}

impl IndexTransport for MemoryTransport {
    fn submit(&self, ticket: RequestTicket) {
        log::debug!(
            "memory index answering {}: {}",
            ticket.id(),
            ticket.request().description()
        );
        let raw = self.index.execute(ticket.request());
        ticket.resolve(raw);
    }
}

impl IndexService for MemoryIndex {
    fn search(&self, request: IndexRequest) -> impl Future<Output = anyhow::Result<Value>> + Send {
        let raw = self.execute(&request);
        async move { Ok(raw) }
    }
}

fn clause_matches(doc: &Map<String, Value>, clause: &FilterClause) -> bool {
    match clause {
        FilterClause::Text { field, query } => {
            let wanted = tokenize(query);
            if wanted.is_empty() {
                return true;
            }
            let present: HashSet<String> = if field == CATCH_ALL_FIELD {
                doc.values().flat_map(value_terms).flat_map(|t| tokenize(&t)).collect()
            } else {
                field_terms(doc, field).flat_map(|t| tokenize(&t)).collect()
            };
            wanted.iter().all(|token| present.contains(token))
        }
        FilterClause::AnyOf { field, values } => {
            field_terms(doc, field).any(|term| values.iter().any(|v| *v == term))
        }
        FilterClause::Range {
            field,
            lower,
            upper,
        } => field_terms(doc, field)
            .filter_map(|term| term.parse::<f64>().ok())
            .any(|n| lower.contains_lower(&n) && upper.contains_upper(&n)),
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

fn field_terms<'a>(doc: &'a Map<String, Value>, field: &str) -> impl Iterator<Item = String> + use<'a> {
    doc.get(field).into_iter().flat_map(value_terms)
}

fn value_terms(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Array(items) => items.iter().flat_map(value_terms).collect(),
        Value::Null | Value::Object(_) => Vec::new(),
    }
}

/// Numeric terms sort numerically and before every other term, which sort
/// lexically. Equal numbers fall back to their text so the order is total.
fn compare_terms(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn sort_key(doc: &Map<String, Value>, field: &str) -> Option<String> {
    field_terms(doc, field).next()
}

fn compare_docs(a: &Map<String, Value>, b: &Map<String, Value>, sort: &[SortClause]) -> Ordering {
    for clause in sort {
        let ordering = match (sort_key(a, &clause.field), sort_key(b, &clause.field)) {
            (Some(x), Some(y)) => {
                let natural = compare_terms(&x, &y);
                match clause.direction {
                    SortDirection::Asc => natural,
                    SortDirection::Desc => natural.reverse(),
                }
            }
            // documents without the field go last in either direction
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
