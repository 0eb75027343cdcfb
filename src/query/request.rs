//! The request value handed to the index transport.

use serde::{Deserialize, Serialize};

use crate::query::filter::FilterClause;
use crate::query::model::{FieldKind, SortDirection};

/// A facet whose value counts the index should report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetRequest {
    pub field: String,
    pub kind: FieldKind,
    /// Count this facet as if the field's own filter clause were absent.
    /// Indexes that cannot do this report counts over the full filter set.
    pub exclude_own_filter: bool,
}

/// One sort key, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    pub field: String,
    pub direction: SortDirection,
}

/// Everything the index needs to answer one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRequest {
    pub index_url: String,
    /// Required clauses (AND).
    pub filters: Vec<FilterClause>,
    pub facet_fields: Vec<FacetRequest>,
    pub sort: Vec<SortClause>,
    pub offset: u64,
    pub limit: usize,
}

impl IndexRequest {
    /// Compact form for log lines.
    pub fn description(&self) -> String {
        let filters = if self.filters.is_empty() {
            "*:*".to_string()
        } else {
            self.filters
                .iter()
                .map(FilterClause::description)
                .collect::<Vec<_>>()
                .join(" AND ")
        };
        format!(
            "{} [{}..+{}] facets={}",
            filters,
            self.offset,
            self.limit,
            self.facet_fields.len()
        )
    }
}
