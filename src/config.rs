//! Controller configuration accepted by `init`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FacetStateError, Result};
use crate::query::{CATCH_ALL_FIELD, FieldSpec, PageStrategy, SortField};

/// Configuration for a search controller.
///
/// Deserializes from camelCase JSON:
///
/// ```
/// use facetstate::config::ControllerConfig;
///
/// let config: ControllerConfig = serde_json::from_str(r#"{
///     "indexUrl": "http://localhost:8983/solr/catalog",
///     "searchFields": [
///         {"type": "text", "field": "*"},
///         {"type": "list-facet", "field": "color"}
///     ],
///     "rows": 10
/// }"#).unwrap();
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfig {
    /// Identifier of the index endpoint, passed through to the transport.
    pub index_url: String,

    /// Declared search fields, in display order.
    pub search_fields: Vec<FieldSpec>,

    /// Declared sort fields, in display order.
    pub sort_fields: Vec<SortField>,

    /// Page size.
    pub rows: usize,

    /// Pagination strategy.
    pub page_strategy: PageStrategy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            index_url: String::new(),
            search_fields: vec![FieldSpec::text(CATCH_ALL_FIELD)],
            sort_fields: Vec::new(),
            rows: 20,
            page_strategy: PageStrategy::Paginate,
        }
    }
}

impl ControllerConfig {
    /// Create a configuration for `index_url` with default fields and paging.
    pub fn new<S: Into<String>>(index_url: S) -> Self {
        ControllerConfig {
            index_url: index_url.into(),
            ..Default::default()
        }
    }

    /// Set the search fields.
    pub fn with_search_fields(mut self, search_fields: Vec<FieldSpec>) -> Self {
        self.search_fields = search_fields;
        self
    }

    /// Set the sort fields.
    pub fn with_sort_fields(mut self, sort_fields: Vec<SortField>) -> Self {
        self.sort_fields = sort_fields;
        self
    }

    /// Set the page size.
    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Set the pagination strategy.
    pub fn with_page_strategy(mut self, page_strategy: PageStrategy) -> Self {
        self.page_strategy = page_strategy;
        self
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ControllerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every constraint; the first violation is returned.
    pub fn validate(&self) -> Result<()> {
        if self.index_url.trim().is_empty() {
            return Err(FacetStateError::configuration("index url must not be empty"));
        }

        if self.search_fields.is_empty() {
            return Err(FacetStateError::configuration(
                "at least one search field is required",
            ));
        }

        if self.rows == 0 {
            return Err(FacetStateError::configuration("rows must be at least 1"));
        }

        let mut seen = HashSet::new();
        for spec in &self.search_fields {
            if spec.field().is_empty() {
                return Err(FacetStateError::configuration(
                    "search field names must not be empty",
                ));
            }
            if !seen.insert(spec.field()) {
                return Err(FacetStateError::configuration(format!(
                    "duplicate search field '{}'",
                    spec.field()
                )));
            }
        }

        Ok(())
    }
}
