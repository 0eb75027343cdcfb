//! The query model: the canonical description of what the user asked for.
//!
//! A [`QueryModel`] is never edited in place. Every operation takes `&self`
//! and returns the next model, so the store can swap snapshots wholesale and
//! observers holding an older snapshot keep a consistent view.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::ControllerConfig;
use crate::error::{FacetStateError, Result};

/// Field name of the catch-all text field; its value is the free-text query.
pub const CATCH_ALL_FIELD: &str = "*";

/// The kind of a search field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    /// Free-text input.
    Text,
    /// A facet whose selection is a set of values.
    ListFacet,
    /// A numeric facet whose selection is a `[min, max]` range.
    RangeFacet,
}

impl FieldKind {
    /// Whether the index should report facet counts for this kind.
    pub fn is_facet(self) -> bool {
        match self {
            FieldKind::Text => false,
            FieldKind::ListFacet | FieldKind::RangeFacet => true,
        }
    }

    /// The wire tag of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::ListFacet => "list-facet",
            FieldKind::RangeFacet => "range-facet",
        }
    }
}

/// Selected bounds of a range facet. Either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeSelection {
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl RangeSelection {
    /// Create a range selection.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        RangeSelection { min, max }
    }

    /// A range selection with both ends open.
    pub fn unbounded() -> Self {
        RangeSelection::default()
    }

    /// Whether neither end is set.
    pub fn is_unset(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// A new selection for one search field, as carried by `setSearchField`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum FieldValue {
    /// Text input; `None` clears it.
    Text(Option<String>),
    /// Selected facet values; an empty set clears the filter.
    ListFacet(BTreeSet<String>),
    /// Selected range.
    RangeFacet(RangeSelection),
}

impl FieldValue {
    /// Text selection.
    pub fn text<S: Into<String>>(value: S) -> Self {
        FieldValue::Text(Some(value.into()))
    }

    /// List selection from any iterator of values.
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::ListFacet(values.into_iter().map(Into::into).collect())
    }

    /// Range selection.
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        FieldValue::RangeFacet(RangeSelection::new(min, max))
    }

    /// The kind of field this value can be applied to.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::ListFacet(_) => FieldKind::ListFacet,
            FieldValue::RangeFacet(_) => FieldKind::RangeFacet,
        }
    }
}

/// A declared search field together with its current selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldSpec {
    /// Free-text field. The catch-all field `"*"` searches every field.
    Text {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// Facet with a set of selectable values, OR-ed together.
    ListFacet {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default)]
        value: BTreeSet<String>,
    },
    /// Numeric facet filtered by an inclusive range.
    RangeFacet {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default)]
        value: RangeSelection,
    },
}

impl FieldSpec {
    /// Declare a text field with no input.
    pub fn text<S: Into<String>>(field: S) -> Self {
        FieldSpec::Text {
            field: field.into(),
            label: None,
            value: None,
        }
    }

    /// Declare a list facet with nothing selected.
    pub fn list_facet<S: Into<String>>(field: S) -> Self {
        FieldSpec::ListFacet {
            field: field.into(),
            label: None,
            value: BTreeSet::new(),
        }
    }

    /// Declare a range facet with both ends open.
    pub fn range_facet<S: Into<String>>(field: S) -> Self {
        FieldSpec::RangeFacet {
            field: field.into(),
            label: None,
            value: RangeSelection::unbounded(),
        }
    }

    /// Set the display label.
    pub fn with_label<S: Into<String>>(mut self, new_label: S) -> Self {
        match &mut self {
            FieldSpec::Text { label, .. }
            | FieldSpec::ListFacet { label, .. }
            | FieldSpec::RangeFacet { label, .. } => *label = Some(new_label.into()),
        }
        self
    }

    /// The field identifier.
    pub fn field(&self) -> &str {
        match self {
            FieldSpec::Text { field, .. }
            | FieldSpec::ListFacet { field, .. }
            | FieldSpec::RangeFacet { field, .. } => field,
        }
    }

    /// The display label, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            FieldSpec::Text { label, .. }
            | FieldSpec::ListFacet { label, .. }
            | FieldSpec::RangeFacet { label, .. } => label.as_deref(),
        }
    }

    /// The kind of this field.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldSpec::Text { .. } => FieldKind::Text,
            FieldSpec::ListFacet { .. } => FieldKind::ListFacet,
            FieldSpec::RangeFacet { .. } => FieldKind::RangeFacet,
        }
    }

    /// The current selection as a [`FieldValue`].
    pub fn value(&self) -> FieldValue {
        match self {
            FieldSpec::Text { value, .. } => FieldValue::Text(value.clone()),
            FieldSpec::ListFacet { value, .. } => FieldValue::ListFacet(value.clone()),
            FieldSpec::RangeFacet { value, .. } => FieldValue::RangeFacet(*value),
        }
    }

    /// Whether the selection would produce a filter clause.
    pub fn is_selected(&self) -> bool {
        match self {
            FieldSpec::Text { value, .. } => value.as_deref().is_some_and(|v| !v.trim().is_empty()),
            FieldSpec::ListFacet { value, .. } => !value.is_empty(),
            FieldSpec::RangeFacet { value, .. } => !value.is_unset(),
        }
    }

    /// Return a copy carrying `new_value`, or an error when the value's kind
    /// differs from the field's.
    pub fn with_value(&self, new_value: FieldValue) -> Result<FieldSpec> {
        let mut next = self.clone();
        match (&mut next, new_value) {
            (FieldSpec::Text { value, .. }, FieldValue::Text(v)) => *value = v,
            (FieldSpec::ListFacet { value, .. }, FieldValue::ListFacet(v)) => *value = v,
            (FieldSpec::RangeFacet { value, .. }, FieldValue::RangeFacet(v)) => *value = v,
            (spec, other) => {
                return Err(FacetStateError::invalid_action(format!(
                    "field '{}' is a {} field, got a {} value",
                    spec.field(),
                    spec.kind().as_str(),
                    other.kind().as_str()
                )));
            }
        }
        Ok(next)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A declared sort field. Only fields with a direction are sent to the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, alias = "value", skip_serializing_if = "Option::is_none")]
    pub direction: Option<SortDirection>,
}

impl SortField {
    /// Declare an inactive sort field.
    pub fn new<S: Into<String>>(field: S) -> Self {
        SortField {
            field: field.into(),
            label: None,
            direction: None,
        }
    }

    /// Ascending sort on `field`.
    pub fn asc<S: Into<String>>(field: S) -> Self {
        SortField::new(field).with_direction(SortDirection::Asc)
    }

    /// Descending sort on `field`.
    pub fn desc<S: Into<String>>(field: S) -> Self {
        SortField::new(field).with_direction(SortDirection::Desc)
    }

    pub fn with_direction(mut self, direction: SortDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// How result pages are loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStrategy {
    /// Discrete pages; each page replaces the result set.
    #[default]
    Paginate,
    /// Cumulative loading; each further page is appended.
    Infinite,
}

/// The current search intent.
///
/// `start` is the pagination cursor: a page index under
/// [`PageStrategy::Paginate`], a document offset under
/// [`PageStrategy::Infinite`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryModel {
    pub index_url: String,
    pub search_fields: Vec<FieldSpec>,
    pub sort_fields: Vec<SortField>,
    pub page_strategy: PageStrategy,
    pub rows: usize,
    pub start: u64,
}

impl Default for QueryModel {
    fn default() -> Self {
        QueryModel {
            index_url: String::new(),
            search_fields: Vec::new(),
            sort_fields: Vec::new(),
            page_strategy: PageStrategy::Paginate,
            rows: 20,
            start: 0,
        }
    }
}

impl QueryModel {
    /// Build the initial model from a validated configuration.
    pub fn from_config(config: &ControllerConfig) -> Result<Self> {
        config.validate()?;
        Ok(QueryModel {
            index_url: config.index_url.clone(),
            search_fields: config.search_fields.clone(),
            sort_fields: config.sort_fields.clone(),
            page_strategy: config.page_strategy,
            rows: config.rows,
            start: 0,
        })
    }

    /// Look up a declared search field.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.search_fields.iter().find(|spec| spec.field() == name)
    }

    /// Fields that report facet counts, in declaration order.
    pub fn facet_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.search_fields.iter().filter(|spec| spec.kind().is_facet())
    }

    /// The free-text query, i.e. the value of the catch-all text field.
    pub fn free_text(&self) -> Option<&str> {
        self.search_fields.iter().find_map(|spec| match spec {
            FieldSpec::Text { field, value, .. } if field == CATCH_ALL_FIELD => value.as_deref(),
            _ => None,
        })
    }

    /// Replace the selection of one field and rewind the cursor.
    pub fn with_search_field(&self, field: &str, value: FieldValue) -> Result<Self> {
        let position = self
            .search_fields
            .iter()
            .position(|spec| spec.field() == field)
            .ok_or_else(|| {
                FacetStateError::invalid_action(format!("unknown search field '{field}'"))
            })?;

        let mut next = self.clone();
        next.search_fields[position] = self.search_fields[position].with_value(value)?;
        next.start = 0;
        Ok(next)
    }

    /// Replace the sort fields wholesale and rewind the cursor.
    pub fn with_sort_fields(&self, sort_fields: Vec<SortField>) -> Self {
        QueryModel {
            sort_fields,
            start: 0,
            ..self.clone()
        }
    }

    /// Move the cursor, leaving everything else untouched.
    pub fn with_start(&self, start: u64) -> Self {
        QueryModel {
            start,
            ..self.clone()
        }
    }

    /// The cursor one page further on.
    pub fn next_start(&self) -> u64 {
        match self.page_strategy {
            PageStrategy::Paginate => self.start.saturating_add(1),
            PageStrategy::Infinite => self.start.saturating_add(self.rows as u64),
        }
    }

    /// Document offset of the first requested row.
    pub fn offset(&self) -> u64 {
        match self.page_strategy {
            PageStrategy::Paginate => self.start.saturating_mul(self.rows as u64),
            PageStrategy::Infinite => self.start,
        }
    }

    /// Whether a response to this model extends the current document list
    /// rather than replacing it.
    pub fn appends_results(&self) -> bool {
        self.page_strategy == PageStrategy::Infinite && self.start > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> QueryModel {
        let config = ControllerConfig::new("memory://catalog")
            .with_search_fields(vec![
                FieldSpec::text(CATCH_ALL_FIELD),
                FieldSpec::list_facet("color"),
                FieldSpec::range_facet("price"),
            ])
            .with_rows(10);
        QueryModel::from_config(&config).unwrap()
    }

    #[test]
    fn test_set_search_field_resets_cursor() {
        let model = model().with_start(3);
        let next = model
            .with_search_field("color", FieldValue::list(["red"]))
            .unwrap();

        assert_eq!(next.start, 0);
        assert!(next.field("color").unwrap().is_selected());
        assert_eq!(next.search_fields[2], model.search_fields[2]);
        // the source model is untouched
        assert_eq!(model.start, 3);
        assert!(!model.field("color").unwrap().is_selected());
    }

    #[test]
    fn test_set_search_field_is_idempotent() {
        let once = model()
            .with_search_field("price", FieldValue::range(Some(1.0), None))
            .unwrap();
        let twice = once
            .with_search_field("price", FieldValue::range(Some(1.0), None))
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_set_search_field_rejects_unknown_or_mismatched() {
        let model = model();
        let err = model
            .with_search_field("size", FieldValue::list(["xl"]))
            .unwrap_err();
        assert!(matches!(err, FacetStateError::InvalidAction(_)));

        let err = model
            .with_search_field("color", FieldValue::range(None, Some(2.0)))
            .unwrap_err();
        assert!(err.to_string().contains("list-facet"));
    }

    #[test]
    fn test_sort_resets_and_page_preserves() {
        let model = model()
            .with_search_field("color", FieldValue::list(["red"]))
            .unwrap()
            .with_start(4);
        let sorted = model.with_sort_fields(vec![SortField::desc("price")]);
        assert_eq!(sorted.start, 0);
        assert_eq!(sorted.search_fields, model.search_fields);

        let paged = sorted.with_start(2);
        assert_eq!(paged.start, 2);
        assert_eq!(paged.search_fields, sorted.search_fields);
        assert_eq!(paged.sort_fields, sorted.sort_fields);
    }

    #[test]
    fn test_cursor_per_strategy() {
        let paginated = model().with_start(2);
        assert_eq!(paginated.offset(), 20);
        assert_eq!(paginated.next_start(), 3);
        assert!(!paginated.appends_results());

        let mut infinite = model();
        infinite.page_strategy = PageStrategy::Infinite;
        assert_eq!(infinite.next_start(), 10);
        let more = infinite.with_start(infinite.next_start());
        assert_eq!(more.offset(), 10);
        assert!(more.appends_results());
    }

    #[test]
    fn test_free_text() {
        let model = model();
        assert_eq!(model.free_text(), None);
        let model = model
            .with_search_field(CATCH_ALL_FIELD, FieldValue::text("rust"))
            .unwrap();
        assert_eq!(model.free_text(), Some("rust"));
    }

    #[test]
    fn test_field_spec_serde_tags() {
        let json = r#"[
            {"type": "text", "field": "*"},
            {"type": "list-facet", "field": "color", "label": "Color", "value": ["red"]},
            {"type": "range-facet", "field": "price", "value": {"min": 5}}
        ]"#;
        let specs: Vec<FieldSpec> = serde_json::from_str(json).unwrap();
        assert_eq!(specs[0].kind(), FieldKind::Text);
        assert_eq!(specs[1].label(), Some("Color"));
        assert!(specs[1].is_selected());
        assert_eq!(
            specs[2].value(),
            FieldValue::RangeFacet(RangeSelection::new(Some(5.0), None))
        );
    }
}
