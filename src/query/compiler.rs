//! Compiles a [`QueryModel`] into an [`IndexRequest`].

use crate::query::filter::{Bound, FilterClause};
use crate::query::model::{FieldSpec, QueryModel};
use crate::query::request::{FacetRequest, IndexRequest, SortClause};

/// Derive the index request for `model`.
///
/// Unset selections produce no clause. Every facet field is requested,
/// selected or not, so renderers can keep showing unselected options.
pub fn compile(model: &QueryModel) -> IndexRequest {
    let filters = model.search_fields.iter().filter_map(filter_clause).collect();

    let facet_fields = model
        .facet_fields()
        .map(|spec| FacetRequest {
            field: spec.field().to_string(),
            kind: spec.kind(),
            exclude_own_filter: true,
        })
        .collect();

    let sort = model
        .sort_fields
        .iter()
        .filter_map(|sort_field| {
            sort_field.direction.map(|direction| SortClause {
                field: sort_field.field.clone(),
                direction,
            })
        })
        .collect();

    IndexRequest {
        index_url: model.index_url.clone(),
        filters,
        facet_fields,
        sort,
        offset: model.offset(),
        limit: model.rows,
    }
}

fn filter_clause(spec: &FieldSpec) -> Option<FilterClause> {
    if !spec.is_selected() {
        return None;
    }

    match spec {
        FieldSpec::Text { field, value, .. } => value.as_ref().map(|query| FilterClause::Text {
            field: field.clone(),
            query: query.trim().to_string(),
        }),
        FieldSpec::ListFacet { field, value, .. } => Some(FilterClause::AnyOf {
            field: field.clone(),
            values: value.iter().cloned().collect(),
        }),
        FieldSpec::RangeFacet { field, value, .. } => Some(FilterClause::Range {
            field: field.clone(),
            lower: Bound::inclusive(value.min),
            upper: Bound::inclusive(value.max),
        }),
    }
}
