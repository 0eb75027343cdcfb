//! The actions a UI can dispatch, and the thin store methods that build them.

use crate::config::ControllerConfig;
use crate::error::Result;
use crate::query::{FieldValue, QueryModel, SortField};
use crate::store::{Generation, SearchStore};

/// An intent that mutates the query model.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the whole model from a validated configuration.
    Init(ControllerConfig),
    /// Change one field's selection.
    SetSearchField { field: String, value: FieldValue },
    /// Replace the sort fields.
    SetSortFields(Vec<SortField>),
    /// Move the cursor: a page index when paginating, an offset otherwise.
    SetPage(u64),
    /// Advance the cursor by one page.
    LoadMore,
}

impl Action {
    /// Build an init action, failing fast on an invalid configuration.
    pub fn init(config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Action::Init(config))
    }

    pub fn set_search_field<S: Into<String>>(field: S, value: FieldValue) -> Self {
        Action::SetSearchField {
            field: field.into(),
            value,
        }
    }

    pub fn set_sort_fields(sort_fields: Vec<SortField>) -> Self {
        Action::SetSortFields(sort_fields)
    }

    pub fn set_page(start: u64) -> Self {
        Action::SetPage(start)
    }

    /// Short name for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Init(_) => "init",
            Action::SetSearchField { .. } => "setSearchField",
            Action::SetSortFields(_) => "setSortFields",
            Action::SetPage(_) => "setPage",
            Action::LoadMore => "loadMore",
        }
    }

    pub fn is_init(&self) -> bool {
        matches!(self, Action::Init(_))
    }

    /// The model that results from applying this action to `model`.
    pub fn apply(&self, model: &QueryModel) -> Result<QueryModel> {
        match self {
            Action::Init(config) => QueryModel::from_config(config),
            Action::SetSearchField { field, value } => {
                model.with_search_field(field, value.clone())
            }
            Action::SetSortFields(sort_fields) => Ok(model.with_sort_fields(sort_fields.clone())),
            Action::SetPage(start) => Ok(model.with_start(*start)),
            Action::LoadMore => Ok(model.with_start(model.next_start())),
        }
    }
}

impl SearchStore {
    /// Initialize the controller and issue the first request.
    ///
    /// An invalid configuration is rejected before anything changes.
    pub fn init(&self, config: ControllerConfig) -> Result<Generation> {
        self.try_dispatch(Action::init(config)?)
    }

    /// Change one field's selection and go back to the first page.
    pub fn set_search_field<S: Into<String>>(
        &self,
        field: S,
        value: FieldValue,
    ) -> Option<Generation> {
        self.dispatch(Action::set_search_field(field, value))
    }

    /// Replace the sort fields and go back to the first page.
    pub fn set_sort_fields(&self, sort_fields: Vec<SortField>) -> Option<Generation> {
        self.dispatch(Action::set_sort_fields(sort_fields))
    }

    /// Jump to a page (paginate) or offset (infinite).
    pub fn set_page(&self, start: u64) -> Option<Generation> {
        self.dispatch(Action::set_page(start))
    }

    /// Load the next page.
    pub fn load_more(&self) -> Option<Generation> {
        self.dispatch(Action::LoadMore)
    }
}
