//! Query model and query compilation.

pub mod compiler;
pub mod filter;
pub mod model;
pub mod request;

pub use self::compiler::compile;
pub use self::filter::{Bound, FilterClause};
pub use self::model::{
    CATCH_ALL_FIELD, FieldKind, FieldSpec, FieldValue, PageStrategy, QueryModel, RangeSelection,
    SortDirection, SortField,
};
pub use self::request::{FacetRequest, IndexRequest, SortClause};
