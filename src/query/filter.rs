//! Filter clauses sent to the index.
//!
//! A compiled request carries a flat list of clauses that are all required
//! (logical AND). Multi-value list selections become a single [`FilterClause::AnyOf`]
//! whose values are alternatives (logical OR).

use serde::{Deserialize, Serialize};

/// Bound type for range clauses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "bound", content = "value")]
pub enum Bound<T> {
    /// Inclusive bound.
    Included(T),
    /// Exclusive bound.
    Excluded(T),
    /// Unbounded (no limit).
    Unbounded,
}

impl<T> Bound<T> {
    /// Inclusive bound when `value` is set, unbounded otherwise.
    pub fn inclusive(value: Option<T>) -> Self {
        match value {
            Some(value) => Bound::Included(value),
            None => Bound::Unbounded,
        }
    }
}

impl<T: PartialOrd> Bound<T> {
    /// Check if a value satisfies this bound as a lower bound.
    pub fn contains_lower(&self, value: &T) -> bool {
        match self {
            Bound::Included(bound) => value >= bound,
            Bound::Excluded(bound) => value > bound,
            Bound::Unbounded => true,
        }
    }

    /// Check if a value satisfies this bound as an upper bound.
    pub fn contains_upper(&self, value: &T) -> bool {
        match self {
            Bound::Included(bound) => value <= bound,
            Bound::Excluded(bound) => value < bound,
            Bound::Unbounded => true,
        }
    }
}

/// One required condition of an index request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FilterClause {
    /// Text search in one field, or every field for `"*"`.
    Text { field: String, query: String },
    /// The field holds at least one of `values`.
    AnyOf { field: String, values: Vec<String> },
    /// The field's numeric value lies between the bounds.
    Range {
        field: String,
        lower: Bound<f64>,
        upper: Bound<f64>,
    },
}

impl FilterClause {
    /// The field this clause constrains.
    pub fn field(&self) -> &str {
        match self {
            FilterClause::Text { field, .. }
            | FilterClause::AnyOf { field, .. }
            | FilterClause::Range { field, .. } => field,
        }
    }

    /// Human-readable form, used in log output.
    pub fn description(&self) -> String {
        match self {
            FilterClause::Text { field, query } => format!("{field}:\"{query}\""),
            FilterClause::AnyOf { field, values } => {
                let alternatives: Vec<String> = values.iter().map(|v| format!("\"{v}\"")).collect();
                format!("{field}:({})", alternatives.join(" OR "))
            }
            FilterClause::Range {
                field,
                lower,
                upper,
            } => {
                let (open, low) = match lower {
                    Bound::Included(v) => ('[', v.to_string()),
                    Bound::Excluded(v) => ('{', v.to_string()),
                    Bound::Unbounded => ('[', "*".to_string()),
                };
                let (high, close) = match upper {
                    Bound::Included(v) => (v.to_string(), ']'),
                    Bound::Excluded(v) => (v.to_string(), '}'),
                    Bound::Unbounded => ("*".to_string(), ']'),
                };
                format!("{field}:{open}{low} TO {high}{close}")
            }
        }
    }
}
