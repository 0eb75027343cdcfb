//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cli::args::{FacetStateArgs, OutputFormat};
use crate::error::Result;
use crate::query::PageStrategy;
use crate::response::{Document, FacetValue};
use crate::store::{ErrorInfo, RequestStatus, Snapshot};

/// Result structure for a search run.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    pub generation: u64,
    pub status: RequestStatus,
    pub num_found: u64,
    pub start: u64,
    pub offset: u64,
    pub rows: usize,
    pub docs: Vec<Document>,
    pub facets: BTreeMap<String, Vec<FacetValue>>,
    pub error: Option<ErrorInfo>,
}

impl From<&Snapshot> for SearchReport {
    fn from(snapshot: &Snapshot) -> Self {
        SearchReport {
            generation: snapshot.generation.value(),
            status: snapshot.status,
            num_found: snapshot.results.num_found,
            start: snapshot.query.start,
            offset: snapshot.query.offset(),
            rows: snapshot.query.rows,
            docs: snapshot.results.docs.clone(),
            facets: snapshot.results.facets.clone(),
            error: snapshot.results.error.clone(),
        }
    }
}

/// Result structure for configuration validation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub path: String,
    pub index_url: String,
    pub search_fields: usize,
    pub facet_fields: usize,
    pub sort_fields: usize,
    pub rows: usize,
    pub page_strategy: PageStrategy,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &FacetStateArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &FacetStateArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    match value.get("docs") {
        Some(_) => output_search_report_human(&value),
        None => output_generic_human(&value),
    }
    Ok(())
}

/// Output a search report in human format.
fn output_search_report_human(value: &Value) {
    let num_found = value.get("numFound").and_then(Value::as_u64).unwrap_or(0);
    let offset = value.get("offset").and_then(Value::as_u64).unwrap_or(0);
    let docs = value
        .get("docs")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        println!(
            "Request failed: {}",
            error.get("message").and_then(Value::as_str).unwrap_or("unknown")
        );
        println!();
    }

    println!("Search Results: {num_found} found, showing {}", docs.len());
    println!("═══════════════");

    for (i, doc) in docs.iter().enumerate() {
        println!();
        println!(
            "{}. {}",
            ordinal(offset, i),
            doc.get("id").and_then(Value::as_str).unwrap_or("?")
        );
        if let Some(fields) = doc.get("fields").and_then(Value::as_object) {
            for (name, field_value) in fields {
                println!("   {name}: {}", format_value(field_value));
            }
        }
    }

    if let Some(facets) = value.get("facets").and_then(Value::as_object)
        && !facets.is_empty()
    {
        println!();
        println!("Facets:");
        println!("───────");
        for (field, values) in facets {
            println!("{field}:");
            for entry in values.as_array().map(Vec::as_slice).unwrap_or_default() {
                println!(
                    "   {} ({})",
                    entry.get("value").and_then(Value::as_str).unwrap_or(""),
                    entry.get("count").and_then(Value::as_u64).unwrap_or(0)
                );
            }
        }
    }
}

/// One-based position of the `index`-th shown document.
fn ordinal(offset: u64, index: usize) -> u64 {
    offset.saturating_add(index as u64).saturating_add(1)
}

/// Generic human-readable output.
fn output_generic_human(value: &Value) {
    match value {
        Value::Object(obj) => {
            for (key, val) in obj {
                println!("{key}: {}", format_value(val));
            }
        }
        _ => println!("{}", format_value(value)),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &FacetStateArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => value.to_string(),
    }
}
