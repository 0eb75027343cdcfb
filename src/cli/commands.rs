//! Command implementations for the facetstate CLI.

use std::collections::{BTreeMap, BTreeSet};

use crate::action::Action;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::ControllerConfig;
use crate::error::{FacetStateError, Result};
use crate::index::{MemoryIndex, MemoryTransport};
use crate::query::{
    CATCH_ALL_FIELD, FieldSpec, FieldValue, PageStrategy, RangeSelection, SortDirection,
    SortField,
};
use crate::store::SearchStore;

/// Execute a CLI command.
pub fn execute_command(args: FacetStateArgs) -> Result<()> {
    match &args.command {
        Command::Search(search_args) => run_search(search_args.clone(), &args),
        Command::Validate(validate_args) => validate_config(validate_args.clone(), &args),
    }
}

/// Load documents, replay the requested actions and print the final state.
fn run_search(args: SearchArgs, cli_args: &FacetStateArgs) -> Result<()> {
    let selections = parse_selections(&args.select)?;
    let ranges = args
        .range
        .iter()
        .map(|spec| parse_range(spec.as_str()))
        .collect::<Result<Vec<_>>>()?;
    let sort_fields = args
        .sort
        .iter()
        .map(|spec| parse_sort(spec.as_str()))
        .collect::<Result<Vec<_>>>()?;

    let mut config = match &args.config {
        Some(path) => {
            if cli_args.verbosity() > 1 {
                println!("Loading configuration from: {}", path.display());
            }
            ControllerConfig::from_path(path)?
        }
        None => ControllerConfig::new(format!("file://{}", args.document_file.display())),
    };
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if args.infinite {
        config.page_strategy = PageStrategy::Infinite;
    }
    declare_missing_facets(&mut config, &selections, &ranges);

    let index = MemoryIndex::from_path(&args.document_file)?;
    log::info!(
        "loaded {} documents from {}",
        index.len(),
        args.document_file.display()
    );

    let store = SearchStore::builder(MemoryTransport::new(index))
        .id_field(args.id_field.clone())
        .build();
    store.init(config)?;

    if let Some(text) = &args.text {
        store.try_dispatch(Action::set_search_field(
            CATCH_ALL_FIELD,
            FieldValue::text(text.clone()),
        ))?;
    }
    for (field, values) in selections {
        store.try_dispatch(Action::set_search_field(field, FieldValue::ListFacet(values)))?;
    }
    for (field, range) in ranges {
        store.try_dispatch(Action::set_search_field(field, FieldValue::RangeFacet(range)))?;
    }
    if !sort_fields.is_empty() {
        store.try_dispatch(Action::set_sort_fields(sort_fields))?;
    }
    if let Some(page) = args.page {
        store.try_dispatch(Action::set_page(page))?;
    }
    for _ in 0..args.load_more {
        store.try_dispatch(Action::LoadMore)?;
    }

    let snapshot = store.snapshot();
    store.teardown();

    let report = SearchReport::from(snapshot.as_ref());
    output_result(
        &format!("Searched {}", args.document_file.display()),
        &report,
        cli_args,
    )
}

/// Check a configuration file and summarize it.
fn validate_config(args: ValidateArgs, cli_args: &FacetStateArgs) -> Result<()> {
    let config = ControllerConfig::from_path(&args.config)?;

    let report = ValidationReport {
        path: args.config.display().to_string(),
        index_url: config.index_url.clone(),
        search_fields: config.search_fields.len(),
        facet_fields: config
            .search_fields
            .iter()
            .filter(|spec| spec.kind().is_facet())
            .count(),
        sort_fields: config.sort_fields.len(),
        rows: config.rows,
        page_strategy: config.page_strategy,
    };

    output_result("Configuration is valid", &report, cli_args)
}

/// Add list or range facets named on the command line but not configured.
fn declare_missing_facets(
    config: &mut ControllerConfig,
    selections: &BTreeMap<String, BTreeSet<String>>,
    ranges: &[(String, RangeSelection)],
) {
    let declared = |config: &ControllerConfig, field: &str| {
        config.search_fields.iter().any(|spec| spec.field() == field)
    };

    for field in selections.keys() {
        if !declared(config, field) {
            config.search_fields.push(FieldSpec::list_facet(field.as_str()));
        }
    }
    for (field, _) in ranges {
        if !declared(config, field) {
            config.search_fields.push(FieldSpec::range_facet(field.as_str()));
        }
    }
}

/// Group `FIELD=VALUE` selections by field.
fn parse_selections(specs: &[String]) -> Result<BTreeMap<String, BTreeSet<String>>> {
    let mut selections: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for spec in specs {
        let (field, value) = split_pair(spec, '=')?;
        selections
            .entry(field.to_string())
            .or_default()
            .insert(value.to_string());
    }
    Ok(selections)
}

/// Parse `FIELD=MIN..MAX`; either end may be empty.
fn parse_range(spec: &str) -> Result<(String, RangeSelection)> {
    let (field, bounds) = split_pair(spec, '=')?;
    let (min, max) = bounds.split_once("..").ok_or_else(|| {
        FacetStateError::invalid_action(format!("range '{spec}' must look like FIELD=MIN..MAX"))
    })?;

    let parse_bound = |bound: &str| -> Result<Option<f64>> {
        let bound = bound.trim();
        if bound.is_empty() {
            return Ok(None);
        }
        bound.parse::<f64>().map(Some).map_err(|e| {
            FacetStateError::invalid_action(format!("invalid range bound '{bound}': {e}"))
        })
    };

    Ok((
        field.to_string(),
        RangeSelection::new(parse_bound(min)?, parse_bound(max)?),
    ))
}

/// Parse `FIELD` or `FIELD:asc|desc`.
fn parse_sort(spec: &str) -> Result<SortField> {
    let (field, direction) = match spec.split_once(':') {
        Some((field, direction)) => (field, direction),
        None => (spec, "asc"),
    };
    if field.trim().is_empty() {
        return Err(FacetStateError::invalid_action(format!(
            "sort '{spec}' has no field"
        )));
    }

    let direction = match direction.trim().to_lowercase().as_str() {
        "asc" => SortDirection::Asc,
        "desc" => SortDirection::Desc,
        other => {
            return Err(FacetStateError::invalid_action(format!(
                "unknown sort direction '{other}'"
            )));
        }
    };

    Ok(SortField::new(field.trim()).with_direction(direction))
}

fn split_pair(spec: &str, separator: char) -> Result<(&str, &str)> {
    match spec.split_once(separator) {
        Some((field, value)) if !field.trim().is_empty() => Ok((field.trim(), value)),
        _ => Err(FacetStateError::invalid_action(format!(
            "'{spec}' must look like FIELD{separator}VALUE"
        ))),
    }
}
