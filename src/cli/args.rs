//! Command line argument parsing for the facetstate CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// facetstate - drive a faceted search controller from the command line
#[derive(Parser, Debug, Clone)]
#[command(name = "facetstate")]
#[command(about = "Run faceted search queries against a JSON document file")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct FacetStateArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl FacetStateArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a sequence of search actions and print the final state
    Search(SearchArgs),

    /// Validate a controller configuration file
    Validate(ValidateArgs),
}

/// Arguments for running a search
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Document file (JSON array or JSON Lines)
    #[arg(value_name = "DOCUMENT_FILE")]
    pub document_file: PathBuf,

    /// Controller configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Field holding document identifiers
    #[arg(long, default_value = "id")]
    pub id_field: String,

    /// Free-text query for the catch-all field
    #[arg(short, long)]
    pub text: Option<String>,

    /// Select a list facet value (repeatable)
    #[arg(short, long = "select", value_name = "FIELD=VALUE")]
    pub select: Vec<String>,

    /// Restrict a range facet, either end may be empty (repeatable)
    #[arg(short, long = "range", value_name = "FIELD=MIN..MAX")]
    pub range: Vec<String>,

    /// Sort by a field (repeatable, in priority order)
    #[arg(long = "sort", value_name = "FIELD:asc|desc")]
    pub sort: Vec<String>,

    /// Page index (paginate) or offset (infinite)
    #[arg(short, long)]
    pub page: Option<u64>,

    /// Number of "load more" actions to run after the query
    #[arg(long, default_value = "0")]
    pub load_more: u32,

    /// Override the page size
    #[arg(long)]
    pub rows: Option<usize>,

    /// Use incremental loading instead of pages
    #[arg(long)]
    pub infinite: bool,
}

/// Arguments for validating a configuration
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Controller configuration file (JSON)
    #[arg(value_name = "CONFIG_FILE")]
    pub config: PathBuf,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
