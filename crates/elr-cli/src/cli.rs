//! CLI argument definitions for `elr`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use elr_cli::records::parse_filter;

#[derive(Parser)]
#[command(
    name = "elr",
    version,
    about = "Electronic lab report mapping and submission history tools",
    long_about = "Resolve lab report fields through lookup tables and mappers, \
                  identify test devices from the LIVD table, and derive the \
                  delivery status of a submission from its pipeline records."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags and RUST_LOG).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow record values (PHI) in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// Metadata directory holding manifest.toml (default: $ELR_METADATA_DIR or ./metadata).
    #[arg(long = "metadata", value_name = "DIR", global = true)]
    pub metadata: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Verify the metadata manifest and list what it loads.
    Verify,

    /// Look up values in a table.
    Lookup(LookupArgs),

    /// Find the row whose words best match a free-text value.
    BestMatch(BestMatchArgs),

    /// Resolve a test device through the LIVD table.
    Livd(LivdArgs),

    /// Map every row of a CSV file through a schema.
    Map(MapArgs),

    /// Derive the history of a submission from a JSON snapshot.
    History(HistoryArgs),
}

#[derive(Args)]
pub struct LookupArgs {
    pub table: String,

    /// Column to return.
    pub column: String,

    /// Row filter as COLUMN=VALUE; repeatable.
    #[arg(long = "filter", value_name = "COLUMN=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,

    /// Treat filter values as prefixes.
    #[arg(long)]
    pub prefix: bool,

    #[arg(long = "case-sensitive")]
    pub case_sensitive: bool,

    /// Reload the table from a JSON row store before the lookup.
    #[arg(long = "row-store", value_name = "PATH")]
    pub row_store: Option<PathBuf>,

    /// Row store version to load (default: latest).
    #[arg(long = "table-version", requires = "row_store")]
    pub table_version: Option<i32>,
}

#[derive(Args)]
pub struct BestMatchArgs {
    pub table: String,
    pub search_column: String,
    pub text: String,
    pub result_column: String,

    /// Low-weight word; repeatable.
    #[arg(long = "common", value_name = "WORD")]
    pub common: Vec<String>,

    /// Only consider rows where COLUMN=VALUE.
    #[arg(long = "filter", value_name = "COLUMN=VALUE", value_parser = parse_filter)]
    pub filter: Option<(String, String)>,
}

#[derive(Args)]
pub struct LivdArgs {
    #[arg(long = "device-id")]
    pub device_id: Option<String>,

    #[arg(long = "model")]
    pub model: Option<String>,

    #[arg(long = "equipment-id")]
    pub equipment_id: Option<String>,

    #[arg(long = "test-kit-id")]
    pub test_kit_id: Option<String>,

    #[arg(long = "test-performed")]
    pub test_performed: Option<String>,

    #[arg(long = "processing-mode")]
    pub processing_mode: Option<String>,

    /// LIVD column to return.
    #[arg(long = "column", default_value = "Test Performed LOINC Code")]
    pub column: String,

    /// Name of the LIVD table.
    #[arg(long = "table", default_value = "LIVD-SARS-CoV-2")]
    pub table: String,
}

#[derive(Args)]
pub struct MapArgs {
    pub schema: String,

    /// CSV file whose headers match the schema's csv fields.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Sender full name (org.client) from the metadata senders.
    #[arg(long = "sender")]
    pub sender: Option<String>,

    #[arg(long = "output", value_enum, default_value = "table")]
    pub output: OutputArg,
}

#[derive(Args)]
pub struct HistoryArgs {
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    #[arg(long = "output", value_enum, default_value = "table")]
    pub output: OutputArg,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    Json,
    Table,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
