use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span};

use elr_cli::records::{MapTotals, map_csv};
use elr_history::{DetailedSubmissionHistory, SubmissionSnapshot, SubmissionStatus};
use elr_map::livd::canonicalize_model_name;
use elr_map::{LivdQuery, MappingEngine, Schema, default_registry};
use elr_tables::{LoadSummary, MemoryRowStore, MetadataDir, TableStore};

use crate::cli::{BestMatchArgs, HistoryArgs, LivdArgs, LookupArgs, MapArgs, OutputArg};
use crate::summary::{print_history, print_load_summary, print_mapped_rows, print_values};

fn load_metadata(root: &Path) -> Result<(MetadataDir, LoadSummary)> {
    MetadataDir::load(root).with_context(|| format!("load metadata from {}", root.display()))
}

pub fn run_verify(root: &Path) -> Result<()> {
    let (_, summary) = load_metadata(root)?;
    print_load_summary(&summary);
    Ok(())
}

pub fn run_lookup(root: &Path, args: &LookupArgs) -> Result<()> {
    let (metadata, _) = load_metadata(root)?;
    let store = TableStore::new(metadata.tables);
    if let Some(path) = &args.row_store {
        let rows = MemoryRowStore::from_json_path(path)
            .with_context(|| format!("read row store {}", path.display()))?;
        let version = args
            .table_version
            .or_else(|| rows.latest_version(&args.table))
            .with_context(|| format!("row store has no table named {}", args.table))?;
        store
            .reload(&args.table, version, &rows)
            .with_context(|| format!("reload table {}", args.table))?;
    }

    let tables = store.snapshot();
    let table = tables.find(&args.table)?;
    let filters: Vec<(&str, &str)> = args
        .filters
        .iter()
        .map(|(column, value)| (column.as_str(), value.as_str()))
        .collect();
    let ignore_case = !args.case_sensitive;
    let values = if args.prefix {
        table.lookup_prefix_values(&args.column, &filters, &[], ignore_case)
    } else {
        table.lookup_values(&args.column, &filters, ignore_case)
    };
    debug!(table = %args.table, column = %args.column, matches = values.len(), "lookup");
    print_values(&args.column, &values);
    Ok(())
}

pub fn run_best_match(root: &Path, args: &BestMatchArgs) -> Result<()> {
    let (metadata, _) = load_metadata(root)?;
    let table = metadata.tables.find(&args.table)?;
    let filter = args
        .filter
        .as_ref()
        .map(|(column, value)| (column.as_str(), value.as_str()));
    let found = table.lookup_best_match(
        &args.search_column,
        &args.text,
        &args.result_column,
        &canonicalize_model_name,
        &args.common,
        filter,
    );
    print_values(&args.result_column, found.as_slice());
    Ok(())
}

pub fn run_livd(root: &Path, args: &LivdArgs) -> Result<()> {
    let (metadata, _) = load_metadata(root)?;
    let table = metadata.tables.find(&args.table)?;
    let mut query = LivdQuery::new();
    if let Some(value) = &args.device_id {
        query = query.with_device_id(value);
    }
    if let Some(value) = &args.model {
        query = query.with_equipment_model_name(value);
    }
    if let Some(value) = &args.equipment_id {
        query = query.with_equipment_model_id(value);
    }
    if let Some(value) = &args.test_kit_id {
        query = query.with_test_kit_name_id(value);
    }
    if let Some(value) = &args.test_performed {
        query = query.with_test_performed_code(value);
    }
    if let Some(value) = &args.processing_mode {
        query = query.with_processing_mode_code(value);
    }
    let found = query.resolve(table, &args.column);
    print_values(&args.column, found.as_slice());
    Ok(())
}

/// Returns whether any mapped row carries field errors.
pub fn run_map(root: &Path, args: &MapArgs) -> Result<bool> {
    let span = info_span!("map", schema = %args.schema);
    let _guard = span.enter();
    let (metadata, _) = load_metadata(root)?;
    let definition = metadata
        .schema(&args.schema)
        .with_context(|| format!("unknown schema {}", args.schema))?;
    let schema = Schema::from_definition(definition, default_registry())
        .with_context(|| format!("compile schema {}", args.schema))?;
    let sender = match &args.sender {
        Some(name) => Some(
            metadata
                .find_sender(name)
                .with_context(|| format!("unknown sender {name}"))?,
        ),
        None => None,
    };

    let engine = MappingEngine::new(&schema, &metadata.tables);
    let file = File::open(&args.input)
        .with_context(|| format!("open {}", args.input.display()))?;
    let rows = map_csv(&engine, sender, BufReader::new(file))?;
    let totals = MapTotals::from_rows(&rows);

    match args.output {
        OutputArg::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputArg::Table => print_mapped_rows(&schema, &rows, totals),
    }
    Ok(totals.errors > 0)
}

/// Returns whether the submission is in error.
pub fn run_history(args: &HistoryArgs) -> Result<bool> {
    let file = File::open(&args.snapshot)
        .with_context(|| format!("open {}", args.snapshot.display()))?;
    let snapshot = SubmissionSnapshot::from_json(BufReader::new(file))
        .with_context(|| format!("read snapshot {}", args.snapshot.display()))?;
    let history = DetailedSubmissionHistory::from_snapshot(&snapshot)
        .context("derive submission history")?;
    info!(
        submission_id = history.submission_id,
        status = %history.overall_status,
        "submission history"
    );

    match args.output {
        OutputArg::Json => println!("{}", serde_json::to_string_pretty(&history)?),
        OutputArg::Table => print_history(&history),
    }
    Ok(history.overall_status == SubmissionStatus::Error)
}
