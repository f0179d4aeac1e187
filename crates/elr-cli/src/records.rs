//! Reading CSV submissions and mapping them row by row.

use std::io::Read;

use anyhow::{Context, Result};
use elr_map::{MappedRecord, MappingEngine};
use elr_model::{ActionLogLevel, Sender};
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::logging::redact_value;

/// Parses a `COLUMN=VALUE` filter argument.
pub fn parse_filter(raw: &str) -> Result<(String, String), String> {
    let Some((column, value)) = raw.split_once('=') else {
        return Err(format!("expected COLUMN=VALUE, got '{raw}'"));
    };
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in '{raw}'"));
    }
    Ok((column.to_string(), value.trim().to_string()))
}

/// One mapped CSV row.
#[derive(Debug, Clone, Serialize)]
pub struct MappedRow {
    /// Zero-based data row index.
    pub index: usize,
    #[serde(flatten)]
    pub record: MappedRecord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapTotals {
    pub rows: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl MapTotals {
    pub fn from_rows(rows: &[MappedRow]) -> Self {
        let count = |level| {
            rows.iter()
                .flat_map(|r| &r.record.logs)
                .filter(|l| l.level == level)
                .count()
        };
        Self {
            rows: rows.len(),
            errors: count(ActionLogLevel::Error),
            warnings: count(ActionLogLevel::Warning),
        }
    }
}

/// Maps every data row of a CSV file whose headers follow the schema's
/// csv fields.
pub fn map_csv(
    engine: &MappingEngine<'_>,
    sender: Option<&Sender>,
    input: impl Read,
) -> Result<Vec<MappedRow>> {
    let schema = engine.schema();
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("read csv headers")?
        .iter()
        .map(str::to_string)
        .collect();
    debug!(schema = schema.name(), columns = headers.len(), "mapping csv");

    let mut rows = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("read csv row {}", index + 1))?;
        let cells: Vec<&str> = row.iter().collect();
        let record = schema.record_from_csv(&headers, &cells);
        for (name, value) in &record {
            trace!(row = index, element = %name, value = redact_value(value), "input value");
        }
        let mapped = engine
            .map_record(&record, sender)
            .with_context(|| format!("map csv row {}", index + 1))?;
        rows.push(MappedRow {
            index,
            record: mapped,
        });
    }

    let totals = MapTotals::from_rows(&rows);
    info!(
        schema = schema.name(),
        rows = totals.rows,
        errors = totals.errors,
        warnings = totals.warnings,
        "mapped csv"
    );
    Ok(rows)
}
