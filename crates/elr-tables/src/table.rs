//! In-memory lookup tables.
//!
//! A [`LookupTable`] is an immutable, row-ordered grid of strings with named
//! columns. Column names are matched case-sensitively; value comparisons are
//! case-sensitive or not depending on the caller. Every single-value lookup
//! follows the same ambiguity rule: when the matching rows carry more than
//! one distinct value in the requested column the answer is `None`.

#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::TableError;
use crate::filter::FilterBuilder;
use crate::store::RowStore;

/// Version of a table that has not been loaded from a row store.
pub const UNLOADED_VERSION: i32 = -1;

/// Version given to tables read from CSV or built in memory.
pub const LOCAL_VERSION: i32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable {
    name: String,
    version: i32,
    is_source_database: bool,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl LookupTable {
    /// Builds a table from a header and data rows; every row must have one
    /// cell per column.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self, TableError> {
        let name = name.into();
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::InconsistentRow {
                    table: name,
                    row: idx + 1,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self {
            name,
            version: LOCAL_VERSION,
            is_source_database: false,
            columns,
            rows,
        })
    }

    /// A placeholder for a database-backed table that has not been loaded yet.
    pub fn unloaded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: UNLOADED_VERSION,
            is_source_database: true,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Builds a table from a 2D list whose first row is the header.
    pub fn from_rows<R, S>(name: impl Into<String>, table: R) -> Result<Self, TableError>
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rows = table
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect::<Vec<String>>());
        let columns = rows.next().unwrap_or_default();
        Self::new(name, columns, rows.collect())
    }

    /// Parses CSV text with a header line.
    pub fn read(name: impl Into<String>, reader: impl Read) -> Result<Self, TableError> {
        let name = name.into();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .map_err(|source| TableError::Csv {
                table: name.clone(),
                source,
            })?
            .iter()
            .map(|h| h.trim_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| TableError::Csv {
                table: name.clone(),
                source,
            })?;
            rows.push(record.iter().map(|v| v.trim().to_string()).collect());
        }
        debug!(table = %name, rows = rows.len(), "read lookup table");
        Self::new(name, columns, rows)
    }

    /// Reads a CSV file; the table is named after the file stem.
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = std::fs::File::open(path).map_err(|e| TableError::io(path, e))?;
        Self::read(name, file)
    }

    /// Loads `version` of this table from a row store, returning a new
    /// snapshot. Headers come from the first row; cells missing from later
    /// rows become empty strings.
    pub fn load_table(&self, store: &dyn RowStore, version: i32) -> Result<Self, TableError> {
        if version <= 0 {
            return Err(TableError::InvalidVersion {
                table: self.name.clone(),
                version,
            });
        }
        let fetched = store.fetch_table(&self.name, version)?;
        let columns: Vec<String> = fetched
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        let rows = fetched
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        debug!(table = %self.name, version, rows = fetched.len(), "loaded lookup table");
        Ok(Self {
            name: self.name.clone(),
            version,
            is_source_database: true,
            columns,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn is_source_database(&self) -> bool {
        self.is_source_database
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Rows keyed by column name.
    pub fn rows_as_maps(&self) -> Vec<BTreeMap<String, String>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    pub fn filter_builder(&self) -> FilterBuilder<'_> {
        FilterBuilder::new(self)
    }

    /// The single value of `column` across rows matching every filter.
    pub fn lookup_value(
        &self,
        column: &str,
        filters: &[(&str, &str)],
        ignore_case: bool,
    ) -> Option<String> {
        single(self.lookup_values(column, filters, ignore_case))
    }

    /// Distinct values of `column` across rows matching every filter, in
    /// first-seen order.
    pub fn lookup_values(
        &self,
        column: &str,
        filters: &[(&str, &str)],
        ignore_case: bool,
    ) -> Vec<String> {
        filters
            .iter()
            .fold(self.filter_builder(), |builder, (col, value)| {
                if ignore_case {
                    builder.equals_ignore_case(col, value)
                } else {
                    builder.equals(col, value)
                }
            })
            .find_all_unique(column)
    }

    /// Single-value variant of [`Self::lookup_prefix_values`].
    pub fn lookup_prefix_value(
        &self,
        column: &str,
        prefix_filters: &[(&str, &str)],
        exact_filters: &[(&str, &str)],
        ignore_case: bool,
    ) -> Option<String> {
        single(self.lookup_prefix_values(column, prefix_filters, exact_filters, ignore_case))
    }

    /// Distinct values of `column` across rows where each prefix filter value
    /// starts the row's cell and each exact filter matches. At least one
    /// filter is required; with none the result is empty.
    pub fn lookup_prefix_values(
        &self,
        column: &str,
        prefix_filters: &[(&str, &str)],
        exact_filters: &[(&str, &str)],
        ignore_case: bool,
    ) -> Vec<String> {
        if prefix_filters.is_empty() && exact_filters.is_empty() {
            return Vec::new();
        }
        let builder = prefix_filters
            .iter()
            .fold(self.filter_builder(), |builder, (col, value)| {
                if ignore_case {
                    builder.starts_with_ignore_case(col, value)
                } else {
                    builder.starts_with(col, value)
                }
            });
        exact_filters
            .iter()
            .fold(builder, |builder, (col, value)| {
                if ignore_case {
                    builder.equals_ignore_case(col, value)
                } else {
                    builder.equals(col, value)
                }
            })
            .find_all_unique(column)
    }

    /// Distinct values in `column`, in first-seen order.
    pub fn distinct_values(&self, column: &str) -> Vec<String> {
        self.filter_builder().find_all_unique(column)
    }

    /// A new table holding only the rows whose cells equal every filter value.
    pub fn filter(&self, filters: &[(&str, &str)], ignore_case: bool) -> Result<Self, TableError> {
        if let Some((column, _)) = filters.iter().find(|(c, _)| !self.has_column(c)) {
            return Err(TableError::MissingColumn {
                table: self.name.clone(),
                column: (*column).to_string(),
            });
        }
        let builder = filters
            .iter()
            .fold(self.filter_builder(), |builder, (col, value)| {
                if ignore_case {
                    builder.equals_ignore_case(col, value)
                } else {
                    builder.equals(col, value)
                }
            });
        Ok(builder.filter())
    }

    pub(crate) fn with_rows(&self, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: self.name.clone(),
            version: self.version,
            is_source_database: self.is_source_database,
            columns: self.columns.clone(),
            rows,
        }
    }
}

/// Collapses a distinct-value list to its only member.
pub(crate) fn single(mut values: Vec<String>) -> Option<String> {
    if values.len() == 1 { values.pop() } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_requires_exactly_one() {
        assert_eq!(single(vec![]), None);
        assert_eq!(single(vec!["a".to_string()]), Some("a".to_string()));
        assert_eq!(single(vec!["a".to_string(), "b".to_string()]), None);
    }

    #[test]
    fn bom_is_stripped_from_headers() {
        let csv = "\u{feff}a,b\n1,2\n";
        let table = LookupTable::read("bom", csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), ["a".to_string(), "b".to_string()]);
    }
}
