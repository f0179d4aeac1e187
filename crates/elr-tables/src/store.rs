//! Versioned row storage behind database-backed lookup tables.

#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::TableError;

/// One stored row, keyed by column name.
pub type StoredRow = BTreeMap<String, String>;

/// Narrow read contract over whatever persists versioned tables.
pub trait RowStore: Send + Sync {
    /// Every row of `version` of table `name`. Failures must be reported,
    /// never replaced by an empty result.
    fn fetch_table(&self, name: &str, version: i32) -> Result<Vec<StoredRow>, TableError>;
}

/// A row store held in memory, used by tests and by the CLI's JSON fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemoryRowStore {
    tables: BTreeMap<(String, i32), Vec<StoredRow>>,
}

#[derive(Debug, Deserialize)]
struct StoreFile {
    tables: Vec<StoredTable>,
}

#[derive(Debug, Deserialize)]
struct StoredTable {
    name: String,
    version: i32,
    rows: Vec<StoredRow>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, version: i32, rows: Vec<StoredRow>) -> Self {
        self.insert(name, version, rows);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, version: i32, rows: Vec<StoredRow>) {
        self.tables
            .insert((name.into().to_lowercase(), version), rows);
    }

    /// Reads `{"tables": [{"name", "version", "rows": [{..}]}]}`.
    pub fn from_json_path(path: &Path) -> Result<Self, TableError> {
        let contents = std::fs::read_to_string(path).map_err(|e| TableError::io(path, e))?;
        let file: StoreFile = serde_json::from_str(&contents).map_err(|source| TableError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let mut store = Self::new();
        for table in file.tables {
            store.insert(table.name, table.version, table.rows);
        }
        Ok(store)
    }

    /// Highest stored version of `name`.
    pub fn latest_version(&self, name: &str) -> Option<i32> {
        let name = name.to_lowercase();
        self.tables
            .keys()
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| *v)
            .max()
    }
}

impl RowStore for MemoryRowStore {
    fn fetch_table(&self, name: &str, version: i32) -> Result<Vec<StoredRow>, TableError> {
        self.tables
            .get(&(name.to_lowercase(), version))
            .cloned()
            .ok_or_else(|| {
                TableError::row_store(name, version, format!("no version {version} of {name}"))
            })
    }
}
