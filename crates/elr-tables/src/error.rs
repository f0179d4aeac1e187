#![deny(unsafe_code)]

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV for table {table}: {source}")]
    Csv {
        table: String,
        #[source]
        source: csv::Error,
    },

    #[error("table {table}: row {row} has {found} columns, expected {expected}")]
    InconsistentRow {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("table {table} has no column named {column}")]
    MissingColumn { table: String, column: String },

    #[error("table {table}: version must be greater than zero, got {version}")]
    InvalidVersion { table: String, version: i32 },

    #[error("failed to fetch version {version} of table {table}: {source}")]
    RowStore {
        table: String,
        version: i32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("table not found: {name}")]
    TableNotFound { name: String },

    #[error("failed to parse TOML {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid manifest: {message}")]
    InvalidManifest { message: String },

    #[error("duplicate {kind} in manifest: {name}")]
    DuplicateEntry { kind: &'static str, name: String },

    #[error("invalid sha256 for {path}: {message}")]
    InvalidSha256 { path: PathBuf, message: String },

    #[error("invalid manifest path {path}: {message}")]
    InvalidPath { path: PathBuf, message: String },

    #[error("missing file listed in manifest: {path}")]
    MissingFile { path: PathBuf },

    #[error("sha256 mismatch for {path} (expected {expected}, got {actual})")]
    Sha256Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

impl TableError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps a storage failure raised by a [`crate::RowStore`] implementation.
    pub fn row_store(
        table: impl Into<String>,
        version: i32,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::RowStore {
            table: table.into(),
            version,
            source: source.into(),
        }
    }
}
