//! Metadata directory loading and verification.
//!
//! A metadata directory holds a `manifest.toml` listing lookup tables (CSV),
//! schemas (TOML element lists) and sender settings (TOML). Loading verifies
//! every listed path and, when given, its sha256 before parsing anything.

#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use elr_model::{Element, Sender};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TableError;
use crate::hash::sha256_hex;
use crate::manifest::{ListedFile, MANIFEST_SCHEMA, MANIFEST_SCHEMA_VERSION, Manifest};
use crate::registry::TableRegistry;
use crate::table::LookupTable;

/// Environment variable for overriding the metadata directory.
pub const METADATA_ENV_VAR: &str = "ELR_METADATA_DIR";

/// Resolution order: `ELR_METADATA_DIR`, then `./metadata`.
pub fn default_metadata_root() -> PathBuf {
    if let Ok(root) = std::env::var(METADATA_ENV_VAR) {
        return PathBuf::from(root);
    }
    PathBuf::from("metadata")
}

/// A schema as written on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaDefinition {
    pub name: String,
    pub topic: Option<String>,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SenderFile {
    #[serde(default)]
    senders: Vec<Sender>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub columns: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
    pub metadata_dir: PathBuf,
    pub file_count: usize,
    pub verified_digests: usize,
    pub tables: Vec<TableSummary>,
    pub schemas: Vec<String>,
    pub senders: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MetadataDir {
    pub root: PathBuf,
    pub manifest: Manifest,
    pub tables: TableRegistry,
    /// Keyed by lowercase schema name.
    pub schemas: BTreeMap<String, SchemaDefinition>,
    /// Keyed by `org.client`.
    pub senders: BTreeMap<String, Sender>,
}

impl MetadataDir {
    pub fn load(root: &Path) -> Result<(Self, LoadSummary), TableError> {
        let manifest = load_manifest(&root.join("manifest.toml"))?;
        validate_manifest(&manifest)?;

        let mut verified_digests = 0;
        for file in manifest.listed_files() {
            if verify_file(root, &file)? {
                verified_digests += 1;
            }
        }

        let mut tables = TableRegistry::new();
        for entry in &manifest.tables {
            let file = std::fs::File::open(root.join(&entry.path))
                .map_err(|e| TableError::io(root.join(&entry.path), e))?;
            let table = LookupTable::read(entry.name.clone(), file)?;
            debug!(table = %entry.name, rows = table.row_count(), "loaded metadata table");
            tables.insert(table);
        }

        let mut schemas = BTreeMap::new();
        for entry in &manifest.schemas {
            let path = root.join(&entry.path);
            let mut schema: SchemaDefinition = read_toml(&path)?;
            if schema.name.is_empty() {
                schema.name = entry.name.clone();
            }
            schemas.insert(entry.name.to_lowercase(), schema);
        }

        let mut senders = BTreeMap::new();
        for entry in &manifest.senders {
            let file: SenderFile = read_toml(&root.join(&entry.path))?;
            for sender in file.senders {
                let full_name = sender.full_name();
                if senders.insert(full_name.clone(), sender).is_some() {
                    return Err(TableError::DuplicateEntry {
                        kind: "sender",
                        name: full_name,
                    });
                }
            }
        }

        let summary = LoadSummary {
            metadata_dir: root.to_path_buf(),
            file_count: manifest.listed_files().len(),
            verified_digests,
            tables: tables
                .tables()
                .map(|t| TableSummary {
                    name: t.name().to_string(),
                    columns: t.columns().len(),
                    rows: t.row_count(),
                })
                .collect(),
            schemas: schemas.values().map(|s| s.name.clone()).collect(),
            senders: senders.keys().cloned().collect(),
        };
        info!(
            tables = summary.tables.len(),
            schemas = summary.schemas.len(),
            senders = summary.senders.len(),
            "metadata loaded"
        );

        Ok((
            Self {
                root: root.to_path_buf(),
                manifest,
                tables,
                schemas,
                senders,
            },
            summary,
        ))
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaDefinition> {
        self.schemas.get(&name.to_lowercase())
    }

    pub fn find_sender(&self, full_name: &str) -> Option<&Sender> {
        self.senders.get(full_name)
    }
}

fn load_manifest(path: &Path) -> Result<Manifest, TableError> {
    read_toml(path)
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, TableError> {
    let contents = std::fs::read_to_string(path).map_err(|e| TableError::io(path, e))?;
    toml::from_str(&contents).map_err(|e| TableError::Toml {
        path: path.to_path_buf(),
        source: e,
    })
}

fn validate_manifest(manifest: &Manifest) -> Result<(), TableError> {
    if manifest.manifest.schema != MANIFEST_SCHEMA {
        return Err(TableError::InvalidManifest {
            message: format!("unsupported schema: {}", manifest.manifest.schema),
        });
    }
    if manifest.manifest.schema_version != MANIFEST_SCHEMA_VERSION {
        return Err(TableError::InvalidManifest {
            message: format!(
                "unsupported schema_version: {}",
                manifest.manifest.schema_version
            ),
        });
    }

    let mut table_names = BTreeSet::new();
    for table in &manifest.tables {
        if !table_names.insert(table.name.to_lowercase()) {
            return Err(TableError::DuplicateEntry {
                kind: "table",
                name: table.name.clone(),
            });
        }
    }
    let mut schema_names = BTreeSet::new();
    for schema in &manifest.schemas {
        if !schema_names.insert(schema.name.to_lowercase()) {
            return Err(TableError::DuplicateEntry {
                kind: "schema",
                name: schema.name.clone(),
            });
        }
    }

    let mut paths = BTreeSet::new();
    for file in manifest.listed_files() {
        if let Some(sha) = file.sha256 {
            validate_sha(sha, file.path)?;
        }
        let path = normalize_path(&validate_path(file.path)?);
        if !paths.insert(path) {
            return Err(TableError::DuplicateEntry {
                kind: file.kind,
                name: file.path.to_string(),
            });
        }
    }
    Ok(())
}

/// Returns whether a digest was checked.
fn verify_file(root: &Path, file: &ListedFile<'_>) -> Result<bool, TableError> {
    let full_path = root.join(file.path);
    let bytes = std::fs::read(&full_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TableError::MissingFile {
                path: full_path.clone(),
            }
        } else {
            TableError::io(full_path.clone(), e)
        }
    })?;

    let Some(expected) = file.sha256 else {
        return Ok(false);
    };
    let actual = sha256_hex(&bytes);
    let expected = expected.to_ascii_lowercase();
    if actual != expected {
        return Err(TableError::Sha256Mismatch {
            path: full_path,
            expected,
            actual,
        });
    }
    Ok(true)
}

fn validate_sha(sha: &str, path: &str) -> Result<(), TableError> {
    if sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TableError::InvalidSha256 {
            path: PathBuf::from(path),
            message: "sha256 must be 64 hex characters".to_string(),
        });
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<PathBuf, TableError> {
    if path.contains('\\') {
        return Err(TableError::InvalidPath {
            path: PathBuf::from(path),
            message: "manifest path must use '/' separators".to_string(),
        });
    }

    let p = PathBuf::from(path);
    if p.is_absolute() {
        return Err(TableError::InvalidPath {
            path: p,
            message: "manifest path must be relative".to_string(),
        });
    }

    if p.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(TableError::InvalidPath {
            path: p,
            message: "manifest path must not traverse out of the metadata directory"
                .to_string(),
        });
    }

    Ok(p)
}

fn normalize_path(p: &Path) -> PathBuf {
    p.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .map(|c| c.as_os_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal_and_backslashes() {
        assert!(validate_path("tables/livd.csv").is_ok());
        assert!(matches!(
            validate_path("../secrets.csv"),
            Err(TableError::InvalidPath { .. })
        ));
        assert!(matches!(
            validate_path("tables\\livd.csv"),
            Err(TableError::InvalidPath { .. })
        ));
        assert!(matches!(
            validate_path("/etc/passwd"),
            Err(TableError::InvalidPath { .. })
        ));
    }

    #[test]
    fn sha_must_be_64_hex() {
        assert!(validate_sha(&"a".repeat(64), "x").is_ok());
        assert!(validate_sha("abc", "x").is_err());
        assert!(validate_sha(&"g".repeat(64), "x").is_err());
    }

    #[test]
    fn normalize_drops_cur_dir() {
        assert_eq!(
            normalize_path(Path::new("./tables/./a.csv")),
            PathBuf::from("tables/a.csv")
        );
    }
}
