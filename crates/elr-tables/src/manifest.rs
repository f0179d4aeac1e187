#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

pub const MANIFEST_SCHEMA: &str = "elr.metadata-manifest";
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub manifest: ManifestHeader,
    #[serde(default)]
    pub tables: Vec<TableEntry>,
    #[serde(default)]
    pub schemas: Vec<SchemaEntry>,
    #[serde(default)]
    pub senders: Vec<SenderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestHeader {
    pub schema: String,
    pub schema_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderEntry {
    pub path: String,
    #[serde(default)]
    pub sha256: Option<String>,
}

/// A file listed in the manifest, whatever its section.
#[derive(Debug, Clone, Copy)]
pub struct ListedFile<'a> {
    pub kind: &'static str,
    pub path: &'a str,
    pub sha256: Option<&'a str>,
}

impl Manifest {
    pub fn listed_files(&self) -> Vec<ListedFile<'_>> {
        let tables = self.tables.iter().map(|t| ListedFile {
            kind: "table",
            path: &t.path,
            sha256: t.sha256.as_deref(),
        });
        let schemas = self.schemas.iter().map(|s| ListedFile {
            kind: "schema",
            path: &s.path,
            sha256: s.sha256.as_deref(),
        });
        let senders = self.senders.iter().map(|s| ListedFile {
            kind: "senders",
            path: &s.path,
            sha256: s.sha256.as_deref(),
        });
        tables.chain(schemas).chain(senders).collect()
    }
}
