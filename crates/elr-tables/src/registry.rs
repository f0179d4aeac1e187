//! Table registries handed to the mapping engine.
//!
//! [`TableRegistry`] is an immutable map of shared tables. [`TableStore`]
//! owns the current registry and replaces it wholesale on reload, so readers
//! holding a snapshot never observe a table mid-update.

#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::error::TableError;
use crate::store::RowStore;
use crate::table::LookupTable;

#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    /// Keyed by lowercase table name.
    tables: BTreeMap<String, Arc<LookupTable>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_table(mut self, table: LookupTable) -> Self {
        self.insert(table);
        self
    }

    pub fn insert(&mut self, table: LookupTable) {
        self.tables
            .insert(table.name().to_lowercase(), Arc::new(table));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<LookupTable>> {
        self.tables.get(&name.to_lowercase())
    }

    pub fn find(&self, name: &str) -> Result<&LookupTable, TableError> {
        self.get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| TableError::TableNotFound {
                name: name.to_string(),
            })
    }

    pub fn tables(&self) -> impl Iterator<Item = &LookupTable> {
        self.tables.values().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Holds the live registry and swaps in new snapshots on reload.
#[derive(Debug, Default)]
pub struct TableStore {
    current: RwLock<Arc<TableRegistry>>,
}

impl TableStore {
    pub fn new(registry: TableRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// The registry as of now. Later reloads do not affect it.
    pub fn snapshot(&self) -> Arc<TableRegistry> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Loads `version` of table `name` from `store` and publishes a registry
    /// containing it. A table not yet registered starts out unloaded.
    pub fn reload(
        &self,
        name: &str,
        version: i32,
        store: &dyn RowStore,
    ) -> Result<Arc<LookupTable>, TableError> {
        let base = self
            .snapshot()
            .get(name)
            .map(|t| (**t).clone())
            .unwrap_or_else(|| LookupTable::unloaded(name));
        let loaded = base.load_table(store, version)?;
        info!(
            table = %loaded.name(),
            version,
            rows = loaded.row_count(),
            "reloaded lookup table"
        );
        self.replace(loaded);
        self.snapshot()
            .get(name)
            .cloned()
            .ok_or_else(|| TableError::TableNotFound {
                name: name.to_string(),
            })
    }

    /// Publishes a registry with `table` added or replaced.
    pub fn replace(&self, table: LookupTable) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = TableRegistry::clone(&guard);
        next.insert(table);
        *guard = Arc::new(next);
    }
}
