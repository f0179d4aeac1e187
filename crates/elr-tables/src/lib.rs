#![deny(unsafe_code)]

pub mod best_match;
pub mod error;
pub mod filter;
pub mod hash;
pub mod manifest;
pub mod metadata;
pub mod registry;
pub mod store;
pub mod table;

pub use crate::error::TableError;
pub use crate::filter::FilterBuilder;
pub use crate::metadata::{LoadSummary, MetadataDir, SchemaDefinition, default_metadata_root};
pub use crate::registry::{TableRegistry, TableStore};
pub use crate::store::{MemoryRowStore, RowStore, StoredRow};
pub use crate::table::{LOCAL_VERSION, LookupTable, UNLOADED_VERSION};
