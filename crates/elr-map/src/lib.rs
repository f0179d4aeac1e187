#![deny(unsafe_code)]

pub mod datetime;
pub mod engine;
pub mod error;
pub mod field;
pub mod livd;
pub mod mapper;
pub mod mappers;
pub mod npi;
pub mod registry;
pub mod schema;

pub use crate::engine::{FieldLog, MappedRecord, MappingEngine};
pub use crate::error::{MapperError, SchemaError};
pub use crate::field::MapperCall;
pub use crate::livd::{LivdColumn, LivdLookupMapper, LivdQuery};
pub use crate::mapper::{MapContext, Mapper};
pub use crate::registry::{MapperRegistry, default_registry};
pub use crate::schema::{MapperBinding, Schema};
