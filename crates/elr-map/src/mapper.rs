//! The mapper trait and the context a mapper runs in.
//!
//! A mapper is stateless. It is named in a schema element's `mapper` field,
//! e.g. `concat(patient_first_name, patient_last_name)`. Before it is applied,
//! [`Mapper::value_names`] turns the arguments into the sibling elements whose
//! values it needs; [`Mapper::apply`] then receives those values.

#![deny(unsafe_code)]

use std::sync::Arc;

use elr_model::{Element, ElementAndValue, MapperResult, Sender};
use elr_tables::{LookupTable, TableRegistry};

use crate::error::{MapperError, SchemaError};

/// Shared state available while mapping one record.
#[derive(Debug, Clone, Copy)]
pub struct MapContext<'a> {
    pub tables: &'a TableRegistry,
    /// Absent when mapping outside of a submission, e.g. from the CLI.
    pub sender: Option<&'a Sender>,
}

impl<'a> MapContext<'a> {
    pub fn new(tables: &'a TableRegistry) -> Self {
        Self {
            tables,
            sender: None,
        }
    }

    #[must_use]
    pub fn with_sender(mut self, sender: &'a Sender) -> Self {
        self.sender = Some(sender);
        self
    }

    /// The table named by `element.table`, or the configuration error to
    /// report when it is not registered.
    pub fn element_table(&self, element: &Element) -> Result<&'a LookupTable, String> {
        let name = element.table.as_deref().unwrap_or_default();
        self.tables
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| format!("Schema Error: could not find table '{name}'"))
    }
}

/// A named, stateless value producer for schema elements.
pub trait Mapper: Send + Sync {
    /// Name used in mapper fields, e.g. `concat`.
    fn name(&self) -> &'static str;

    /// Names of the sibling elements whose values [`Mapper::apply`] needs.
    ///
    /// Called once per element when a schema is compiled, so argument
    /// validation belongs here.
    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError>;

    /// Computes the element's value.
    ///
    /// `values` holds the requested siblings that resolved to a non-blank
    /// value, in [`Mapper::value_names`] order.
    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError>;
}

/// Value of the sibling named `name`, if it was passed in.
pub(crate) fn value_of<'v>(values: &'v [ElementAndValue], name: &str) -> Option<&'v str> {
    values
        .iter()
        .find(|v| v.name() == name)
        .map(|v| v.value.as_str())
}

/// Value of the first sibling passed in.
pub(crate) fn first_value(values: &[ElementAndValue]) -> Option<&str> {
    values.first().map(|v| v.value.as_str())
}

pub(crate) fn arg<'a>(
    args: &'a [String],
    index: usize,
    mapper: &'static str,
) -> Result<&'a str, MapperError> {
    args.get(index)
        .map(String::as_str)
        .ok_or(MapperError::MissingArgument { mapper, index })
}

/// Checks `args.len()` against an inclusive range at compile time.
pub(crate) fn expect_args(
    element: &Element,
    args: &[String],
    mapper: &'static str,
    min: usize,
    max: usize,
    message: &str,
) -> Result<(), SchemaError> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(SchemaError::arguments(element, mapper, message))
    }
}
