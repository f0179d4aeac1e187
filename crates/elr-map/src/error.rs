//! Error types for schema compilation and record mapping.
//!
//! Configuration problems met while mapping a record (a missing table, an
//! unknown column, a value that matches nothing) are not errors here: they
//! travel as messages on [`elr_model::MapperResult`]. [`MapperError`] is
//! reserved for preconditions that a correctly deployed schema never breaks.

#![deny(unsafe_code)]

/// Hard failures raised while applying a mapper.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("{mapper} requires at least one argument")]
    MissingArguments { mapper: &'static str },

    #[error("{mapper}: argument {index} is missing")]
    MissingArgument { mapper: &'static str, index: usize },

    #[error("ifThenElse Mapper Argument Error: not a valid operator: {op}")]
    InvalidOperator { op: String },

    #[error("ifThenElse Type Mismatch Error: {value} is not numeric")]
    TypeMismatch { value: String },

    #[error("Invalid date: '{value}' for element '{element}'")]
    InvalidDate { element: String, value: String },

    #[error("Unit passed into mapper is not valid: {unit}")]
    InvalidOffsetUnit { unit: String },

    #[error("offset amount must be an integer, got '{amount}'")]
    InvalidOffsetAmount { amount: String },

    #[error("{mapper}: '{value}' is not a valid index")]
    InvalidIndex { mapper: &'static str, value: String },

    #[error("unknown mapper: {name}")]
    UnknownMapper { name: String },

    #[error("failed to map element {element}: {source}")]
    Element {
        element: String,
        #[source]
        source: Box<MapperError>,
    },
}

impl MapperError {
    pub(crate) fn for_element(self, element: &str) -> Self {
        Self::Element {
            element: element.to_string(),
            source: Box::new(self),
        }
    }
}

/// Problems found while compiling a schema, before any record is mapped.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Mapper field {field} does not parse")]
    UnparsableMapper { field: String },

    #[error("element {element} uses unknown mapper {mapper}")]
    UnknownMapper { element: String, mapper: String },

    #[error("Schema Error for {element}: {mapper} {message}")]
    InvalidArguments {
        element: String,
        mapper: &'static str,
        message: String,
    },

    #[error("duplicate element {name} in schema {schema}")]
    DuplicateElement { schema: String, name: String },

    #[error("schema {schema} has a dependency cycle through {}", elements.join(", "))]
    Cycle { schema: String, elements: Vec<String> },
}

impl SchemaError {
    pub(crate) fn arguments(
        element: &elr_model::Element,
        mapper: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidArguments {
            element: element.name.clone(),
            mapper,
            message: message.into(),
        }
    }
}
