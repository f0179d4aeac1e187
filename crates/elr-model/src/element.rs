//! Schema element descriptors.
//!
//! An [`Element`] describes one field of a report schema: its data type, the
//! lookup table backing it (if any), the mapper that computes it, and the
//! output bindings that decide whether problems with it are user visible.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ElrError;

/// Data type of a schema element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementType {
    #[default]
    Text,
    TextOrBlank,
    Number,
    Date,
    Datetime,
    Duration,
    Code,
    /// Value comes from a lookup table column.
    Table,
    TableOrBlank,
    Hd,
    Ei,
    Id,
    IdClia,
    IdDln,
    IdSsn,
    IdNpi,
    Street,
    StreetOrBlank,
    City,
    PostalCode,
    PersonName,
    Telephone,
    Email,
    Blank,
}

impl ElementType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::TextOrBlank => "TEXT_OR_BLANK",
            Self::Number => "NUMBER",
            Self::Date => "DATE",
            Self::Datetime => "DATETIME",
            Self::Duration => "DURATION",
            Self::Code => "CODE",
            Self::Table => "TABLE",
            Self::TableOrBlank => "TABLE_OR_BLANK",
            Self::Hd => "HD",
            Self::Ei => "EI",
            Self::Id => "ID",
            Self::IdClia => "ID_CLIA",
            Self::IdDln => "ID_DLN",
            Self::IdSsn => "ID_SSN",
            Self::IdNpi => "ID_NPI",
            Self::Street => "STREET",
            Self::StreetOrBlank => "STREET_OR_BLANK",
            Self::City => "CITY",
            Self::PostalCode => "POSTAL_CODE",
            Self::PersonName => "PERSON_NAME",
            Self::Telephone => "TELEPHONE",
            Self::Email => "EMAIL",
            Self::Blank => "BLANK",
        }
    }

    /// Table-backed types resolve their value through `table` and `table_column`.
    pub fn is_table(self) -> bool {
        matches!(self, Self::Table | Self::TableOrBlank)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = ElrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: &[ElementType] = &[
            ElementType::Text,
            ElementType::TextOrBlank,
            ElementType::Number,
            ElementType::Date,
            ElementType::Datetime,
            ElementType::Duration,
            ElementType::Code,
            ElementType::Table,
            ElementType::TableOrBlank,
            ElementType::Hd,
            ElementType::Ei,
            ElementType::Id,
            ElementType::IdClia,
            ElementType::IdDln,
            ElementType::IdSsn,
            ElementType::IdNpi,
            ElementType::Street,
            ElementType::StreetOrBlank,
            ElementType::City,
            ElementType::PostalCode,
            ElementType::PersonName,
            ElementType::Telephone,
            ElementType::Email,
            ElementType::Blank,
        ];
        let wanted = s.trim();
        ALL.iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ElrError::UnknownVariant {
                kind: "element type",
                value: s.to_string(),
            })
    }
}

/// A schema field descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Element {
    pub name: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Name of the lookup table consulted by table-backed mappers.
    pub table: Option<String>,
    pub table_column: Option<String>,
    /// Mapper field, e.g. `concat(patient_first_name, patient_last_name)`.
    pub mapper: Option<String>,
    /// Run the mapper even when the sender supplied a value.
    pub mapper_overrides_value: bool,
    pub default: Option<String>,
    pub default_overrides_value: bool,
    /// Separator used when concatenating multiple values into this element.
    pub delimiter: Option<String>,
    pub csv_fields: Vec<String>,
    pub hl7_field: Option<String>,
    pub hl7_output_fields: Vec<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type(mut self, element_type: ElementType) -> Self {
        self.element_type = element_type;
        self
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self.table_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_table_name(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn with_table_column(mut self, column: impl Into<String>) -> Self {
        self.table_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn with_mapper(mut self, mapper: impl Into<String>) -> Self {
        self.mapper = Some(mapper.into());
        self
    }

    #[must_use]
    pub fn with_mapper_overrides_value(mut self, enable: bool) -> Self {
        self.mapper_overrides_value = enable;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    #[must_use]
    pub fn with_csv_field(mut self, field: impl Into<String>) -> Self {
        self.csv_fields.push(field.into());
        self
    }

    #[must_use]
    pub fn with_hl7_field(mut self, field: impl Into<String>) -> Self {
        self.hl7_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_hl7_output_field(mut self, field: impl Into<String>) -> Self {
        self.hl7_output_fields.push(field.into());
        self
    }

    /// True when the element is bound to a CSV column, an HL7 field or an
    /// HL7 output field list.
    pub fn is_output(&self) -> bool {
        !self.csv_fields.is_empty()
            || self.hl7_field.as_deref().is_some_and(|f| !f.trim().is_empty())
            || !self.hl7_output_fields.is_empty()
    }

    /// Human readable name of the element and where it lands in the output.
    pub fn field_mapping(&self) -> String {
        if let Some(field) = self.hl7_field.as_deref().filter(|f| !f.trim().is_empty()) {
            format!("{} ({field})", self.name)
        } else if let Some(field) = self.csv_fields.first() {
            format!("{} ({field})", self.name)
        } else if !self.hl7_output_fields.is_empty() {
            format!("{} ({})", self.name, self.hl7_output_fields.join(", "))
        } else {
            self.name.clone()
        }
    }
}

/// A resolved sibling value handed to a mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementAndValue {
    pub element: Element,
    pub value: String,
}

impl ElementAndValue {
    pub fn new(element: Element, value: impl Into<String>) -> Self {
        Self {
            element,
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.element.name
    }
}
