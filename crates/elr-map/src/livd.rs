//! Device resolution against the LIVD SARS-CoV-2 table.
//!
//! Senders identify the device behind a result in many ways: an FDA GUDID,
//! a 99ELR coded id (possibly truncated), an equipment UID, a test kit id or
//! a free-text model name. [`LivdQuery::resolve`] tries them in a fixed order
//! and returns the first unambiguous answer.
//!
//! Rows flagged with the test processing mode are only visible to queries
//! that are themselves in test mode.

#![deny(unsafe_code)]

use elr_model::{Element, ElementAndValue, MapperResult};
use elr_tables::{FilterBuilder, LookupTable};
use tracing::debug;

use crate::error::{MapperError, SchemaError};
use crate::mapper::{MapContext, Mapper, expect_args, value_of};

/// Columns of the LIVD table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivdColumn {
    TestkitNameId,
    TestkitNameIdType,
    EquipmentUid,
    Model,
    TestPerformedCode,
    ProcessingModeCode,
    Manufacturer,
}

impl LivdColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TestkitNameId => "Testkit Name ID",
            Self::TestkitNameIdType => "Testkit Name ID Type",
            Self::EquipmentUid => "Equipment UID",
            Self::Model => "Model",
            Self::TestPerformedCode => "Test Performed LOINC Code",
            Self::ProcessingModeCode => "processing_mode_code",
            Self::Manufacturer => "Manufacturer",
        }
    }
}

pub const DEVICE_ID: &str = "device_id";
pub const EQUIPMENT_MODEL_ID: &str = "equipment_model_id";
pub const EQUIPMENT_MODEL_NAME: &str = "equipment_model_name";
pub const TEST_KIT_NAME_ID: &str = "test_kit_name_id";
pub const TEST_PERFORMED_CODE: &str = "test_performed_code";
pub const PROCESSING_MODE_CODE: &str = "processing_mode_code";

/// Processing mode of test and validation data.
pub const TEST_PROCESSING_MODE: &str = "T";

/// Coding-system suffixes of 99ELR device ids, e.g. `BD-Veritor_EUA`.
const STANDARD_99ELR_TYPES: &[&str] = &["EUA", "DII", "DIT", "DIM", "MNT", "MNI", "MNM"];

/// Marks a device id the sender cut short.
const TRUNCATION_MARKER: char = '#';
const MODEL_WILDCARD: char = '*';

/// Removes a single trailing `*` from a model name.
pub fn clean_model_name(model: &str) -> &str {
    model.strip_suffix(MODEL_WILDCARD).unwrap_or(model)
}

/// Upper-cases and replaces everything but letters and digits with spaces.
pub fn canonicalize_model_name(model: &str) -> String {
    model
        .to_uppercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect()
}

/// Canonical words of `model` that are not purely alphabetic. Version numbers
/// and catalogue codes are shared by too many devices to identify one.
fn common_model_words(model: &str) -> Vec<String> {
    canonicalize_model_name(model)
        .split_whitespace()
        .filter(|word| !word.chars().all(char::is_alphabetic))
        .map(str::to_string)
        .collect()
}

pub fn invalid_equipment_message(field_mapping: &str) -> String {
    format!(
        "Invalid field {field_mapping}; please refer to the HHS LOINC mapping spreadsheet for acceptable values."
    )
}

/// The device identifiers known for one result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivdQuery {
    pub device_id: Option<String>,
    pub equipment_model_id: Option<String>,
    pub test_kit_name_id: Option<String>,
    pub equipment_model_name: Option<String>,
    pub test_performed_code: Option<String>,
    pub processing_mode_code: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl LivdQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the identifiers from resolved sibling values.
    pub fn from_values(values: &[ElementAndValue]) -> Self {
        let get = |name| non_blank(value_of(values, name));
        Self {
            device_id: get(DEVICE_ID),
            equipment_model_id: get(EQUIPMENT_MODEL_ID),
            test_kit_name_id: get(TEST_KIT_NAME_ID),
            equipment_model_name: get(EQUIPMENT_MODEL_NAME),
            test_performed_code: get(TEST_PERFORMED_CODE),
            processing_mode_code: get(PROCESSING_MODE_CODE),
        }
    }

    #[must_use]
    pub fn with_device_id(mut self, value: &str) -> Self {
        self.device_id = non_blank(Some(value));
        self
    }

    #[must_use]
    pub fn with_equipment_model_id(mut self, value: &str) -> Self {
        self.equipment_model_id = non_blank(Some(value));
        self
    }

    #[must_use]
    pub fn with_test_kit_name_id(mut self, value: &str) -> Self {
        self.test_kit_name_id = non_blank(Some(value));
        self
    }

    #[must_use]
    pub fn with_equipment_model_name(mut self, value: &str) -> Self {
        self.equipment_model_name = non_blank(Some(value));
        self
    }

    #[must_use]
    pub fn with_test_performed_code(mut self, value: &str) -> Self {
        self.test_performed_code = non_blank(Some(value));
        self
    }

    #[must_use]
    pub fn with_processing_mode_code(mut self, value: &str) -> Self {
        self.processing_mode_code = non_blank(Some(value));
        self
    }

    fn is_test_mode(&self) -> bool {
        self.processing_mode_code
            .as_deref()
            .is_some_and(|mode| mode.eq_ignore_ascii_case(TEST_PROCESSING_MODE))
    }

    /// Restrictions shared by every step: the performed test, and no test
    /// devices outside test mode. Columns the table lacks are not filtered on.
    fn base_filter<'t>(&self, table: &'t LookupTable) -> FilterBuilder<'t> {
        let mut filter = table.filter_builder();
        let performed = LivdColumn::TestPerformedCode.as_str();
        if let Some(code) = self.test_performed_code.as_deref()
            && table.has_column(performed)
        {
            filter = filter.equals_ignore_case(performed, code);
        }
        let mode = LivdColumn::ProcessingModeCode.as_str();
        if !self.is_test_mode() && table.has_column(mode) {
            filter = filter.not_equals_ignore_case(mode, TEST_PROCESSING_MODE);
        }
        filter
    }

    /// The value of `column` for the described device, or `None` when the
    /// device is unknown or ambiguous.
    pub fn resolve(&self, table: &LookupTable, column: &str) -> Option<String> {
        let base = self.base_filter(table);
        let exact = |on: LivdColumn, value: &str| {
            base.clone()
                .equals_ignore_case(on.as_str(), value)
                .find_single_result(column)
        };
        let prefix = |on: LivdColumn, value: &str| {
            base.clone()
                .starts_with_ignore_case(on.as_str(), value)
                .find_single_result(column)
        };

        let resolved = self
            .device_id
            .as_deref()
            .and_then(|id| {
                let id = strip_99elr_type(id);
                if id.ends_with(TRUNCATION_MARKER) {
                    return None;
                }
                exact(LivdColumn::TestkitNameId, id)
                    .or_else(|| exact(LivdColumn::EquipmentUid, id))
            })
            .or_else(|| {
                let truncated = self.device_id.as_deref()?.strip_suffix(TRUNCATION_MARKER)?;
                prefix(LivdColumn::TestkitNameId, truncated)
                    .or_else(|| prefix(LivdColumn::EquipmentUid, truncated))
            })
            .or_else(|| exact(LivdColumn::EquipmentUid, self.equipment_model_id.as_deref()?))
            .or_else(|| exact(LivdColumn::TestkitNameId, self.test_kit_name_id.as_deref()?))
            .or_else(|| self.resolve_model_name(&base, column));
        debug!(column, resolved = resolved.is_some(), "livd lookup");
        resolved
    }

    fn resolve_model_name(&self, base: &FilterBuilder<'_>, column: &str) -> Option<String> {
        let model = self.equipment_model_name.as_deref()?;
        let on = LivdColumn::Model.as_str();
        base.clone()
            .equals_ignore_case(on, model)
            .find_single_result(column)
            .or_else(|| {
                base.clone()
                    .equals_ignoring_suffix(on, model, MODEL_WILDCARD)
                    .find_single_result(column)
            })
            .or_else(|| {
                base.filter().lookup_best_match(
                    on,
                    clean_model_name(model),
                    column,
                    &canonicalize_model_name,
                    &common_model_words(model),
                    None,
                )
            })
    }
}

/// Drops a 99ELR coding-system suffix such as `_EUA`.
fn strip_99elr_type(device_id: &str) -> &str {
    match device_id.rsplit_once('_') {
        Some((id, suffix)) if STANDARD_99ELR_TYPES.contains(&suffix) => id,
        _ => device_id,
    }
}

/// `livdLookup()`: the element's LIVD column for the result's device.
pub struct LivdLookupMapper;

impl Mapper for LivdLookupMapper {
    fn name(&self) -> &'static str {
        "livdLookup"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 0, 0, "does not expect args")?;
        Ok([
            EQUIPMENT_MODEL_NAME,
            DEVICE_ID,
            EQUIPMENT_MODEL_ID,
            TEST_KIT_NAME_ID,
            TEST_PERFORMED_CODE,
            PROCESSING_MODE_CODE,
        ]
        .map(str::to_string)
        .to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let table = match ctx.element_table(element) {
            Ok(table) => table,
            Err(message) => return Ok(MapperResult::error(message)),
        };
        let Some(column) = element.table_column.as_deref() else {
            return Ok(MapperResult::error(format!(
                "Schema Error: no tableColumn for element '{}'",
                element.name
            )));
        };
        let query = LivdQuery::from_values(values);
        Ok(match query.resolve(table, column) {
            Some(value) => MapperResult::value(value),
            // Fields the sender never sees stay quiet.
            None if element.is_output() => MapperResult::empty()
                .with_warning(invalid_equipment_message(&element.field_mapping())),
            None => MapperResult::empty(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_99elr_suffixes_only() {
        assert_eq!(strip_99elr_type("BD-Veritor_EUA"), "BD-Veritor");
        assert_eq!(strip_99elr_type("BD_Veritor_MNM"), "BD_Veritor");
        assert_eq!(strip_99elr_type("BD_Veritor"), "BD_Veritor");
    }

    #[test]
    fn model_name_canonical_form() {
        assert_eq!(canonicalize_model_name("BinaxNOW COVID-19 Ag*"), "BINAXNOW COVID 19 AG ");
        assert_eq!(common_model_words("BinaxNOW COVID-19 Ag*"), ["19"]);
    }

    #[test]
    fn clean_model_name_removes_one_wildcard() {
        assert_eq!(clean_model_name("ID NOW**"), "ID NOW*");
        assert_eq!(clean_model_name("ID NOW"), "ID NOW");
    }
}
