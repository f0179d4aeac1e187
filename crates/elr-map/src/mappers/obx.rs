//! OBX segment helpers for COVID-19 results.

#![deny(unsafe_code)]

use elr_model::{Element, ElementAndValue, MapperResult};

use crate::error::{MapperError, SchemaError};
use crate::livd::{EQUIPMENT_MODEL_NAME, LivdColumn, clean_model_name};
use crate::mapper::{MapContext, Mapper, expect_args};

pub const TEST_RESULT: &str = "test_result";

/// OBX-8 abnormal flag for a SNOMED CT result code.
pub fn abnormal_flag(snomed_code: &str) -> Option<&'static str> {
    let flag = match snomed_code {
        // Detected, presumptive positive, positive, detected in pooled specimen
        "260373001" | "720735008" | "10828004" | "462371000124108" => "A",
        // SARS-CoV-2 disorder, situation, event, organism, antigen, antibody, vaccination
        "840539006" | "840544004" | "840546002" | "840533007" | "840536004" | "840535000"
        | "840534001" => "A",
        // Not detected, equivocal, negative, not detected in pooled specimen
        "260415000" | "42425007" | "260385009" | "895231008" => "N",
        // Inconclusive, unsatisfactory specimen, invalid, not done, indeterminate
        "419984006" | "125154007" | "455371000124106" | "373121007" | "82334004" => "N",
        _ => return None,
    };
    Some(flag)
}

pub struct Obx8Mapper;

impl Mapper for Obx8Mapper {
    fn name(&self) -> &'static str {
        "obx8"
    }

    fn value_names(&self, _element: &Element, _args: &[String]) -> Result<Vec<String>, SchemaError> {
        Ok(vec![TEST_RESULT.to_string()])
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let [result] = values else {
            return Ok(MapperResult::empty());
        };
        Ok(MapperResult::from_option(
            abnormal_flag(&result.value).map(str::to_string),
        ))
    }
}

/// Resolves a LIVD column for the device model named by `equipment_model_name`,
/// searching the column that element is bound to.
fn model_lookup(
    element: &Element,
    values: &[ElementAndValue],
    ctx: &MapContext<'_>,
    columns: &[LivdColumn],
) -> Result<Option<Vec<String>>, MapperResult> {
    let Some(model) = values.first() else {
        return Ok(None);
    };
    let table = ctx.element_table(element).map_err(MapperResult::error)?;
    let Some(index_column) = model.element.table_column.as_deref() else {
        return Err(MapperResult::error(format!(
            "Schema Error: no tableColumn for element '{}'",
            model.name()
        )));
    };
    let model_name = clean_model_name(&model.value);
    let found = columns
        .iter()
        .map(|column| {
            table
                .filter_builder()
                .equals_ignore_case(index_column, model_name)
                .find_single_result(column.as_str())
        })
        .collect();
    Ok(found)
}

/// OBX-17 device identifier, `<Testkit Name ID>_<Testkit Name ID Type>`.
pub struct Obx17Mapper;

impl Mapper for Obx17Mapper {
    fn name(&self) -> &'static str {
        "obx17"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 0, 0, "does not expect args")?;
        Ok(vec![EQUIPMENT_MODEL_NAME.to_string()])
    }

    fn apply(
        &self,
        element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let columns = [LivdColumn::TestkitNameId, LivdColumn::TestkitNameIdType];
        Ok(match model_lookup(element, values, ctx, &columns) {
            Ok(Some(found)) => match found.as_slice() {
                [id, id_type] => MapperResult::value(format!("{id}_{id_type}")),
                _ => MapperResult::empty(),
            },
            Ok(None) => MapperResult::empty(),
            Err(result) => result,
        })
    }
}

/// OBX-17 coding system: `99ELR` when the device model is known.
pub struct Obx17TypeMapper;

pub const LOCAL_CODING_SYSTEM: &str = "99ELR";

impl Mapper for Obx17TypeMapper {
    fn name(&self) -> &'static str {
        "obx17Type"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 0, 0, "does not expect args")?;
        Ok(vec![EQUIPMENT_MODEL_NAME.to_string()])
    }

    fn apply(
        &self,
        element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        Ok(match model_lookup(element, values, ctx, &[LivdColumn::TestkitNameId]) {
            Ok(Some(found)) if matches!(found.as_slice(), [_]) => {
                MapperResult::value(LOCAL_CODING_SYSTEM)
            }
            Ok(_) => MapperResult::empty(),
            Err(result) => result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snomed_flags() {
        assert_eq!(abnormal_flag("260373001"), Some("A"));
        assert_eq!(abnormal_flag("840539006"), Some("A"));
        assert_eq!(abnormal_flag("260415000"), Some("N"));
        assert_eq!(abnormal_flag("82334004"), Some("N"));
        assert_eq!(abnormal_flag("12345"), None);
    }
}
