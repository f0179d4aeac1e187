//! Table-backed mappers.
//!
//! Each of these reads the table named by the target element. A missing table
//! or column is reported on the [`MapperResult`]; a key that matches several
//! distinct values yields no value.

#![deny(unsafe_code)]

use elr_model::{Element, ElementAndValue, MapperResult};
use elr_tables::LookupTable;

use crate::error::{MapperError, SchemaError};
use crate::mapper::{MapContext, Mapper, expect_args, first_value, value_of};

/// The element's table and result column, or the configuration error to
/// attach when either is unavailable.
fn table_and_column<'a>(
    element: &'a Element,
    ctx: &MapContext<'a>,
) -> Result<(&'a LookupTable, &'a str), MapperResult> {
    let table = ctx.element_table(element).map_err(MapperResult::error)?;
    let Some(column) = element.table_column.as_deref() else {
        return Err(MapperResult::error(format!(
            "Schema Error: no tableColumn for element {}",
            element.name
        )));
    };
    if !table.has_column(column) {
        return Err(MapperResult::error(format!(
            "Schema Error: no tableColumn named {column} for element {}",
            element.name
        )));
    }
    Ok((table, column))
}

/// Index column encoded in a `$Column:Name` argument.
fn index_column(arg: &str) -> &str {
    arg.split_once(':').map_or("", |(_, column)| column)
}

fn clean_zip(zip: &str) -> &str {
    zip.split_once('-').map_or(zip, |(head, _)| head)
}

/// `lookup(element, $Column:Index[, element, $Column:Index])`: the element's
/// table column on the row keyed by one or two values.
pub struct LookupMapper;

impl Mapper for LookupMapper {
    fn name(&self) -> &'static str {
        "lookup"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 2, 4, "expected 2 or 4 args")?;
        Ok(args.iter().step_by(2).cloned().collect())
    }

    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        // Every keyed element needs a value, otherwise the key is partial.
        if values.len() * 2 != args.len() {
            return Ok(MapperResult::empty());
        }
        let (table, column) = match table_and_column(element, ctx) {
            Ok(found) => found,
            Err(result) => return Ok(result),
        };
        let mut filter = table.filter_builder();
        for (index, value) in values.iter().enumerate() {
            let index_column = args.get(index * 2 + 1).map_or("", |a| index_column(a));
            if index_column.is_empty() {
                return Ok(MapperResult::error(format!(
                    "Schema Error: no tableColumn for element {}",
                    value.name()
                )));
            }
            filter = filter.equals_ignore_case(index_column, &value.value);
        }
        if filter.has_error() {
            return Ok(MapperResult::empty().with_warning(format!(
                "Schema Error: table {} has no index column {} for element {}",
                table.name(),
                filter.missing_columns().join(", "),
                element.name
            )));
        }
        Ok(MapperResult::from_option(filter.find_single_result(column)))
    }
}

/// `lookupSenderAutomationValuesets(element, valueSetName[, version])`:
/// translates a display value through a value set table with `name`,
/// `version` and `display` columns.
pub struct LookupSenderAutomationValuesetsMapper;

impl Mapper for LookupSenderAutomationValuesetsMapper {
    fn name(&self) -> &'static str {
        "lookupSenderAutomationValuesets"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 2, 3, "expected 2 or 3 args")?;
        Ok(args[..1].to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let (table, column) = match table_and_column(element, ctx) {
            Ok(found) => found,
            Err(result) => return Ok(result),
        };
        let Some(display) = first_value(values) else {
            return Ok(MapperResult::empty());
        };
        let value_set = args.get(1).map_or("", String::as_str);
        let version = args.get(2).map_or("", String::as_str);
        let found = table
            .filter_builder()
            .equals_ignore_case("name", value_set)
            .equals_ignore_case("version", version)
            .equals_ignore_case("display", display)
            .find_single_result(column);
        Ok(match found {
            Some(value) => MapperResult::value(value),
            None => {
                let version = if version.is_empty() {
                    "[no version specified]"
                } else {
                    version
                };
                MapperResult::error(format!(
                    "Schema Error: no value for element {} with value set name of {value_set} \
                     display value {display} and version {version}",
                    element.name
                ))
            }
        })
    }
}

/// `npiLookup(provider_id, facility_clia, sender_id)`: provider details keyed
/// by NPI, falling back to the facility's default provider when no NPI was
/// sent.
///
/// The argument names double as the table's index columns.
pub struct NpiLookupMapper;

impl Mapper for NpiLookupMapper {
    fn name(&self) -> &'static str {
        "npiLookup"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(
            element,
            args,
            self.name(),
            3,
            3,
            "expects provider id, facility CLIA and sender id",
        )?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let (table, column) = match table_and_column(element, ctx) {
            Ok(found) => found,
            Err(result) => return Ok(result),
        };
        let [npi_column, clia_column, sender_column] = args else {
            return Ok(MapperResult::empty());
        };
        let sent = |name: &str| value_of(values, name).unwrap_or_default();
        let npi = sent(npi_column);
        let filter = if npi.trim().is_empty() {
            table
                .filter_builder()
                .equals_ignore_case(clia_column, sent(clia_column))
                .equals_ignore_case(sender_column, sent(sender_column))
                .equals_ignore_case("default", "true")
        } else {
            table.filter_builder().equals_ignore_case(npi_column, npi)
        };
        Ok(MapperResult::from_option(filter.find_single_result(column)))
    }
}

/// County for a zip code, from a table with `zipcode` and `county` columns.
pub struct ZipCodeToCountyMapper;

impl Mapper for ZipCodeToCountyMapper {
    fn name(&self) -> &'static str {
        "zipCodeToCounty"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 1, 1, "expects a zip code element")?;
        Ok(args.to_vec())
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
        let Some(zip) = first_value(values) else {
            return Ok(MapperResult::empty());
        };
        let county = table
            .filter_builder()
            .equals_ignore_case("zipcode", clean_zip(zip))
            .find_single_result("county");
        Ok(MapperResult::from_option(county))
    }
}

/// State for a zip code; the result column is the element's `table_column`.
pub struct ZipCodeToStateMapper;

impl Mapper for ZipCodeToStateMapper {
    fn name(&self) -> &'static str {
        "zipCodeToState"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 1, 1, "expects a zip code element")?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let (table, column) = match table_and_column(element, ctx) {
            Ok(found) => found,
            Err(result) => return Ok(result),
        };
        let Some(zip) = first_value(values) else {
            return Ok(MapperResult::empty());
        };
        let state = table
            .filter_builder()
            .equals_ignore_case("zipcode", clean_zip(zip))
            .find_single_result(column);
        Ok(MapperResult::from_option(state))
    }
}
