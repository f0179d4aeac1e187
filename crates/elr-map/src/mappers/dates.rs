//! Date arithmetic mappers.

#![deny(unsafe_code)]

use elr_model::{Element, ElementAndValue, MapperResult};

use crate::datetime::{OffsetUnit, add_offset, format_hl7, parse_date_time, whole_years_between};
use crate::error::{MapperError, SchemaError};
use crate::mapper::{MapContext, Mapper, arg, expect_args, first_value, value_of};

/// `offsetDateTime(element, unit, amount)`: shifts a timestamp by a signed
/// amount, keeping the sender's UTC offset.
pub struct DateTimeOffsetMapper;

impl Mapper for DateTimeOffsetMapper {
    fn name(&self) -> &'static str {
        "offsetDateTime"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 3, 3, "expects an element, a unit and an amount")?;
        Ok(args[..1].to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let Some(value) = first_value(values).filter(|v| !v.trim().is_empty()) else {
            return Ok(MapperResult::empty());
        };
        let unit = arg(args, 1, "offsetDateTime")?;
        let unit = OffsetUnit::parse(unit).ok_or_else(|| MapperError::InvalidOffsetUnit {
            unit: unit.to_string(),
        })?;
        let amount = arg(args, 2, "offsetDateTime")?;
        let amount: i64 = amount.trim().parse().map_err(|_| MapperError::InvalidOffsetAmount {
            amount: amount.to_string(),
        })?;
        let invalid_date = || MapperError::InvalidDate {
            element: element.name.clone(),
            value: value.to_string(),
        };
        let parsed = parse_date_time(value).ok_or_else(invalid_date)?;
        let shifted = add_offset(parsed, unit, amount).ok_or_else(invalid_date)?;
        Ok(MapperResult::value(format_hl7(&shifted)))
    }
}

pub const PATIENT_AGE: &str = "patient_age";
pub const PATIENT_DOB: &str = "patient_dob";
pub const SPECIMEN_COLLECTION_DATE_TIME: &str = "specimen_collection_date_time";

/// `patientAge(patient_age, patient_dob, specimen_collection_date_time)`.
///
/// A sender-supplied age always wins. Otherwise the age is the whole number
/// of 365-day years from birth to specimen collection. A birth date after the
/// collection date yields no value.
pub struct PatientAgeMapper;

impl Mapper for PatientAgeMapper {
    fn name(&self) -> &'static str {
        "patientAge"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(
            element,
            args,
            self.name(),
            3,
            3,
            "expects patient age, date of birth and specimen collection elements",
        )?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let age_name = args.first().map_or(PATIENT_AGE, String::as_str);
        let dob_name = args.get(1).map_or(PATIENT_DOB, String::as_str);
        let specimen_name = args
            .get(2)
            .map_or(SPECIMEN_COLLECTION_DATE_TIME, String::as_str);

        if let Some(age) = value_of(values, age_name).filter(|a| !a.trim().is_empty()) {
            return Ok(MapperResult::value(age));
        }
        let (Some(dob), Some(specimen)) =
            (value_of(values, dob_name), value_of(values, specimen_name))
        else {
            return Ok(MapperResult::empty());
        };
        // Messages must not echo the dates themselves.
        let (Some(dob), Some(specimen)) = (parse_date_time(dob), parse_date_time(specimen)) else {
            return Ok(MapperResult::error(format!(
                "Unable to calculate {} because the date of birth or specimen collection date is not a valid date",
                element.name
            )));
        };
        if dob > specimen {
            return Ok(MapperResult::empty().with_warning(
                "Patient DOB is after specimen collection date, so cannot correctly calculate patient age",
            ));
        }
        Ok(MapperResult::value(
            whole_years_between(dob, specimen).to_string(),
        ))
    }
}
