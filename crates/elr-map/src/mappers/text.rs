//! Pure string transforms over a single sibling value.

#![deny(unsafe_code)]

use std::sync::OnceLock;

use elr_model::{Element, ElementAndValue, MapperResult};
use regex::Regex;

use crate::error::{MapperError, SchemaError};
use crate::mapper::{MapContext, Mapper, arg, expect_args, first_value, value_of};

/// Digits only, followed by the `:1:` repetition marker HL7 phone fields expect.
pub struct StripPhoneFormattingMapper;

impl Mapper for StripPhoneFormattingMapper {
    fn name(&self) -> &'static str {
        "stripPhoneFormatting"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 1, usize::MAX, "requires one or more arguments")?;
        Ok(args[..1].to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let Some(value) = first_value(values) else {
            return Ok(MapperResult::empty());
        };
        let digits: String = value.chars().filter(char::is_ascii_digit).collect();
        Ok(MapperResult::value(format!("{digits}:1:")))
    }
}

pub struct StripNonNumericMapper;

impl Mapper for StripNonNumericMapper {
    fn name(&self) -> &'static str {
        "stripNonNumeric"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let stripped = first_value(values)
            .map(|v| v.chars().filter(char::is_ascii_digit).collect::<String>());
        Ok(MapperResult::from_option(stripped))
    }
}

pub struct StripNumericMapper;

impl Mapper for StripNumericMapper {
    fn name(&self) -> &'static str {
        "stripNumeric"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let stripped = first_value(values).map(|v| {
            v.chars()
                .filter(|c| !c.is_ascii_digit())
                .collect::<String>()
                .trim()
                .to_string()
        });
        Ok(MapperResult::from_option(stripped))
    }
}

/// The trimmed token at `index` of `value` split on `delimiter`.
fn split_token(
    value: &str,
    delimiter: &str,
    index: &str,
    mapper: &'static str,
) -> Result<Option<String>, MapperError> {
    let index: usize = index.trim().parse().map_err(|_| MapperError::InvalidIndex {
        mapper,
        value: index.to_string(),
    })?;
    Ok(value.split(delimiter).nth(index).map(|token| token.trim().to_string()))
}

/// `split(element, index[, delimiter])`; the delimiter defaults to a space.
pub struct SplitMapper;

impl Mapper for SplitMapper {
    fn name(&self) -> &'static str {
        "split"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(
            element,
            args,
            self.name(),
            2,
            3,
            "expects an element, an index and an optional delimiter",
        )?;
        Ok(args[..1].to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let Some(value) = first_value(values) else {
            return Ok(MapperResult::empty());
        };
        let delimiter = args.get(2).map_or(" ", String::as_str);
        let token = split_token(value, delimiter, arg(args, 1, "split")?, "split")?;
        Ok(MapperResult::from_option(token))
    }
}

/// `splitByComma(element, index)`.
pub struct SplitByCommaMapper;

impl Mapper for SplitByCommaMapper {
    fn name(&self) -> &'static str {
        "splitByComma"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 2, 2, "expects an element and an index")?;
        Ok(args[..1].to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let Some(value) = first_value(values) else {
            return Ok(MapperResult::empty());
        };
        let token = split_token(value, ",", arg(args, 1, "splitByComma")?, "splitByComma")?;
        Ok(MapperResult::from_option(token))
    }
}

pub const USA: &str = "USA";
pub const CAN: &str = "CAN";

/// Element holding the postal code the country is inferred from.
pub const PATIENT_ZIP_CODE: &str = "patient_zip_code";

/// `A9A 9A9`, the space optional.
const CANADIAN_POSTAL_CODE_PATTERN: &str = r"(?i)^[A-Z][0-9][A-Z]\s?[0-9][A-Z][0-9]$";

static CANADIAN_POSTAL_CODE: OnceLock<Option<Regex>> = OnceLock::new();

pub fn is_canadian_postal_code(value: &str) -> bool {
    CANADIAN_POSTAL_CODE
        .get_or_init(|| Regex::new(CANADIAN_POSTAL_CODE_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Keeps a sender-supplied country; otherwise `CAN` for Canadian postal codes
/// and `USA` for everything else.
pub struct CountryMapper;

impl Mapper for CountryMapper {
    fn name(&self) -> &'static str {
        "countryMapper"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        if let Some(country) = value_of(values, &element.name).filter(|c| !c.is_empty()) {
            return Ok(MapperResult::value(country));
        }
        let country = match value_of(values, PATIENT_ZIP_CODE) {
            Some(zip) if is_canadian_postal_code(zip) => CAN,
            _ => USA,
        };
        Ok(MapperResult::value(country))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canadian_postal_codes() {
        assert!(is_canadian_postal_code("J0A 0A0"));
        assert!(is_canadian_postal_code("h0h0h0"));
        assert!(!is_canadian_postal_code("32303"));
        assert!(!is_canadian_postal_code("J0A 0A0 extra"));
    }

    #[test]
    fn split_tokens() {
        assert_eq!(split_token("a b c", " ", "1", "split").unwrap().as_deref(), Some("b"));
        assert_eq!(split_token("a, b", ",", "1", "splitByComma").unwrap().as_deref(), Some("b"));
        assert_eq!(split_token("a b", " ", "5", "split").unwrap(), None);
        assert!(matches!(
            split_token("a b", " ", "x", "split"),
            Err(MapperError::InvalidIndex { .. })
        ));
    }
}
