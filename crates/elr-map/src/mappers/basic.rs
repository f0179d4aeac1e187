//! Mappers that combine or pick among sibling values without consulting tables.

#![deny(unsafe_code)]

use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use elr_model::{Element, ElementAndValue, ElementType, MapperResult};
use sha2::{Digest, Sha256};

use crate::datetime::parse_date_time;
use crate::error::{MapperError, SchemaError};
use crate::mapper::{MapContext, Mapper, expect_args, first_value};

/// First character of a name, upper-cased.
pub struct MiddleInitialMapper;

impl Mapper for MiddleInitialMapper {
    fn name(&self) -> &'static str {
        "middleInitial"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 1, 1, "expects exactly one argument")?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let initial = first_value(values)
            .and_then(|v| v.chars().next())
            .map(|c| c.to_uppercase().collect::<String>());
        Ok(MapperResult::from_option(initial))
    }
}

/// First available value among the arguments, in priority order.
pub struct UseMapper;

impl Mapper for UseMapper {
    fn name(&self) -> &'static str {
        "use"
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
        let Some(from) = values.first() else {
            return Ok(MapperResult::empty());
        };
        // A timestamp copied into a date element keeps only the date.
        if element.element_type == ElementType::Date
            && from.element.element_type == ElementType::Datetime
            && let Some(parsed) = parse_date_time(&from.value)
        {
            return Ok(MapperResult::value(parsed.format("%Y%m%d").to_string()));
        }
        Ok(MapperResult::value(from.value.clone()))
    }
}

/// Reads a property of the submitting sender's settings.
pub struct UseSenderSettingMapper;

impl Mapper for UseSenderSettingMapper {
    fn name(&self) -> &'static str {
        "useSenderSetting"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 1, 1, "expects a single argument")?;
        // The argument names a sender property, not an element.
        Ok(Vec::new())
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        _values: &[ElementAndValue],
        ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let Some(sender) = ctx.sender else {
            return Ok(MapperResult::empty());
        };
        let property = args.first().map(String::as_str).unwrap_or_default();
        Ok(match sender.setting(property) {
            Some(value) => MapperResult::value(value),
            None => MapperResult::error(format!(
                "internal error in {}: {property} is not a sender setting field",
                self.name()
            )),
        })
    }
}

/// Joins the values with the element's delimiter, `, ` by default.
pub struct ConcatenateMapper;

impl Mapper for ConcatenateMapper {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(
            element,
            args,
            self.name(),
            2,
            usize::MAX,
            "expects to concat two or more column names",
        )?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        if values.is_empty() {
            return Ok(MapperResult::empty());
        }
        let delimiter = element.delimiter.as_deref().unwrap_or(", ");
        let joined = values
            .iter()
            .map(|v| v.value.as_str())
            .collect::<Vec<_>>()
            .join(delimiter);
        Ok(MapperResult::value(joined))
    }
}

/// First non-empty value; an empty string when none of the arguments has one.
pub struct CoalesceMapper;

impl Mapper for CoalesceMapper {
    fn name(&self) -> &'static str {
        "coalesce"
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
        if values.is_empty() {
            return Ok(MapperResult::empty());
        }
        let value = values
            .iter()
            .map(|v| v.value.as_str())
            .find(|v| !v.is_empty())
            .unwrap_or_default();
        Ok(MapperResult::value(value))
    }
}

pub struct TrimBlanksMapper;

impl Mapper for TrimBlanksMapper {
    fn name(&self) -> &'static str {
        "trimBlanks"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 1, usize::MAX, "expects an element name")?;
        Ok(args[..1].to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        Ok(MapperResult::value(first_value(values).unwrap_or_default().trim()))
    }
}

/// Lowercase hex SHA-256 of the concatenated values, in argument order.
pub struct HashMapper;

impl HashMapper {
    pub fn digest(input: &[u8]) -> String {
        hex::encode(Sha256::digest(input))
    }
}

impl Mapper for HashMapper {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        if args.is_empty() {
            return Err(MapperError::MissingArguments { mapper: "hash" });
        }
        // Every named field must carry a value; a partial digest is never produced.
        let parts: Option<Vec<&str>> = args
            .iter()
            .map(|arg| {
                values
                    .iter()
                    .find(|v| v.name() == arg.as_str())
                    .map(|v| v.value.as_str())
                    .filter(|v| !v.is_empty())
            })
            .collect();
        let Some(parts) = parts else {
            return Ok(MapperResult::empty());
        };
        Ok(MapperResult::value(Self::digest(parts.concat().as_bytes())))
    }
}

/// The current local time, formatted with an optional chrono pattern.
pub struct TimestampMapper;

const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%.4f%z";
const FALLBACK_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

impl Mapper for TimestampMapper {
    fn name(&self) -> &'static str {
        "timestamp"
    }

    fn value_names(&self, _element: &Element, _args: &[String]) -> Result<Vec<String>, SchemaError> {
        Ok(Vec::new())
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        _values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let pattern = args.first().map_or(DEFAULT_TIMESTAMP_FORMAT, String::as_str);
        let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
        let now = Local::now();
        let formatted = if items.contains(&Item::Error) {
            now.format(FALLBACK_TIMESTAMP_FORMAT).to_string()
        } else {
            now.format_with_items(items.into_iter()).to_string()
        };
        Ok(MapperResult::value(formatted))
    }
}

/// Produces nothing; used to cancel a mapper inherited from a parent schema.
pub struct NullMapper;

impl Mapper for NullMapper {
    fn name(&self) -> &'static str {
        "none"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 0, 0, "does not expect args")?;
        Ok(Vec::new())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        _values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        Ok(MapperResult::empty())
    }
}
