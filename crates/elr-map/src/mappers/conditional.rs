//! Conditional mappers: `ifThenElse`, `ifPresent`, `ifNotPresent` and `ifNPI`.

#![deny(unsafe_code)]

use std::cmp::Ordering;

use elr_model::{CaseInsensitiveSet, Element, ElementAndValue, MapperResult};

use crate::error::{MapperError, SchemaError};
use crate::mapper::{MapContext, Mapper, arg, expect_args, value_of};
use crate::npi::is_valid_npi;

/// `ifThenElse(op, lhs, rhs, then, else)`: compares `lhs` with `rhs` and
/// yields `then` or `else`.
///
/// Every argument is either an element name, replaced by that element's
/// value, or a literal. Operands are compared as numbers when both parse as
/// numbers and as strings when neither does.
pub struct IfThenElseMapper;

impl IfThenElseMapper {
    /// The value of the element named `arg` (matched case-insensitively), or
    /// `arg` itself as a literal.
    pub fn decode_arg<'v>(values: &'v [ElementAndValue], arg: &'v str) -> &'v str {
        let names = CaseInsensitiveSet::new(values.iter().map(ElementAndValue::name));
        names
            .get(arg)
            .and_then(|name| values.iter().find(|v| v.name() == name))
            .map_or(arg, |v| v.value.as_str())
    }

    pub fn compare(op: &str, lhs: &str, rhs: &str) -> Result<bool, MapperError> {
        let ordering = match (lhs.trim().parse::<f64>(), rhs.trim().parse::<f64>()) {
            (Ok(l), Ok(r)) => l.partial_cmp(&r),
            (Err(_), Ok(_)) => {
                return Err(MapperError::TypeMismatch {
                    value: lhs.to_string(),
                });
            }
            (Ok(_), Err(_)) => {
                return Err(MapperError::TypeMismatch {
                    value: rhs.to_string(),
                });
            }
            (Err(_), Err(_)) => Some(lhs.cmp(rhs)),
        };
        let result = match op {
            "==" => ordering == Some(Ordering::Equal),
            "!=" => ordering != Some(Ordering::Equal),
            ">=" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            "<=" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            "<" => ordering == Some(Ordering::Less),
            ">" => ordering == Some(Ordering::Greater),
            _ => return Err(MapperError::InvalidOperator { op: op.to_string() }),
        };
        Ok(result)
    }
}

impl Mapper for IfThenElseMapper {
    fn name(&self) -> &'static str {
        "ifThenElse"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 5, 5, "requires 5 arguments")?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let decode = |index| arg(args, index, "ifThenElse").map(|a| Self::decode_arg(values, a));
        let chosen = if Self::compare(decode(0)?, decode(1)?, decode(2)?)? {
            decode(3)?
        } else {
            decode(4)?
        };
        Ok(MapperResult::value(chosen))
    }
}

/// `ifPresent(element, value)`: `value` when `element` has one.
pub struct IfPresentMapper;

impl Mapper for IfPresentMapper {
    fn name(&self) -> &'static str {
        "ifPresent"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 2, 2, "expects dependency and value parameters")?;
        Ok(args[..1].to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        if values.len() == 1 {
            Ok(MapperResult::value(arg(args, 1, "ifPresent")?))
        } else {
            Ok(MapperResult::empty())
        }
    }
}

/// `ifNotPresent($mode:literal, $string:TEXT, cond...)` yields `TEXT` and
/// `ifNotPresent($mode:lookup, other, cond...)` yields `other`'s value, in
/// both cases only when every condition element is blank.
pub struct IfNotPresentMapper;

fn after_colon(arg: &str) -> &str {
    arg.split_once(':').map_or(arg, |(_, rest)| rest)
}

impl Mapper for IfNotPresentMapper {
    fn name(&self) -> &'static str {
        "ifNotPresent"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(
            element,
            args,
            self.name(),
            2,
            usize::MAX,
            "expects dependency and value parameters",
        )?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let mode = after_colon(arg(args, 0, "ifNotPresent")?);
        let operand = after_colon(arg(args, 1, "ifNotPresent")?);
        let any_present = args[2..]
            .iter()
            .any(|name| value_of(values, name).is_some_and(|v| !v.trim().is_empty()));
        if any_present {
            return Ok(MapperResult::empty());
        }
        let value = match mode {
            "literal" => Some(operand.to_string()),
            "lookup" => value_of(values, operand).map(str::to_string),
            _ => None,
        };
        Ok(MapperResult::from_option(value))
    }
}

/// `ifNPI(element, valid[, invalid])`: picks a literal by NPI validity.
pub struct IfNpiMapper;

impl Mapper for IfNpiMapper {
    fn name(&self) -> &'static str {
        "ifNPI"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>, SchemaError> {
        expect_args(element, args, self.name(), 2, 3, "expects dependency and value parameters")?;
        Ok(args[..1].to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        values: &[ElementAndValue],
        _ctx: &MapContext<'_>,
    ) -> Result<MapperResult, MapperError> {
        let [value] = values else {
            return Ok(MapperResult::empty());
        };
        let chosen = if is_valid_npi(&value.value) {
            args.get(1)
        } else {
            args.get(2)
        };
        Ok(MapperResult::from_option(chosen.cloned()))
    }
}
