//! Parsing of schema mapper fields such as `lookup(patient_state, $Column:State)`.

#![deny(unsafe_code)]

use std::sync::OnceLock;

use regex::Regex;

use crate::error::SchemaError;

const MAPPER_FIELD_PATTERN: &str = r"([a-zA-Z0-9]+)\(([a-z, ._\-A-Z0-9?&$*:^><=!]*)\)";

static MAPPER_FIELD: OnceLock<Option<Regex>> = OnceLock::new();

fn mapper_field_regex() -> Option<&'static Regex> {
    MAPPER_FIELD
        .get_or_init(|| Regex::new(MAPPER_FIELD_PATTERN).ok())
        .as_ref()
}

/// A parsed mapper field: the mapper name and its trimmed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperCall {
    pub name: String,
    pub args: Vec<String>,
}

impl MapperCall {
    pub fn parse(field: &str) -> Result<Self, SchemaError> {
        let unparsable = || SchemaError::UnparsableMapper {
            field: field.to_string(),
        };
        let captures = mapper_field_regex()
            .and_then(|re| re.captures(field))
            .ok_or_else(unparsable)?;
        let name = captures.get(1).ok_or_else(unparsable)?.as_str().to_string();
        let raw_args = captures.get(2).map_or("", |m| m.as_str());
        let args = if raw_args.is_empty() {
            Vec::new()
        } else {
            raw_args.split(',').map(|a| a.trim().to_string()).collect()
        };
        Ok(Self { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_arguments() {
        let call = MapperCall::parse("lookup(patient_state, $Column:State)").unwrap();
        assert_eq!(call.name, "lookup");
        assert_eq!(call.args, ["patient_state", "$Column:State"]);
    }

    #[test]
    fn empty_argument_list() {
        let call = MapperCall::parse("livdLookup()").unwrap();
        assert_eq!(call.name, "livdLookup");
        assert!(call.args.is_empty());
    }

    #[test]
    fn operators_and_literals_are_allowed() {
        let call = MapperCall::parse("ifThenElse(<=, patient_age, 18, $string:minor, adult)").unwrap();
        assert_eq!(call.args.len(), 5);
        assert_eq!(call.args[0], "<=");
    }

    #[test]
    fn rejects_malformed_fields() {
        assert!(matches!(
            MapperCall::parse("concat patient_first_name"),
            Err(SchemaError::UnparsableMapper { .. })
        ));
    }
}
