//! Schema compilation.
//!
//! A compiled [`Schema`] binds every mapper field to a registered mapper and
//! fixes the order in which elements are resolved: an element comes after
//! every sibling its mapper reads. Among independent elements declaration
//! order is kept. A dependency cycle is a compile error, so mapping a record
//! never has to detect one.

#![deny(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};

use elr_model::Element;
use elr_tables::SchemaDefinition;
use tracing::debug;

use crate::error::SchemaError;
use crate::field::MapperCall;
use crate::mapper::Mapper;
use crate::registry::MapperRegistry;

/// A schema element's mapper, resolved and validated.
pub struct MapperBinding<'r> {
    pub mapper: &'r dyn Mapper,
    pub args: Vec<String>,
    /// Siblings the mapper reads, in the order it expects them.
    pub value_names: Vec<String>,
}

impl std::fmt::Debug for MapperBinding<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperBinding")
            .field("mapper", &self.mapper.name())
            .field("args", &self.args)
            .field("value_names", &self.value_names)
            .finish()
    }
}

#[derive(Debug)]
pub struct Schema<'r> {
    name: String,
    topic: Option<String>,
    elements: Vec<Element>,
    /// Parallel to `elements`.
    bindings: Vec<Option<MapperBinding<'r>>>,
    /// Indices into `elements`, dependencies first.
    order: Vec<usize>,
    index: HashMap<String, usize>,
}

impl<'r> Schema<'r> {
    pub fn from_definition(
        definition: &SchemaDefinition,
        registry: &'r MapperRegistry,
    ) -> Result<Self, SchemaError> {
        Self::compile(
            &definition.name,
            definition.topic.clone(),
            definition.elements.clone(),
            registry,
        )
    }

    pub fn compile(
        name: &str,
        topic: Option<String>,
        elements: Vec<Element>,
        registry: &'r MapperRegistry,
    ) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(elements.len());
        for (position, element) in elements.iter().enumerate() {
            if index.insert(element.name.clone(), position).is_some() {
                return Err(SchemaError::DuplicateElement {
                    schema: name.to_string(),
                    name: element.name.clone(),
                });
            }
        }

        let bindings = elements
            .iter()
            .map(|element| bind_mapper(element, registry))
            .collect::<Result<Vec<_>, _>>()?;

        let order = resolution_order(name, &elements, &bindings, &index)?;
        debug!(
            schema = name,
            elements = elements.len(),
            mapped = bindings.iter().flatten().count(),
            "compiled schema"
        );
        Ok(Self {
            name: name.to_string(),
            topic,
            elements,
            bindings,
            order,
            index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Elements in declaration order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.index.get(name).map(|&i| &self.elements[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn binding(&self, name: &str) -> Option<&MapperBinding<'r>> {
        self.index.get(name).and_then(|&i| self.bindings[i].as_ref())
    }

    /// Elements with their mapper bindings, dependencies first.
    pub fn resolution_order(&self) -> impl Iterator<Item = (&Element, Option<&MapperBinding<'r>>)> {
        self.order
            .iter()
            .map(|&i| (&self.elements[i], self.bindings[i].as_ref()))
    }

    /// Builds a record keyed by element name from one CSV row.
    ///
    /// An element takes the first of its `csv_fields` present in `headers`,
    /// or the column named like the element itself.
    pub fn record_from_csv<H, V>(&self, headers: &[H], row: &[V]) -> BTreeMap<String, String>
    where
        H: AsRef<str>,
        V: AsRef<str>,
    {
        let column = |name: &str| headers.iter().position(|h| h.as_ref().trim() == name);
        self.elements
            .iter()
            .filter_map(|element| {
                let position = element
                    .csv_fields
                    .iter()
                    .find_map(|field| column(field))
                    .or_else(|| column(&element.name))?;
                let value = row.get(position)?.as_ref().to_string();
                Some((element.name.clone(), value))
            })
            .collect()
    }
}

fn bind_mapper<'r>(
    element: &Element,
    registry: &'r MapperRegistry,
) -> Result<Option<MapperBinding<'r>>, SchemaError> {
    let Some(field) = element.mapper.as_deref().filter(|m| !m.trim().is_empty()) else {
        return Ok(None);
    };
    let call = MapperCall::parse(field)?;
    let mapper = registry
        .get(&call.name)
        .ok_or_else(|| SchemaError::UnknownMapper {
            element: element.name.clone(),
            mapper: call.name.clone(),
        })?;
    let value_names = mapper.value_names(element, &call.args)?;
    Ok(Some(MapperBinding {
        mapper,
        args: call.args,
        value_names,
    }))
}

/// Stable topological order: whenever several elements are ready, the one
/// declared first goes next.
fn resolution_order(
    schema: &str,
    elements: &[Element],
    bindings: &[Option<MapperBinding<'_>>],
    index: &HashMap<String, usize>,
) -> Result<Vec<usize>, SchemaError> {
    let mut in_degree = vec![0usize; elements.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); elements.len()];
    for (position, binding) in bindings.iter().enumerate() {
        let Some(binding) = binding else { continue };
        let dependencies: BTreeSet<usize> = binding
            .value_names
            .iter()
            .filter_map(|name| index.get(name).copied())
            // Reading its own sender value is not a dependency.
            .filter(|&dependency| dependency != position)
            .collect();
        for dependency in dependencies {
            dependents[dependency].push(position);
            in_degree[position] += 1;
        }
    }

    let mut ready: BTreeSet<usize> = (0..elements.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(elements.len());
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &dependents[next] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() < elements.len() {
        let elements = (0..elements.len())
            .filter(|&i| in_degree[i] > 0)
            .map(|i| elements[i].name.clone())
            .collect();
        return Err(SchemaError::Cycle {
            schema: schema.to_string(),
            elements,
        });
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_registry;

    fn names(schema: &Schema<'_>) -> Vec<String> {
        schema
            .resolution_order()
            .map(|(element, _)| element.name.clone())
            .collect()
    }

    #[test]
    fn dependencies_resolve_first() {
        let schema = Schema::compile(
            "test",
            None,
            vec![
                Element::new("full_name").with_mapper("concat(first, last)"),
                Element::new("first"),
                Element::new("initial").with_mapper("middleInitial(first)"),
                Element::new("last"),
            ],
            default_registry(),
        )
        .unwrap();
        assert_eq!(names(&schema), ["first", "initial", "last", "full_name"]);
    }

    #[test]
    fn self_reference_is_not_a_cycle() {
        let schema = Schema::compile(
            "test",
            None,
            vec![
                Element::new("patient_country")
                    .with_mapper("countryMapper(patient_country, patient_zip_code)"),
                Element::new("patient_zip_code"),
            ],
            default_registry(),
        )
        .unwrap();
        assert_eq!(names(&schema), ["patient_zip_code", "patient_country"]);
    }

    #[test]
    fn cycles_are_rejected() {
        let err = Schema::compile(
            "loop",
            None,
            vec![
                Element::new("a").with_mapper("use(b)"),
                Element::new("b").with_mapper("use(a)"),
                Element::new("c"),
            ],
            default_registry(),
        )
        .unwrap_err();
        match err {
            SchemaError::Cycle { schema, elements } => {
                assert_eq!(schema, "loop");
                assert_eq!(elements, ["a", "b"]);
            }
            other => panic!("expected a cycle, got {other}"),
        }
    }

    #[test]
    fn unknown_mappers_and_bad_arguments_fail_compilation() {
        let unknown = Schema::compile(
            "test",
            None,
            vec![Element::new("a").with_mapper("frobnicate(b)")],
            default_registry(),
        );
        assert!(matches!(unknown, Err(SchemaError::UnknownMapper { .. })));

        let bad_args = Schema::compile(
            "test",
            None,
            vec![Element::new("a").with_mapper("ifThenElse(==, b)")],
            default_registry(),
        );
        assert!(matches!(bad_args, Err(SchemaError::InvalidArguments { .. })));
    }

    #[test]
    fn duplicate_elements_fail_compilation() {
        let result = Schema::compile(
            "test",
            None,
            vec![Element::new("a"), Element::new("a")],
            default_registry(),
        );
        assert!(matches!(result, Err(SchemaError::DuplicateElement { .. })));
    }

    #[test]
    fn csv_rows_map_through_csv_fields() {
        let schema = Schema::compile(
            "test",
            None,
            vec![
                Element::new("patient_last_name").with_csv_field("Patient_last_name"),
                Element::new("patient_state"),
                Element::new("unsent"),
            ],
            default_registry(),
        )
        .unwrap();
        let record = schema.record_from_csv(
            &["Patient_last_name", "patient_state"],
            &["Doe", "FL"],
        );
        assert_eq!(record.get("patient_last_name").map(String::as_str), Some("Doe"));
        assert_eq!(record.get("patient_state").map(String::as_str), Some("FL"));
        assert!(!record.contains_key("unsent"));
    }
}
