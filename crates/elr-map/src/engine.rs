//! Record mapping.
//!
//! [`MappingEngine::map_record`] resolves every element of a compiled schema
//! for one record. Configuration problems reported by mappers are collected
//! per field instead of failing the record; only a [`MapperError`] aborts it.

#![deny(unsafe_code)]

use std::collections::BTreeMap;

use elr_model::{ActionLogLevel, DetailedActionLog, Element, ElementAndValue, Sender};
use elr_tables::TableRegistry;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::MapperError;
use crate::mapper::MapContext;
use crate::schema::{MapperBinding, Schema};

/// A problem with one field of a mapped record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldLog {
    /// Element name and its output binding, e.g. `equipment_model_name (OBX-17)`.
    pub field: String,
    pub level: ActionLogLevel,
    pub message: String,
}

/// Resolved element values of one record, in schema declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedRecord {
    pub values: Vec<(String, String)>,
    pub logs: Vec<FieldLog>,
}

impl MappedRecord {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(element, _)| element == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn errors(&self) -> impl Iterator<Item = &FieldLog> {
        self.logs.iter().filter(|l| l.level == ActionLogLevel::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &FieldLog> {
        self.logs.iter().filter(|l| l.level == ActionLogLevel::Warning)
    }

    /// Item-scoped action logs for the record at `index` of its report.
    pub fn to_action_logs(&self, index: usize, tracking_id: Option<&str>) -> Vec<DetailedActionLog> {
        self.logs
            .iter()
            .map(|log| {
                DetailedActionLog::item(log.level, index, tracking_id, log.message.clone())
                    .with_field_mapping(log.field.clone())
            })
            .collect()
    }
}

/// Maps records through one compiled schema against one table snapshot.
#[derive(Debug, Clone, Copy)]
pub struct MappingEngine<'a> {
    schema: &'a Schema<'a>,
    tables: &'a TableRegistry,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

impl<'a> MappingEngine<'a> {
    pub fn new(schema: &'a Schema<'a>, tables: &'a TableRegistry) -> Self {
        Self { schema, tables }
    }

    pub fn schema(&self) -> &Schema<'a> {
        self.schema
    }

    /// Resolves every element of the schema for `record`, keyed by element name.
    pub fn map_record(
        &self,
        record: &BTreeMap<String, String>,
        sender: Option<&Sender>,
    ) -> Result<MappedRecord, MapperError> {
        let mut ctx = MapContext::new(self.tables);
        if let Some(sender) = sender {
            ctx = ctx.with_sender(sender);
        }

        let mut resolved: BTreeMap<&str, String> = BTreeMap::new();
        let mut logs = Vec::new();
        for (element, binding) in self.schema.resolution_order() {
            let sent = non_blank(record.get(&element.name));
            let mut value = sent.map(str::to_string);

            if let Some(binding) = binding
                && (value.is_none() || element.mapper_overrides_value)
            {
                let inputs = self.mapper_inputs(element, binding, record, &resolved);
                let result = binding
                    .mapper
                    .apply(element, &binding.args, &inputs, &ctx)
                    .map_err(|e| e.for_element(&element.name))?;
                let reports = result
                    .errors
                    .into_iter()
                    .map(|m| (ActionLogLevel::Error, m))
                    .chain(result.warnings.into_iter().map(|m| (ActionLogLevel::Warning, m)));
                for (level, message) in reports {
                    if element.is_output() {
                        logs.push(FieldLog {
                            field: element.field_mapping(),
                            level,
                            message,
                        });
                    } else {
                        warn!(
                            schema = self.schema.name(),
                            element = %element.name,
                            mapper = binding.mapper.name(),
                            "{message}"
                        );
                    }
                }
                value = result.value;
            }

            if element.default_overrides_value && element.default.is_some() {
                value.clone_from(&element.default);
            } else if value.is_none() {
                value.clone_from(&element.default);
            }
            resolved.insert(element.name.as_str(), value.unwrap_or_default());
        }

        debug!(
            schema = self.schema.name(),
            elements = resolved.len(),
            logs = logs.len(),
            "mapped record"
        );
        let values = self
            .schema
            .elements()
            .iter()
            .map(|e| {
                let value = resolved.get(e.name.as_str()).cloned().unwrap_or_default();
                (e.name.clone(), value)
            })
            .collect();
        Ok(MappedRecord { values, logs })
    }

    /// Non-blank values of the siblings a mapper reads. An element naming
    /// itself reads what the sender supplied for it.
    fn mapper_inputs(
        &self,
        element: &Element,
        binding: &MapperBinding<'_>,
        record: &BTreeMap<String, String>,
        resolved: &BTreeMap<&str, String>,
    ) -> Vec<ElementAndValue> {
        binding
            .value_names
            .iter()
            .filter_map(|name| {
                let value = if *name == element.name {
                    non_blank(record.get(name))
                } else {
                    resolved
                        .get(name.as_str())
                        .map(String::as_str)
                        .filter(|v| !v.trim().is_empty())
                }?;
                let sibling = self.schema.element(name)?;
                Some(ElementAndValue::new(sibling.clone(), value))
            })
            .collect()
    }
}
