//! Raw action logs recorded while a submission moves through the pipeline.

use serde::{Deserialize, Serialize};

/// What a log entry is about. Declaration order is the display order for
/// non-item scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionLogScope {
    Parameter,
    Report,
    Item,
    Translation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionLogLevel {
    Info,
    Warning,
    Error,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    JurisdictionalFilter,
    QualityFilter,
    RoutingFilter,
    ProcessingModeFilter,
    ConditionFilter,
    MappedConditionFilter,
}

/// Detail attached to `filter` level logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterResult {
    /// Receiver the filter ran for, as `org.service`.
    pub receiver_name: String,
    pub original_count: usize,
    pub filter_name: String,
    #[serde(default)]
    pub filter_args: Vec<String>,
    #[serde(default)]
    pub filtered_tracking_element: String,
    pub filter_type: FilterType,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedActionLog {
    pub scope: ActionLogScope,
    #[serde(rename = "type")]
    pub level: ActionLogLevel,
    #[serde(default)]
    pub report_id: Option<String>,
    /// Item index within the report, for item scoped logs.
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub tracking_id: Option<String>,
    #[serde(default)]
    pub field_mapping: Option<String>,
    pub message: String,
    #[serde(default)]
    pub filter: Option<FilterResult>,
}

impl DetailedActionLog {
    pub fn new(scope: ActionLogScope, level: ActionLogLevel, message: impl Into<String>) -> Self {
        Self {
            scope,
            level,
            report_id: None,
            index: None,
            tracking_id: None,
            field_mapping: None,
            message: message.into(),
            filter: None,
        }
    }

    /// An item scoped log for the item at `index`.
    pub fn item(
        level: ActionLogLevel,
        index: usize,
        tracking_id: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index: Some(index),
            tracking_id: tracking_id.map(str::to_string),
            ..Self::new(ActionLogScope::Item, level, message)
        }
    }

    /// A filter log; its message is the filter's own message.
    pub fn filtered(report_id: Option<&str>, filter: FilterResult) -> Self {
        let message = filter.message.clone();
        Self {
            report_id: report_id.map(str::to_string),
            filter: Some(filter),
            ..Self::new(ActionLogScope::Report, ActionLogLevel::Filter, message)
        }
    }

    #[must_use]
    pub fn with_report_id(mut self, report_id: impl Into<String>) -> Self {
        self.report_id = Some(report_id.into());
        self
    }

    #[must_use]
    pub fn with_field_mapping(mut self, field: impl Into<String>) -> Self {
        self.field_mapping = Some(field.into());
        self
    }
}
