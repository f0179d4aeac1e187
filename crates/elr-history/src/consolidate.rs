//! Log consolidation.
//!
//! Raw logs that share scope, level and message collapse into one entry that
//! lists every item it applies to. Non-item entries come first, then item
//! entries in order of the first item they mention.

#![deny(unsafe_code)]

use elr_model::{ActionLogLevel, ActionLogScope, DetailedActionLog};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedActionLog {
    pub scope: ActionLogScope,
    /// Item indices, one per merged log. `None` outside item scope.
    pub indices: Option<Vec<Option<usize>>>,
    pub tracking_ids: Option<Vec<Option<String>>>,
    #[serde(skip)]
    pub level: ActionLogLevel,
    pub field: Option<String>,
    pub message: String,
}

impl ConsolidatedActionLog {
    fn start(log: &DetailedActionLog) -> Self {
        let is_item = log.scope == ActionLogScope::Item;
        let mut consolidated = Self {
            scope: log.scope,
            indices: is_item.then(Vec::new),
            tracking_ids: is_item.then(Vec::new),
            level: log.level,
            field: if is_item { log.field_mapping.clone() } else { None },
            message: log.message.clone(),
        };
        consolidated.add(log);
        consolidated
    }

    fn add(&mut self, log: &DetailedActionLog) {
        if let (Some(indices), Some(tracking_ids)) = (&mut self.indices, &mut self.tracking_ids) {
            indices.push(log.index);
            tracking_ids.push(log.tracking_id.clone());
        }
    }

    pub fn accepts(&self, log: &DetailedActionLog) -> bool {
        self.scope == log.scope && self.level == log.level && self.message == log.message
    }

    /// Number of raw logs merged into this entry, for item scope.
    pub fn item_count(&self) -> usize {
        self.indices.as_ref().map_or(0, Vec::len)
    }
}

/// Consolidates `logs`, keeping only `level` when one is given.
pub fn consolidate_logs<'a>(
    logs: impl IntoIterator<Item = &'a DetailedActionLog>,
    level: Option<ActionLogLevel>,
) -> Vec<ConsolidatedActionLog> {
    let mut selected: Vec<&DetailedActionLog> = logs
        .into_iter()
        .filter(|log| level.is_none_or(|level| log.level == level))
        .collect();
    selected.sort_by(|a, b| a.message.cmp(&b.message));

    // Stable sorts keep message order within a scope and within an index.
    let (mut ordered, mut items): (Vec<_>, Vec<_>) = selected
        .into_iter()
        .partition(|log| log.scope != ActionLogScope::Item);
    ordered.sort_by_key(|log| log.scope);
    items.sort_by_key(|log| log.index);
    ordered.extend(items);

    let mut consolidated: Vec<ConsolidatedActionLog> = Vec::new();
    for log in ordered {
        match consolidated.iter_mut().find(|c| c.accepts(log)) {
            Some(existing) => existing.add(log),
            None => consolidated.push(ConsolidatedActionLog::start(log)),
        }
    }
    consolidated
}
