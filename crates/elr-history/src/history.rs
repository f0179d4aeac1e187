//! Detailed submission history.
//!
//! [`DetailedSubmissionHistory::from_snapshot`] builds the history of one
//! submission from a freshly read [`SubmissionSnapshot`]:
//!
//! 1. the receive action supplies the root input report and its logs,
//! 2. routing stages (legacy `process`/`route` or universal
//!    `destination_filter`/`receiver_filter`, then `translate` and `batch`)
//!    add destinations and filter results,
//! 3. `send` and `download` actions attach delivered reports,
//! 4. status and completion times are derived from the result.

#![deny(unsafe_code)]

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, FixedOffset};
use elr_model::{ActionLogLevel, DetailedActionLog, InputReport, ReportRecord, TaskAction};
use serde::Serialize;
use tracing::debug;

use crate::consolidate::{ConsolidatedActionLog, consolidate_logs};
use crate::destination::{DeliveredReport, Destination};
use crate::error::{HistoryError, Result};
use crate::snapshot::{ActionRecord, SubmissionSnapshot};
use crate::status::SubmissionStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedSubmissionHistory {
    /// Root report id. Hidden when the submission was rejected with errors.
    pub id: Option<String>,
    pub submission_id: i64,
    pub overall_status: SubmissionStatus,
    pub timestamp: DateTime<FixedOffset>,
    pub planned_completion_at: Option<DateTime<FixedOffset>>,
    pub actual_completion_at: Option<DateTime<FixedOffset>>,
    pub sender: String,
    pub report_item_count: Option<usize>,
    pub error_count: usize,
    pub warning_count: usize,
    pub http_status: Option<u16>,
    pub destinations: Vec<Destination>,
    pub destination_count: usize,
    pub action_name: TaskAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,
    pub topic: Option<String>,
    pub errors: Vec<ConsolidatedActionLog>,
    pub warnings: Vec<ConsolidatedActionLog>,
    /// Every stage seen for this submission.
    #[serde(skip)]
    pub actions_performed: BTreeSet<TaskAction>,
}

impl DetailedSubmissionHistory {
    pub fn from_snapshot(snapshot: &SubmissionSnapshot) -> Result<Self> {
        let mut history = Self::from_action(&snapshot.action)?;
        history.enrich_with_descendants(&snapshot.descendants)?;
        history.enrich_with_summary();
        debug!(
            submission_id = history.submission_id,
            status = %history.overall_status,
            destinations = history.destinations.len(),
            "derived submission history"
        );
        Ok(history)
    }

    /// History of the receive action alone, before any enrichment.
    fn from_action(action: &ActionRecord) -> Result<Self> {
        let error_count = action.count_level(ActionLogLevel::Error);
        let root = root_report(&action.reports)?;

        let mut history = Self {
            id: root
                .filter(|_| error_count == 0)
                .map(|r| r.report_id.clone()),
            submission_id: action.action_id,
            overall_status: SubmissionStatus::Received,
            timestamp: action.created_at,
            planned_completion_at: None,
            actual_completion_at: None,
            sender: root.map(InputReport::sender_name).unwrap_or_default(),
            report_item_count: root.map(|r| r.item_count),
            error_count,
            warning_count: action.count_level(ActionLogLevel::Warning),
            http_status: action.http_status,
            destinations: Vec::new(),
            destination_count: 0,
            action_name: action.action_name,
            external_name: root.and_then(|r| r.external_name.clone()),
            topic: root.and_then(|r| r.schema_topic.clone()),
            errors: Vec::new(),
            warnings: Vec::new(),
            actions_performed: BTreeSet::from([action.action_name]),
        };
        // Synchronous legacy submissions route within the receive action.
        history.add_destinations(action);
        history.errors = consolidate_logs(&action.logs, Some(ActionLogLevel::Error));
        history.warnings = consolidate_logs(&action.logs, Some(ActionLogLevel::Warning));
        Ok(history)
    }

    /// Merges later pipeline actions in stage order.
    pub fn enrich_with_descendants(&mut self, descendants: &[ActionRecord]) -> Result<()> {
        let mut seen = HashSet::new();
        for descendant in descendants {
            if !seen.insert(descendant.action_id) {
                return Err(HistoryError::DuplicateDescendant {
                    action_id: descendant.action_id,
                });
            }
        }

        let mut ordered: Vec<&ActionRecord> = descendants.iter().collect();
        ordered.sort_by_key(|d| (d.action_name, d.action_id));
        self.actions_performed
            .extend(ordered.iter().map(|d| d.action_name));

        let routing: Vec<&ActionRecord> = ordered
            .iter()
            .copied()
            .filter(|d| d.action_name.produces_destinations())
            .collect();
        let mut filter_logs: Vec<&DetailedActionLog> = Vec::new();
        let mut stage_logs: Vec<&DetailedActionLog> = Vec::new();
        for descendant in &routing {
            self.add_destinations(descendant);
            filter_logs.extend(descendant.logs.iter().filter(|l| l.filter.is_some()));
            stage_logs.extend(
                descendant
                    .logs
                    .iter()
                    .filter(|l| matches!(l.level, ActionLogLevel::Error | ActionLogLevel::Warning)),
            );
        }
        self.attach_filters(&filter_logs);

        let count = |level| stage_logs.iter().filter(|l| l.level == level).count();
        self.error_count += count(ActionLogLevel::Error);
        self.warning_count += count(ActionLogLevel::Warning);

        self.errors
            .extend(consolidate_logs(stage_logs.iter().copied(), Some(ActionLogLevel::Error)));
        self.warnings
            .extend(consolidate_logs(stage_logs.iter().copied(), Some(ActionLogLevel::Warning)));

        for descendant in ordered.iter().filter(|d| d.action_name.is_delivery()) {
            self.add_deliveries(descendant);
        }
        Ok(())
    }

    /// Recomputes status, completion times and the destination count.
    pub fn enrich_with_summary(&mut self) {
        self.overall_status =
            SubmissionStatus::derive(self.http_status, self.routed(), &self.destinations);
        let with_items = || self.destinations.iter().filter(|d| d.has_items());

        self.destination_count = with_items().count();
        self.planned_completion_at = if self.overall_status.is_delivering() {
            with_items().filter_map(|d| d.sending_at).max()
        } else {
            None
        };
        self.actual_completion_at = if self.overall_status == SubmissionStatus::Delivered {
            with_items().filter_map(Destination::completed_at).max()
        } else {
            None
        };
    }

    /// Whether a routing stage of either pipeline has run, or a destination
    /// with items was routed within the receive action itself.
    pub fn routed(&self) -> bool {
        self.actions_performed.iter().any(|a| a.is_routing())
            || self.destinations.iter().any(Destination::has_items)
    }

    fn destination_mut(&mut self, organization_id: &str, service: &str) -> Option<&mut Destination> {
        self.destinations
            .iter_mut()
            .find(|d| d.matches(organization_id, service))
    }

    fn add_destinations(&mut self, action: &ActionRecord) {
        let reports = action.reports.iter().filter_map(ReportRecord::as_destination);
        for report in reports {
            match self.destination_mut(&report.receiving_org, &report.receiving_org_svc) {
                Some(existing) => existing.update_from(report),
                None => self.destinations.push(Destination::from_report(report)),
            }
            for log in action.logs.iter().filter(|l| l.report_id.as_deref() == Some(&report.report_id)) {
                if let Some(filter) = &log.filter
                    && let Some(destination) =
                        self.destination_mut(&report.receiving_org, &report.receiving_org_svc)
                {
                    destination.add_filter(filter);
                }
            }
        }
    }

    /// Attaches filter results by receiver name. When everything was filtered
    /// out no destination report exists, so empty destinations are created
    /// from the filter logs.
    fn attach_filters(&mut self, filter_logs: &[&DetailedActionLog]) {
        let create = self.destinations.is_empty();
        for filter in filter_logs.iter().filter_map(|l| l.filter.as_ref()) {
            let (organization_id, service) = filter
                .receiver_name
                .split_once('.')
                .unwrap_or((filter.receiver_name.as_str(), ""));
            if let Some(destination) = self.destination_mut(organization_id, service) {
                destination.add_filter(filter);
            } else if create {
                let mut destination = Destination::new(organization_id, service, 0);
                destination.item_count_before_qual_filter = Some(filter.original_count);
                destination.add_filter(filter);
                self.destinations.push(destination);
            }
        }
    }

    fn add_deliveries(&mut self, action: &ActionRecord) {
        let reports = action.reports.iter().filter_map(ReportRecord::as_destination);
        for report in reports {
            let delivered = DeliveredReport::from(report);
            let position = self
                .destinations
                .iter()
                .position(|d| d.matches(&report.receiving_org, &report.receiving_org_svc));
            let index = position.unwrap_or_else(|| {
                self.destinations.push(Destination::from_report(report));
                self.destinations.len() - 1
            });
            let destination = &mut self.destinations[index];
            if action.action_name == TaskAction::Download {
                destination.downloaded_reports.push(delivered);
            } else {
                destination.sent_reports.push(delivered);
            }
        }
    }

    pub fn error_logs(&self) -> &[ConsolidatedActionLog] {
        &self.errors
    }

    pub fn warning_logs(&self) -> &[ConsolidatedActionLog] {
        &self.warnings
    }
}

/// The single input report among `reports`, if any.
fn root_report(reports: &[ReportRecord]) -> Result<Option<&InputReport>> {
    let mut inputs = reports.iter().filter_map(ReportRecord::as_input);
    let root = inputs.next();
    if let (Some(first), Some(second)) = (root, inputs.next()) {
        return Err(HistoryError::MultipleInputReports {
            first: first.report_id.clone(),
            second: second.report_id.clone(),
        });
    }
    Ok(root)
}
