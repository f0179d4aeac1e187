//! Receivers a submission was routed to, from the submission's point of view.

#![deny(unsafe_code)]

use chrono::{DateTime, FixedOffset};
use elr_model::{DestinationReport, FilterResult, FilterType};
use serde::Serialize;

/// A report sent to or downloaded by a receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredReport {
    pub report_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub item_count: usize,
}

impl From<&DestinationReport> for DeliveredReport {
    fn from(report: &DestinationReport) -> Self {
        Self {
            report_id: report.report_id.clone(),
            external_name: report.external_name.clone(),
            created_at: report.created_at,
            item_count: report.item_count,
        }
    }
}

/// The public part of a filter result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredItem {
    pub filter_type: FilterType,
    pub filter_name: String,
    pub filtered_tracking_element: String,
    pub filter_args: Vec<String>,
    pub message: String,
}

impl From<&FilterResult> for FilteredItem {
    fn from(filter: &FilterResult) -> Self {
        Self {
            filter_type: filter.filter_type,
            filter_name: filter.filter_name.clone(),
            filtered_tracking_element: filter.filtered_tracking_element.clone(),
            filter_args: filter.filter_args.clone(),
            message: filter.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(rename = "organization_id")]
    pub organization_id: String,
    pub service: String,
    /// Items left after quality filtering.
    pub item_count: usize,
    #[serde(rename = "itemCountBeforeQualityFiltering")]
    pub item_count_before_qual_filter: Option<usize>,
    #[serde(rename = "sending_at", skip_serializing_if = "Option::is_none")]
    pub sending_at: Option<DateTime<FixedOffset>>,
    pub filtered_report_rows: Vec<String>,
    pub filtered_report_items: Vec<FilteredItem>,
    pub sent_reports: Vec<DeliveredReport>,
    pub downloaded_reports: Vec<DeliveredReport>,
}

impl Destination {
    pub fn new(organization_id: impl Into<String>, service: impl Into<String>, item_count: usize) -> Self {
        Self {
            organization_id: organization_id.into(),
            service: service.into(),
            item_count,
            item_count_before_qual_filter: None,
            sending_at: None,
            filtered_report_rows: Vec::new(),
            filtered_report_items: Vec::new(),
            sent_reports: Vec::new(),
            downloaded_reports: Vec::new(),
        }
    }

    pub fn from_report(report: &DestinationReport) -> Self {
        let mut destination = Self::new(
            report.receiving_org.clone(),
            report.receiving_org_svc.clone(),
            report.item_count,
        );
        destination.update_from(report);
        destination
    }

    /// Takes counts and scheduling from a later stage's report.
    pub(crate) fn update_from(&mut self, report: &DestinationReport) {
        self.item_count = report.item_count;
        self.item_count_before_qual_filter = report.item_count_before_qual_filter;
        self.sending_at = report.sending_at();
    }

    /// `org.service`
    pub fn name(&self) -> String {
        format!("{}.{}", self.organization_id, self.service)
    }

    pub fn matches(&self, organization_id: &str, service: &str) -> bool {
        self.organization_id == organization_id && self.service == service
    }

    pub(crate) fn add_filter(&mut self, filter: &FilterResult) {
        let item = FilteredItem::from(filter);
        if !self.filtered_report_items.contains(&item) {
            self.filtered_report_rows.push(filter.message.clone());
            self.filtered_report_items.push(item);
        }
    }

    /// Whether any items made it through filtering to this receiver.
    pub fn has_items(&self) -> bool {
        self.item_count > 0
    }

    /// All items were sent, or all items were downloaded.
    pub fn is_finished(&self) -> bool {
        let sent: usize = self.sent_reports.iter().map(|r| r.item_count).sum();
        let downloaded: usize = self.downloaded_reports.iter().map(|r| r.item_count).sum();
        sent >= self.item_count || downloaded >= self.item_count
    }

    pub(crate) fn completed_at(&self) -> Option<DateTime<FixedOffset>> {
        self.sent_reports
            .iter()
            .chain(&self.downloaded_reports)
            .map(|r| r.created_at)
            .max()
    }
}
