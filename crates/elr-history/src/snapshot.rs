//! Persisted pipeline state read for one submission.
//!
//! A snapshot is everything the aggregator needs, read in one go: the
//! receive action with the root report, and every descendant action recorded
//! so far by later stages.

#![deny(unsafe_code)]

use std::io::Read;

use chrono::{DateTime, FixedOffset};
use elr_model::{ActionLogLevel, DetailedActionLog, ReportRecord, TaskAction};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One pipeline action with the reports and logs it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub action_id: i64,
    pub action_name: TaskAction,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub http_status: Option<u16>,
    #[serde(default)]
    pub reports: Vec<ReportRecord>,
    #[serde(default)]
    pub logs: Vec<DetailedActionLog>,
}

impl ActionRecord {
    pub fn new(action_id: i64, action_name: TaskAction, created_at: DateTime<FixedOffset>) -> Self {
        Self {
            action_id,
            action_name,
            created_at,
            http_status: None,
            reports: Vec::new(),
            logs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    #[must_use]
    pub fn with_report(mut self, report: ReportRecord) -> Self {
        self.reports.push(report);
        self
    }

    #[must_use]
    pub fn with_log(mut self, log: DetailedActionLog) -> Self {
        self.logs.push(log);
        self
    }

    pub(crate) fn count_level(&self, level: ActionLogLevel) -> usize {
        self.logs.iter().filter(|l| l.level == level).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSnapshot {
    /// The receive action that started the submission.
    pub action: ActionRecord,
    #[serde(default)]
    pub descendants: Vec<ActionRecord>,
}

impl SubmissionSnapshot {
    pub fn new(action: ActionRecord) -> Self {
        Self {
            action,
            descendants: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_descendant(mut self, descendant: ActionRecord) -> Self {
        self.descendants.push(descendant);
        self
    }

    pub fn from_json(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}
