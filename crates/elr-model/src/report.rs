//! Report records produced by pipeline stages.
//!
//! Every report in a submission's graph is either the single root
//! [`InputReport`] received from a sender or a [`DestinationReport`] derived
//! for one receiver during routing, translation, batching or delivery.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::ElrError;

/// Pipeline stage that recorded an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    Receive,
    /// Legacy pipeline: combined routing and translation.
    Process,
    Convert,
    /// Legacy single-stage routing.
    Route,
    DestinationFilter,
    ReceiverFilter,
    Translate,
    Batch,
    Send,
    Download,
}

impl TaskAction {
    pub const ALL: &'static [TaskAction] = &[
        TaskAction::Receive,
        TaskAction::Process,
        TaskAction::Convert,
        TaskAction::Route,
        TaskAction::DestinationFilter,
        TaskAction::ReceiverFilter,
        TaskAction::Translate,
        TaskAction::Batch,
        TaskAction::Send,
        TaskAction::Download,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Receive => "receive",
            Self::Process => "process",
            Self::Convert => "convert",
            Self::Route => "route",
            Self::DestinationFilter => "destination_filter",
            Self::ReceiverFilter => "receiver_filter",
            Self::Translate => "translate",
            Self::Batch => "batch",
            Self::Send => "send",
            Self::Download => "download",
        }
    }

    /// Stages whose presence proves routing has happened, in either pipeline.
    pub fn is_routing(self) -> bool {
        matches!(
            self,
            Self::Process | Self::Route | Self::DestinationFilter | Self::ReceiverFilter
        )
    }

    /// Stages that produce per-receiver destination reports.
    pub fn produces_destinations(self) -> bool {
        matches!(
            self,
            Self::Process
                | Self::Route
                | Self::DestinationFilter
                | Self::ReceiverFilter
                | Self::Translate
                | Self::Batch
        )
    }

    /// Stages that record delivery to a receiver.
    pub fn is_delivery(self) -> bool {
        matches!(self, Self::Send | Self::Download)
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskAction {
    type Err = ElrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ElrError::UnknownVariant {
                kind: "task action",
                value: s.to_string(),
            })
    }
}

/// The report received from a sender: the root of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputReport {
    pub report_id: String,
    pub sending_org: String,
    #[serde(default)]
    pub sending_org_client: Option<String>,
    #[serde(default)]
    pub schema_topic: Option<String>,
    #[serde(default)]
    pub external_name: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub item_count: usize,
}

impl InputReport {
    /// `org.client`, or just `org` when no client is known.
    pub fn sender_name(&self) -> String {
        match self.sending_org_client.as_deref().map(str::trim) {
            Some(client) if !client.is_empty() => format!("{}.{client}", self.sending_org),
            _ => self.sending_org.clone(),
        }
    }
}

/// A report derived for one receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationReport {
    pub report_id: String,
    pub receiving_org: String,
    pub receiving_org_svc: String,
    #[serde(default)]
    pub schema_topic: Option<String>,
    #[serde(default)]
    pub external_name: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub next_action_at: Option<DateTime<FixedOffset>>,
    /// The receiver filtered everything out; no further action follows.
    #[serde(default)]
    pub next_action_filtered: bool,
    pub item_count: usize,
    #[serde(default)]
    pub item_count_before_qual_filter: Option<usize>,
    #[serde(default = "default_true")]
    pub receiver_has_transport: bool,
}

fn default_true() -> bool {
    true
}

impl DestinationReport {
    /// `org.service`
    pub fn receiver_name(&self) -> String {
        format!("{}.{}", self.receiving_org, self.receiving_org_svc)
    }

    /// When the next pipeline action is scheduled, if one will run at all.
    pub fn sending_at(&self) -> Option<DateTime<FixedOffset>> {
        if self.receiver_has_transport && !self.next_action_filtered {
            self.next_action_at
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportRecord {
    Input(InputReport),
    Destination(DestinationReport),
}

impl ReportRecord {
    pub fn report_id(&self) -> &str {
        match self {
            Self::Input(r) => &r.report_id,
            Self::Destination(r) => &r.report_id,
        }
    }

    pub fn created_at(&self) -> DateTime<FixedOffset> {
        match self {
            Self::Input(r) => r.created_at,
            Self::Destination(r) => r.created_at,
        }
    }

    pub fn item_count(&self) -> usize {
        match self {
            Self::Input(r) => r.item_count,
            Self::Destination(r) => r.item_count,
        }
    }

    pub fn as_destination(&self) -> Option<&DestinationReport> {
        match self {
            Self::Destination(r) => Some(r),
            Self::Input(_) => None,
        }
    }

    pub fn as_input(&self) -> Option<&InputReport> {
        match self {
            Self::Input(r) => Some(r),
            Self::Destination(_) => None,
        }
    }
}
