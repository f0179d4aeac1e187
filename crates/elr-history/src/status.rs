#![deny(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::destination::Destination;

/// How far a submission has progressed through the pipeline.
///
/// Always derived from the current snapshot; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    /// The receive step failed. Overrides every other signal.
    Error,
    /// Accepted, but not routed to any receiver with data yet.
    Received,
    WaitingToDeliver,
    PartiallyDelivered,
    Delivered,
}

impl SubmissionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Received => "Received",
            Self::WaitingToDeliver => "Waiting to Deliver",
            Self::PartiallyDelivered => "Partially Delivered",
            Self::Delivered => "Delivered",
        }
    }

    /// Statuses that carry a planned completion time.
    pub fn is_delivering(self) -> bool {
        matches!(
            self,
            Self::WaitingToDeliver | Self::PartiallyDelivered | Self::Delivered
        )
    }

    /// Derives the status from the receive step's HTTP status, whether the
    /// submission has been routed, and the destinations found so far.
    pub fn derive(http_status: Option<u16>, routed: bool, destinations: &[Destination]) -> Self {
        if http_status.is_some_and(|status| status >= 400) {
            return Self::Error;
        }
        if !routed {
            return Self::Received;
        }

        let mut with_items = 0;
        let mut finished = 0;
        for destination in destinations.iter().filter(|d| d.has_items()) {
            with_items += 1;
            if destination.is_finished() {
                finished += 1;
            }
        }

        if with_items == 0 {
            Self::Received
        } else if finished == with_items {
            Self::Delivered
        } else if finished > 0 {
            Self::PartiallyDelivered
        } else {
            Self::WaitingToDeliver
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination(item_count: usize, sent: &[usize]) -> Destination {
        let mut destination = Destination::new("ca-dph", "elr", item_count);
        for (i, count) in sent.iter().enumerate() {
            destination.sent_reports.push(crate::destination::DeliveredReport {
                report_id: format!("sent-{i}"),
                external_name: None,
                created_at: chrono::DateTime::parse_from_rfc3339("2023-01-01T12:00:00Z")
                    .unwrap(),
                item_count: *count,
            });
        }
        destination
    }

    #[test]
    fn error_status_is_absorbing() {
        let delivered = [destination(2, &[2])];
        assert_eq!(
            SubmissionStatus::derive(Some(400), true, &delivered),
            SubmissionStatus::Error
        );
        assert_eq!(
            SubmissionStatus::derive(Some(500), false, &[]),
            SubmissionStatus::Error
        );
        assert_eq!(
            SubmissionStatus::derive(Some(201), true, &delivered),
            SubmissionStatus::Delivered
        );
    }

    #[test]
    fn unrouted_or_fully_filtered_is_received() {
        assert_eq!(
            SubmissionStatus::derive(Some(200), false, &[destination(3, &[])]),
            SubmissionStatus::Received
        );
        assert_eq!(
            SubmissionStatus::derive(Some(200), true, &[destination(0, &[])]),
            SubmissionStatus::Received
        );
    }

    #[test]
    fn delivery_progress() {
        let waiting = [destination(2, &[]), destination(3, &[])];
        assert_eq!(
            SubmissionStatus::derive(None, true, &waiting),
            SubmissionStatus::WaitingToDeliver
        );
        let partial = [destination(2, &[1, 1]), destination(3, &[2])];
        assert_eq!(
            SubmissionStatus::derive(None, true, &partial),
            SubmissionStatus::PartiallyDelivered
        );
        let done = [destination(2, &[2]), destination(3, &[3]), destination(0, &[])];
        assert_eq!(
            SubmissionStatus::derive(None, true, &done),
            SubmissionStatus::Delivered
        );
    }

    #[test]
    fn serializes_screaming_snake() {
        let json = serde_json::to_string(&SubmissionStatus::WaitingToDeliver).unwrap();
        assert_eq!(json, "\"WAITING_TO_DELIVER\"");
        assert_eq!(SubmissionStatus::PartiallyDelivered.to_string(), "Partially Delivered");
    }
}
