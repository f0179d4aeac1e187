#![deny(unsafe_code)]

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("submission has more than one input report: {first} and {second}")]
    MultipleInputReports { first: String, second: String },

    #[error("descendant action {action_id} appears more than once")]
    DuplicateDescendant { action_id: i64 },

    #[error("invalid submission snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HistoryError>;
