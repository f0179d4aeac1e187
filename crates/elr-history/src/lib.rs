#![deny(unsafe_code)]

pub mod consolidate;
pub mod destination;
pub mod error;
pub mod history;
pub mod snapshot;
pub mod status;

pub use consolidate::{ConsolidatedActionLog, consolidate_logs};
pub use destination::{DeliveredReport, Destination, FilteredItem};
pub use error::{HistoryError, Result};
pub use history::DetailedSubmissionHistory;
pub use snapshot::{ActionRecord, SubmissionSnapshot};
pub use status::SubmissionStatus;
