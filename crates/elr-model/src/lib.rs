#![deny(unsafe_code)]

pub mod action_log;
pub mod element;
pub mod error;
pub mod lookup;
pub mod report;
pub mod result;
pub mod sender;

pub use action_log::{ActionLogLevel, ActionLogScope, DetailedActionLog, FilterResult, FilterType};
pub use element::{Element, ElementAndValue, ElementType};
pub use error::{ElrError, Result};
pub use lookup::CaseInsensitiveSet;
pub use report::{DestinationReport, InputReport, ReportRecord, TaskAction};
pub use result::MapperResult;
pub use sender::{CustomerStatus, Format, ProcessingType, Sender};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapper_result_distinguishes_outcomes() {
        let found = MapperResult::value("A");
        let absent = MapperResult::empty();
        let broken = MapperResult::error("Schema Error: could not find table 'zip'");
        assert!(found.value.is_some() && !found.is_config_error());
        assert!(absent.value.is_none() && !absent.is_config_error());
        assert!(broken.value.is_none() && broken.is_config_error());
    }

    #[test]
    fn report_record_serializes_with_kind_tag() {
        let report = ReportRecord::Input(InputReport {
            report_id: "a2cf1c46-7689-4819-98de-520b5007e45f".to_string(),
            sending_org: "ignore".to_string(),
            sending_org_client: Some("ignore-full-elr".to_string()),
            schema_topic: Some("full-elr".to_string()),
            external_name: Some("report.hl7".to_string()),
            created_at: chrono::DateTime::parse_from_rfc3339("2023-01-01T10:00:00Z")
                .expect("timestamp"),
            item_count: 5,
        });
        let json = serde_json::to_value(&report).expect("serialize report");
        assert_eq!(json["kind"], "input");
        assert_eq!(json["sendingOrg"], "ignore");
    }
}
