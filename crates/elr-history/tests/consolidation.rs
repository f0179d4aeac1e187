use elr_history::consolidate_logs;
use elr_model::{ActionLogLevel, ActionLogScope, DetailedActionLog};
use proptest::prelude::*;

fn item(level: ActionLogLevel, index: usize, message: &str) -> DetailedActionLog {
    DetailedActionLog::item(level, index, Some(&format!("t-{index}")), message)
}

fn report(level: ActionLogLevel, message: &str) -> DetailedActionLog {
    DetailedActionLog::new(ActionLogScope::Report, level, message)
}

#[test]
fn level_is_part_of_the_merge_key() {
    let logs = [
        item(ActionLogLevel::Error, 0, "Invalid date"),
        item(ActionLogLevel::Warning, 1, "Invalid date"),
        item(ActionLogLevel::Error, 2, "Invalid date"),
    ];
    let all = consolidate_logs(&logs, None);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].level, ActionLogLevel::Error);
    assert_eq!(all[0].indices, Some(vec![Some(0), Some(2)]));
    assert_eq!(all[1].indices, Some(vec![Some(1)]));

    let warnings = consolidate_logs(&logs, Some(ActionLogLevel::Warning));
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].tracking_ids, Some(vec![Some("t-1".to_string())]));
}

#[test]
fn report_scope_first_then_items_by_smallest_index() {
    let logs = [
        item(ActionLogLevel::Error, 4, "b"),
        report(ActionLogLevel::Error, "zeta"),
        item(ActionLogLevel::Error, 1, "c"),
        report(ActionLogLevel::Error, "alpha"),
        item(ActionLogLevel::Error, 3, "a"),
        item(ActionLogLevel::Error, 5, "c"),
    ];
    let consolidated = consolidate_logs(&logs, Some(ActionLogLevel::Error));
    let messages: Vec<&str> = consolidated.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(messages, ["alpha", "zeta", "c", "a", "b"]);
    assert_eq!(consolidated[2].indices, Some(vec![Some(1), Some(5)]));
}

#[test]
fn scope_is_part_of_the_merge_key() {
    let logs = [
        report(ActionLogLevel::Error, "Missing header"),
        item(ActionLogLevel::Error, 0, "Missing header"),
    ];
    assert_eq!(consolidate_logs(&logs, None).len(), 2);
}

#[test]
fn consolidated_json() {
    let logs = [
        item(ActionLogLevel::Warning, 2, "Invalid phone number")
            .with_field_mapping("patient_phone_number (Patient_phone)"),
        item(ActionLogLevel::Warning, 0, "Invalid phone number")
            .with_field_mapping("patient_phone_number (Patient_phone)"),
        report(ActionLogLevel::Warning, "Report has no receivers"),
    ];
    insta::assert_json_snapshot!("consolidated_warnings", consolidate_logs(&logs, None));
}

proptest! {
    #[test]
    fn identical_logs_collapse_to_one(indices in prop::collection::vec(0usize..500, 1..40)) {
        let logs: Vec<DetailedActionLog> = indices
            .iter()
            .map(|&i| item(ActionLogLevel::Error, i, "Invalid value"))
            .collect();
        let consolidated = consolidate_logs(&logs, None);
        prop_assert_eq!(consolidated.len(), 1);
        prop_assert_eq!(consolidated[0].item_count(), indices.len());
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        let merged: Vec<usize> = consolidated[0]
            .indices
            .iter()
            .flatten()
            .flatten()
            .copied()
            .collect();
        prop_assert_eq!(merged, sorted);
    }
}
