use chrono::{DateTime, FixedOffset};
use elr_history::{
    ActionRecord, DetailedSubmissionHistory, HistoryError, SubmissionSnapshot, SubmissionStatus,
};
use elr_model::{
    ActionLogLevel, ActionLogScope, DestinationReport, DetailedActionLog, FilterResult,
    FilterType, InputReport, ReportRecord, TaskAction,
};

fn ts(value: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value).unwrap()
}

fn input(report_id: &str, item_count: usize) -> ReportRecord {
    ReportRecord::Input(InputReport {
        report_id: report_id.to_string(),
        sending_org: "simple_report".to_string(),
        sending_org_client: Some("default".to_string()),
        schema_topic: Some("covid-19".to_string()),
        external_name: Some("upload.csv".to_string()),
        created_at: ts("2023-03-01T10:00:00Z"),
        item_count,
    })
}

fn destination(report_id: &str, org: &str, item_count: usize, created_at: &str) -> DestinationReport {
    DestinationReport {
        report_id: report_id.to_string(),
        receiving_org: org.to_string(),
        receiving_org_svc: "elr".to_string(),
        schema_topic: Some("covid-19".to_string()),
        external_name: None,
        created_at: ts(created_at),
        next_action_at: Some(ts("2023-03-01T10:10:00Z")),
        next_action_filtered: false,
        item_count,
        item_count_before_qual_filter: Some(item_count),
        receiver_has_transport: true,
    }
}

fn receive(item_count: usize) -> ActionRecord {
    ActionRecord::new(42, TaskAction::Receive, ts("2023-03-01T10:00:00Z"))
        .with_http_status(201)
        .with_report(input("a1", item_count))
}

fn action(id: i64, name: TaskAction, reports: Vec<DestinationReport>) -> ActionRecord {
    reports.into_iter().fold(
        ActionRecord::new(id, name, ts("2023-03-01T10:05:00Z")),
        |action, report| action.with_report(ReportRecord::Destination(report)),
    )
}

fn filter_log(receiver: &str, report_id: Option<&str>) -> DetailedActionLog {
    DetailedActionLog::filtered(
        report_id,
        FilterResult {
            receiver_name: receiver.to_string(),
            original_count: 5,
            filter_name: "hasValidDataFor".to_string(),
            filter_args: vec!["patient_state".to_string()],
            filtered_tracking_element: "t-3".to_string(),
            filter_type: FilterType::QualityFilter,
            message: "Filtered out item t-3".to_string(),
        },
    )
}

#[test]
fn receive_only_is_received() {
    let snapshot = SubmissionSnapshot::new(
        ActionRecord::new(7, TaskAction::Receive, ts("2023-03-01T10:00:00Z")).with_http_status(200),
    );
    let history = DetailedSubmissionHistory::from_snapshot(&snapshot).unwrap();
    assert_eq!(history.overall_status, SubmissionStatus::Received);
    assert!(history.destinations.is_empty());
    assert_eq!(history.destination_count, 0);
    assert_eq!(history.planned_completion_at, None);
    assert_eq!(history.id, None);
    assert_eq!(history.sender, "");
}

#[test]
fn routed_destination_waits_to_deliver() {
    let snapshot = SubmissionSnapshot::new(receive(5)).with_descendant(action(
        43,
        TaskAction::Route,
        vec![destination("d1", "ca-dph", 5, "2023-03-01T10:05:00Z")],
    ));
    let history = DetailedSubmissionHistory::from_snapshot(&snapshot).unwrap();
    assert_eq!(history.overall_status, SubmissionStatus::WaitingToDeliver);
    assert_eq!(history.destination_count, 1);
    assert_eq!(history.report_item_count, Some(5));
    assert_eq!(history.id.as_deref(), Some("a1"));
    assert_eq!(history.sender, "simple_report.default");
    assert_eq!(history.planned_completion_at, Some(ts("2023-03-01T10:10:00Z")));
    assert_eq!(history.actual_completion_at, None);
}

#[test]
fn universal_pipeline_stages_count_as_routing() {
    let snapshot = SubmissionSnapshot::new(receive(5))
        .with_descendant(action(
            44,
            TaskAction::ReceiverFilter,
            vec![destination("d2", "ca-dph", 3, "2023-03-01T10:06:00Z")],
        ))
        .with_descendant(action(
            43,
            TaskAction::DestinationFilter,
            vec![destination("d1", "ca-dph", 5, "2023-03-01T10:05:00Z")],
        ));
    let history = DetailedSubmissionHistory::from_snapshot(&snapshot).unwrap();
    assert!(history.routed());
    assert_eq!(history.overall_status, SubmissionStatus::WaitingToDeliver);
    assert_eq!(history.destinations.len(), 1);
    // The receiver filter runs after the destination filter and wins.
    assert_eq!(history.destinations[0].item_count, 3);
}

#[test]
fn delivery_progresses_to_delivered() {
    let routed = SubmissionSnapshot::new(receive(5)).with_descendant(action(
        43,
        TaskAction::Route,
        vec![
            destination("d1", "ca-dph", 2, "2023-03-01T10:05:00Z"),
            destination("d2", "md-phd", 3, "2023-03-01T10:05:00Z"),
            destination("d3", "tx-doh", 0, "2023-03-01T10:05:00Z"),
        ],
    ));
    let sent = routed.clone().with_descendant(action(
        45,
        TaskAction::Send,
        vec![destination("s1", "ca-dph", 2, "2023-03-01T10:11:00Z")],
    ));

    let partial = DetailedSubmissionHistory::from_snapshot(&sent).unwrap();
    assert_eq!(partial.overall_status, SubmissionStatus::PartiallyDelivered);
    assert_eq!(partial.destination_count, 2);
    assert_eq!(partial.actual_completion_at, None);

    let downloaded = sent.with_descendant(action(
        46,
        TaskAction::Download,
        vec![destination("s2", "md-phd", 3, "2023-03-01T11:30:00Z")],
    ));
    let delivered = DetailedSubmissionHistory::from_snapshot(&downloaded).unwrap();
    assert_eq!(delivered.overall_status, SubmissionStatus::Delivered);
    assert_eq!(delivered.actual_completion_at, Some(ts("2023-03-01T11:30:00Z")));
    assert_eq!(delivered.destinations[1].downloaded_reports.len(), 1);

    let again = DetailedSubmissionHistory::from_snapshot(&downloaded).unwrap();
    assert_eq!(again, delivered);
}

#[test]
fn destinations_on_the_receive_action_count_as_routed() {
    let received = SubmissionSnapshot::new(
        receive(2).with_report(ReportRecord::Destination(destination(
            "d1",
            "ca-dph",
            2,
            "2023-03-01T10:00:00Z",
        ))),
    );
    let waiting = DetailedSubmissionHistory::from_snapshot(&received).unwrap();
    assert!(waiting.routed());
    assert_eq!(waiting.overall_status, SubmissionStatus::WaitingToDeliver);
    assert_eq!(waiting.destination_count, 1);

    let sent = received.with_descendant(action(
        45,
        TaskAction::Send,
        vec![destination("s1", "ca-dph", 2, "2023-03-01T10:11:00Z")],
    ));
    let delivered = DetailedSubmissionHistory::from_snapshot(&sent).unwrap();
    assert_eq!(delivered.overall_status, SubmissionStatus::Delivered);
    assert_eq!(delivered.destinations.len(), 1);
    assert_eq!(delivered.destinations[0].sent_reports.len(), 1);
    assert_eq!(delivered.actual_completion_at, Some(ts("2023-03-01T10:11:00Z")));
}

#[test]
fn deliveries_to_unknown_receivers_add_destinations() {
    let snapshot = SubmissionSnapshot::new(receive(2))
        .with_descendant(action(43, TaskAction::Route, Vec::new()))
        .with_descendant(action(
            45,
            TaskAction::Send,
            vec![destination("s1", "ca-dph", 2, "2023-03-01T10:11:00Z")],
        ));
    let history = DetailedSubmissionHistory::from_snapshot(&snapshot).unwrap();
    assert_eq!(history.destinations.len(), 1);
    assert_eq!(history.destinations[0].sent_reports.len(), 1);
    assert_eq!(history.overall_status, SubmissionStatus::Delivered);
}

#[test]
fn fully_filtered_submission_lists_receivers_without_items() {
    let filtered = action(43, TaskAction::ReceiverFilter, Vec::new())
        .with_log(filter_log("ca-dph.elr", None))
        .with_log(filter_log("md-phd.elr", None));
    let snapshot = SubmissionSnapshot::new(receive(5)).with_descendant(filtered);
    let history = DetailedSubmissionHistory::from_snapshot(&snapshot).unwrap();

    assert_eq!(history.overall_status, SubmissionStatus::Received);
    assert_eq!(history.destination_count, 0);
    let names: Vec<String> = history.destinations.iter().map(|d| d.name()).collect();
    assert_eq!(names, ["ca-dph.elr", "md-phd.elr"]);
    let first = &history.destinations[0];
    assert_eq!(first.item_count, 0);
    assert_eq!(first.item_count_before_qual_filter, Some(5));
    assert_eq!(first.filtered_report_rows, ["Filtered out item t-3"]);
    assert_eq!(first.filtered_report_items[0].filter_name, "hasValidDataFor");
}

#[test]
fn filter_logs_attach_to_their_destination_report() {
    let routed = action(
        43,
        TaskAction::Route,
        vec![destination("d1", "ca-dph", 4, "2023-03-01T10:05:00Z")],
    )
    .with_log(filter_log("ca-dph.elr", Some("d1")));
    let snapshot = SubmissionSnapshot::new(receive(5)).with_descendant(routed);
    let history = DetailedSubmissionHistory::from_snapshot(&snapshot).unwrap();
    assert_eq!(history.destinations.len(), 1);
    // Matched both by report id and by receiver name, recorded once.
    assert_eq!(history.destinations[0].filtered_report_items.len(), 1);
}

#[test]
fn rejected_submission_is_an_error() {
    let action = ActionRecord::new(42, TaskAction::Receive, ts("2023-03-01T10:00:00Z"))
        .with_http_status(400)
        .with_report(input("a1", 2))
        .with_log(DetailedActionLog::new(
            ActionLogScope::Report,
            ActionLogLevel::Error,
            "Expecting a post message with content",
        ))
        .with_log(DetailedActionLog::item(
            ActionLogLevel::Error,
            1,
            Some("t-1"),
            "Missing patient_last_name",
        ))
        .with_log(DetailedActionLog::item(
            ActionLogLevel::Error,
            2,
            Some("t-2"),
            "Missing patient_last_name",
        ));
    let history =
        DetailedSubmissionHistory::from_snapshot(&SubmissionSnapshot::new(action)).unwrap();

    assert_eq!(history.overall_status, SubmissionStatus::Error);
    assert_eq!(history.id, None, "rejected submissions hide their report id");
    assert_eq!(history.error_count, 3);
    assert_eq!(history.errors.len(), 2);
    assert_eq!(history.errors[0].scope, ActionLogScope::Report);
    assert_eq!(history.errors[1].indices, Some(vec![Some(1), Some(2)]));
    assert_eq!(history.http_status, Some(400));
}

#[test]
fn routing_warnings_join_the_submission_logs() {
    let routed = action(
        43,
        TaskAction::Route,
        vec![destination("d1", "ca-dph", 1, "2023-03-01T10:05:00Z")],
    )
    .with_log(DetailedActionLog::item(
        ActionLogLevel::Warning,
        0,
        None,
        "Invalid field equipment_model_name (OBX-17)",
    ));
    let snapshot = SubmissionSnapshot::new(receive(1)).with_descendant(routed);
    let history = DetailedSubmissionHistory::from_snapshot(&snapshot).unwrap();
    assert_eq!(history.warning_count, 1);
    assert_eq!(history.warnings.len(), 1);
    assert_eq!(history.errors.len(), 0);
}

#[test]
fn rejects_inconsistent_snapshots() {
    let two_roots = SubmissionSnapshot::new(receive(1).with_report(input("a2", 1)));
    assert!(matches!(
        DetailedSubmissionHistory::from_snapshot(&two_roots),
        Err(HistoryError::MultipleInputReports { .. })
    ));

    let duplicated = SubmissionSnapshot::new(receive(1))
        .with_descendant(action(43, TaskAction::Route, Vec::new()))
        .with_descendant(action(43, TaskAction::Send, Vec::new()));
    assert!(matches!(
        DetailedSubmissionHistory::from_snapshot(&duplicated),
        Err(HistoryError::DuplicateDescendant { action_id: 43 })
    ));
}

fn waiting_history() -> DetailedSubmissionHistory {
    let receive = receive(5).with_log(
        DetailedActionLog::item(ActionLogLevel::Warning, 1, Some("t-1"), "Invalid phone number")
            .with_field_mapping("patient_phone_number (Patient_phone)"),
    );
    let snapshot = SubmissionSnapshot::new(receive).with_descendant(action(
        43,
        TaskAction::Route,
        vec![destination("d1", "ca-dph", 5, "2023-03-01T10:05:00Z")],
    ));
    DetailedSubmissionHistory::from_snapshot(&snapshot).unwrap()
}

#[test]
fn json_keeps_the_public_field_order() {
    let json = serde_json::to_string(&waiting_history()).unwrap();
    let keys = [
        "\"id\"",
        "\"submissionId\"",
        "\"overallStatus\"",
        "\"timestamp\"",
        "\"plannedCompletionAt\"",
        "\"actualCompletionAt\"",
        "\"sender\"",
        "\"reportItemCount\"",
        "\"errorCount\"",
        "\"warningCount\"",
        "\"httpStatus\"",
        "\"destinations\"",
        "\"destinationCount\"",
        "\"actionName\"",
        "\"externalName\"",
        "\"topic\"",
        "\"errors\"",
        "\"warnings\"",
    ];
    let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
    assert!(json.contains("\"overallStatus\":\"WAITING_TO_DELIVER\""));
}

#[test]
fn waiting_history_json() {
    insta::assert_json_snapshot!("waiting_to_deliver", waiting_history());
}

#[test]
fn snapshot_reads_from_json() {
    let json = r#"{
        "action": {
            "actionId": 42,
            "actionName": "receive",
            "createdAt": "2023-03-01T10:00:00Z",
            "httpStatus": 201,
            "reports": [{
                "kind": "input",
                "reportId": "a1",
                "sendingOrg": "simple_report",
                "createdAt": "2023-03-01T10:00:00Z",
                "itemCount": 5
            }]
        },
        "descendants": [{
            "actionId": 43,
            "actionName": "destination_filter",
            "createdAt": "2023-03-01T10:05:00Z",
            "reports": [{
                "kind": "destination",
                "reportId": "d1",
                "receivingOrg": "ca-dph",
                "receivingOrgSvc": "elr",
                "createdAt": "2023-03-01T10:05:00Z",
                "itemCount": 5
            }]
        }]
    }"#;
    let snapshot = SubmissionSnapshot::from_json(json.as_bytes()).unwrap();
    let history = DetailedSubmissionHistory::from_snapshot(&snapshot).unwrap();
    assert_eq!(history.sender, "simple_report");
    assert_eq!(history.overall_status, SubmissionStatus::WaitingToDeliver);
    assert_eq!(history.planned_completion_at, None);

    assert!(matches!(
        SubmissionSnapshot::from_json("{}".as_bytes()),
        Err(HistoryError::Snapshot(_))
    ));
}
