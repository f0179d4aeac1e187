use std::fs;
use std::path::Path;

use elr_cli::records::{MapTotals, map_csv, parse_filter};
use elr_map::{MappingEngine, Schema, default_registry};
use elr_model::ActionLogLevel;
use elr_tables::MetadataDir;
use elr_tables::hash::sha256_hex;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

const ZIP_CSV: &str = "zipcode,state,county\n32303,FL,Leon\n92101,CA,San Diego\n";

const SCHEMA: &str = r#"
name = "covid-19"
topic = "covid-19"

[[elements]]
name = "patient_zip_code"
type = "POSTAL_CODE"
csv_fields = ["Patient_zip"]

[[elements]]
name = "patient_county"
type = "TABLE"
table = "zip-code-data"
table_column = "county"
mapper = "zipCodeToCounty(patient_zip_code)"
hl7_field = "PID-11-9"

[[elements]]
name = "patient_state"
type = "TABLE"
table = "zip-code-data"
table_column = "state"
mapper = "zipCodeToState(patient_zip_code)"
default = "XX"

[[elements]]
name = "ordering_facility_state"
type = "TABLE"
table = "missing-table"
table_column = "state"
mapper = "zipCodeToState(patient_zip_code)"
hl7_field = "ORC-22-4"
"#;

const SENDERS: &str = r#"
[[senders]]
name = "default"
organization_name = "simple_report"
topic = "covid-19"
schema_name = "covid-19"
processing_type = "sync"
format = "CSV"
customer_status = "active"
"#;

fn manifest(zip_sha: &str) -> String {
    format!(
        r#"[manifest]
schema = "elr.metadata-manifest"
schema_version = 1

[[tables]]
name = "zip-code-data"
path = "tables/zip-code-data.csv"
sha256 = "{zip_sha}"

[[schemas]]
name = "covid-19"
path = "schemas/covid-19.toml"

[[senders]]
path = "senders.toml"
"#
    )
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "tables/zip-code-data.csv", ZIP_CSV);
    write(root, "schemas/covid-19.toml", SCHEMA);
    write(root, "senders.toml", SENDERS);
    write(root, "manifest.toml", &manifest(&sha256_hex(ZIP_CSV.as_bytes())));
    dir
}

#[test]
fn filters_split_on_the_first_equals_sign() {
    assert_eq!(
        parse_filter("Model = BinaxNOW=2"),
        Ok(("Model".to_string(), "BinaxNOW=2".to_string()))
    );
    assert_eq!(
        parse_filter("state="),
        Ok(("state".to_string(), String::new()))
    );
    assert!(parse_filter("state").is_err());
    assert!(parse_filter("=FL").is_err());
}

#[test]
fn maps_each_csv_row() {
    let dir = fixture();
    let (metadata, _) = MetadataDir::load(dir.path()).unwrap();
    let definition = metadata.schema("COVID-19").unwrap();
    let schema = Schema::from_definition(definition, default_registry()).unwrap();
    let sender = metadata.find_sender("simple_report.default");
    assert!(sender.is_some());
    let engine = MappingEngine::new(&schema, &metadata.tables);

    let csv = "Patient_zip,Ignored\n32303-1234,x\n99999,y\n";
    let rows = map_csv(&engine, sender, csv.as_bytes()).unwrap();
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0].index, 0);
    assert_eq!(rows[0].record.get("patient_zip_code"), Some("32303-1234"));
    assert_eq!(rows[0].record.get("patient_county"), Some("Leon"));
    assert_eq!(rows[0].record.get("patient_state"), Some("FL"));

    assert_eq!(rows[1].index, 1);
    assert_eq!(rows[1].record.get("patient_county"), Some(""));
    assert_eq!(rows[1].record.get("patient_state"), Some("XX"));
}

#[test]
fn totals_count_output_field_problems() {
    let dir = fixture();
    let (metadata, _) = MetadataDir::load(dir.path()).unwrap();
    let definition = metadata.schema("covid-19").unwrap();
    let schema = Schema::from_definition(definition, default_registry()).unwrap();
    let engine = MappingEngine::new(&schema, &metadata.tables);

    let rows = map_csv(&engine, None, "Patient_zip\n32303\n92101\n".as_bytes()).unwrap();
    let totals = MapTotals::from_rows(&rows);
    assert_eq!(
        totals,
        MapTotals {
            rows: 2,
            errors: 2,
            warnings: 0,
        }
    );
    let log = &rows[0].record.logs[0];
    assert_eq!(log.level, ActionLogLevel::Error);
    assert_eq!(log.field, "ordering_facility_state (ORC-22-4)");
}

#[test]
fn rows_serialize_with_their_index() {
    let dir = fixture();
    let (metadata, _) = MetadataDir::load(dir.path()).unwrap();
    let definition = metadata.schema("covid-19").unwrap();
    let schema = Schema::from_definition(definition, default_registry()).unwrap();
    let engine = MappingEngine::new(&schema, &metadata.tables);

    let rows = map_csv(&engine, None, "Patient_zip\n92101\n".as_bytes()).unwrap();
    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(json[0]["index"], 0);
    assert_eq!(json[0]["values"][1], serde_json::json!(["patient_county", "San Diego"]));
}

#[test]
fn unreadable_rows_are_reported_by_number() {
    let dir = fixture();
    let (metadata, _) = MetadataDir::load(dir.path()).unwrap();
    let definition = metadata.schema("covid-19").unwrap();
    let schema = Schema::from_definition(definition, default_registry()).unwrap();
    let engine = MappingEngine::new(&schema, &metadata.tables);

    let error = map_csv(&engine, None, "Patient_zip,Other\n32303,a\n92101\n".as_bytes())
        .unwrap_err();
    assert_eq!(error.to_string(), "read csv row 2");
}
