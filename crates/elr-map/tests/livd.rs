use elr_map::livd::invalid_equipment_message;
use elr_map::{LivdLookupMapper, LivdQuery, MapContext, Mapper};
use elr_model::{Element, ElementAndValue};
use elr_tables::{LookupTable, TableRegistry};

const LIVD: &str = "LIVD-SARS-CoV-2";

fn livd_table() -> LookupTable {
    LookupTable::from_rows(
        LIVD,
        vec![
            vec![
                "Manufacturer",
                "Model",
                "Equipment UID",
                "Testkit Name ID",
                "Testkit Name ID Type",
                "Test Performed LOINC Code",
                "processing_mode_code",
            ],
            vec![
                "Abbott",
                "BinaxNOW COVID-19 Ag Card",
                "10811877011269",
                "10811877011290",
                "99ELR",
                "94558-4",
                "",
            ],
            vec![
                "Abbott",
                "ID NOW*",
                "10811877011337",
                "10811877011344",
                "99ELR",
                "94534-5",
                "",
            ],
            vec![
                "Becton, Dickinson and Company (BD)",
                "BD Veritor System for Rapid Detection of SARS-CoV-2",
                "BD Veritor Plus System",
                "BD Veritor",
                "99ELR",
                "94558-4",
                "",
            ],
            vec![
                "Quidel Corporation",
                "Sofia 2 Flu + SARS Antigen FIA",
                "Sofia 2",
                "Sofia 2 Flu + SARS",
                "99ELR",
                "95209-3",
                "",
            ],
            vec![
                "Quidel Corporation",
                "Sofia 2 Flu + SARS Antigen FIA",
                "Sofia 2",
                "Sofia 2 Flu + SARS",
                "99ELR",
                "92142-9",
                "",
            ],
            vec![
                "Validation Labs",
                "Validation Device",
                "TEST-UID",
                "TEST-KIT",
                "99ELR",
                "94558-4",
                "T",
            ],
        ],
    )
    .unwrap()
}

fn model_of(query: &LivdQuery) -> Option<String> {
    query.resolve(&livd_table(), "Model")
}

#[test]
fn exact_device_id_matches_test_kit_or_equipment() {
    let by_kit = LivdQuery::new().with_device_id("10811877011290");
    assert_eq!(model_of(&by_kit).as_deref(), Some("BinaxNOW COVID-19 Ag Card"));
    let by_equipment = LivdQuery::new().with_device_id("10811877011337");
    assert_eq!(model_of(&by_equipment).as_deref(), Some("ID NOW*"));
}

#[test]
fn coded_99elr_device_ids_lose_their_suffix() {
    let query = LivdQuery::new().with_device_id("BD Veritor_EUA");
    assert_eq!(
        model_of(&query).as_deref(),
        Some("BD Veritor System for Rapid Detection of SARS-CoV-2")
    );
}

#[test]
fn truncated_device_ids_match_by_prefix() {
    let unique = LivdQuery::new().with_device_id("1081187701129#");
    assert_eq!(model_of(&unique).as_deref(), Some("BinaxNOW COVID-19 Ag Card"));

    // Both Abbott devices share this prefix.
    let ambiguous = LivdQuery::new().with_device_id("108118770#");
    assert_eq!(model_of(&ambiguous), None);
}

#[test]
fn equipment_model_id_and_test_kit_id() {
    let equipment = LivdQuery::new().with_equipment_model_id("BD Veritor Plus System");
    assert_eq!(
        model_of(&equipment).as_deref(),
        Some("BD Veritor System for Rapid Detection of SARS-CoV-2")
    );
    let kit = LivdQuery::new().with_test_kit_name_id("10811877011344");
    assert_eq!(model_of(&kit).as_deref(), Some("ID NOW*"));
}

#[test]
fn model_names_match_exactly_then_without_wildcard() {
    let table = livd_table();
    let exact = LivdQuery::new().with_equipment_model_name("BinaxNOW COVID-19 Ag Card");
    assert_eq!(
        exact.resolve(&table, "Testkit Name ID").as_deref(),
        Some("10811877011290")
    );
    let without_star = LivdQuery::new().with_equipment_model_name("id now");
    assert_eq!(
        without_star.resolve(&table, "Testkit Name ID").as_deref(),
        Some("10811877011344")
    );
}

#[test]
fn model_names_fall_back_to_best_match() {
    let query = LivdQuery::new().with_equipment_model_name("Abbott BinaxNOW Ag");
    assert_eq!(
        query.resolve(&livd_table(), "Testkit Name ID").as_deref(),
        Some("10811877011290")
    );
    let unrelated = LivdQuery::new().with_equipment_model_name("Completely Different");
    assert_eq!(unrelated.resolve(&livd_table(), "Testkit Name ID"), None);
}

#[test]
fn test_devices_need_test_processing_mode() {
    let table = livd_table();
    let production = LivdQuery::new().with_test_kit_name_id("TEST-KIT");
    assert_eq!(production.resolve(&table, "Model"), None);
    let explicit_production = production.clone().with_processing_mode_code("P");
    assert_eq!(explicit_production.resolve(&table, "Model"), None);
    let testing = production.with_processing_mode_code("t");
    assert_eq!(testing.resolve(&table, "Model").as_deref(), Some("Validation Device"));
}

#[test]
fn test_performed_code_disambiguates_multiplex_devices() {
    let table = livd_table();
    let column = "Test Performed LOINC Code";
    let device = LivdQuery::new().with_equipment_model_id("Sofia 2");
    assert_eq!(device.resolve(&table, column), None);
    let covid = device.with_test_performed_code("95209-3");
    assert_eq!(covid.resolve(&table, column).as_deref(), Some("95209-3"));
}

#[test]
fn resolution_is_idempotent() {
    let table = livd_table();
    let query = LivdQuery::new()
        .with_device_id("BD Veritor_EUA")
        .with_processing_mode_code("P");
    let first = query.resolve(&table, "Testkit Name ID");
    let second = query.resolve(&table, "Testkit Name ID");
    assert_eq!(first, second);
    assert_eq!(first.as_deref(), Some("BD Veritor"));
}

fn apply(element: &Element, values: &[ElementAndValue]) -> elr_model::MapperResult {
    let tables = TableRegistry::new().with_table(livd_table());
    LivdLookupMapper
        .apply(element, &[], values, &MapContext::new(&tables))
        .unwrap()
}

#[test]
fn mapper_reads_sibling_identifiers() {
    let element = Element::new("ordered_test_code").with_table(LIVD, "Test Performed LOINC Code");
    let values = [ElementAndValue::new(Element::new("device_id"), "10811877011290")];
    let result = apply(&element, &values);
    assert_eq!(result.value.as_deref(), Some("94558-4"));
    assert!(result.warnings.is_empty());
}

#[test]
fn unresolved_devices_warn_only_on_output_fields() {
    let values = [ElementAndValue::new(Element::new("device_id"), "unknown device")];

    let wired = Element::new("test_kit_name_id")
        .with_table(LIVD, "Testkit Name ID")
        .with_hl7_field("OBX-17");
    let result = apply(&wired, &values);
    assert_eq!(result.value, None);
    assert_eq!(
        result.warnings,
        [invalid_equipment_message("test_kit_name_id (OBX-17)")]
    );
    assert!(result.errors.is_empty());

    let unwired = Element::new("test_kit_name_id").with_table(LIVD, "Testkit Name ID");
    let quiet = apply(&unwired, &values);
    assert_eq!(quiet.value, None);
    assert!(quiet.warnings.is_empty());
}

#[test]
fn mapper_rejects_arguments() {
    let element = Element::new("x").with_table(LIVD, "Model");
    assert!(
        LivdLookupMapper
            .value_names(&element, &["device_id".to_string()])
            .is_err()
    );
}
