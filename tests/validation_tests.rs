//! Validation integration tests
//!
//! These tests run the validator over the resource tree and datasets in
//! `tests/fixtures`.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use iati_validator::{
    check_codelist_values, check_codes, full_validation, gated_validation, is_iati_xml, is_valid,
    is_xml, Codelist, CodelistMapping, Dataset, Error, ErrorContext, ErrorKind, MappingRule,
    Message, ResourceStore, Schema, Severity, ValidationError,
};

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

fn store() -> ResourceStore {
    ResourceStore::new(fixtures_dir().join("resources"))
}

fn dataset(name: &str) -> Dataset {
    let path = fixtures_dir().join("datasets").join(name);
    Dataset::new(fs::read_to_string(path).unwrap()).unwrap()
}

fn activity_setup() -> (Schema, CodelistMapping) {
    let store = store();
    (
        store.activity_schema(None, true).unwrap(),
        store.codelist_mapping(None).unwrap(),
    )
}

// ============================================================================
// Default resources
// ============================================================================

#[test]
fn test_default_codelists() {
    let codelists = store().codelists(Some("2.02")).unwrap();
    let names: Vec<_> = codelists.keys().cloned().collect();
    assert_eq!(names, vec!["Language", "OrganisationType", "Sector", "Vocabulary"]);
    assert!(codelists["Vocabulary"].complete());
    assert!(!codelists["Language"].complete());
}

#[test]
fn test_populated_schemas_share_codelists() {
    let store = store();
    let activity = store.activity_schema(None, true).unwrap();
    let organisation = store.organisation_schema(None, true).unwrap();
    assert!(Arc::ptr_eq(
        activity.codelist("Sector").unwrap(),
        organisation.codelist("Sector").unwrap()
    ));
}

#[test]
fn test_unknown_version() {
    let err = store().activity_schema(Some("2.99"), true).unwrap_err();
    assert!(err.to_string().contains("Version 2.99 is not a valid version of the IATI Standard."));
}

// ============================================================================
// Structural validation
// ============================================================================

#[test]
fn test_valid_activity_is_iati_xml() {
    let (schema, _) = activity_setup();
    assert!(is_iati_xml(&dataset("valid-activity.xml"), &schema).unwrap());
}

#[test]
fn test_valid_organisation_is_iati_xml() {
    let schema = store().organisation_schema(None, true).unwrap();
    assert!(is_iati_xml(&dataset("valid-organisation.xml"), &schema).unwrap());
}

#[test]
fn test_missing_identifier_is_not_iati_xml() {
    let (schema, _) = activity_setup();
    assert!(!is_iati_xml(&dataset("not-iati.xml"), &schema).unwrap());
}

#[test]
fn test_activity_against_organisation_schema() {
    let schema = store().organisation_schema(None, false).unwrap();
    assert!(!is_iati_xml(&dataset("valid-activity.xml"), &schema).unwrap());
}

// ============================================================================
// Codelist validation
// ============================================================================

#[test]
fn test_valid_activity_has_no_records() {
    let (schema, mapping) = activity_setup();
    let data = dataset("valid-activity.xml");
    let log = full_validation(&data, &schema, &mapping).unwrap();
    assert!(log.is_empty(), "unexpected records: {:?}", log);
    assert!(is_valid(&data, &schema, &mapping).unwrap());
}

#[test]
fn test_vocabulary_not_on_codelist() {
    let (schema, mapping) = activity_setup();
    let data = dataset("invalid-vocabulary.xml");
    let log = full_validation(&data, &schema, &mapping).unwrap();

    assert_eq!(log.len(), 1);
    let error = log.iter().next().unwrap();
    assert_eq!(error.kind, ErrorKind::ErrCodeNotOnCodelist);
    assert_eq!(error.severity, Severity::Error);
    assert_eq!(error.category, "codelist");
    assert_eq!(error.actual_value.as_deref(), Some("99"));
    assert_eq!(error.line_number, Some(9));
    assert_eq!(
        error.info,
        Message::Complete("99 is not a valid Code on the Vocabulary Codelist.".to_string())
    );
    assert_eq!(
        error.context.as_deref(),
        Some("    </title>\n    <sector vocabulary=\"99\" code=\"12220\"/>\n  </iati-activity>")
    );
    assert!(!is_valid(&data, &schema, &mapping).unwrap());
}

#[test]
fn test_sector_condition() {
    let (schema, mapping) = activity_setup();
    let data = dataset("invalid-sector.xml");
    let log = full_validation(&data, &schema, &mapping).unwrap();

    // the vocabulary-2 sector is outside the Sector rule's condition
    let values: Vec<_> = log
        .iter()
        .map(|e| (e.actual_value.clone().unwrap_or_default(), e.line_number))
        .collect();
    assert_eq!(
        values,
        vec![("99999".to_string(), Some(9)), ("88888".to_string(), Some(11))]
    );
}

#[test]
fn test_incomplete_codelist_only_warns() {
    let (schema, mapping) = activity_setup();
    let data = dataset("warning-language.xml");
    let log = full_validation(&data, &schema, &mapping).unwrap();

    assert_eq!(log.len(), 1);
    assert!(log.contains_warnings());
    assert!(!log.contains_errors());
    let warning = log.warnings().next().unwrap();
    assert_eq!(warning.kind, ErrorKind::WarnCodeNotOnCodelist);
    assert_eq!(warning.actual_value.as_deref(), Some("xx"));
    assert!(is_valid(&data, &schema, &mapping).unwrap());
}

#[test]
fn test_codelist_check_is_idempotent() {
    let (schema, mapping) = activity_setup();
    let data = dataset("invalid-sector.xml");
    let first = check_codelist_values(&data, &schema, &mapping).unwrap();
    let second = check_codelist_values(&data, &schema, &mapping).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unmapped_codelist_is_an_error() {
    let (mut schema, mapping) = activity_setup();
    schema.add_codelist(Codelist::new("Currency", ["EUR", "USD"], true));
    let err = check_codelist_values(&dataset("valid-activity.xml"), &schema, &mapping).unwrap_err();
    assert!(matches!(err, Error::MissingMapping(ref name) if name == "Currency"));
    assert!(is_valid(&dataset("valid-activity.xml"), &schema, &mapping).is_err());
}

// ============================================================================
// Gated validation
// ============================================================================

#[test]
fn test_gated_skips_codelists_for_invalid_structure() {
    let (schema, mapping) = activity_setup();
    let data = dataset("not-iati.xml");
    let log = gated_validation(&data, &schema, &mapping).unwrap();

    assert!(!log.is_empty());
    assert!(log.iter().all(|e| e.kind == ErrorKind::ErrNotIatiXml));
    assert!(!log.contains_kind(ErrorKind::ErrCodeNotOnCodelist));
    assert!(!is_valid(&data, &schema, &mapping).unwrap());
}

#[test]
fn test_gated_reports_codelist_problems() {
    let (schema, mapping) = activity_setup();
    let log = gated_validation(&dataset("invalid-vocabulary.xml"), &schema, &mapping).unwrap();
    assert_eq!(log.len(), 1);
    assert!(log.contains_kind(ErrorKind::ErrCodeNotOnCodelist));
}

#[test]
fn test_uncompilable_schema_fails_closed() {
    let (_, mapping) = activity_setup();
    let schema = Schema::from_string("broken", "<xsd:schema xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\"><xsd:element name=\"a\" type=\"missing\"/></xsd:schema>");
    let data = dataset("valid-activity.xml");
    assert!(is_iati_xml(&data, &schema).is_err());
    assert!(!is_valid(&data, &schema, &mapping).unwrap());
    assert!(matches!(gated_validation(&data, &schema, &mapping), Err(Error::Schema(_))));
}

// ============================================================================
// Records and probes
// ============================================================================

#[test]
fn test_is_xml() {
    assert!(is_xml("<a><b/></a>"));
    assert!(!is_xml("not xml"));
    assert!(!is_xml(None::<&str>));
    let text = fs::read_to_string(fixtures_dir().join("datasets/not-xml.txt")).unwrap();
    assert!(!is_xml(&text));
    assert!(is_xml(&dataset("valid-activity.xml")));
}

#[test]
fn test_error_help_mentions_codelist_page() {
    let codelist = Codelist::new("Sector", ["11110"], true);
    let ctx = ErrorContext::new()
        .with_code("1")
        .with_codelist(&codelist)
        .with_attr_name("code");
    let error = ValidationError::new("err-code-not-on-codelist", &ctx).unwrap();
    assert_eq!(
        error.help.as_str(),
        "The `code` attribute must contain a value on the `Sector` Codelist.\n\
         See http://iatistandard.org/202/codelists/Sector for permitted values."
    );
}

#[test]
fn test_json_report() {
    let (schema, mapping) = activity_setup();
    let log = full_validation(&dataset("invalid-vocabulary.xml"), &schema, &mapping).unwrap();
    let json = serde_json::to_value(&log).unwrap();
    assert_eq!(json[0]["kind"], "err-code-not-on-codelist");
    assert_eq!(json[0]["category"], "codelist");
    assert_eq!(json[0]["severity"], "error");
    assert_eq!(json[0]["actual_value"], "99");
    assert_eq!(json[0]["line_number"], 9);
}

// ============================================================================
// Properties
// ============================================================================

fn sectors_document(codes: &[(Option<u8>, String)]) -> String {
    let mut xml = String::from("<iati-activities version=\"2.02\">\n<iati-activity>\n");
    for (vocabulary, code) in codes {
        match vocabulary {
            Some(v) => xml.push_str(&format!("<sector vocabulary=\"{}\" code=\"{}\"/>\n", v, code)),
            None => xml.push_str(&format!("<sector code=\"{}\"/>\n", code)),
        }
    }
    xml.push_str("</iati-activity>\n</iati-activities>");
    xml
}

fn sector_mapping() -> CodelistMapping {
    let mut mapping = CodelistMapping::new();
    mapping.insert(
        "Sector",
        MappingRule::new(
            "//iati-activity/sector/@code",
            Some("@vocabulary = '1' or not(@vocabulary)".to_string()),
        ),
    );
    mapping
}

proptest! {
    #[test]
    fn prop_severity_follows_completeness(
        codes in prop::collection::vec((prop::option::of(1u8..4), "[0-9]{3}"), 0..12),
        complete in any::<bool>(),
    ) {
        let data = Dataset::new(sectors_document(&codes)).unwrap();
        let sector = Codelist::new("Sector", ["100", "200", "300"], complete);
        let log = check_codes(&data, &sector, &sector_mapping()).unwrap();

        let expected: Vec<String> = codes
            .iter()
            .filter(|(v, _)| matches!(v, None | Some(1)))
            .filter(|(_, code)| !sector.contains(code))
            .map(|(_, code)| code.clone())
            .collect();
        let actual: Vec<String> = log.iter().filter_map(|e| e.actual_value.clone()).collect();
        prop_assert_eq!(actual, expected);

        let severity = if complete { Severity::Error } else { Severity::Warning };
        prop_assert!(log.iter().all(|e| e.severity == severity));
        prop_assert_eq!(log.contains_errors(), complete && !log.is_empty());
    }

    #[test]
    fn prop_records_in_document_order(
        codes in prop::collection::vec((Just(None::<u8>), "[a-z]{2}"), 1..10),
    ) {
        let data = Dataset::new(sectors_document(&codes)).unwrap();
        let sector = Codelist::new("Sector", Vec::<String>::new(), true);
        let log = check_codes(&data, &sector, &sector_mapping()).unwrap();
        let lines: Vec<usize> = log.iter().filter_map(|e| e.line_number).collect();
        prop_assert_eq!(lines.len(), codes.len());
        prop_assert!(lines.windows(2).all(|w| w[0] < w[1]));
    }
}
