//! CLI integration tests
//!
//! These tests verify the CLI commands work correctly by running the binary.

use std::path::PathBuf;
use std::process::Command;

fn iati_validator_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_iati-validator"))
}

fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

fn dataset(name: &str) -> String {
    fixtures_dir()
        .join("datasets")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn validate(args: &[&str]) -> std::process::Output {
    Command::new(iati_validator_bin())
        .arg("validate")
        .args(args)
        .env("IATI_RESOURCES_DIR", fixtures_dir().join("resources"))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

// ============================================================================
// Validate Command Tests
// ============================================================================

#[test]
fn test_cli_validate_valid_activity() {
    let output = validate(&[&dataset("valid-activity.xml")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "valid dataset should exit 0: {}", stdout);
    assert!(stdout.contains("valid (0 errors, 0 warnings)"));
}

#[test]
fn test_cli_validate_organisation_detected() {
    let output = validate(&[&dataset("valid-organisation.xml")]);
    assert!(output.status.success(), "organisation file should use the organisation schema");
}

#[test]
fn test_cli_validate_codelist_error() {
    let output = validate(&[&dataset("invalid-vocabulary.xml")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("error [err-code-not-on-codelist]"));
    assert!(stdout.contains("99 is not a valid Code on the Vocabulary Codelist."));
    assert!(stdout.contains("(line 9)"));
    assert!(stdout.contains("invalid (1 errors, 0 warnings)"));
}

#[test]
fn test_cli_validate_warning_only() {
    let output = validate(&[&dataset("warning-language.xml")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("warning [warn-code-not-on-codelist]"));
}

#[test]
fn test_cli_validate_json_output() {
    let output = validate(&["--json", &dataset("invalid-vocabulary.xml")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let json: serde_json::Value = serde_json::from_str(&stdout)
        .expect("Output should be valid JSON");

    assert_eq!(json["valid"], false);
    assert_eq!(json["errors"][0]["kind"], "err-code-not-on-codelist");
    assert_eq!(json["errors"][0]["actual_value"], "99");
}

#[test]
fn test_cli_validate_structural_error() {
    let output = validate(&["--mode", "lax", &dataset("not-iati.xml")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("err-not-iati-xml"));
    assert!(!stdout.contains("err-code-not-on-codelist"));
}

#[test]
fn test_cli_validate_default_mode_is_lax() {
    let default = validate(&["--json", &dataset("not-iati.xml")]);
    let lax = validate(&["--json", "--mode", "lax", &dataset("not-iati.xml")]);

    assert_eq!(default.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&default.stdout),
        String::from_utf8_lossy(&lax.stdout)
    );
}

#[test]
fn test_cli_validate_codelist_only() {
    let output = validate(&["--codelist-only", &dataset("not-iati.xml")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("err-code-not-on-codelist"));
    assert!(!stdout.contains("err-not-iati-xml"));
}

#[test]
fn test_cli_validate_explicit_schema() {
    let resources = fixtures_dir().join("resources").join("202");
    let schema = resources.join("schemas").join("iati-activities-schema.xsd");
    let mapping = resources.join("codelist-mapping.xml");
    let codelists = resources.join("codelists");

    let output = validate(&[
        "--schema", schema.to_str().unwrap(),
        "--mapping", mapping.to_str().unwrap(),
        "--codelists", codelists.to_str().unwrap(),
        &dataset("invalid-sector.xml"),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("99999 is not a valid Code on the Sector Codelist."));
    assert!(stdout.contains("88888 is not a valid Code on the Sector Codelist."));
}

#[test]
fn test_cli_validate_not_xml() {
    let output = validate(&[&dataset("not-xml.txt")]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("not valid XML"));
}

#[test]
fn test_cli_validate_unknown_version() {
    let output = validate(&["--standard-version", "9.99", &dataset("valid-activity.xml")]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Version 9.99 is not a valid version of the IATI Standard."));
}

#[test]
fn test_cli_validate_bad_mode() {
    let output = validate(&["--mode", "sloppy", &dataset("valid-activity.xml")]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr.contains("Invalid validation mode"));
}

// ============================================================================
// Check-xml Command Tests
// ============================================================================

#[test]
fn test_cli_check_xml() {
    let output = Command::new(iati_validator_bin())
        .args(["check-xml", &dataset("valid-activity.xml")])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("is well-formed XML"));
}

#[test]
fn test_cli_check_xml_rejects_text() {
    let output = Command::new(iati_validator_bin())
        .args(["check-xml", &dataset("not-xml.txt")])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("is not well-formed XML"));
}
