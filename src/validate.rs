//! Dataset validation
//!
//! Structural validation against a schema's XSD, and semantic validation
//! of coded attribute values against the schema's Codelists.
//!
//! ```no_run
//! use iati_validator::{Dataset, ResourceStore, validate};
//!
//! # fn main() -> iati_validator::Result<()> {
//! let store = ResourceStore::new("resources/standard");
//! let schema = store.activity_schema(None, true)?;
//! let mapping = store.codelist_mapping(None)?;
//! let dataset = Dataset::new(std::fs::read_to_string("activities.xml")?)?;
//!
//! if !validate::is_valid(&dataset, &schema, &mapping)? {
//!     for error in validate::gated_validation(&dataset, &schema, &mapping)?.errors() {
//!         println!("{}", error);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::catalog::ErrorKind;
use crate::codelists::Codelist;
use crate::datasets::Dataset;
use crate::documents::{Document, NodeId};
use crate::error::{Result, SchemaError};
use crate::mappings::CodelistMapping;
use crate::schemas::Schema;
use crate::validator::{ErrorContext, ValidationError, ValidationErrorLog};
use crate::validators::ValidationMode;
use crate::xpath::XPath;

/// Check the values of one codelist's attributes in a dataset.
///
/// Every rule the mapping gives for the codelist is applied in order and
/// matches are reported in document order. Values not on the codelist are
/// errors when the codelist is complete and warnings otherwise.
#[tracing::instrument(level = "debug", skip_all, fields(codelist = codelist.name()))]
pub fn check_codes(
    dataset: &Dataset,
    codelist: &Codelist,
    mapping: &CodelistMapping,
) -> Result<ValidationErrorLog> {
    let kind = if codelist.complete() {
        ErrorKind::ErrCodeNotOnCodelist
    } else {
        ErrorKind::WarnCodeNotOnCodelist
    };
    let doc = dataset.xml_tree();
    let mut log = ValidationErrorLog::new();

    for rule in mapping.rules_for(codelist.name())? {
        let selector = rule.selector()?;
        let xpath = XPath::compile(&selector.with_condition(rule.condition.as_deref()))?;
        let matches = xpath.select_elements(doc)?;
        tracing::debug!(xpath = xpath.as_str(), matches = matches.len(), "applying mapping rule");

        for id in matches {
            let Some(value) = attribute_value(doc, id, &selector.attribute) else {
                continue;
            };
            if codelist.contains(value) {
                continue;
            }
            let line = doc.element(id).source_line;
            tracing::trace!(value, line, "value not on codelist");
            let context = ErrorContext::new()
                .with_code(value)
                .with_codelist(codelist)
                .with_attr_name(&selector.attribute)
                .with_line_number(line)
                .with_dataset(dataset);
            log.push(ValidationError::from_kind(kind, &context));
        }
    }

    Ok(log)
}

/// The value of a possibly prefixed attribute, with the prefix resolved in
/// the scope of the element
fn attribute_value<'d>(doc: &'d Document, id: NodeId, name: &str) -> Option<&'d str> {
    let element = doc.element(id);
    if !name.contains(':') {
        return element.get_attribute(name);
    }
    let qname = doc.namespace_context(id).resolve_unqualified(name).ok()?;
    element.get_attribute_qname(&qname)
}

/// Check every codelist attached to `schema`, in the order they were added
#[tracing::instrument(level = "debug", skip_all, fields(schema = schema.name()))]
pub fn check_codelist_values(
    dataset: &Dataset,
    schema: &Schema,
    mapping: &CodelistMapping,
) -> Result<ValidationErrorLog> {
    let mut log = ValidationErrorLog::new();
    for codelist in schema.codelists() {
        log.extend(check_codes(dataset, codelist, mapping)?);
    }
    tracing::debug!(
        errors = log.errors().count(),
        warnings = log.warnings().count(),
        "codelist checks finished"
    );
    Ok(log)
}

/// Codelist validation only; structural validity is not checked
pub fn full_validation(
    dataset: &Dataset,
    schema: &Schema,
    mapping: &CodelistMapping,
) -> Result<ValidationErrorLog> {
    check_codelist_values(dataset, schema, mapping)
}

/// Structural mode used by [`gated_validation`] and the command line
pub const GATED_VALIDATION_MODE: ValidationMode = ValidationMode::Lax;

/// Structural validation followed, when it passes, by codelist validation.
///
/// Every structural problem becomes an `err-not-iati-xml` record and the
/// codelist checks are skipped. A schema that fails to compile is an error.
pub fn gated_validation(
    dataset: &Dataset,
    schema: &Schema,
    mapping: &CodelistMapping,
) -> Result<ValidationErrorLog> {
    gated_validation_with_mode(dataset, schema, mapping, GATED_VALIDATION_MODE)
}

/// [`gated_validation`] where `mode` decides whether the first structural
/// problem or all of them are reported
#[tracing::instrument(level = "debug", skip_all, fields(schema = schema.name(), mode = %mode))]
pub fn gated_validation_with_mode(
    dataset: &Dataset,
    schema: &Schema,
    mapping: &CodelistMapping,
    mode: ValidationMode,
) -> Result<ValidationErrorLog> {
    let validator = schema.validator_with_mode(mode)?;
    let problems = match validator.validate(dataset.xml_tree()) {
        Ok(()) => return check_codelist_values(dataset, schema, mapping),
        Err(invalid) => invalid.into_errors(),
    };

    let log: ValidationErrorLog = problems
        .iter()
        .map(|problem| {
            let reason = match &problem.reason {
                Some(reason) => format!("{} ({})", problem.message(), reason),
                None => problem.message().to_string(),
            };
            let context = ErrorContext::new()
                .with_reason(&reason)
                .with_line_number(problem.source_line())
                .with_dataset(dataset);
            ValidationError::from_kind(ErrorKind::ErrNotIatiXml, &context)
        })
        .collect();
    tracing::debug!(problems = log.len(), "dataset is not structurally valid");
    Ok(log)
}

/// Whether the dataset conforms to the schema's XSD.
///
/// A schema that cannot be compiled is an error rather than `false`.
pub fn is_iati_xml(dataset: &Dataset, schema: &Schema) -> std::result::Result<bool, SchemaError> {
    Ok(schema.validator()?.is_valid(dataset.xml_tree()))
}

/// Whether the dataset is valid: structurally valid and without
/// error-severity codelist problems.
///
/// A schema that cannot be compiled makes every dataset invalid. Missing
/// codelist mappings are still reported as errors.
pub fn is_valid(dataset: &Dataset, schema: &Schema, mapping: &CodelistMapping) -> Result<bool> {
    match is_iati_xml(dataset, schema) {
        Ok(true) => {}
        Ok(false) => return Ok(false),
        Err(e) => {
            tracing::warn!(schema = schema.name(), error = %e, "schema could not be compiled");
            return Ok(false);
        }
    }
    Ok(!check_codelist_values(dataset, schema, mapping)?.contains_errors())
}

/// Something that may or may not be XML
#[derive(Debug, Clone, Copy)]
pub enum XmlCandidate<'a> {
    /// Text, possibly absent
    Text(Option<&'a str>),
    /// A dataset, probed through its string form
    Dataset(&'a Dataset),
}

impl<'a> From<&'a str> for XmlCandidate<'a> {
    fn from(text: &'a str) -> Self {
        XmlCandidate::Text(Some(text))
    }
}

impl<'a> From<&'a String> for XmlCandidate<'a> {
    fn from(text: &'a String) -> Self {
        XmlCandidate::Text(Some(text.as_str()))
    }
}

impl<'a> From<Option<&'a str>> for XmlCandidate<'a> {
    fn from(text: Option<&'a str>) -> Self {
        XmlCandidate::Text(text)
    }
}

impl<'a> From<&'a Dataset> for XmlCandidate<'a> {
    fn from(dataset: &'a Dataset) -> Self {
        XmlCandidate::Dataset(dataset)
    }
}

/// Whether the input is well-formed XML. Surrounding whitespace is ignored;
/// empty or absent input is not XML.
pub fn is_xml<'a>(candidate: impl Into<XmlCandidate<'a>>) -> bool {
    let text = match candidate.into() {
        XmlCandidate::Text(Some(text)) => text,
        XmlCandidate::Text(None) => return false,
        XmlCandidate::Dataset(dataset) => dataset.xml_str(),
    };
    let text = text.trim();
    !text.is_empty() && Document::from_string(text).is_ok()
}
