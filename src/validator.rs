//! Validation errors and error logs
//!
//! A [`ValidationError`] is one problem found in a dataset. It is built from
//! an [`ErrorKind`] and the context of the violation; the catalog supplies
//! the static fields and the message templates. A [`ValidationErrorLog`]
//! collects the records of one validation run in detection order.

use std::fmt;

use serde::Serialize;

use crate::catalog::ErrorKind;
use crate::codelists::Codelist;
use crate::datasets::Dataset;
use crate::error::Result;

/// Lines of source shown either side of a reported line
const CONTEXT_LINES: usize = 1;

/// Severity of a validation record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Makes the dataset invalid
    Error,
    /// Advisory only
    Warning,
}

impl Severity {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl From<ErrorKind> for Severity {
    fn from(kind: ErrorKind) -> Self {
        if kind.is_error() {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message filled from a template.
///
/// When some placeholder has no value in the context the message stays
/// unfilled and lists what was missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// Every placeholder was substituted
    Complete(String),
    /// At least one placeholder had no value
    Incomplete {
        /// The unfilled template
        template: String,
        /// Placeholder names without a value, in order of first use
        missing: Vec<String>,
    },
}

impl Message {
    /// Fill `{name}` placeholders in `template` using `lookup`
    pub fn fill<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> Self {
        let mut out = String::with_capacity(template.len());
        let mut missing: Vec<String> = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            if name_len > 0 && after[name_len..].starts_with('}') {
                let name = &after[..name_len];
                match lookup(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        if !missing.iter().any(|m| m == name) {
                            missing.push(name.to_string());
                        }
                    }
                }
                rest = &after[name_len + 1..];
            } else {
                out.push('{');
                rest = after;
            }
        }
        out.push_str(rest);

        if missing.is_empty() {
            Message::Complete(out)
        } else {
            Message::Incomplete {
                template: template.to_string(),
                missing,
            }
        }
    }

    /// Whether every placeholder was filled
    pub fn is_complete(&self) -> bool {
        matches!(self, Message::Complete(_))
    }

    /// The filled text, or the raw template when incomplete
    pub fn as_str(&self) -> &str {
        match self {
            Message::Complete(text) => text,
            Message::Incomplete { template, .. } => template,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values describing one violation, used to fill catalog templates
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorContext<'a> {
    /// The offending value
    pub code: Option<&'a str>,
    /// The codelist the value was checked against
    pub codelist: Option<&'a Codelist>,
    /// Name of the attribute holding the value
    pub attr_name: Option<&'a str>,
    /// Free-text reason, for structural problems
    pub reason: Option<&'a str>,
    /// 1-based source line of the element
    pub line_number: Option<usize>,
    /// Dataset the violation was found in
    pub dataset: Option<&'a Dataset>,
}

impl<'a> ErrorContext<'a> {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the offending value
    pub fn with_code(mut self, code: &'a str) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the codelist the value was checked against
    pub fn with_codelist(mut self, codelist: &'a Codelist) -> Self {
        self.codelist = Some(codelist);
        self
    }

    /// Set the name of the attribute holding the value
    pub fn with_attr_name(mut self, attr_name: &'a str) -> Self {
        self.attr_name = Some(attr_name);
        self
    }

    /// Set the reason a dataset failed structural validation
    pub fn with_reason(mut self, reason: &'a str) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Set the source line of the offending element
    pub fn with_line_number(mut self, line_number: Option<usize>) -> Self {
        self.line_number = line_number;
        self
    }

    /// Set the dataset used to extract surrounding source lines
    pub fn with_dataset(mut self, dataset: &'a Dataset) -> Self {
        self.dataset = Some(dataset);
        self
    }

    fn variable(&self, name: &str) -> Option<&'a str> {
        match name {
            "code" => self.code,
            "codelist" => self.codelist.map(Codelist::name),
            "attr_name" => self.attr_name,
            "reason" => self.reason,
            _ => None,
        }
    }
}

/// A problem found while validating a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// Catalog kind
    pub kind: ErrorKind,
    /// Broad class of the problem
    pub category: &'static str,
    /// Derived from the kind's identifier prefix
    pub severity: Severity,
    /// Static description of the kind
    pub description: &'static str,
    /// Short message about this violation
    pub info: Message,
    /// Guidance about this violation
    pub help: Message,
    /// Source line of the offending element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    /// Source lines around `line_number`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// The offending value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<String>,
}

impl ValidationError {
    /// Build a record from a kind identifier such as `err-code-not-on-codelist`.
    ///
    /// Fails only if the identifier is not in the catalog.
    pub fn new(kind_name: &str, context: &ErrorContext<'_>) -> Result<Self> {
        let kind = ErrorKind::from_identifier(kind_name)?;
        Ok(Self::from_kind(kind, context))
    }

    /// Build a record from a known kind
    pub fn from_kind(kind: ErrorKind, context: &ErrorContext<'_>) -> Self {
        let entry = kind.entry();
        let lookup = |name: &str| context.variable(name);

        let source_context = match (context.line_number, context.dataset) {
            (Some(line), Some(dataset)) => Some(dataset.source_around_line(line, CONTEXT_LINES)),
            _ => None,
        };

        Self {
            kind,
            category: entry.category,
            severity: Severity::from(kind),
            description: entry.description,
            info: Message::fill(entry.info, lookup),
            help: Message::fill(entry.help, lookup),
            line_number: context.line_number,
            context: source_context,
            actual_value: context.code.map(str::to_string),
        }
    }

    /// Whether this record makes the dataset invalid
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.kind, self.info.as_str().trim_end())?;
        if let Some(line) = self.line_number {
            write!(f, " (line {})", line)?;
        }
        Ok(())
    }
}

/// Ordered collection of validation records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrorLog {
    errors: Vec<ValidationError>,
}

impl ValidationErrorLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Append every record of `other`, keeping their order
    pub fn extend(&mut self, other: ValidationErrorLog) {
        self.errors.extend(other.errors);
    }

    /// Records in the order they were found
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no records were found
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether at least one record has severity `error`
    pub fn contains_errors(&self) -> bool {
        self.errors.iter().any(ValidationError::is_error)
    }

    /// Whether at least one record has severity `warning`
    pub fn contains_warnings(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Warning)
    }

    /// Whether any record is of `kind`
    pub fn contains_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// Records with severity `error`
    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.is_error())
    }

    /// Records with severity `warning`
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| e.severity == Severity::Warning)
    }
}

impl Extend<ValidationError> for ValidationErrorLog {
    fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl FromIterator<ValidationError> for ValidationErrorLog {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ValidationErrorLog {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrorLog {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
