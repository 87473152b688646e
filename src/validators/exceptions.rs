//! Structural validation findings
//!
//! A [`StructuralError`] describes one way in which a document fails to
//! conform to a schema. [`DocumentInvalid`] groups the findings of one
//! validation run and is what [`XsdValidator::validate`] returns on failure.
//!
//! [`XsdValidator::validate`]: super::XsdValidator::validate

use std::fmt;

use serde::Serialize;

/// Result of checking a single value or element
pub type ValueResult<T> = std::result::Result<T, StructuralError>;

/// A document does not conform to the schema at some location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuralError {
    /// The error message
    message: String,
    /// Why the value or content was rejected
    pub reason: Option<String>,
    /// Path to the offending element, e.g. `/iati-activities/iati-activity[2]`
    path: Option<String>,
    /// Line of the offending element in the source document
    source_line: Option<usize>,
}

impl StructuralError {
    /// Create a new error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason: None,
            path: None,
            source_line: None,
        }
    }

    /// Error for a child element the content model does not accept
    pub fn unexpected_child(parent: &str, child: &str, index: usize) -> Self {
        Self::new(format!(
            "Unexpected child with tag '{}' at position {} in '{}'",
            child,
            index + 1,
            parent
        ))
    }

    /// Error for content that ends before the content model is satisfied
    pub fn incomplete_content(parent: &str) -> Self {
        Self::new(format!("The content of element '{}' is not complete", parent))
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the source line
    pub fn with_source_line(mut self, line: Option<usize>) -> Self {
        self.source_line = line;
        self
    }

    /// The error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Path to the offending element
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Source line of the offending element
    pub fn source_line(&self) -> Option<usize> {
        self.source_line
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref reason) = self.reason {
            write!(f, "\nReason: {}", reason)?;
        }
        if let Some(ref path) = self.path {
            write!(f, "\nPath: {}", path)?;
        }
        if let Some(line) = self.source_line {
            write!(f, "\nLine: {}", line)?;
        }
        Ok(())
    }
}

impl std::error::Error for StructuralError {}

/// A document failed structural validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInvalid {
    errors: Vec<StructuralError>,
}

impl DocumentInvalid {
    /// Wrap the findings of a validation run. `errors` should not be empty.
    pub fn new(errors: Vec<StructuralError>) -> Self {
        Self { errors }
    }

    /// All findings, in document order
    pub fn errors(&self) -> &[StructuralError] {
        &self.errors
    }

    /// Consume into the findings
    pub fn into_errors(self) -> Vec<StructuralError> {
        self.errors
    }
}

impl fmt::Display for DocumentInvalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.first() {
            Some(first) if self.errors.len() == 1 => {
                write!(f, "document is not valid against the schema: {}", first.message())
            }
            Some(first) => write!(
                f,
                "document is not valid against the schema ({} problems); first: {}",
                self.errors.len(),
                first.message()
            ),
            None => write!(f, "document is not valid against the schema"),
        }
    }
}

impl std::error::Error for DocumentInvalid {}
