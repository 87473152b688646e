//! Error types for iati-validator
//!
//! This module defines the error types used throughout the library.
//! Problems found *in a dataset* are never reported through these types:
//! they are data (`ValidationError` records or a `false` verdict). The
//! errors here describe broken inputs the validator itself depends on.

use std::fmt;
use thiserror::Error;

use crate::xpath::XPathParseError;

/// Result type alias using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for iati-validator operations
#[derive(Error, Debug)]
pub enum Error {
    /// The XML Schema could not be compiled
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// An error kind that is not in the error catalog
    #[error("{0} is not a known type of ValidationError")]
    UnknownErrorKind(String),

    /// A codelist that has no entry in the codelist mapping
    #[error("there is no codelist mapping for the `{0}` Codelist")]
    MissingMapping(String),

    /// XPath expression could not be parsed
    #[error("XPath error: {0}")]
    XPath(#[from] XPathParseError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Value error (a value that is not acceptable for the operation)
    #[error("value error: {0}")]
    Value(String),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error indicates corrupt or mismatched reference data
    /// (as opposed to a problem with a single input document).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownErrorKind(_) | Error::MissingMapping(_) | Error::XPath(_)
        )
    }
}

/// XML Schema compilation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Error message
    pub message: String,
    /// Location in the schema file
    pub location: Option<String>,
    /// Schema source that caused the error
    pub source: Option<String>,
}

impl SchemaError {
    /// Create a new schema error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            source: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        if let Some(ref src) = self.source {
            write!(f, "\n\nSource:\n{}", src)?;
        }

        Ok(())
    }
}

impl std::error::Error for SchemaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::new("Unknown type 'iati:foo'")
            .with_location("iati-activities-schema.xsd:42")
            .with_source("<xsd:element name='bar' type='iati:foo'/>");

        let msg = format!("{}", err);
        assert!(msg.contains("Unknown type 'iati:foo'"));
        assert!(msg.contains("Location:"));
        assert!(msg.contains("Source:"));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = SchemaError::new("test").into();
        assert!(matches!(err, Error::Schema(_)));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_configuration_errors() {
        assert!(Error::MissingMapping("Sector".to_string()).is_configuration());
        assert!(Error::UnknownErrorKind("err-nope".to_string()).is_configuration());
        assert!(!Error::Xml("bad".to_string()).is_configuration());
    }

    #[test]
    fn test_unknown_kind_message() {
        let err = Error::UnknownErrorKind("err-nope".to_string());
        assert_eq!(err.to_string(), "err-nope is not a known type of ValidationError");
    }
}
