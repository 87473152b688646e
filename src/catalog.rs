//! Error catalog
//!
//! Every kind of problem the validator reports has a static entry here: a
//! category, a description and the templates for its `info` and `help`
//! messages. Templates use `{name}` placeholders that are filled from the
//! context of a violation when a [`ValidationError`] is built.
//!
//! [`ValidationError`]: crate::validator::ValidationError

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::Error;

/// Static catalog data for one error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Broad class of the problem, e.g. `codelist`
    pub category: &'static str,
    /// What this kind of problem is, independent of any violation
    pub description: &'static str,
    /// Template for the short message about a violation
    pub info: &'static str,
    /// Template for the longer guidance about a violation
    pub help: &'static str,
}

macro_rules! codelist_page {
    () => {
        "http://iatistandard.org/202/codelists/{codelist}"
    };
}

static ERR_CODE_NOT_ON_CODELIST: CatalogEntry = CatalogEntry {
    category: "codelist",
    description: "An attribute that requires a Code from a particular complete Codelist contained a value not on the Codelist.",
    info: "{code} is not a valid Code on the {codelist} Codelist.",
    help: concat!(
        "The `{attr_name}` attribute must contain a value on the `{codelist}` Codelist.\n",
        "See ",
        codelist_page!(),
        " for permitted values."
    ),
};

static WARN_CODE_NOT_ON_CODELIST: CatalogEntry = CatalogEntry {
    category: "codelist",
    description: "An attribute that should contain a Code from a particular incomplete Codelist contained a value not on the Codelist.",
    info: "{code} is not a Code on the {codelist} Codelist. ",
    help: concat!(
        "The `{attr_name}` attribute should contain a value on the `{codelist}` Codelist. ",
        "Note that values not on the Codelist may be valid in particular circumstances.\n",
        "See ",
        codelist_page!(),
        " for values on the Codelist."
    ),
};

static ERR_NOT_IATI_XML: CatalogEntry = CatalogEntry {
    category: "schema",
    description: "The dataset does not conform to the IATI Schema it was validated against.",
    info: "The dataset is not valid against the Schema: {reason}",
    help: "The dataset must conform to the structure defined by the IATI Schema before its Codelist values can be checked.",
};

/// Identifier of a kind of validation problem.
///
/// The identifier prefix determines severity: `err-` kinds are errors,
/// everything else is a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value not on a complete Codelist
    ErrCodeNotOnCodelist,
    /// A value not on an incomplete Codelist
    WarnCodeNotOnCodelist,
    /// The dataset failed structural validation
    ErrNotIatiXml,
}

impl ErrorKind {
    /// Every kind in the catalog
    pub const ALL: [ErrorKind; 3] = [
        ErrorKind::ErrCodeNotOnCodelist,
        ErrorKind::WarnCodeNotOnCodelist,
        ErrorKind::ErrNotIatiXml,
    ];

    /// The kind's identifier, e.g. `err-code-not-on-codelist`
    pub fn identifier(&self) -> &'static str {
        match self {
            ErrorKind::ErrCodeNotOnCodelist => "err-code-not-on-codelist",
            ErrorKind::WarnCodeNotOnCodelist => "warn-code-not-on-codelist",
            ErrorKind::ErrNotIatiXml => "err-not-iati-xml",
        }
    }

    /// Look up a kind by identifier
    pub fn from_identifier(name: &str) -> Result<Self, Error> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.identifier() == name)
            .ok_or_else(|| Error::UnknownErrorKind(name.to_string()))
    }

    /// The catalog entry for this kind
    pub fn entry(&self) -> &'static CatalogEntry {
        match self {
            ErrorKind::ErrCodeNotOnCodelist => &ERR_CODE_NOT_ON_CODELIST,
            ErrorKind::WarnCodeNotOnCodelist => &WARN_CODE_NOT_ON_CODELIST,
            ErrorKind::ErrNotIatiXml => &ERR_NOT_IATI_XML,
        }
    }

    /// Whether reports of this kind make a dataset invalid
    pub fn is_error(&self) -> bool {
        self.identifier().starts_with("err")
    }
}

impl FromStr for ErrorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_identifier(s)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_roundtrip() {
        for kind in ErrorKind::ALL {
            assert_eq!(ErrorKind::from_identifier(kind.identifier()).unwrap(), kind);
        }
        assert_eq!(
            "warn-code-not-on-codelist".parse::<ErrorKind>().unwrap(),
            ErrorKind::WarnCodeNotOnCodelist
        );
    }

    #[test]
    fn test_unknown_kind() {
        let err = ErrorKind::from_identifier("err-made-up").unwrap_err();
        assert!(matches!(err, Error::UnknownErrorKind(ref name) if name == "err-made-up"));
        assert_eq!(err.to_string(), "err-made-up is not a known type of ValidationError");
    }

    #[test]
    fn test_severity_from_prefix() {
        assert!(ErrorKind::ErrCodeNotOnCodelist.is_error());
        assert!(ErrorKind::ErrNotIatiXml.is_error());
        assert!(!ErrorKind::WarnCodeNotOnCodelist.is_error());
    }

    #[test]
    fn test_entries() {
        let entry = ErrorKind::ErrCodeNotOnCodelist.entry();
        assert_eq!(entry.category, "codelist");
        assert!(entry.info.contains("{code}"));
        assert!(entry.help.contains("{attr_name}"));
        assert_eq!(ErrorKind::ErrNotIatiXml.entry().category, "schema");
    }

    #[test]
    fn test_serialize_as_identifier() {
        let json = serde_json::to_string(&ErrorKind::ErrNotIatiXml).unwrap();
        assert_eq!(json, "\"err-not-iati-xml\"");
    }

    #[test]
    fn test_help_templates_link_codelist_page() {
        for kind in [ErrorKind::ErrCodeNotOnCodelist, ErrorKind::WarnCodeNotOnCodelist] {
            assert!(kind
                .entry()
                .help
                .contains("See http://iatistandard.org/202/codelists/{codelist} for "));
        }
    }
}
