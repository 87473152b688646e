//! # iati-validator
//!
//! Validation of IATI (International Aid Transparency Initiative) XML
//! datasets against the IATI Schemas and Codelists.
//!
//! Validation happens in two layers:
//!
//! - structural validation of a dataset against the XSD of a [`Schema`]
//! - semantic validation of coded attribute values against the
//!   [`Codelist`]s attached to the schema, located through a
//!   [`CodelistMapping`]
//!
//! Problems found in a dataset are reported as [`ValidationError`] records
//! collected in a [`ValidationErrorLog`]. Values missing from a complete
//! codelist are errors; values missing from an incomplete one are warnings.
//!
//! ## Example
//!
//! ```rust,ignore
//! use iati_validator::{validate, Codelist, CodelistMapping, Dataset, Schema};
//!
//! let mut schema = Schema::from_file("iati-activities-schema.xsd");
//! schema.add_codelist(Codelist::from_xml(&std::fs::read_to_string("Sector.xml")?)?);
//! let mapping = CodelistMapping::from_xml(&std::fs::read_to_string("codelist-mapping.xml")?)?;
//!
//! let dataset = Dataset::new(std::fs::read_to_string("activities.xml")?)?;
//! let log = validate::gated_validation(&dataset, &schema, &mapping)?;
//! for record in log.iter() {
//!     println!("{}", record);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod namespaces;

// Documents and resources
pub mod documents;
pub mod loaders;
pub mod xpath;

// Structural validation engine
pub mod validators;

// IATI data model
pub mod codelists;
pub mod datasets;
pub mod mappings;
pub mod resources;
pub mod schemas;

// Reporting and validation
pub mod catalog;
pub mod validate;
pub mod validator;

pub use catalog::ErrorKind;
pub use codelists::{Code, Codelist};
pub use datasets::{Dataset, XmlSource};
pub use error::{Error, Result, SchemaError};
pub use limits::Limits;
pub use mappings::{CodelistMapping, MappingRule};
pub use resources::{ResourceStore, STANDARD_VERSIONS, STANDARD_VERSION_LATEST};
pub use schemas::{Schema, SchemaKind};
pub use validate::{
    check_codelist_values, check_codes, full_validation, gated_validation,
    gated_validation_with_mode, is_iati_xml, is_valid, is_xml, GATED_VALIDATION_MODE,
};
pub use validator::{ErrorContext, Message, Severity, ValidationError, ValidationErrorLog};
pub use validators::{ValidationMode, XsdValidator};

/// Version of the iati-validator library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
