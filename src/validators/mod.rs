//! XML Schema validators
//!
//! The structural validation engine: compiles XSD 1.0 schemas and checks
//! instance documents against them.

pub mod attributes;
pub mod builders;
pub mod builtins;
pub mod complex_types;
pub mod elements;
pub mod exceptions;
pub mod facets;
pub mod particles;
pub mod schemas;
pub mod simple_types;
pub mod validation;
pub mod wildcards;

pub use builders::SchemaBuilder;
pub use builtins::{validate_builtin, XsdValue};
pub use exceptions::{DocumentInvalid, StructuralError, ValueResult};
pub use schemas::{TypeDefinition, XsdSchema};
pub use simple_types::SimpleType;
pub use validation::{ValidationMode, XsdValidator};
