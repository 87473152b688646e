//! XSD element declarations
//!
//! Element declarations name their type instead of owning it when the type
//! is a named global definition. Resolution happens through the compiled
//! schema at validation time, which lets recursive structures refer to
//! their own types.

use std::fmt;
use std::sync::Arc;

use super::complex_types::ComplexType;
use super::simple_types::SimpleType;
use crate::error::SchemaError;
use crate::namespaces::QName;

/// Element or attribute form (qualified or unqualified)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Form {
    /// Name must be namespace-qualified
    Qualified,
    /// Name is unqualified
    #[default]
    Unqualified,
}

impl Form {
    /// Parse from a `form`, `elementFormDefault` or `attributeFormDefault` value
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        match s.trim() {
            "qualified" => Ok(Self::Qualified),
            "unqualified" => Ok(Self::Unqualified),
            other => Err(SchemaError::new(format!("invalid form value '{}'", other))),
        }
    }
}

/// Reference from a declaration to its type
#[derive(Debug, Clone)]
pub enum TypeRef {
    /// A global type definition, or a built-in type, by name
    Named(QName),
    /// An anonymous simple type
    Simple(Arc<SimpleType>),
    /// An anonymous complex type
    Complex(Arc<ComplexType>),
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{}", name.local_name),
            TypeRef::Simple(st) => write!(f, "{}", st.display_name()),
            TypeRef::Complex(_) => write!(f, "anonymous complex type"),
        }
    }
}

/// An element declaration
#[derive(Debug, Clone)]
pub struct ElementDecl {
    /// Element name
    pub name: QName,
    /// Element type
    pub type_ref: TypeRef,
    /// Whether `xsi:nil` may be used
    pub nillable: bool,
    /// Whether the declaration may not appear in instances
    pub is_abstract: bool,
    /// Fixed value constraint
    pub fixed: Option<String>,
    /// Default value
    pub default: Option<String>,
}

impl ElementDecl {
    /// Create a declaration of the given type
    pub fn new(name: QName, type_ref: TypeRef) -> Self {
        Self {
            name,
            type_ref,
            nillable: false,
            is_abstract: false,
            fixed: None,
            default: None,
        }
    }
}

/// An element particle: a local declaration or a reference to a global one
#[derive(Debug, Clone)]
pub enum ElementRef {
    /// Declared in place
    Local(Arc<ElementDecl>),
    /// `ref` to a global element declaration
    Global(QName),
}

impl ElementRef {
    /// Name of the element this particle matches
    pub fn name(&self) -> &QName {
        match self {
            ElementRef::Local(decl) => &decl.name,
            ElementRef::Global(name) => name,
        }
    }
}
