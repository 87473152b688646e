//! Compiled XML Schemas
//!
//! An [`XsdSchema`] holds the global components of a schema and everything
//! it includes or imports, ready for validating instance documents.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;

use super::attributes::AttributeUse;
use super::builders::SchemaBuilder;
use super::complex_types::ComplexType;
use super::elements::{ElementDecl, TypeRef};
use super::simple_types::SimpleType;
use crate::error::SchemaError;
use crate::limits::Limits;
use crate::namespaces::{QName, XSD_NAMESPACE};

/// Name of xs:anyType
pub fn any_type_name() -> QName {
    QName::namespaced(XSD_NAMESPACE, "anyType")
}

/// A resolved type definition
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    /// Simple type
    Simple(Arc<SimpleType>),
    /// Complex type
    Complex(Arc<ComplexType>),
}

/// A compiled XML Schema
#[derive(Debug)]
pub struct XsdSchema {
    target_namespace: Option<String>,
    version: Option<String>,
    elements: IndexMap<QName, Arc<ElementDecl>>,
    simple_types: HashMap<QName, Arc<SimpleType>>,
    complex_types: HashMap<QName, Arc<ComplexType>>,
    attributes: HashMap<QName, AttributeUse>,
    any_type: Arc<ComplexType>,
}

impl XsdSchema {
    pub(crate) fn new(
        target_namespace: Option<String>,
        version: Option<String>,
        elements: IndexMap<QName, Arc<ElementDecl>>,
        simple_types: HashMap<QName, Arc<SimpleType>>,
        complex_types: HashMap<QName, Arc<ComplexType>>,
        attributes: HashMap<QName, AttributeUse>,
        any_type: Arc<ComplexType>,
    ) -> Self {
        Self {
            target_namespace,
            version,
            elements,
            simple_types,
            complex_types,
            attributes,
            any_type,
        }
    }

    /// Compile a schema from text.
    ///
    /// `base_dir` is where `xs:include`/`xs:import` locations are resolved.
    pub fn compile(text: &str, base_dir: Option<&Path>, limits: &Limits) -> Result<Self, SchemaError> {
        let mut builder = SchemaBuilder::new(limits.clone());
        builder.add_document(text, base_dir, "<schema>")?;
        builder.build()
    }

    /// Compile a schema file
    pub fn from_file(path: impl AsRef<Path>, limits: &Limits) -> Result<Self, SchemaError> {
        let mut builder = SchemaBuilder::new(limits.clone());
        builder.add_file(path.as_ref())?;
        builder.build()
    }

    /// Target namespace of the main schema document
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// The `version` attribute of the main schema document
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Global element declaration by name
    pub fn element(&self, name: &QName) -> Option<&Arc<ElementDecl>> {
        self.elements.get(name)
    }

    /// Global element declarations in document order
    pub fn elements(&self) -> impl Iterator<Item = &Arc<ElementDecl>> {
        self.elements.values()
    }

    /// Global simple type by name
    pub fn simple_type(&self, name: &QName) -> Option<&Arc<SimpleType>> {
        self.simple_types.get(name)
    }

    /// Global complex type by name
    pub fn complex_type(&self, name: &QName) -> Option<&Arc<ComplexType>> {
        self.complex_types.get(name)
    }

    /// Global attribute declaration by name
    pub fn attribute(&self, name: &QName) -> Option<&AttributeUse> {
        self.attributes.get(name)
    }

    /// Look up a named type, including the built-in ones
    pub fn lookup_type(&self, name: &QName) -> Option<TypeDefinition> {
        if name.namespace.as_deref() == Some(XSD_NAMESPACE) {
            if name.local_name == "anyType" {
                return Some(TypeDefinition::Complex(self.any_type.clone()));
            }
            return SimpleType::builtin(&name.local_name).map(|st| TypeDefinition::Simple(Arc::new(st)));
        }
        if let Some(ct) = self.complex_types.get(name) {
            return Some(TypeDefinition::Complex(ct.clone()));
        }
        self.simple_types
            .get(name)
            .map(|st| TypeDefinition::Simple(st.clone()))
    }

    /// Resolve the type of a declaration
    pub fn resolve_type(&self, type_ref: &TypeRef) -> Option<TypeDefinition> {
        match type_ref {
            TypeRef::Named(name) => self.lookup_type(name),
            TypeRef::Simple(st) => Some(TypeDefinition::Simple(st.clone())),
            TypeRef::Complex(ct) => Some(TypeDefinition::Complex(ct.clone())),
        }
    }
}
