//! XSD complex types
//!
//! A complex type pairs a content type (empty, simple or element content)
//! with the attributes it admits.

use std::sync::Arc;

use super::attributes::AttributeSet;
use super::particles::{ContentModel, Occurs, Particle, Term};
use super::simple_types::SimpleType;
use super::wildcards::Wildcard;
use crate::namespaces::{QName, XSD_NAMESPACE};

/// Derivation method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationMethod {
    /// Derived by extension
    Extension,
    /// Derived by restriction
    Restriction,
}

/// Content of a complex type
#[derive(Debug, Clone)]
pub enum ContentType {
    /// No children and no character data
    Empty,
    /// Character data of a simple type
    Simple(Arc<SimpleType>),
    /// Child elements matched by a content model
    Elements {
        /// The content model
        model: ContentModel,
        /// Whether character data may be interleaved with the children
        mixed: bool,
    },
}

impl ContentType {
    /// Element content, or [`ContentType::Empty`] for an empty model that
    /// does not allow character data
    pub fn from_particle(particle: Particle, mixed: bool) -> Self {
        if particle.is_empty() && !mixed {
            ContentType::Empty
        } else {
            ContentType::Elements {
                model: ContentModel::new(particle),
                mixed,
            }
        }
    }

    /// Whether character data is allowed
    pub fn allows_text(&self) -> bool {
        match self {
            ContentType::Empty => false,
            ContentType::Simple(_) => true,
            ContentType::Elements { mixed, .. } => *mixed,
        }
    }
}

/// A compiled complex type definition
#[derive(Debug, Clone)]
pub struct ComplexType {
    /// Type name (None for anonymous types)
    pub name: Option<QName>,
    /// Content type
    pub content: ContentType,
    /// Admitted attributes
    pub attributes: AttributeSet,
    /// Base type name, for derived types
    pub base_type: Option<QName>,
    /// Derivation method
    pub derivation: Option<DerivationMethod>,
    /// Whether this type is abstract
    pub is_abstract: bool,
}

impl ComplexType {
    /// Create a complex type
    pub fn new(name: Option<QName>, content: ContentType, attributes: AttributeSet) -> Self {
        Self {
            name,
            content,
            attributes,
            base_type: None,
            derivation: None,
            is_abstract: false,
        }
    }

    /// xs:anyType: any attributes, any children, mixed content
    pub fn any_type() -> Self {
        let particle = Particle::new(Term::Any(Wildcard::any_lax()), Occurs::zero_or_more());
        let mut attributes = AttributeSet::new();
        attributes.set_wildcard(Some(Wildcard::any_lax()));
        Self::new(
            Some(QName::namespaced(XSD_NAMESPACE, "anyType")),
            ContentType::from_particle(particle, true),
            attributes,
        )
    }

    /// Display name used in messages
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.local_name.clone(),
            None => "anonymous complex type".to_string(),
        }
    }

    /// Check if this type has simple content
    pub fn has_simple_content(&self) -> bool {
        matches!(self.content, ContentType::Simple(_))
    }

    /// Check if this type has mixed content
    pub fn is_mixed(&self) -> bool {
        matches!(self.content, ContentType::Elements { mixed: true, .. })
    }
}
