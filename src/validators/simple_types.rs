//! XSD simple types
//!
//! A simple type is a built-in type, a restriction of another simple type,
//! a list of an item type or a union of member types. Restrictions chain:
//! validating against a restriction first validates against its base.

use std::sync::Arc;

use super::builtins::{any_simple_type, get_builtin_type, BuiltinType, Primitive, XsdValue};
use super::exceptions::{StructuralError, ValueResult};
use super::facets::{Facets, WhiteSpace};
use crate::namespaces::QName;

/// Variety of a simple type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleTypeVariety {
    /// Atomic values
    Atomic,
    /// Whitespace separated lists
    List,
    /// One of several member types
    Union,
}

/// A compiled simple type definition
#[derive(Debug, Clone)]
pub enum SimpleType {
    /// Built-in datatype
    Builtin(&'static BuiltinType),
    /// Restriction of a base type by facets
    Restriction {
        /// Type name, `None` for anonymous types
        name: Option<QName>,
        /// Base type
        base: Arc<SimpleType>,
        /// Facets declared by this restriction
        facets: Facets,
    },
    /// List of an item type
    List {
        /// Type name, `None` for anonymous types
        name: Option<QName>,
        /// Item type
        item: Arc<SimpleType>,
    },
    /// Union of member types
    Union {
        /// Type name, `None` for anonymous types
        name: Option<QName>,
        /// Member types, tried in order
        members: Vec<Arc<SimpleType>>,
    },
}

impl SimpleType {
    /// xs:anySimpleType
    pub fn any_simple() -> Self {
        SimpleType::Builtin(any_simple_type())
    }

    /// A built-in type by local name
    pub fn builtin(name: &str) -> Option<Self> {
        get_builtin_type(name).map(SimpleType::Builtin)
    }

    /// Display name used in messages
    pub fn display_name(&self) -> String {
        match self {
            SimpleType::Builtin(b) => format!("xs:{}", b.name),
            SimpleType::Restriction { name: Some(n), .. }
            | SimpleType::List { name: Some(n), .. }
            | SimpleType::Union { name: Some(n), .. } => n.local_name.clone(),
            SimpleType::Restriction { base, .. } => format!("anonymous restriction of {}", base.display_name()),
            SimpleType::List { .. } => "anonymous list type".to_string(),
            SimpleType::Union { .. } => "anonymous union type".to_string(),
        }
    }

    /// Variety of this type
    pub fn variety(&self) -> SimpleTypeVariety {
        match self {
            SimpleType::Builtin(b) if b.is_list() => SimpleTypeVariety::List,
            SimpleType::Builtin(_) => SimpleTypeVariety::Atomic,
            SimpleType::Restriction { base, .. } => base.variety(),
            SimpleType::List { .. } => SimpleTypeVariety::List,
            SimpleType::Union { .. } => SimpleTypeVariety::Union,
        }
    }

    /// Primitive ancestor of an atomic type
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            SimpleType::Builtin(b) => Some(b.primitive),
            SimpleType::Restriction { base, .. } => base.primitive(),
            _ => None,
        }
    }

    /// Effective white space handling
    pub fn white_space(&self) -> WhiteSpace {
        match self {
            SimpleType::Builtin(b) => b.white_space,
            SimpleType::Restriction { base, facets, .. } => {
                facets.white_space.unwrap_or_else(|| base.white_space())
            }
            SimpleType::List { .. } => WhiteSpace::Collapse,
            SimpleType::Union { .. } => WhiteSpace::Preserve,
        }
    }

    /// Validate a lexical value, returning the typed value for atomic types
    pub fn validate(&self, value: &str) -> ValueResult<Option<XsdValue>> {
        match self {
            SimpleType::Builtin(b) => b.validate(value).map(Some),
            SimpleType::Restriction { base, facets, .. } => {
                let normalized = self.white_space().normalize(value);
                let typed = base.validate(&normalized)?;
                let length = self.value_length(&normalized, typed.as_ref());
                facets.validate(&normalized, typed.as_ref(), length)?;
                Ok(typed)
            }
            SimpleType::List { item, .. } => {
                for token in value.split_whitespace() {
                    item.validate(token)?;
                }
                Ok(None)
            }
            SimpleType::Union { members, .. } => {
                let mut reasons = Vec::new();
                for member in members {
                    match member.validate(value) {
                        Ok(typed) => return Ok(typed),
                        Err(e) => reasons.push(e.message().to_string()),
                    }
                }
                Err(StructuralError::new(format!(
                    "'{}' is not valid for any member of {}",
                    value,
                    self.display_name()
                ))
                .with_reason(reasons.join("; ")))
            }
        }
    }

    /// Parse a lexical value of this type, used for facet values in schemas
    pub fn parse_value(&self, value: &str) -> Option<XsdValue> {
        self.validate(value).ok().flatten()
    }

    fn value_length(&self, normalized: &str, typed: Option<&XsdValue>) -> usize {
        if self.variety() == SimpleTypeVariety::List {
            return normalized.split_whitespace().count();
        }
        match typed {
            Some(XsdValue::Binary(bytes)) => bytes.len(),
            _ => normalized.chars().count(),
        }
    }
}
