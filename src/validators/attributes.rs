//! XSD attribute declarations
//!
//! This module holds attribute uses and the attribute set of a complex
//! type, and checks an element's attributes against that set.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::exceptions::StructuralError;
use super::simple_types::SimpleType;
use super::wildcards::Wildcard;
use crate::error::SchemaError;
use crate::namespaces::QName;

/// Attribute use mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Use {
    /// Attribute is optional (default)
    #[default]
    Optional,
    /// Attribute is required
    Required,
    /// Attribute is prohibited
    Prohibited,
}

impl Use {
    /// Parse from the `use` attribute value
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        match s.trim() {
            "optional" => Ok(Use::Optional),
            "required" => Ok(Use::Required),
            "prohibited" => Ok(Use::Prohibited),
            other => Err(SchemaError::new(format!(
                "Invalid attribute use value: '{}'. Must be 'optional', 'required', or 'prohibited'",
                other
            ))),
        }
    }
}

impl fmt::Display for Use {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Use::Optional => write!(f, "optional"),
            Use::Required => write!(f, "required"),
            Use::Prohibited => write!(f, "prohibited"),
        }
    }
}

/// An attribute declaration as used by a complex type
#[derive(Debug, Clone)]
pub struct AttributeUse {
    /// Attribute name
    pub name: QName,
    /// Value type
    pub simple_type: Arc<SimpleType>,
    /// Use mode
    pub use_mode: Use,
    /// Fixed value
    pub fixed: Option<String>,
    /// Default value
    pub default: Option<String>,
}

impl AttributeUse {
    /// Create an optional attribute use
    pub fn new(name: QName, simple_type: Arc<SimpleType>) -> Self {
        Self {
            name,
            simple_type,
            use_mode: Use::Optional,
            fixed: None,
            default: None,
        }
    }

    /// Set the use mode
    pub fn with_use(mut self, use_mode: Use) -> Self {
        self.use_mode = use_mode;
        self
    }

    /// Check one value of this attribute
    pub fn validate(&self, value: &str) -> Result<(), StructuralError> {
        self.simple_type.validate(value).map_err(|e| {
            let mut err = StructuralError::new(format!(
                "attribute {}='{}': {}",
                self.name,
                value,
                e.message()
            ));
            err.reason = e.reason;
            err
        })?;
        if let Some(fixed) = &self.fixed {
            let normalized = self.simple_type.white_space().normalize(value);
            if &normalized != fixed {
                return Err(StructuralError::new(format!(
                    "attribute {}='{}': value must be fixed to '{}'",
                    self.name, value, fixed
                )));
            }
        }
        Ok(())
    }
}

/// The attributes a complex type admits
#[derive(Debug, Clone, Default)]
pub struct AttributeSet {
    uses: IndexMap<QName, AttributeUse>,
    wildcard: Option<Wildcard>,
}

impl AttributeSet {
    /// Create an empty attribute set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an attribute use
    pub fn insert(&mut self, attribute: AttributeUse) {
        self.uses.insert(attribute.name.clone(), attribute);
    }

    /// Get an attribute use by name
    pub fn get(&self, name: &QName) -> Option<&AttributeUse> {
        self.uses.get(name)
    }

    /// Attribute uses in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &AttributeUse> {
        self.uses.values()
    }

    /// Number of declared attributes
    pub fn len(&self) -> usize {
        self.uses.len()
    }

    /// Whether no attributes are declared
    pub fn is_empty(&self) -> bool {
        self.uses.is_empty() && self.wildcard.is_none()
    }

    /// The attribute wildcard
    pub fn wildcard(&self) -> Option<&Wildcard> {
        self.wildcard.as_ref()
    }

    /// Set the attribute wildcard
    pub fn set_wildcard(&mut self, wildcard: Option<Wildcard>) {
        self.wildcard = wildcard;
    }

    /// Add the attributes of `base` that are not redeclared here.
    ///
    /// Used for derivation by extension: the wildcard becomes the union of
    /// both wildcards.
    pub fn inherit(&mut self, base: &AttributeSet) {
        let mut merged: IndexMap<QName, AttributeUse> = base.uses.clone();
        for (name, attribute) in self.uses.drain(..) {
            merged.insert(name, attribute);
        }
        self.uses = merged;
        self.wildcard = match (self.wildcard.take(), &base.wildcard) {
            (Some(own), Some(inherited)) => Some(own.union(inherited)),
            (Some(own), None) => Some(own),
            (None, inherited) => inherited.clone(),
        };
    }

    /// Add the attributes of `base` that a restriction does not mention.
    ///
    /// The restriction's own wildcard replaces the inherited one.
    pub fn restrict(&mut self, base: &AttributeSet) {
        for (name, attribute) in &base.uses {
            if !self.uses.contains_key(name) {
                self.uses.insert(name.clone(), attribute.clone());
            }
        }
    }

    /// Names of required attributes missing from `present`
    pub fn missing_required<'a>(&'a self, present: &[&QName]) -> Vec<&'a QName> {
        self.uses
            .values()
            .filter(|a| a.use_mode == Use::Required && !present.contains(&&a.name))
            .map(|a| &a.name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::wildcards::{NamespaceConstraint, ProcessContents};

    fn string_attr(name: &str) -> AttributeUse {
        AttributeUse::new(QName::local(name), Arc::new(SimpleType::builtin("string").unwrap()))
    }

    #[test]
    fn test_use_parse() {
        assert_eq!(Use::parse("required").unwrap(), Use::Required);
        assert_eq!(Use::default(), Use::Optional);
        assert!(Use::parse("mandatory").is_err());
        assert_eq!(Use::Prohibited.to_string(), "prohibited");
    }

    #[test]
    fn test_validate_value() {
        let date = AttributeUse::new(
            QName::local("iso-date"),
            Arc::new(SimpleType::builtin("date").unwrap()),
        );
        assert!(date.validate("2014-01-01").is_ok());
        let err = date.validate("tomorrow").unwrap_err();
        assert!(err.message().contains("iso-date"));
    }

    #[test]
    fn test_fixed_value() {
        let mut version = string_attr("version");
        version.fixed = Some("2.02".to_string());
        assert!(version.validate("2.02").is_ok());
        assert!(version.validate("2.01").is_err());
    }

    #[test]
    fn test_missing_required() {
        let mut set = AttributeSet::new();
        set.insert(string_attr("ref").with_use(Use::Required));
        set.insert(string_attr("type"));
        let code = QName::local("code");
        assert_eq!(set.missing_required(&[&code]), vec![&QName::local("ref")]);
        let reference = QName::local("ref");
        assert!(set.missing_required(&[&reference]).is_empty());
    }

    #[test]
    fn test_inherit() {
        let mut base = AttributeSet::new();
        base.insert(string_attr("code").with_use(Use::Required));
        base.set_wildcard(Some(Wildcard::new(
            NamespaceConstraint::from_namespace_attr("urn:a", None).unwrap(),
            ProcessContents::Lax,
        )));

        let mut derived = AttributeSet::new();
        derived.insert(string_attr("vocabulary"));
        derived.set_wildcard(Some(Wildcard::new(
            NamespaceConstraint::from_namespace_attr("urn:b", None).unwrap(),
            ProcessContents::Lax,
        )));
        derived.inherit(&base);

        let names: Vec<&str> = derived.iter().map(|a| a.name.local_name.as_str()).collect();
        assert_eq!(names, vec!["code", "vocabulary"]);
        let wildcard = derived.wildcard().unwrap();
        assert!(wildcard.is_namespace_allowed(Some("urn:a")));
        assert!(wildcard.is_namespace_allowed(Some("urn:b")));
    }

    #[test]
    fn test_restrict_keeps_unmentioned() {
        let mut base = AttributeSet::new();
        base.insert(string_attr("code"));
        base.insert(string_attr("vocabulary"));

        let mut derived = AttributeSet::new();
        derived.insert(string_attr("vocabulary").with_use(Use::Prohibited));
        derived.restrict(&base);

        assert_eq!(derived.len(), 2);
        let vocabulary = derived.get(&QName::local("vocabulary")).unwrap();
        assert_eq!(vocabulary.use_mode, Use::Prohibited);
    }
}
