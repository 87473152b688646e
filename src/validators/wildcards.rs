//! XSD wildcards
//!
//! `xs:any` and `xs:anyAttribute` admit elements and attributes by
//! namespace. IATI schemas use them to let publishers add elements and
//! attributes from their own namespaces.

use std::collections::HashSet;
use std::fmt;

use crate::error::SchemaError;

/// Process contents mode for wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessContents {
    /// Validate strictly - element/attribute must be declared
    #[default]
    Strict,
    /// Validate if declaration found, otherwise accept
    Lax,
    /// Skip validation entirely
    Skip,
}

impl ProcessContents {
    /// Parse from the `processContents` attribute value
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        match s.trim() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "skip" => Ok(Self::Skip),
            other => Err(SchemaError::new(format!(
                "wrong value '{}' in 'processContents' attribute",
                other
            ))),
        }
    }
}

impl fmt::Display for ProcessContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lax => write!(f, "lax"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Namespace constraint for wildcards
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Any namespace except the target namespace and no namespace (##other)
    Other {
        /// The target namespace to exclude
        target_namespace: Option<String>,
    },
    /// Specific set of allowed namespaces; the empty string stands for no namespace
    Enumeration(HashSet<String>),
}

impl NamespaceConstraint {
    /// Create from the `namespace` attribute value
    pub fn from_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
    ) -> Result<Self, SchemaError> {
        match value.trim() {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::Other {
                target_namespace: target_namespace.map(String::from),
            }),
            value => {
                let mut namespaces = HashSet::new();
                for ns in value.split_whitespace() {
                    match ns {
                        "##local" => {
                            namespaces.insert(String::new());
                        }
                        "##targetNamespace" => {
                            namespaces.insert(target_namespace.unwrap_or_default().to_string());
                        }
                        s if s.starts_with("##") => {
                            return Err(SchemaError::new(format!(
                                "wrong value '{}' in 'namespace' attribute",
                                s
                            )));
                        }
                        uri => {
                            namespaces.insert(uri.to_string());
                        }
                    }
                }
                Ok(Self::Enumeration(namespaces))
            }
        }
    }

    /// Check if a namespace (`None` for no namespace) is allowed
    pub fn is_allowed(&self, namespace: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Other { target_namespace } => match namespace {
                None | Some("") => false,
                Some(ns) => target_namespace.as_deref() != Some(ns),
            },
            Self::Enumeration(set) => set.contains(namespace.unwrap_or_default()),
        }
    }

    /// The union of two constraints, used when extending attribute wildcards
    pub fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Any, _) | (_, Self::Any) => Self::Any,
            (a, b) if a == b => a.clone(),
            (Self::Enumeration(a), Self::Enumeration(b)) => {
                Self::Enumeration(a.union(b).cloned().collect())
            }
            (Self::Other { target_namespace }, Self::Enumeration(set))
            | (Self::Enumeration(set), Self::Other { target_namespace }) => {
                let excluded = target_namespace.clone().unwrap_or_default();
                if set.contains(&excluded) && set.contains("") {
                    Self::Any
                } else {
                    Self::Other {
                        target_namespace: target_namespace.clone(),
                    }
                }
            }
            // two different ##other constraints
            _ => Self::Any,
        }
    }
}

/// A wildcard: namespace constraint plus process contents
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Wildcard {
    /// Namespaces admitted
    pub namespace: NamespaceConstraint,
    /// How admitted items are validated
    pub process_contents: ProcessContents,
}

impl Wildcard {
    /// Create a wildcard
    pub fn new(namespace: NamespaceConstraint, process_contents: ProcessContents) -> Self {
        Self {
            namespace,
            process_contents,
        }
    }

    /// `##any` with lax processing, as used by xs:anyType
    pub fn any_lax() -> Self {
        Self::new(NamespaceConstraint::Any, ProcessContents::Lax)
    }

    /// Check if a namespace is admitted
    pub fn is_namespace_allowed(&self, namespace: Option<&str>) -> bool {
        self.namespace.is_allowed(namespace)
    }

    /// Union with another wildcard; the process contents of `self` is kept
    pub fn union(&self, other: &Wildcard) -> Wildcard {
        Wildcard::new(self.namespace.union(&other.namespace), self.process_contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IATI_EXT: &str = "http://example.org/iati-extension";

    #[test]
    fn test_any() {
        let c = NamespaceConstraint::from_namespace_attr("##any", None).unwrap();
        assert!(c.is_allowed(None));
        assert!(c.is_allowed(Some(IATI_EXT)));
    }

    #[test]
    fn test_other_without_target_namespace() {
        let c = NamespaceConstraint::from_namespace_attr("##other", None).unwrap();
        assert!(!c.is_allowed(None));
        assert!(c.is_allowed(Some(IATI_EXT)));
    }

    #[test]
    fn test_other_with_target_namespace() {
        let c = NamespaceConstraint::from_namespace_attr("##other", Some("urn:t")).unwrap();
        assert!(!c.is_allowed(Some("urn:t")));
        assert!(!c.is_allowed(None));
        assert!(c.is_allowed(Some(IATI_EXT)));
    }

    #[test]
    fn test_enumeration() {
        let c = NamespaceConstraint::from_namespace_attr("##local urn:a", Some("urn:t")).unwrap();
        assert!(c.is_allowed(None));
        assert!(c.is_allowed(Some("urn:a")));
        assert!(!c.is_allowed(Some("urn:t")));

        let c = NamespaceConstraint::from_namespace_attr("##targetNamespace", Some("urn:t")).unwrap();
        assert!(c.is_allowed(Some("urn:t")));
        assert!(NamespaceConstraint::from_namespace_attr("##bogus", None).is_err());
    }

    #[test]
    fn test_union() {
        let a = NamespaceConstraint::from_namespace_attr("urn:a", None).unwrap();
        let b = NamespaceConstraint::from_namespace_attr("urn:b", None).unwrap();
        let u = a.union(&b);
        assert!(u.is_allowed(Some("urn:a")));
        assert!(u.is_allowed(Some("urn:b")));
        assert!(!u.is_allowed(None));
        assert_eq!(a.union(&NamespaceConstraint::Any), NamespaceConstraint::Any);
    }

    #[test]
    fn test_process_contents() {
        assert_eq!(ProcessContents::parse("lax").unwrap(), ProcessContents::Lax);
        assert!(ProcessContents::parse("eager").is_err());
        assert_eq!(ProcessContents::default().to_string(), "strict");
    }
}
