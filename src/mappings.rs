//! Codelist mappings
//!
//! A codelist mapping says where in a dataset the values of each Codelist
//! are expected: for a codelist name, a list of rules, each an XPath to an
//! attribute plus an optional condition on the containing element.
//!
//! ```xml
//! <mappings>
//!   <mapping>
//!     <path>//iati-activity/sector/@code</path>
//!     <codelist ref="Sector"/>
//!     <condition>@vocabulary = '1' or not(@vocabulary)</condition>
//!   </mapping>
//! </mappings>
//! ```

use std::path::Path;

use indexmap::IndexMap;

use crate::documents::{Document, NodeId};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::xpath::{AttributeSelector, XPath, XPathParseError};

/// Where a codelist's values appear in a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    /// XPath ending in the attribute step, e.g. `//iati-activity/sector/@code`
    pub xpath: String,
    /// XPath boolean evaluated on the containing element; `None` always applies
    pub condition: Option<String>,
}

impl MappingRule {
    /// Create a rule
    pub fn new(xpath: impl Into<String>, condition: Option<String>) -> Self {
        Self {
            xpath: xpath.into(),
            condition: condition.filter(|c| !c.trim().is_empty()),
        }
    }

    /// The rule's path split into containing-element path and attribute name
    pub fn selector(&self) -> std::result::Result<AttributeSelector, XPathParseError> {
        AttributeSelector::parse(&self.xpath)
    }
}

/// Mapping from codelist names to the rules locating their values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodelistMapping {
    rules: IndexMap<String, Vec<MappingRule>>,
}

impl CodelistMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the codelist mapping XML format
    pub fn from_xml(xml: &str) -> Result<Self> {
        Self::from_xml_with_limits(xml, &Limits::default())
    }

    /// Parse the codelist mapping XML format, enforcing `limits`
    pub fn from_xml_with_limits(xml: &str, limits: &Limits) -> Result<Self> {
        let doc = Document::parse(xml, limits)?;
        let mut mapping = Self::new();
        for id in XPath::compile("//mapping")?.select_elements(&doc)? {
            let xpath = child_text(&doc, id, "path")
                .ok_or_else(|| Error::Value("codelist mapping entry has no path".to_string()))?;
            let name = child(&doc, id, "codelist")
                .and_then(|c| doc.element(c).get_attribute("ref"))
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    Error::Value(format!("codelist mapping entry for '{}' has no codelist ref", xpath))
                })?
                .to_string();
            let condition = child_text(&doc, id, "condition");
            mapping.insert(name, MappingRule::new(xpath, condition));
        }
        tracing::debug!(codelists = mapping.len(), "loaded codelist mapping");
        Ok(mapping)
    }

    /// Load a mapping file
    pub fn from_file(path: impl AsRef<Path>, loader: &Loader) -> Result<Self> {
        let xml = loader.load(path)?;
        Self::from_xml_with_limits(&xml, loader.limits())
    }

    /// Add a rule for `codelist`
    pub fn insert(&mut self, codelist: impl Into<String>, rule: MappingRule) {
        self.rules.entry(codelist.into()).or_default().push(rule);
    }

    /// Rules for a codelist, failing if the codelist is not mapped
    pub fn rules_for(&self, codelist: &str) -> Result<&[MappingRule]> {
        self.rules
            .get(codelist)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::MissingMapping(codelist.to_string()))
    }

    /// Whether the codelist has rules
    pub fn contains(&self, codelist: &str) -> bool {
        self.rules.contains_key(codelist)
    }

    /// Mapped codelist names, in file order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Number of mapped codelists
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no codelist is mapped
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn child(doc: &Document, id: NodeId, name: &str) -> Option<NodeId> {
    doc.children(id)
        .into_iter()
        .find(|&c| doc.element(c).local_name() == name)
}

fn child_text(doc: &Document, id: NodeId, name: &str) -> Option<String> {
    child(doc, id, name)
        .map(|c| doc.string_value(c).trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MAPPING: &str = r#"<?xml version="1.0"?>
<mappings>
  <mapping>
    <path>//iati-activity/sector/@code</path>
    <codelist ref="Sector"/>
    <condition>@vocabulary = '1' or not(@vocabulary)</condition>
  </mapping>
  <mapping>
    <path>//iati-activity/sector/@vocabulary</path>
    <codelist ref="SectorVocabulary"/>
  </mapping>
  <mapping>
    <path>//iati-activity/transaction/sector/@code</path>
    <codelist ref="Sector"/>
    <condition></condition>
  </mapping>
</mappings>"#;

    #[test]
    fn test_from_xml() {
        let mapping = CodelistMapping::from_xml(MAPPING).unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.names().collect::<Vec<_>>(), vec!["Sector", "SectorVocabulary"]);

        let sector = mapping.rules_for("Sector").unwrap();
        assert_eq!(sector.len(), 2);
        assert_eq!(sector[0].xpath, "//iati-activity/sector/@code");
        assert_eq!(
            sector[0].condition.as_deref(),
            Some("@vocabulary = '1' or not(@vocabulary)")
        );
        // an empty condition always applies
        assert_eq!(sector[1].condition, None);
    }

    #[test]
    fn test_missing_mapping() {
        let mapping = CodelistMapping::from_xml(MAPPING).unwrap();
        let err = mapping.rules_for("Currency").unwrap_err();
        assert!(matches!(err, Error::MissingMapping(ref name) if name == "Currency"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_entry_without_ref() {
        let xml = "<mappings><mapping><path>//a/@b</path><codelist/></mapping></mappings>";
        assert!(CodelistMapping::from_xml(xml).is_err());
    }

    #[test]
    fn test_rule_selector() {
        let rule = MappingRule::new("//iati-activity/sector/@vocabulary", None);
        let selector = rule.selector().unwrap();
        assert_eq!(selector.attribute, "vocabulary");
        assert!(MappingRule::new("//iati-activity/sector", None).selector().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MAPPING.as_bytes()).unwrap();
        let mapping = CodelistMapping::from_file(file.path(), &Loader::new()).unwrap();
        assert!(mapping.contains("SectorVocabulary"));
    }
}
