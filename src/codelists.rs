//! IATI Codelists
//!
//! A codelist is a named set of permitted values for a coded attribute.
//! Complete codelists are exhaustive; incomplete ones may legitimately be
//! extended by publishers, so values missing from them are only advisory.

use indexmap::IndexMap;

use crate::documents::Document;
use crate::error::{Error, Result};
use crate::limits::Limits;

/// A single code on a codelist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    /// The code value, as it appears in datasets
    pub value: String,
    /// Human readable name
    pub name: Option<String>,
    /// Longer description
    pub description: Option<String>,
}

impl Code {
    /// Create a code with only a value
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            name: None,
            description: None,
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Representation of a Codelist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codelist {
    name: String,
    codes: IndexMap<String, Code>,
    complete: bool,
}

impl Codelist {
    /// Create a codelist from code values. Duplicate values are kept once.
    pub fn new<I, S>(name: impl Into<String>, codes: I, complete: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        codes
            .into_iter()
            .fold(Self::empty(name, complete), |list, value| list.with_code(Code::new(value)))
    }

    /// Create a codelist without codes
    pub fn empty(name: impl Into<String>, complete: bool) -> Self {
        Self {
            name: name.into(),
            codes: IndexMap::new(),
            complete,
        }
    }

    /// Add a code; the first code with a given value wins
    pub fn with_code(mut self, code: Code) -> Self {
        self.codes.entry(code.value.clone()).or_insert(code);
        self
    }

    /// Parse the IATI codelist XML format:
    ///
    /// ```xml
    /// <codelist name="Vocabulary" complete="1">
    ///   <codelist-items>
    ///     <codelist-item><code>1</code><name><narrative>OECD DAC</narrative></name></codelist-item>
    ///   </codelist-items>
    /// </codelist>
    /// ```
    pub fn from_xml(xml: &str) -> Result<Self> {
        Self::from_xml_with_limits(xml, &Limits::default())
    }

    /// Parse the IATI codelist XML format, enforcing `limits`
    pub fn from_xml_with_limits(xml: &str, limits: &Limits) -> Result<Self> {
        let doc = Document::parse(xml, limits)?;
        let root = doc
            .root_element()
            .ok_or_else(|| Error::Value("Codelist XML has no root element".to_string()))?;
        if root.local_name() != "codelist" {
            return Err(Error::Value(format!(
                "Expected a <codelist> root element, found <{}>",
                root.local_name()
            )));
        }

        let name = root
            .get_attribute("name")
            .ok_or_else(|| Error::Value("Codelist XML has no name attribute".to_string()))?;
        let complete = match root.get_attribute("complete").map(str::trim) {
            Some("1") | Some("true") => true,
            Some("0") | Some("false") | None => false,
            Some(other) => {
                return Err(Error::Value(format!(
                    "Invalid value '{}' for the complete attribute of Codelist {}",
                    other, name
                )))
            }
        };

        let mut codelist = Self::empty(name, complete);
        let root_id = doc.root().unwrap_or_default();
        for items in child_elements(&doc, root_id, "codelist-items") {
            for item in child_elements(&doc, items, "codelist-item") {
                let Some(value) = child_elements(&doc, item, "code")
                    .first()
                    .map(|id| doc.string_value(*id).trim().to_string())
                else {
                    continue;
                };
                let mut code = Code::new(value);
                if let Some(name) = narrative(&doc, item, "name") {
                    code = code.with_name(name);
                }
                if let Some(description) = narrative(&doc, item, "description") {
                    code = code.with_description(description);
                }
                codelist = codelist.with_code(code);
            }
        }

        Ok(codelist)
    }

    /// Codelist name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the codelist is exhaustive
    pub fn complete(&self) -> bool {
        self.complete
    }

    /// Whether `value` is a code on this list (exact match)
    pub fn contains(&self, value: &str) -> bool {
        self.codes.contains_key(value)
    }

    /// Look up a code
    pub fn code(&self, value: &str) -> Option<&Code> {
        self.codes.get(value)
    }

    /// Codes in declaration order
    pub fn codes(&self) -> impl Iterator<Item = &Code> {
        self.codes.values()
    }

    /// Number of codes
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the codelist has no codes
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// An `xsd:simpleType` restricting `xsd:string` to the codes on this
    /// list, named `{name}-type`. The `xsd` prefix must be bound to the
    /// XML Schema namespace where the fragment is used.
    pub fn xsd_simple_type(&self) -> String {
        let mut out = format!(
            "<xsd:simpleType name=\"{}-type\"><xsd:restriction base=\"xsd:string\">",
            escape_attribute(&self.name)
        );
        for code in self.codes.keys() {
            out.push_str(&format!(
                "<xsd:enumeration value=\"{}\"/>",
                escape_attribute(code)
            ));
        }
        out.push_str("</xsd:restriction></xsd:simpleType>");
        out
    }
}

fn child_elements(doc: &Document, parent: usize, local_name: &str) -> Vec<usize> {
    doc.children(parent)
        .into_iter()
        .filter(|id| doc.element(*id).local_name() == local_name)
        .collect()
}

/// Text of `<{element}><narrative>..</narrative></{element}>`, or of the element itself
fn narrative(doc: &Document, item: usize, element: &str) -> Option<String> {
    let id = *child_elements(doc, item, element).first()?;
    let text = match child_elements(doc, id, "narrative").first() {
        Some(narrative) => doc.string_value(*narrative),
        None => doc.string_value(id),
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn escape_attribute(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOCABULARY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<codelist name="SectorVocabulary" complete="1">
  <metadata><name><narrative>Sector Vocabulary</narrative></name></metadata>
  <codelist-items>
    <codelist-item>
      <code>1</code>
      <name><narrative>OECD DAC CRS Purpose Codes (5 digit)</narrative></name>
    </codelist-item>
    <codelist-item>
      <code>2</code>
      <name><narrative>OECD DAC CRS Purpose Codes (3 digit)</narrative></name>
      <description><narrative>The sector reported corresponds to an OECD DAC CRS 3-digit category</narrative></description>
    </codelist-item>
    <codelist-item>
      <code> 99 </code>
    </codelist-item>
  </codelist-items>
</codelist>"#;

    #[test]
    fn test_from_xml() {
        let codelist = Codelist::from_xml(VOCABULARY_XML).unwrap();
        assert_eq!(codelist.name(), "SectorVocabulary");
        assert!(codelist.complete());
        assert_eq!(codelist.len(), 3);
        assert!(codelist.contains("1"));
        assert!(codelist.contains("99"));
        assert!(!codelist.contains("3"));

        let code = codelist.code("2").unwrap();
        assert_eq!(code.name.as_deref(), Some("OECD DAC CRS Purpose Codes (3 digit)"));
        assert!(code.description.as_deref().unwrap().contains("3-digit"));
        assert!(codelist.code("99").unwrap().name.is_none());
    }

    #[test]
    fn test_completeness_attribute() {
        let incomplete = Codelist::from_xml(r#"<codelist name="Country" complete="0"/>"#).unwrap();
        assert!(!incomplete.complete());
        assert!(incomplete.is_empty());

        let absent = Codelist::from_xml(r#"<codelist name="Country"/>"#).unwrap();
        assert!(!absent.complete());

        assert!(Codelist::from_xml(r#"<codelist name="Country" complete="yes"/>"#).is_err());
    }

    #[test]
    fn test_from_xml_errors() {
        assert!(Codelist::from_xml("<codelist complete=\"1\"/>").is_err());
        assert!(Codelist::from_xml("<mappings/>").is_err());
        assert!(Codelist::from_xml("<codelist").is_err());
    }

    #[test]
    fn test_duplicates_keep_declaration_order() {
        let codelist = Codelist::new("Version", ["2.02", "2.01", "2.02", "1.05"], true);
        let values: Vec<_> = codelist.codes().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["2.02", "2.01", "1.05"]);
    }

    #[test]
    fn test_contains_is_exact() {
        let codelist = Codelist::new("Currency", ["EUR"], true);
        assert!(codelist.contains("EUR"));
        assert!(!codelist.contains("eur"));
        assert!(!codelist.contains(" EUR"));
    }

    #[test]
    fn test_xsd_simple_type() {
        let codelist = Codelist::new("Odd&Name", ["A", "B\"C"], true);
        let xsd = codelist.xsd_simple_type();
        assert!(xsd.starts_with("<xsd:simpleType name=\"Odd&amp;Name-type\">"));
        assert!(xsd.contains("<xsd:enumeration value=\"A\"/>"));
        assert!(xsd.contains("<xsd:enumeration value=\"B&quot;C\"/>"));
    }
}
