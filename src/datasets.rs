//! IATI datasets
//!
//! A [`Dataset`] holds an XML document in two forms, a parsed tree and its
//! serialized text. Whichever form was assigned last is authoritative and
//! the other is derived from it immediately, so the two never disagree.

use crate::documents::Document;
use crate::error::{Error, Result};
use crate::limits::Limits;

const INVALID_XML_MESSAGE: &str = "The string provided to create a Dataset from is not valid XML.";

/// Input accepted when creating or updating a [`Dataset`]
#[derive(Debug, Clone)]
pub enum XmlSource {
    /// An already-parsed tree
    Tree(Document),
    /// Raw XML text
    Str(String),
}

impl From<Document> for XmlSource {
    fn from(doc: Document) -> Self {
        XmlSource::Tree(doc)
    }
}

impl From<String> for XmlSource {
    fn from(xml: String) -> Self {
        XmlSource::Str(xml)
    }
}

impl From<&str> for XmlSource {
    fn from(xml: &str) -> Self {
        XmlSource::Str(xml.to_string())
    }
}

/// Which representation of a dataset was assigned last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// The tree was assigned; the string is its serialization
    Tree,
    /// The string was assigned; the tree is its parse
    Str,
}

/// Representation of an IATI XML file that may be validated against a schema
#[derive(Debug, Clone)]
pub struct Dataset {
    xml_str: String,
    xml_tree: Document,
    authority: Authority,
    limits: Limits,
}

impl Dataset {
    /// Create a dataset from a tree or a string, with default limits
    pub fn new(source: impl Into<XmlSource>) -> Result<Self> {
        Self::with_limits(source, Limits::default())
    }

    /// Create a dataset, enforcing `limits` whenever XML is parsed
    pub fn with_limits(source: impl Into<XmlSource>, limits: Limits) -> Result<Self> {
        let (xml_str, xml_tree, authority) = Self::derive(source.into(), &limits)?;
        Ok(Self {
            xml_str,
            xml_tree,
            authority,
            limits,
        })
    }

    fn derive(source: XmlSource, limits: &Limits) -> Result<(String, Document, Authority)> {
        match source {
            XmlSource::Str(xml) => {
                let tree = Self::parse(&xml, limits)?;
                Ok((xml, tree, Authority::Str))
            }
            XmlSource::Tree(tree) => {
                if tree.root().is_none() {
                    return Err(Error::Value(
                        "Datasets can only be created from trees with a root element".to_string(),
                    ));
                }
                let xml = tree.to_xml_string()?;
                // Reparse so that element line numbers refer to `xml`
                let tree = Self::parse(&xml, limits)?;
                Ok((xml, tree, Authority::Tree))
            }
        }
    }

    fn parse(xml: &str, limits: &Limits) -> Result<Document> {
        Document::parse(xml, limits).map_err(|e| match e {
            Error::Xml(detail) => {
                tracing::debug!(%detail, "dataset XML failed to parse");
                Error::Value(INVALID_XML_MESSAGE.to_string())
            }
            other => other,
        })
    }

    /// The serialized form
    pub fn xml_str(&self) -> &str {
        &self.xml_str
    }

    /// The parsed form
    pub fn xml_tree(&self) -> &Document {
        &self.xml_tree
    }

    /// Which representation was assigned last
    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Limits applied when parsing
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Replace the content with an XML string. On error the dataset is unchanged.
    pub fn set_xml_str(&mut self, xml: impl Into<String>) -> Result<()> {
        self.assign(XmlSource::Str(xml.into()))
    }

    /// Replace the content with a tree. On error the dataset is unchanged.
    pub fn set_xml_tree(&mut self, tree: Document) -> Result<()> {
        self.assign(XmlSource::Tree(tree))
    }

    fn assign(&mut self, source: XmlSource) -> Result<()> {
        let (xml_str, xml_tree, authority) = Self::derive(source, &self.limits)?;
        self.xml_str = xml_str;
        self.xml_tree = xml_tree;
        self.authority = authority;
        Ok(())
    }

    /// The source lines from `line - surrounding` to `line + surrounding`
    /// (1-based, clamped to the document), joined with newlines
    pub fn source_around_line(&self, line: usize, surrounding: usize) -> String {
        let first = line.saturating_sub(surrounding).max(1);
        let last = line.saturating_add(surrounding);
        self.xml_str
            .lines()
            .enumerate()
            .filter(|(i, _)| (first..=last).contains(&(i + 1)))
            .map(|(_, l)| l)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::QName;

    const XML: &str = "<iati-activities version=\"2.02\">\n  <iati-activity>\n    <sector code=\"A\"/>\n  </iati-activity>\n</iati-activities>";

    #[test]
    fn test_from_string() {
        let dataset = Dataset::new(XML).unwrap();
        assert_eq!(dataset.xml_str(), XML);
        assert_eq!(dataset.authority(), Authority::Str);
        let root = dataset.xml_tree().root_element().unwrap();
        assert_eq!(root.local_name(), "iati-activities");
    }

    #[test]
    fn test_invalid_string() {
        let err = Dataset::new("<iati-activities>").unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("value error: {}", INVALID_XML_MESSAGE)
        );
        assert!(Dataset::new("").is_err());
    }

    #[test]
    fn test_from_tree_serializes() {
        let mut doc = Document::with_root(QName::local("iati-activities"));
        let root = doc.root().unwrap();
        let activity = doc.append_element(root, QName::local("iati-activity"));
        doc.set_attribute(activity, QName::local("default-currency"), "EUR");

        let dataset = Dataset::new(doc).unwrap();
        assert_eq!(dataset.authority(), Authority::Tree);
        assert!(dataset.xml_str().contains("default-currency=\"EUR\""));

        // line numbers of the derived tree refer to the derived string
        let tree = dataset.xml_tree();
        let activity = tree.children(tree.root().unwrap())[0];
        let line = tree.element(activity).source_line.unwrap();
        assert!(dataset
            .source_around_line(line, 0)
            .contains("<iati-activity default-currency=\"EUR\"/>"));
    }

    #[test]
    fn test_tree_without_root_rejected() {
        assert!(matches!(Dataset::new(Document::new()), Err(Error::Value(_))));
    }

    #[test]
    fn test_reassignment_keeps_forms_consistent() {
        let mut dataset = Dataset::new(XML).unwrap();
        dataset.set_xml_str("<a><b/></a>").unwrap();
        assert_eq!(dataset.xml_tree().len(), 2);
        assert_eq!(dataset.authority(), Authority::Str);

        let tree = Document::from_string("<x><y/><y/><y/></x>").unwrap();
        dataset.set_xml_tree(tree).unwrap();
        assert_eq!(dataset.authority(), Authority::Tree);
        assert_eq!(Document::from_string(dataset.xml_str()).unwrap().len(), 4);
    }

    #[test]
    fn test_failed_assignment_leaves_dataset_unchanged() {
        let mut dataset = Dataset::new(XML).unwrap();
        assert!(dataset.set_xml_str("not xml").is_err());
        assert_eq!(dataset.xml_str(), XML);
        assert_eq!(dataset.xml_tree().len(), 3);
    }

    #[test]
    fn test_source_around_line() {
        let dataset = Dataset::new(XML).unwrap();
        let lines: Vec<&str> = XML.split('\n').collect();
        assert_eq!(dataset.source_around_line(3, 1), lines[1..4].join("\n"));
        assert_eq!(dataset.source_around_line(1, 1), lines[0..2].join("\n"));
        assert_eq!(dataset.source_around_line(5, 2), lines[2..5].join("\n"));
    }
}
