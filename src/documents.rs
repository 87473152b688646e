//! XML document handling
//!
//! An arena-backed element tree. Documents are parsed with `roxmltree`,
//! which gives us namespace resolution and source positions, then copied
//! into an owned tree that can be edited, queried with XPath and
//! serialized again with `quick-xml`.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, QName, XML_NAMESPACE};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Index of an element inside its [`Document`]
pub type NodeId = usize;

/// An attribute on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute qualified name
    pub qname: QName,
    /// Prefix used in the source, if any
    pub prefix: Option<String>,
    /// Attribute value (unescaped)
    pub value: String,
}

/// A piece of element content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// A child element
    Element(NodeId),
    /// Character data (whitespace-only runs are not kept)
    Text(String),
}

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Prefix used in the source, if any
    pub prefix: Option<String>,
    /// Element attributes, in source order
    pub attributes: Vec<Attribute>,
    /// Namespace declarations made on this element (`None` = default namespace)
    pub namespaces: Vec<(Option<String>, String)>,
    /// Child elements and text, in document order
    pub content: Vec<Content>,
    /// Parent element
    pub parent: Option<NodeId>,
    /// 1-based line of the start tag in the parsed source
    pub source_line: Option<usize>,
}

impl Element {
    /// Create a new detached element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            prefix: None,
            attributes: Vec::new(),
            namespaces: Vec::new(),
            content: Vec::new(),
            parent: None,
            source_line: None,
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Get an unqualified attribute value by local name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.qname.namespace.is_none() && a.qname.local_name == name)
            .map(|a| a.value.as_str())
    }

    /// Get an attribute value by qualified name
    pub fn get_attribute_qname(&self, qname: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| &a.qname == qname)
            .map(|a| a.value.as_str())
    }

    /// The name as written in the source (`prefix:local` or `local`)
    pub fn prefixed_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.qname.local_name),
            None => self.qname.local_name.clone(),
        }
    }

    /// Child element ids
    pub fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.content.iter().filter_map(|c| match c {
            Content::Element(id) => Some(*id),
            Content::Text(_) => None,
        })
    }

    /// Whether the element has non-whitespace character data of its own
    pub fn has_text(&self) -> bool {
        self.content.iter().any(|c| matches!(c, Content::Text(_)))
    }

    /// Concatenation of the element's own character data
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                Content::Text(t) => Some(t.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }
}

/// XML Document representation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Element>,
    root: Option<NodeId>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document with a single root element
    pub fn with_root(qname: QName) -> Self {
        let mut doc = Self::new();
        let id = doc.push(Element::new(qname));
        doc.root = Some(id);
        doc
    }

    /// Parse an XML document from a string using default limits
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml, &Limits::default())
    }

    /// Parse an XML document from a string, enforcing `limits`
    pub fn parse(xml: &str, limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let source = roxmltree::Document::parse_with_options(xml, options)
            .map_err(|e| Error::Xml(e.to_string()))?;
        let source_root = source.root_element();

        let mut doc = Document::new();
        let root_id = doc.push(Self::convert(&source, xml, source_root, None, limits)?);
        doc.root = Some(root_id);

        // Explicit stack: deeply nested input must not exhaust the call stack
        let mut stack = vec![(source_root, root_id, 1usize)];
        while let Some((node, id, depth)) = stack.pop() {
            limits.check_xml_depth(depth)?;
            for child in node.children() {
                if child.is_element() {
                    let child_id = doc.push(Self::convert(&source, xml, child, Some(id), limits)?);
                    doc.nodes[id].content.push(Content::Element(child_id));
                    stack.push((child, child_id, depth + 1));
                } else if child.is_text() {
                    let text = child.text().unwrap_or_default();
                    if !text.trim().is_empty() {
                        doc.append_text(id, text);
                    }
                }
            }
        }

        Ok(doc)
    }

    fn convert(
        source: &roxmltree::Document,
        xml: &str,
        node: roxmltree::Node,
        parent: Option<NodeId>,
        limits: &Limits,
    ) -> Result<Element> {
        let tag = node.tag_name();
        // xmlns="" puts an element back in no namespace
        let mut element = Element::new(QName::new(non_empty(tag.namespace()), tag.name()));
        element.parent = parent;
        element.source_line = Some(source.text_pos_at(node.range().start).row as usize);

        // roxmltree resolves prefixes away; recover the one used in the start tag
        let start_tag = &xml[node.range().start..];
        let raw_name: String = start_tag
            .trim_start_matches('<')
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
            .collect();
        element.prefix = raw_name.split_once(':').map(|(p, _)| p.to_string());

        let attributes: Vec<_> = node.attributes().collect();
        limits.check_attributes(attributes.len())?;
        for attr in attributes {
            let prefix = match attr.namespace() {
                Some(XML_NAMESPACE) => Some("xml".to_string()),
                Some(uri) => node
                    .namespaces()
                    .find(|ns| ns.uri() == uri && ns.name().is_some())
                    .and_then(|ns| ns.name())
                    .map(str::to_string),
                None => None,
            };
            element.attributes.push(Attribute {
                qname: QName::new(non_empty(attr.namespace()), attr.name()),
                prefix,
                value: attr.value().to_string(),
            });
        }

        // Declarations made here are the in-scope bindings the parent lacks
        let parent_node = node.parent_element();
        for ns in node.namespaces() {
            if ns.name() == Some("xml") {
                continue;
            }
            let inherited = parent_node.map_or(false, |p| {
                p.namespaces()
                    .any(|pns| pns.name() == ns.name() && pns.uri() == ns.uri())
            });
            if !inherited {
                element
                    .namespaces
                    .push((ns.name().map(str::to_string), ns.uri().to_string()));
            }
        }
        if let Some(p) = parent_node {
            let parent_default = p.namespaces().any(|pns| pns.name().is_none());
            let own_default = node.namespaces().any(|ns| ns.name().is_none());
            if parent_default && !own_default {
                element.namespaces.push((None, String::new()));
            }
        }

        Ok(element)
    }

    fn push(&mut self, element: Element) -> NodeId {
        self.nodes.push(element);
        self.nodes.len() - 1
    }

    /// Get the root element id
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Get the root element
    pub fn root_element(&self) -> Option<&Element> {
        self.root.map(|id| &self.nodes[id])
    }

    /// Get an element by id
    pub fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id]
    }

    /// Get an element mutably by id
    pub fn element_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id]
    }

    /// Number of elements in the document
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no elements
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child elements of `id`, in document order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id].child_ids().collect()
    }

    /// Parent element of `id`
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// All elements in document order, starting at the root
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if let Some(root) = self.root {
            self.collect_descendants(root, &mut order);
        }
        order
    }

    /// `id` followed by all of its descendant elements, in document order
    pub fn descendants_or_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let children: Vec<_> = self.nodes[current].child_ids().collect();
            stack.extend(children.into_iter().rev());
        }
    }

    /// XPath string-value: all descendant character data, concatenated
    pub fn string_value(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack: Vec<&Content> = self.nodes[id].content.iter().rev().collect();
        while let Some(content) = stack.pop() {
            match content {
                Content::Text(t) => out.push_str(t),
                Content::Element(child) => {
                    stack.extend(self.nodes[*child].content.iter().rev());
                }
            }
        }
        out
    }

    /// Namespace bindings in scope at `id`
    pub fn namespace_context(&self, id: NodeId) -> NamespaceContext {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            chain.push(parent);
            current = parent;
        }

        let mut ctx = NamespaceContext::new();
        for node in chain.into_iter().rev() {
            for (prefix, uri) in &self.nodes[node].namespaces {
                match prefix {
                    Some(p) => ctx.add_prefix(p.clone(), uri.clone()),
                    None => ctx.set_default_namespace(uri.clone()),
                }
            }
        }
        ctx
    }

    /// Look up the namespace bound to `prefix` (`None` = default) at `id`
    pub fn lookup_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<String> {
        let mut current = Some(id);
        while let Some(node) = current {
            let element = &self.nodes[node];
            if let Some((_, uri)) = element
                .namespaces
                .iter()
                .find(|(p, _)| p.as_deref() == prefix)
            {
                return if uri.is_empty() { None } else { Some(uri.clone()) };
            }
            current = element.parent;
        }
        match prefix {
            Some("xml") => Some(XML_NAMESPACE.to_string()),
            _ => None,
        }
    }

    /// Append a new child element to `parent` and return its id
    pub fn append_element(&mut self, parent: NodeId, qname: QName) -> NodeId {
        let mut element = Element::new(qname);
        element.parent = Some(parent);
        let id = self.push(element);
        self.nodes[parent].content.push(Content::Element(id));
        id
    }

    /// Set (or replace) an attribute on `id`
    pub fn set_attribute(&mut self, id: NodeId, qname: QName, value: impl Into<String>) {
        let value = value.into();
        let element = &mut self.nodes[id];
        match element.attributes.iter_mut().find(|a| a.qname == qname) {
            Some(existing) => existing.value = value,
            None => {
                let prefix = match qname.namespace.as_deref() {
                    Some(XML_NAMESPACE) => Some("xml".to_string()),
                    _ => None,
                };
                element.attributes.push(Attribute {
                    qname,
                    prefix,
                    value,
                })
            }
        }
    }

    /// Append character data to `id`, merging with a preceding text run
    pub fn append_text(&mut self, id: NodeId, text: &str) {
        let content = &mut self.nodes[id].content;
        if let Some(Content::Text(last)) = content.last_mut() {
            last.push_str(text);
        } else {
            content.push(Content::Text(text.to_string()));
        }
    }

    /// Declare a namespace on `id` (`None` prefix = default namespace)
    pub fn declare_namespace(&mut self, id: NodeId, prefix: Option<&str>, uri: &str) {
        let element = &mut self.nodes[id];
        element.namespaces.retain(|(p, _)| p.as_deref() != prefix);
        element
            .namespaces
            .push((prefix.map(str::to_string), uri.to_string()));
    }

    /// Serialize to an indented XML string with an XML declaration
    pub fn to_xml_string(&self) -> Result<String> {
        let root = self
            .root
            .ok_or_else(|| Error::Xml("Cannot serialize a document without a root element".to_string()))?;

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;

        enum Step {
            Open(NodeId),
            Close(String),
            Text(String),
        }

        let mut scopes = vec![NamespaceContext::new()];
        let mut steps = vec![Step::Open(root)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Open(id) => {
                    let element = &self.nodes[id];
                    let mut scope = scopes.last().cloned().unwrap_or_default();
                    let (name, start) = self.start_tag(element, &mut scope);
                    if element.content.is_empty() {
                        writer.write_event(Event::Empty(start)).map_err(write_error)?;
                        continue;
                    }
                    writer.write_event(Event::Start(start)).map_err(write_error)?;
                    scopes.push(scope);
                    steps.push(Step::Close(name));
                    for content in element.content.iter().rev() {
                        steps.push(match content {
                            Content::Element(child) => Step::Open(*child),
                            Content::Text(t) => Step::Text(t.clone()),
                        });
                    }
                }
                Step::Close(name) => {
                    scopes.pop();
                    writer
                        .write_event(Event::End(BytesEnd::new(name)))
                        .map_err(write_error)?;
                }
                Step::Text(text) => {
                    writer
                        .write_event(Event::Text(BytesText::new(&text)))
                        .map_err(write_error)?;
                }
            }
        }

        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Xml(format!("Serialized XML is not UTF-8: {}", e)))
    }

    /// Build the start tag for `element`, adding whatever namespace
    /// declarations are needed for its names to resolve in `scope`.
    fn start_tag(&self, element: &Element, scope: &mut NamespaceContext) -> (String, BytesStart<'static>) {
        let mut declarations: Vec<(Option<String>, String)> = element.namespaces.clone();
        for (prefix, uri) in &element.namespaces {
            bind(scope, prefix.as_deref(), uri);
        }

        let element_ns = element.qname.namespace.clone().unwrap_or_default();
        let bound = match &element.prefix {
            Some(p) => scope.get_namespace(p).unwrap_or_default().to_string(),
            None => scope.get_default_namespace().unwrap_or_default().to_string(),
        };
        if bound != element_ns {
            bind(scope, element.prefix.as_deref(), &element_ns);
            declarations.push((element.prefix.clone(), element_ns));
        }

        let mut attributes = Vec::with_capacity(element.attributes.len());
        let mut generated = 0;
        for attr in &element.attributes {
            let key = match attr.qname.namespace.as_deref() {
                None => attr.qname.local_name.clone(),
                Some(XML_NAMESPACE) => format!("xml:{}", attr.qname.local_name),
                Some(uri) => {
                    let prefix = match &attr.prefix {
                        Some(p) if scope.get_namespace(p) == Some(uri) => p.clone(),
                        Some(p) => {
                            bind(scope, Some(p), uri);
                            declarations.push((Some(p.clone()), uri.to_string()));
                            p.clone()
                        }
                        None => {
                            let p = format!("ns{}", generated);
                            generated += 1;
                            bind(scope, Some(&p), uri);
                            declarations.push((Some(p.clone()), uri.to_string()));
                            p
                        }
                    };
                    format!("{}:{}", prefix, attr.qname.local_name)
                }
            };
            attributes.push((key, attr.value.clone()));
        }

        let name = element.prefixed_name();
        let mut start = BytesStart::new(name.clone());
        for (prefix, uri) in &declarations {
            let key = match prefix {
                Some(p) => format!("xmlns:{}", p),
                None => "xmlns".to_string(),
            };
            start.push_attribute((key.as_str(), uri.as_str()));
        }
        for (key, value) in &attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        (name, start)
    }
}

fn bind(scope: &mut NamespaceContext, prefix: Option<&str>, uri: &str) {
    match prefix {
        Some(p) => scope.add_prefix(p, uri),
        None => scope.set_default_namespace(uri),
    }
}

fn write_error(e: impl std::fmt::Display) -> Error {
    Error::Xml(format!("Failed to serialize XML: {}", e))
}

fn non_empty(namespace: Option<&str>) -> Option<&str> {
    namespace.filter(|ns| !ns.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IATI_NS: &str = "http://example.org/iati";

    #[test]
    fn test_document_creation() {
        let doc = Document::new();
        assert!(doc.root().is_none());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root().unwrap();
        assert_eq!(doc.element(root).local_name(), "root");
        let children = doc.children(root);
        assert_eq!(children.len(), 1);
        assert_eq!(doc.element(children[0]).local_name(), "child");
        assert_eq!(doc.element(children[0]).text(), "text");
    }

    #[test]
    fn test_parse_with_attributes() {
        let xml = r#"<root attr1="value1" attr2="a &amp; b"><child/></root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root_element().unwrap();
        assert_eq!(root.get_attribute("attr1"), Some("value1"));
        assert_eq!(root.get_attribute("attr2"), Some("a & b"));
        assert_eq!(root.get_attribute("missing"), None);
    }

    #[test]
    fn test_parse_with_namespaces() {
        let xml = r#"<i:root xmlns:i="http://example.org/iati" xmlns="http://example.com"><item xml:lang="en"/></i:root>"#;
        let doc = Document::from_string(xml).unwrap();

        let root = doc.root().unwrap();
        let element = doc.element(root);
        assert_eq!(element.namespace(), Some(IATI_NS));
        assert_eq!(element.prefix.as_deref(), Some("i"));
        assert_eq!(element.namespaces.len(), 2);

        let item = doc.children(root)[0];
        assert_eq!(doc.element(item).namespace(), Some("http://example.com"));
        assert!(doc.element(item).namespaces.is_empty());
        assert_eq!(
            doc.element(item)
                .get_attribute_qname(&QName::namespaced(XML_NAMESPACE, "lang")),
            Some("en")
        );
        assert_eq!(doc.lookup_namespace(item, Some("i")).as_deref(), Some(IATI_NS));
        assert_eq!(
            doc.namespace_context(item).get_default_namespace(),
            Some("http://example.com")
        );
    }

    #[test]
    fn test_source_lines() {
        let xml = "<root>\n  <a/>\n\n  <b>\n    <c/>\n  </b>\n</root>";
        let doc = Document::from_string(xml).unwrap();

        let lines: Vec<_> = doc
            .preorder()
            .into_iter()
            .map(|id| (doc.element(id).local_name().to_string(), doc.element(id).source_line))
            .collect();
        assert_eq!(
            lines,
            vec![
                ("root".to_string(), Some(1)),
                ("a".to_string(), Some(2)),
                ("b".to_string(), Some(4)),
                ("c".to_string(), Some(5)),
            ]
        );
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(Document::from_string("<a><b></a>"), Err(Error::Xml(_))));
        assert!(Document::from_string("not xml").is_err());
        assert!(Document::from_string("").is_err());
    }

    #[test]
    fn test_undeclared_default_namespace() {
        let xml = r#"<root xmlns="urn:ext"><activity xmlns=""><sector/></activity></root>"#;
        let doc = Document::from_string(xml).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.element(root).namespace(), Some("urn:ext"));

        let activity = doc.children(root)[0];
        assert_eq!(doc.element(activity).namespace(), None);
        assert_eq!(doc.element(doc.children(activity)[0]).namespace(), None);
    }

    #[test]
    fn test_doctype_accepted() {
        let doc = Document::from_string("<!DOCTYPE a><a><b/></a>").unwrap();
        assert_eq!(doc.root_element().unwrap().local_name(), "a");
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_depth_limit() {
        let mut limits = Limits::default();
        limits.max_xml_depth = 3;
        let shallow = "<a><b><c/></b></a>";
        let deep = "<a><b><c><d/></c></b></a>";
        assert!(Document::parse(shallow, &limits).is_ok());
        assert!(matches!(
            Document::parse(deep, &limits),
            Err(Error::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_attribute_limit() {
        let mut limits = Limits::default();
        limits.max_attributes = 1;
        assert!(Document::parse(r#"<a x="1" y="2"/>"#, &limits).is_err());
    }

    #[test]
    fn test_mixed_content_string_value() {
        let doc = Document::from_string("<p>one <b>two</b> three</p>").unwrap();
        let root = doc.root().unwrap();
        assert_eq!(doc.string_value(root), "one two three");
        assert_eq!(doc.element(root).text(), "one  three");
    }

    #[test]
    fn test_builder_and_serialize() {
        let mut doc = Document::with_root(QName::local("iati-activities"));
        let root = doc.root().unwrap();
        doc.set_attribute(root, QName::local("version"), "2.02");
        let activity = doc.append_element(root, QName::local("iati-activity"));
        let sector = doc.append_element(activity, QName::local("sector"));
        doc.set_attribute(sector, QName::local("vocabulary"), "99");
        let title = doc.append_element(activity, QName::local("title"));
        doc.append_text(title, "Water & sanitation");

        let xml = doc.to_xml_string().unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<sector vocabulary=\"99\"/>"));
        assert!(xml.contains("Water &amp; sanitation"));

        let reparsed = Document::from_string(&xml).unwrap();
        assert_eq!(reparsed.len(), 4);
        let sector_line = reparsed
            .preorder()
            .into_iter()
            .find(|id| reparsed.element(*id).local_name() == "sector")
            .and_then(|id| reparsed.element(id).source_line);
        assert_eq!(sector_line, Some(4));
    }

    #[test]
    fn test_serialize_declares_missing_namespaces() {
        let mut doc = Document::with_root(QName::namespaced(IATI_NS, "root"));
        let root = doc.root().unwrap();
        let child = doc.append_element(root, QName::local("plain"));
        doc.set_attribute(child, QName::namespaced("http://example.org/ext", "flag"), "1");
        doc.set_attribute(child, QName::namespaced(XML_NAMESPACE, "lang"), "fr");

        let xml = doc.to_xml_string().unwrap();
        let reparsed = Document::from_string(&xml).unwrap();
        let root = reparsed.root().unwrap();
        assert_eq!(reparsed.element(root).namespace(), Some(IATI_NS));

        let child = reparsed.element(reparsed.children(root)[0]);
        assert_eq!(child.namespace(), None);
        assert_eq!(
            child.get_attribute_qname(&QName::namespaced("http://example.org/ext", "flag")),
            Some("1")
        );
        assert_eq!(
            child.get_attribute_qname(&QName::namespaced(XML_NAMESPACE, "lang")),
            Some("fr")
        );
    }

    #[test]
    fn test_round_trip_preserves_prefixes() {
        let xml = r#"<i:root xmlns:i="http://example.org/iati"><i:item code="A"/></i:root>"#;
        let doc = Document::from_string(xml).unwrap();
        let out = doc.to_xml_string().unwrap();
        assert!(out.contains("<i:item code=\"A\"/>"));
        assert_eq!(Document::from_string(&out).unwrap().len(), 2);
    }
}
