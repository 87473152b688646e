//! Schema compilation
//!
//! [`SchemaBuilder`] loads a schema document together with everything it
//! includes or imports, registers the global components of every loaded
//! document and then builds them into the form used by the validator.
//! Named components are built on first use and memoized. A component that
//! is reached again while it is still being built is a circular definition.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;

use super::attributes::{AttributeSet, AttributeUse, Use};
use super::builtins::XsdValue;
use super::complex_types::{ComplexType, ContentType, DerivationMethod};
use super::elements::{ElementDecl, ElementRef, Form, TypeRef};
use super::facets::{Bound, EnumValue, Facets, Pattern, WhiteSpace};
use super::particles::{Occurs, Particle, Term};
use super::schemas::{any_type_name, XsdSchema};
use super::simple_types::SimpleType;
use super::wildcards::{NamespaceConstraint, ProcessContents, Wildcard};
use crate::documents::{Document, Element, NodeId};
use crate::error::SchemaError;
use crate::limits::Limits;
use crate::loaders::{resolve_location, Loader};
use crate::namespaces::{QName, XML_NAMESPACE, XSD_NAMESPACE};

/// A loaded schema document
#[derive(Debug)]
struct SchemaDocument {
    document: Document,
    location: String,
    /// Effective target namespace (adopted from the includer for chameleon includes)
    target_namespace: Option<String>,
    chameleon: bool,
    element_form: Form,
    attribute_form: Form,
}

/// An XSD element inside one of the loaded documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Component {
    doc: usize,
    node: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    SimpleType,
    ComplexType,
    Group,
    AttributeGroup,
    Attribute,
}

impl Kind {
    fn label(self) -> &'static str {
        match self {
            Kind::SimpleType => "simple type",
            Kind::ComplexType => "complex type",
            Kind::Group => "group",
            Kind::AttributeGroup => "attribute group",
            Kind::Attribute => "attribute",
        }
    }
}

/// Compiles XSD documents into an [`XsdSchema`]
#[derive(Debug)]
pub struct SchemaBuilder {
    limits: Limits,
    loader: Loader,
    documents: Vec<SchemaDocument>,
    visited: HashSet<PathBuf>,

    types: IndexMap<QName, Component>,
    elements: IndexMap<QName, Component>,
    attributes: IndexMap<QName, Component>,
    groups: IndexMap<QName, Component>,
    attribute_groups: IndexMap<QName, Component>,

    any_type: Arc<ComplexType>,
    simple_types: HashMap<QName, Arc<SimpleType>>,
    complex_types: HashMap<QName, Arc<ComplexType>>,
    built_groups: HashMap<QName, Particle>,
    built_attribute_groups: HashMap<QName, AttributeSet>,
    built_attributes: HashMap<QName, AttributeUse>,
    in_progress: HashSet<(Kind, QName)>,
}

impl SchemaBuilder {
    /// Create a builder that enforces `limits` on every loaded document
    pub fn new(limits: Limits) -> Self {
        Self {
            loader: Loader::new().with_limits(limits.clone()),
            limits,
            documents: Vec::new(),
            visited: HashSet::new(),
            types: IndexMap::new(),
            elements: IndexMap::new(),
            attributes: IndexMap::new(),
            groups: IndexMap::new(),
            attribute_groups: IndexMap::new(),
            any_type: Arc::new(ComplexType::any_type()),
            simple_types: HashMap::new(),
            complex_types: HashMap::new(),
            built_groups: HashMap::new(),
            built_attribute_groups: HashMap::new(),
            built_attributes: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Add a schema document given as text.
    ///
    /// Includes and imports are resolved against `base_dir`.
    pub fn add_document(
        &mut self,
        text: &str,
        base_dir: Option<&Path>,
        location: &str,
    ) -> Result<(), SchemaError> {
        self.load(text, base_dir, location, None, 0)
    }

    /// Add a schema document from a file
    pub fn add_file(&mut self, path: &Path) -> Result<(), SchemaError> {
        let location = path.display().to_string();
        self.mark_visited(path);
        let text = self
            .loader
            .load(path)
            .map_err(|e| SchemaError::new(e.to_string()).with_location(location.clone()))?;
        self.load(&text, path.parent(), &location, None, 0)
    }

    /// Build every registered component
    pub fn build(mut self) -> Result<XsdSchema, SchemaError> {
        let first = self
            .documents
            .first()
            .ok_or_else(|| SchemaError::new("no schema document was loaded"))?;
        let target_namespace = first.target_namespace.clone();
        let version = first
            .document
            .root_element()
            .and_then(|root| root.get_attribute("version"))
            .map(|v| v.trim().to_string());

        let types: Vec<(QName, Component)> = self.types.iter().map(|(n, c)| (n.clone(), *c)).collect();
        for (name, def) in types {
            if self.local_name(def) == "simpleType" {
                self.simple_type_by_name(def, &name)?;
            } else {
                self.complex_type_by_name(def, &name)?;
            }
        }
        let groups: Vec<(QName, Component)> = self.groups.iter().map(|(n, c)| (n.clone(), *c)).collect();
        for (name, def) in groups {
            self.group_by_name(def, &name)?;
        }
        let attribute_groups: Vec<(QName, Component)> =
            self.attribute_groups.iter().map(|(n, c)| (n.clone(), *c)).collect();
        for (name, def) in attribute_groups {
            self.attribute_group_by_name(def, &name)?;
        }
        let attributes: Vec<(QName, Component)> =
            self.attributes.iter().map(|(n, c)| (n.clone(), *c)).collect();
        for (name, def) in attributes {
            self.global_attribute(def, &name)?;
        }

        let mut elements = IndexMap::new();
        let element_defs: Vec<(QName, Component)> =
            self.elements.iter().map(|(n, c)| (n.clone(), *c)).collect();
        for (name, def) in element_defs {
            let decl = self.element_decl(def, name.clone())?;
            elements.insert(name, Arc::new(decl));
        }

        tracing::debug!(
            documents = self.documents.len(),
            elements = elements.len(),
            types = self.simple_types.len() + self.complex_types.len(),
            "compiled schema"
        );

        Ok(XsdSchema::new(
            target_namespace,
            version,
            elements,
            self.simple_types,
            self.complex_types,
            self.built_attributes,
            self.any_type,
        ))
    }

    // Loading

    fn load(
        &mut self,
        text: &str,
        base_dir: Option<&Path>,
        location: &str,
        including_namespace: Option<Option<String>>,
        depth: usize,
    ) -> Result<(), SchemaError> {
        self.limits
            .check_schema_depth(depth)
            .map_err(|e| SchemaError::new(e.to_string()).with_location(location))?;
        let document = Document::parse(text, &self.limits).map_err(|e| {
            SchemaError::new(format!("invalid schema document: {}", e)).with_location(location)
        })?;
        let root = document
            .root()
            .ok_or_else(|| SchemaError::new("empty schema document").with_location(location))?;
        let root_element = document.element(root);
        if root_element.local_name() != "schema" || root_element.namespace() != Some(XSD_NAMESPACE) {
            return Err(SchemaError::new(format!(
                "not an XSD schema document: the root element is '{}'",
                root_element.prefixed_name()
            ))
            .with_location(location));
        }

        let own_namespace = root_element
            .get_attribute("targetNamespace")
            .filter(|ns| !ns.is_empty())
            .map(String::from);
        let chameleon = matches!(including_namespace, Some(Some(_))) && own_namespace.is_none();
        let target_namespace = match (including_namespace, own_namespace) {
            (Some(including), None) => including,
            (Some(including), Some(own)) if including.as_deref() != Some(own.as_str()) => {
                return Err(SchemaError::new(format!(
                    "included schema has targetNamespace '{}' which differs from the including schema",
                    own
                ))
                .with_location(location));
            }
            (_, own) => own,
        };
        let form = |name: &str| -> Result<Form, SchemaError> {
            match root_element.get_attribute(name) {
                Some(value) => Form::parse(value).map_err(|e| e.with_location(location)),
                None => Ok(Form::default()),
            }
        };
        let element_form = form("elementFormDefault")?;
        let attribute_form = form("attributeFormDefault")?;
        let children = document.children(root);

        tracing::debug!(location, namespace = ?target_namespace, "loading schema document");
        self.documents.push(SchemaDocument {
            document,
            location: location.to_string(),
            target_namespace,
            chameleon,
            element_form,
            attribute_form,
        });
        let doc = self.documents.len() - 1;

        for node in children {
            let c = Component { doc, node };
            if self.element(c).namespace() != Some(XSD_NAMESPACE) {
                continue;
            }
            let kind = self.local_name(c).to_string();
            match kind.as_str() {
                "include" => self.load_included(c, base_dir, depth)?,
                "import" => self.load_imported(c, base_dir, depth)?,
                "redefine" | "override" => {
                    return Err(self.error(c, format!("xs:{} is not supported", kind)));
                }
                "element" | "attribute" | "simpleType" | "complexType" | "group"
                | "attributeGroup" => self.register(c, &kind)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn load_included(&mut self, c: Component, base_dir: Option<&Path>, depth: usize) -> Result<(), SchemaError> {
        let location = self
            .attr(c, "schemaLocation")
            .ok_or_else(|| self.error(c, "xs:include has no schemaLocation"))?;
        let path = resolve_location(base_dir, &location);
        if !self.mark_visited(&path) {
            return Ok(());
        }
        let text = self
            .loader
            .load(&path)
            .map_err(|e| self.error(c, format!("cannot include '{}': {}", location, e)))?;
        let namespace = self.documents[c.doc].target_namespace.clone();
        self.load(&text, path.parent(), &path.display().to_string(), Some(namespace), depth + 1)
    }

    fn load_imported(&mut self, c: Component, base_dir: Option<&Path>, depth: usize) -> Result<(), SchemaError> {
        let namespace = self.attr(c, "namespace");
        let Some(location) = self.attr(c, "schemaLocation") else {
            tracing::debug!(namespace = ?namespace, "import without schemaLocation");
            return Ok(());
        };
        let path = resolve_location(base_dir, &location);
        if !self.mark_visited(&path) {
            return Ok(());
        }
        let text = match self.loader.load(&path) {
            Ok(text) => text,
            Err(e) if namespace.as_deref() == Some(XML_NAMESPACE) => {
                tracing::debug!(%location, error = %e, "xml namespace schema not available");
                return Ok(());
            }
            Err(e) => return Err(self.error(c, format!("cannot import '{}': {}", location, e))),
        };
        self.load(&text, path.parent(), &path.display().to_string(), None, depth + 1)
    }

    fn mark_visited(&mut self, path: &Path) -> bool {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.visited.insert(key)
    }

    fn register(&mut self, c: Component, kind: &str) -> Result<(), SchemaError> {
        let name = self
            .attr(c, "name")
            .ok_or_else(|| self.error(c, format!("global xs:{} has no name", kind)))?;
        let qname = QName::new(self.target_namespace(c), name);
        let map = match kind {
            "element" => &mut self.elements,
            "attribute" => &mut self.attributes,
            "group" => &mut self.groups,
            "attributeGroup" => &mut self.attribute_groups,
            _ => &mut self.types,
        };
        let duplicate = map.contains_key(&qname);
        if !duplicate {
            map.insert(qname.clone(), c);
        }
        if duplicate {
            return Err(self.error(c, format!("duplicate global xs:{} '{}'", kind, qname)));
        }
        Ok(())
    }

    // Access helpers

    fn element(&self, c: Component) -> &Element {
        self.documents[c.doc].document.element(c.node)
    }

    fn local_name(&self, c: Component) -> &str {
        self.element(c).local_name()
    }

    fn attr(&self, c: Component, name: &str) -> Option<String> {
        self.element(c).get_attribute(name).map(String::from)
    }

    fn flag(&self, c: Component, name: &str) -> bool {
        matches!(self.element(c).get_attribute(name).map(str::trim), Some("true" | "1"))
    }

    fn target_namespace(&self, c: Component) -> Option<String> {
        self.documents[c.doc].target_namespace.clone()
    }

    /// XSD children, without annotations
    fn children(&self, c: Component) -> Vec<Component> {
        let document = &self.documents[c.doc].document;
        document
            .children(c.node)
            .into_iter()
            .filter(|&id| {
                let e = document.element(id);
                e.namespace() == Some(XSD_NAMESPACE) && e.local_name() != "annotation"
            })
            .map(|node| Component { doc: c.doc, node })
            .collect()
    }

    fn child(&self, c: Component, names: &[&str]) -> Option<Component> {
        self.children(c)
            .into_iter()
            .find(|&child| names.contains(&self.local_name(child)))
    }

    fn error(&self, c: Component, message: impl Into<String>) -> SchemaError {
        let doc = &self.documents[c.doc];
        let location = match doc.document.element(c.node).source_line {
            Some(line) => format!("{}:{}", doc.location, line),
            None => doc.location.clone(),
        };
        SchemaError::new(message).with_location(location)
    }

    /// Resolve a QName-valued attribute
    fn resolve(&self, c: Component, value: &str) -> Result<QName, SchemaError> {
        let doc = &self.documents[c.doc];
        let mut qname = doc
            .document
            .namespace_context(c.node)
            .resolve(value.trim())
            .map_err(|e| self.error(c, e.to_string()))?;
        if qname.namespace.as_deref() == Some("") {
            qname.namespace = None;
        }
        if qname.namespace.is_none() && doc.chameleon {
            qname.namespace = doc.target_namespace.clone();
        }
        Ok(qname)
    }

    fn required_qname(&self, c: Component, attribute: &str) -> Result<QName, SchemaError> {
        let value = self.attr(c, attribute).ok_or_else(|| {
            self.error(c, format!("xs:{} has no '{}' attribute", self.local_name(c), attribute))
        })?;
        self.resolve(c, &value)
    }

    fn occurs(&self, c: Component) -> Result<Occurs, SchemaError> {
        let min = self.attr(c, "minOccurs");
        let max = self.attr(c, "maxOccurs");
        Occurs::parse(min.as_deref(), max.as_deref()).map_err(|e| self.error(c, e.message))
    }

    fn enter(&mut self, kind: Kind, name: &QName, c: Component) -> Result<(), SchemaError> {
        if !self.in_progress.insert((kind, name.clone())) {
            return Err(self.error(c, format!("circular definition of {} '{}'", kind.label(), name)));
        }
        Ok(())
    }

    fn leave(&mut self, kind: Kind, name: &QName) {
        self.in_progress.remove(&(kind, name.clone()));
    }

    fn is_complex_type_name(&self, name: &QName) -> bool {
        *name == any_type_name()
            || self
                .types
                .get(name)
                .is_some_and(|&def| self.local_name(def) == "complexType")
    }

    fn check_type_name(&self, c: Component, name: &QName) -> Result<(), SchemaError> {
        let known = if name.namespace.as_deref() == Some(XSD_NAMESPACE) {
            *name == any_type_name() || SimpleType::builtin(&name.local_name).is_some()
        } else {
            self.types.contains_key(name)
        };
        if known {
            Ok(())
        } else {
            Err(self.error(c, format!("unknown type '{}'", name)))
        }
    }

    // Simple types

    fn simple_type_by_name(&mut self, c: Component, name: &QName) -> Result<Arc<SimpleType>, SchemaError> {
        if name.namespace.as_deref() == Some(XSD_NAMESPACE) {
            return SimpleType::builtin(&name.local_name)
                .map(Arc::new)
                .ok_or_else(|| self.error(c, format!("unknown simple type '{}'", name)));
        }
        if let Some(st) = self.simple_types.get(name) {
            return Ok(st.clone());
        }
        let Some(&def) = self.types.get(name) else {
            return Err(self.error(c, format!("unknown type '{}'", name)));
        };
        if self.local_name(def) != "simpleType" {
            return Err(self.error(c, format!("'{}' is not a simple type", name)));
        }
        self.enter(Kind::SimpleType, name, def)?;
        let result = self.build_simple_type(def, Some(name.clone()));
        self.leave(Kind::SimpleType, name);
        let st = Arc::new(result?);
        self.simple_types.insert(name.clone(), st.clone());
        Ok(st)
    }

    fn build_simple_type(&mut self, def: Component, name: Option<QName>) -> Result<SimpleType, SchemaError> {
        let derivation = self
            .child(def, &["restriction", "list", "union"])
            .ok_or_else(|| self.error(def, "simple type has no restriction, list or union"))?;
        let kind = self.local_name(derivation).to_string();
        match kind.as_str() {
            "restriction" => {
                let base = match self.attr(derivation, "base") {
                    Some(base) => {
                        let base = self.resolve(derivation, &base)?;
                        self.simple_type_by_name(derivation, &base)?
                    }
                    None => self
                        .inline_simple_type(derivation)?
                        .ok_or_else(|| self.error(derivation, "xs:restriction has no base type"))?,
                };
                let facets = self.parse_facets(derivation, &base)?;
                Ok(SimpleType::Restriction { name, base, facets })
            }
            "list" => {
                let item = match self.attr(derivation, "itemType") {
                    Some(item) => {
                        let item = self.resolve(derivation, &item)?;
                        self.simple_type_by_name(derivation, &item)?
                    }
                    None => self
                        .inline_simple_type(derivation)?
                        .ok_or_else(|| self.error(derivation, "xs:list has no item type"))?,
                };
                Ok(SimpleType::List { name, item })
            }
            _ => {
                let mut members = Vec::new();
                if let Some(member_types) = self.attr(derivation, "memberTypes") {
                    for member in member_types.split_whitespace() {
                        let member = self.resolve(derivation, member)?;
                        members.push(self.simple_type_by_name(derivation, &member)?);
                    }
                }
                for child in self.children(derivation) {
                    if self.local_name(child) == "simpleType" {
                        members.push(Arc::new(self.build_simple_type(child, None)?));
                    }
                }
                if members.is_empty() {
                    return Err(self.error(derivation, "xs:union has no member types"));
                }
                Ok(SimpleType::Union { name, members })
            }
        }
    }

    fn inline_simple_type(&mut self, c: Component) -> Result<Option<Arc<SimpleType>>, SchemaError> {
        match self.child(c, &["simpleType"]) {
            Some(child) => Ok(Some(Arc::new(self.build_simple_type(child, None)?))),
            None => Ok(None),
        }
    }

    fn parse_facets(&self, restriction: Component, base: &SimpleType) -> Result<Facets, SchemaError> {
        let mut facets = Facets::new();
        let mut enumeration = Vec::new();
        for child in self.children(restriction) {
            let kind = self.local_name(child);
            if matches!(
                kind,
                "simpleType" | "attribute" | "attributeGroup" | "anyAttribute"
            ) {
                continue;
            }
            let value = self
                .attr(child, "value")
                .ok_or_else(|| self.error(child, format!("xs:{} facet has no value", kind)))?;
            match kind {
                "length" => facets.length = Some(self.facet_number(child, &value)?),
                "minLength" => facets.min_length = Some(self.facet_number(child, &value)?),
                "maxLength" => facets.max_length = Some(self.facet_number(child, &value)?),
                "totalDigits" => facets.total_digits = Some(self.facet_number(child, &value)?),
                "fractionDigits" => facets.fraction_digits = Some(self.facet_number(child, &value)?),
                "pattern" => facets
                    .patterns
                    .push(Pattern::new(&value).map_err(|e| self.error(child, e.message))?),
                "whiteSpace" => {
                    facets.white_space =
                        Some(WhiteSpace::from_str(&value).map_err(|e| self.error(child, e.message))?)
                }
                "enumeration" => {
                    let typed = base.validate(&value).map_err(|e| {
                        self.error(
                            child,
                            format!(
                                "enumeration value '{}' is not valid for {}: {}",
                                value,
                                base.display_name(),
                                e.message()
                            ),
                        )
                    })?;
                    enumeration.push(EnumValue {
                        lexical: value,
                        value: typed,
                    });
                }
                "minInclusive" => facets
                    .bounds
                    .push(Bound::MinInclusive(self.bound_value(child, base, &value)?)),
                "minExclusive" => facets
                    .bounds
                    .push(Bound::MinExclusive(self.bound_value(child, base, &value)?)),
                "maxInclusive" => facets
                    .bounds
                    .push(Bound::MaxInclusive(self.bound_value(child, base, &value)?)),
                "maxExclusive" => facets
                    .bounds
                    .push(Bound::MaxExclusive(self.bound_value(child, base, &value)?)),
                other => return Err(self.error(child, format!("unknown facet xs:{}", other))),
            }
        }
        if !enumeration.is_empty() {
            facets.enumeration = Some(enumeration);
        }
        Ok(facets)
    }

    fn facet_number<T: FromStr>(&self, c: Component, value: &str) -> Result<T, SchemaError> {
        value
            .trim()
            .parse()
            .map_err(|_| self.error(c, format!("invalid xs:{} value '{}'", self.local_name(c), value)))
    }

    fn bound_value(
        &self,
        c: Component,
        base: &SimpleType,
        value: &str,
    ) -> Result<XsdValue, SchemaError> {
        base.parse_value(value).ok_or_else(|| {
            self.error(
                c,
                format!(
                    "invalid xs:{} value '{}' for {}",
                    self.local_name(c),
                    value,
                    base.display_name()
                ),
            )
        })
    }

    // Complex types

    fn complex_type_by_name(&mut self, c: Component, name: &QName) -> Result<Arc<ComplexType>, SchemaError> {
        if *name == any_type_name() {
            return Ok(self.any_type.clone());
        }
        if let Some(ct) = self.complex_types.get(name) {
            return Ok(ct.clone());
        }
        let Some(&def) = self.types.get(name) else {
            return Err(self.error(c, format!("unknown type '{}'", name)));
        };
        if self.local_name(def) != "complexType" {
            return Err(self.error(c, format!("'{}' is not a complex type", name)));
        }
        self.enter(Kind::ComplexType, name, def)?;
        let result = self.build_complex_type(def, Some(name.clone()));
        self.leave(Kind::ComplexType, name);
        let ct = Arc::new(result?);
        self.complex_types.insert(name.clone(), ct.clone());
        Ok(ct)
    }

    fn build_complex_type(&mut self, def: Component, name: Option<QName>) -> Result<ComplexType, SchemaError> {
        let mixed = self.flag(def, "mixed");
        let mut ty = if let Some(content) = self.child(def, &["simpleContent"]) {
            self.build_simple_content(content, name)?
        } else if let Some(content) = self.child(def, &["complexContent"]) {
            let mixed = match self.attr(content, "mixed") {
                Some(_) => self.flag(content, "mixed"),
                None => mixed,
            };
            self.build_complex_content(content, name, mixed)?
        } else {
            let particle = self.model_group_particle(def)?.unwrap_or_else(Particle::empty);
            let attributes = self.parse_attributes(def)?;
            ComplexType::new(name, ContentType::from_particle(particle, mixed), attributes)
        };
        ty.is_abstract = self.flag(def, "abstract");
        Ok(ty)
    }

    fn derivation_of(&self, content: Component) -> Result<(Component, DerivationMethod, QName), SchemaError> {
        let derivation = self
            .child(content, &["extension", "restriction"])
            .ok_or_else(|| self.error(content, "content has no extension or restriction"))?;
        let method = if self.local_name(derivation) == "extension" {
            DerivationMethod::Extension
        } else {
            DerivationMethod::Restriction
        };
        let base = self.required_qname(derivation, "base")?;
        Ok((derivation, method, base))
    }

    fn build_simple_content(&mut self, content: Component, name: Option<QName>) -> Result<ComplexType, SchemaError> {
        let (derivation, method, base_name) = self.derivation_of(content)?;
        let (base_simple, base_attributes) = if self.is_complex_type_name(&base_name) {
            let base = self.complex_type_by_name(derivation, &base_name)?;
            match &base.content {
                ContentType::Simple(st) => (st.clone(), base.attributes.clone()),
                _ if base_name == any_type_name() => {
                    (Arc::new(SimpleType::any_simple()), AttributeSet::new())
                }
                _ => {
                    return Err(self.error(
                        derivation,
                        format!("base type '{}' does not have simple content", base_name),
                    ))
                }
            }
        } else {
            (self.simple_type_by_name(derivation, &base_name)?, AttributeSet::new())
        };

        let mut attributes = self.parse_attributes(derivation)?;
        let simple = match method {
            DerivationMethod::Extension => {
                attributes.inherit(&base_attributes);
                base_simple
            }
            DerivationMethod::Restriction => {
                attributes.restrict(&base_attributes);
                let base = self.inline_simple_type(derivation)?.unwrap_or(base_simple);
                let facets = self.parse_facets(derivation, &base)?;
                Arc::new(SimpleType::Restriction {
                    name: None,
                    base,
                    facets,
                })
            }
        };
        let mut ty = ComplexType::new(name, ContentType::Simple(simple), attributes);
        ty.base_type = Some(base_name);
        ty.derivation = Some(method);
        Ok(ty)
    }

    fn build_complex_content(
        &mut self,
        content: Component,
        name: Option<QName>,
        mixed: bool,
    ) -> Result<ComplexType, SchemaError> {
        let (derivation, method, base_name) = self.derivation_of(content)?;
        let base = self.complex_type_by_name(derivation, &base_name)?;
        let own = self.model_group_particle(derivation)?;
        let mut attributes = self.parse_attributes(derivation)?;

        let content = match method {
            DerivationMethod::Extension => {
                attributes.inherit(&base.attributes);
                match &base.content {
                    ContentType::Simple(_) => {
                        return Err(self.error(
                            derivation,
                            format!("complex content cannot extend '{}' which has simple content", base_name),
                        ))
                    }
                    ContentType::Empty => ContentType::from_particle(own.unwrap_or_else(Particle::empty), mixed),
                    ContentType::Elements { model, mixed: base_mixed } => {
                        let particle = match own {
                            Some(own) if !own.is_empty() => Particle::new(
                                Term::Sequence(vec![model.particle().clone(), own]),
                                Occurs::once(),
                            ),
                            _ => model.particle().clone(),
                        };
                        ContentType::from_particle(particle, mixed || *base_mixed)
                    }
                }
            }
            DerivationMethod::Restriction => {
                attributes.restrict(&base.attributes);
                ContentType::from_particle(own.unwrap_or_else(Particle::empty), mixed)
            }
        };

        let mut ty = ComplexType::new(name, content, attributes);
        ty.base_type = Some(base_name);
        ty.derivation = Some(method);
        Ok(ty)
    }

    // Particles

    fn model_group_particle(&mut self, c: Component) -> Result<Option<Particle>, SchemaError> {
        match self.child(c, &["group", "all", "choice", "sequence"]) {
            Some(model) => Ok(Some(self.build_particle(model)?)),
            None => Ok(None),
        }
    }

    fn build_particle(&mut self, c: Component) -> Result<Particle, SchemaError> {
        let kind = self.local_name(c).to_string();
        let occurs = self.occurs(c)?;
        match kind.as_str() {
            "element" => self.element_particle(c, occurs),
            "any" => Ok(Particle::new(Term::Any(self.wildcard(c)?), occurs)),
            "sequence" | "choice" | "all" => {
                let mut particles = Vec::new();
                for child in self.children(c) {
                    particles.push(self.build_particle(child)?);
                }
                let term = match kind.as_str() {
                    "sequence" => Term::Sequence(particles),
                    "choice" => Term::Choice(particles),
                    _ => Term::All(particles),
                };
                Ok(Particle::new(term, occurs))
            }
            "group" => {
                let name = self.required_qname(c, "ref")?;
                let group = self.group_by_name(c, &name)?;
                Ok(Particle::new(group.term, occurs))
            }
            other => Err(self.error(c, format!("unexpected xs:{} in a model group", other))),
        }
    }

    fn group_by_name(&mut self, c: Component, name: &QName) -> Result<Particle, SchemaError> {
        if let Some(group) = self.built_groups.get(name) {
            return Ok(group.clone());
        }
        let Some(&def) = self.groups.get(name) else {
            return Err(self.error(c, format!("unknown group '{}'", name)));
        };
        self.enter(Kind::Group, name, def)?;
        let result = self.model_group_particle(def);
        self.leave(Kind::Group, name);
        let particle = result?.ok_or_else(|| self.error(def, format!("group '{}' has no model group", name)))?;
        self.built_groups.insert(name.clone(), particle.clone());
        Ok(particle)
    }

    fn wildcard(&self, c: Component) -> Result<Wildcard, SchemaError> {
        let namespace = self.attr(c, "namespace").unwrap_or_else(|| "##any".to_string());
        let target_namespace = self.target_namespace(c);
        let constraint = NamespaceConstraint::from_namespace_attr(&namespace, target_namespace.as_deref())
            .map_err(|e| self.error(c, e.message))?;
        let process_contents = match self.attr(c, "processContents") {
            Some(value) => ProcessContents::parse(&value).map_err(|e| self.error(c, e.message))?,
            None => ProcessContents::default(),
        };
        Ok(Wildcard::new(constraint, process_contents))
    }

    // Elements

    fn element_particle(&mut self, c: Component, occurs: Occurs) -> Result<Particle, SchemaError> {
        if self.attr(c, "ref").is_some() {
            let name = self.required_qname(c, "ref")?;
            if !self.elements.contains_key(&name) {
                return Err(self.error(c, format!("unknown element '{}'", name)));
            }
            return Ok(Particle::new(Term::Element(ElementRef::Global(name)), occurs));
        }
        let local = self
            .attr(c, "name")
            .ok_or_else(|| self.error(c, "local element declaration has no name"))?;
        let form = match self.attr(c, "form") {
            Some(form) => Form::parse(&form).map_err(|e| self.error(c, e.message))?,
            None => self.documents[c.doc].element_form,
        };
        let namespace = match form {
            Form::Qualified => self.target_namespace(c),
            Form::Unqualified => None,
        };
        let decl = self.element_decl(c, QName::new(namespace, local))?;
        Ok(Particle::new(Term::Element(ElementRef::Local(Arc::new(decl))), occurs))
    }

    fn element_decl(&mut self, c: Component, name: QName) -> Result<ElementDecl, SchemaError> {
        let type_ref = if self.attr(c, "type").is_some() {
            let type_name = self.required_qname(c, "type")?;
            self.check_type_name(c, &type_name)?;
            TypeRef::Named(type_name)
        } else if let Some(child) = self.child(c, &["complexType"]) {
            TypeRef::Complex(Arc::new(self.build_complex_type(child, None)?))
        } else if let Some(child) = self.child(c, &["simpleType"]) {
            TypeRef::Simple(Arc::new(self.build_simple_type(child, None)?))
        } else {
            TypeRef::Named(any_type_name())
        };
        let mut decl = ElementDecl::new(name, type_ref);
        decl.nillable = self.flag(c, "nillable");
        decl.is_abstract = self.flag(c, "abstract");
        decl.fixed = self.attr(c, "fixed");
        decl.default = self.attr(c, "default");
        Ok(decl)
    }

    // Attributes

    fn parse_attributes(&mut self, c: Component) -> Result<AttributeSet, SchemaError> {
        let mut set = AttributeSet::new();
        let mut group_wildcard: Option<Wildcard> = None;
        let mut own_wildcard = None;
        for child in self.children(c) {
            let kind = self.local_name(child).to_string();
            match kind.as_str() {
                "attribute" => {
                    let attribute = self.attribute_use(child)?;
                    set.insert(attribute);
                }
                "attributeGroup" => {
                    let name = self.required_qname(child, "ref")?;
                    let group = self.attribute_group_by_name(child, &name)?;
                    for attribute in group.iter() {
                        set.insert(attribute.clone());
                    }
                    if let Some(wildcard) = group.wildcard() {
                        group_wildcard = Some(match group_wildcard {
                            Some(existing) => existing.union(wildcard),
                            None => wildcard.clone(),
                        });
                    }
                }
                "anyAttribute" => own_wildcard = Some(self.wildcard(child)?),
                _ => {}
            }
        }
        set.set_wildcard(match (own_wildcard, group_wildcard) {
            (Some(own), Some(group)) => Some(own.union(&group)),
            (own, group) => own.or(group),
        });
        Ok(set)
    }

    fn attribute_use(&mut self, c: Component) -> Result<AttributeUse, SchemaError> {
        let use_mode = match self.attr(c, "use") {
            Some(value) => Use::parse(&value).map_err(|e| self.error(c, e.message))?,
            None => Use::default(),
        };
        let mut attribute = if self.attr(c, "ref").is_some() {
            let name = self.required_qname(c, "ref")?;
            let mut attribute = self.global_attribute(c, &name)?;
            if let Some(fixed) = self.attr(c, "fixed") {
                attribute.fixed = Some(fixed);
            }
            if let Some(default) = self.attr(c, "default") {
                attribute.default = Some(default);
            }
            attribute
        } else {
            let local = self
                .attr(c, "name")
                .ok_or_else(|| self.error(c, "local attribute declaration has no name"))?;
            let form = match self.attr(c, "form") {
                Some(form) => Form::parse(&form).map_err(|e| self.error(c, e.message))?,
                None => self.documents[c.doc].attribute_form,
            };
            let namespace = match form {
                Form::Qualified => self.target_namespace(c),
                Form::Unqualified => None,
            };
            self.attribute_decl(c, QName::new(namespace, local))?
        };
        attribute.use_mode = use_mode;
        Ok(attribute)
    }

    fn attribute_decl(&mut self, c: Component, name: QName) -> Result<AttributeUse, SchemaError> {
        let simple_type = if self.attr(c, "type").is_some() {
            let type_name = self.required_qname(c, "type")?;
            self.simple_type_by_name(c, &type_name)?
        } else {
            self.inline_simple_type(c)?
                .unwrap_or_else(|| Arc::new(SimpleType::any_simple()))
        };
        let mut attribute = AttributeUse::new(name, simple_type);
        attribute.fixed = self.attr(c, "fixed");
        attribute.default = self.attr(c, "default");
        Ok(attribute)
    }

    fn global_attribute(&mut self, c: Component, name: &QName) -> Result<AttributeUse, SchemaError> {
        if let Some(attribute) = self.built_attributes.get(name) {
            return Ok(attribute.clone());
        }
        let Some(&def) = self.attributes.get(name) else {
            if name.namespace.as_deref() == Some(XML_NAMESPACE) {
                // xml:lang and friends when the xml namespace schema is not available
                return Ok(AttributeUse::new(name.clone(), Arc::new(SimpleType::any_simple())));
            }
            return Err(self.error(c, format!("unknown attribute '{}'", name)));
        };
        self.enter(Kind::Attribute, name, def)?;
        let result = self.attribute_decl(def, name.clone());
        self.leave(Kind::Attribute, name);
        let attribute = result?;
        self.built_attributes.insert(name.clone(), attribute.clone());
        Ok(attribute)
    }

    fn attribute_group_by_name(&mut self, c: Component, name: &QName) -> Result<AttributeSet, SchemaError> {
        if let Some(group) = self.built_attribute_groups.get(name) {
            return Ok(group.clone());
        }
        let Some(&def) = self.attribute_groups.get(name) else {
            return Err(self.error(c, format!("unknown attribute group '{}'", name)));
        };
        self.enter(Kind::AttributeGroup, name, def)?;
        let result = self.parse_attributes(def);
        self.leave(Kind::AttributeGroup, name);
        let group = result?;
        self.built_attribute_groups.insert(name.clone(), group.clone());
        Ok(group)
    }
}
