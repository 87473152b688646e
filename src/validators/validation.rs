//! Instance document validation
//!
//! [`XsdValidator`] checks a [`Document`] against a compiled schema: the
//! root must match a global element declaration, and from there every
//! element is checked against its declaration and type. Findings are
//! [`StructuralError`]s carrying the element path and source line.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::attributes::{AttributeSet, Use};
use super::complex_types::{ComplexType, ContentType};
use super::elements::{ElementDecl, ElementRef};
use super::exceptions::{DocumentInvalid, StructuralError};
use super::particles::{ChildMatch, MatchFailure};
use super::schemas::{TypeDefinition, XsdSchema};
use super::simple_types::SimpleType;
use super::wildcards::{ProcessContents, Wildcard};
use crate::documents::{Document, NodeId};
use crate::error::Error;
use crate::namespaces::{QName, XML_NAMESPACE, XSI_NAMESPACE};

/// Validation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Stop at the first problem
    #[default]
    Strict,
    /// Collect every problem
    Lax,
}

impl ValidationMode {
    /// Get the mode as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Lax => "lax",
        }
    }
}

impl FromStr for ValidationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "lax" => Ok(ValidationMode::Lax),
            _ => Err(Error::Value(format!(
                "Invalid validation mode: '{}'. Must be 'strict' or 'lax'",
                s
            ))),
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structural validator bound to a compiled schema
#[derive(Debug, Clone)]
pub struct XsdValidator {
    schema: Arc<XsdSchema>,
    mode: ValidationMode,
}

impl XsdValidator {
    /// Create a validator in strict mode
    pub fn new(schema: Arc<XsdSchema>) -> Self {
        Self {
            schema,
            mode: ValidationMode::default(),
        }
    }

    /// Set the validation mode
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// The compiled schema
    pub fn schema(&self) -> &XsdSchema {
        &self.schema
    }

    /// The validation mode
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Validate a document.
    ///
    /// In strict mode the error holds the first problem found, in lax mode
    /// all of them.
    pub fn validate(&self, doc: &Document) -> Result<(), DocumentInvalid> {
        let errors = self.run(doc, self.mode == ValidationMode::Strict);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DocumentInvalid::new(errors))
        }
    }

    /// Every problem in the document, regardless of mode
    pub fn iter_errors(&self, doc: &Document) -> impl Iterator<Item = StructuralError> {
        self.run(doc, false).into_iter()
    }

    /// Whether the document is valid
    pub fn is_valid(&self, doc: &Document) -> bool {
        self.run(doc, true).is_empty()
    }

    fn run(&self, doc: &Document, stop_at_first: bool) -> Vec<StructuralError> {
        let mut run = Run {
            schema: &self.schema,
            doc,
            errors: Vec::new(),
            stop_at_first,
        };
        run.validate_root();
        tracing::debug!(problems = run.errors.len(), mode = %self.mode, "structural validation finished");
        run.errors
    }
}

struct Run<'a> {
    schema: &'a XsdSchema,
    doc: &'a Document,
    errors: Vec<StructuralError>,
    stop_at_first: bool,
}

impl<'a> Run<'a> {
    fn done(&self) -> bool {
        self.stop_at_first && !self.errors.is_empty()
    }

    fn report(&mut self, id: NodeId, path: &str, error: StructuralError) {
        let line = self.doc.element(id).source_line;
        tracing::trace!(path, message = error.message(), "structural problem");
        self.errors
            .push(error.with_path(path).with_source_line(line));
    }

    fn validate_root(&mut self) {
        let doc = self.doc;
        let schema = self.schema;
        let Some(root) = doc.root() else {
            self.errors.push(StructuralError::new("The document has no root element"));
            return;
        };
        let element = doc.element(root);
        let path = format!("/{}", element.prefixed_name());
        match schema.element(&element.qname) {
            Some(decl) => self.validate_element(root, decl, &path),
            None => self.report(
                root,
                &path,
                StructuralError::new(format!(
                    "'{}' is not an element of the schema",
                    element.prefixed_name()
                )),
            ),
        }
    }

    fn validate_element(&mut self, id: NodeId, decl: &ElementDecl, path: &str) {
        if self.done() {
            return;
        }
        let doc = self.doc;
        let element = doc.element(id);
        if decl.is_abstract {
            self.report(
                id,
                path,
                StructuralError::new(format!("Element '{}' is abstract", element.prefixed_name())),
            );
            return;
        }

        let mut definition = match self.schema.resolve_type(&decl.type_ref) {
            Some(definition) => definition,
            None => {
                self.report(
                    id,
                    path,
                    StructuralError::new(format!("Unknown type '{}'", decl.type_ref)),
                );
                return;
            }
        };
        if let Some(xsi_type) = element.get_attribute_qname(&QName::namespaced(XSI_NAMESPACE, "type")) {
            let resolved = doc
                .namespace_context(id)
                .resolve(xsi_type.trim())
                .ok()
                .and_then(|name| self.schema.lookup_type(&name));
            match resolved {
                Some(found) => definition = found,
                None => {
                    self.report(
                        id,
                        path,
                        StructuralError::new(format!("Unknown xsi:type '{}'", xsi_type)),
                    );
                    return;
                }
            }
        }

        let nil = element
            .get_attribute_qname(&QName::namespaced(XSI_NAMESPACE, "nil"))
            .is_some_and(|v| matches!(v.trim(), "true" | "1"));
        if nil && !decl.nillable {
            self.report(
                id,
                path,
                StructuralError::new(format!("Element '{}' is not nillable", element.prefixed_name())),
            );
            return;
        }
        if nil {
            if element.has_text() || element.child_ids().next().is_some() {
                self.report(
                    id,
                    path,
                    StructuralError::new(format!(
                        "Element '{}' is nil and must be empty",
                        element.prefixed_name()
                    )),
                );
            }
            if let TypeDefinition::Complex(ct) = &definition {
                self.check_attributes(id, &ct.attributes, path);
            }
            return;
        }

        match &definition {
            TypeDefinition::Simple(st) => {
                self.check_attributes(id, &AttributeSet::new(), path);
                if element.child_ids().next().is_some() {
                    self.report(
                        id,
                        path,
                        StructuralError::new(format!(
                            "Element '{}' has a simple type and cannot have child elements",
                            element.prefixed_name()
                        )),
                    );
                    return;
                }
                self.check_text(id, st, decl, path);
            }
            TypeDefinition::Complex(ct) => {
                self.check_attributes(id, &ct.attributes, path);
                self.check_content(id, ct, decl, path);
            }
        }
    }

    fn check_text(&mut self, id: NodeId, st: &SimpleType, decl: &ElementDecl, path: &str) {
        if self.done() {
            return;
        }
        let text = self.doc.element(id).text();
        let value = if text.is_empty() {
            match decl.fixed.as_ref().or(decl.default.as_ref()) {
                Some(value) => value.clone(),
                None => text,
            }
        } else {
            text
        };
        if let Err(e) = st.validate(&value) {
            self.report(id, path, e);
            return;
        }
        if let Some(fixed) = &decl.fixed {
            let white_space = st.white_space();
            if white_space.normalize(&value) != white_space.normalize(fixed) {
                self.report(
                    id,
                    path,
                    StructuralError::new(format!(
                        "'{}' is not valid: value must be fixed to '{}'",
                        value, fixed
                    )),
                );
            }
        }
    }

    fn check_attributes(&mut self, id: NodeId, set: &AttributeSet, path: &str) {
        let doc = self.doc;
        let element = doc.element(id);
        let mut present: Vec<&QName> = Vec::new();
        for attribute in &element.attributes {
            if self.done() {
                return;
            }
            let name = &attribute.qname;
            if name.namespace.as_deref() == Some(XSI_NAMESPACE) {
                continue;
            }
            present.push(name);
            match set.get(name) {
                Some(declared) if declared.use_mode == Use::Prohibited => self.report(
                    id,
                    path,
                    StructuralError::new(format!("Attribute '{}' is prohibited", name)),
                ),
                Some(declared) => {
                    if let Err(e) = declared.validate(&attribute.value) {
                        self.report(id, path, e);
                    }
                }
                None => match set.wildcard() {
                    Some(wildcard) if wildcard.is_namespace_allowed(name.namespace.as_deref()) => {
                        self.check_wildcard_attribute(id, path, wildcard, name, &attribute.value)
                    }
                    _ => self.report(
                        id,
                        path,
                        StructuralError::new(format!(
                            "Attribute '{}' is not allowed on element '{}'",
                            name,
                            element.prefixed_name()
                        )),
                    ),
                },
            }
        }
        if self.done() {
            return;
        }
        for missing in set.missing_required(&present) {
            self.report(
                id,
                path,
                StructuralError::new(format!(
                    "Missing required attribute '{}' on element '{}'",
                    missing,
                    element.prefixed_name()
                )),
            );
            if self.done() {
                return;
            }
        }
    }

    fn check_wildcard_attribute(&mut self, id: NodeId, path: &str, wildcard: &Wildcard, name: &QName, value: &str) {
        if wildcard.process_contents == ProcessContents::Skip {
            return;
        }
        match self.schema.attribute(name) {
            Some(global) => {
                if let Err(e) = global.validate(value) {
                    self.report(id, path, e);
                }
            }
            None if wildcard.process_contents == ProcessContents::Strict
                && name.namespace.as_deref() != Some(XML_NAMESPACE) =>
            {
                self.report(
                    id,
                    path,
                    StructuralError::new(format!("No global declaration for attribute '{}'", name)),
                )
            }
            None => {}
        }
    }

    fn check_content(&mut self, id: NodeId, ct: &ComplexType, decl: &ElementDecl, path: &str) {
        if self.done() {
            return;
        }
        let doc = self.doc;
        let element = doc.element(id);
        let children: Vec<NodeId> = element.child_ids().collect();

        match &ct.content {
            ContentType::Empty => {
                if let Some(&first) = children.first() {
                    self.report(
                        id,
                        path,
                        StructuralError::unexpected_child(
                            &element.prefixed_name(),
                            &doc.element(first).prefixed_name(),
                            0,
                        )
                        .with_reason("the element must be empty"),
                    );
                } else if element.has_text() {
                    self.report(
                        id,
                        path,
                        StructuralError::new(format!(
                            "Element '{}' must be empty",
                            element.prefixed_name()
                        )),
                    );
                }
            }
            ContentType::Simple(st) => {
                if children.is_empty() {
                    self.check_text(id, st, decl, path);
                } else {
                    self.report(
                        id,
                        path,
                        StructuralError::new(format!(
                            "Element '{}' has simple content and cannot have child elements",
                            element.prefixed_name()
                        )),
                    );
                }
            }
            ContentType::Elements { model, mixed } => {
                if !mixed && element.has_text() {
                    self.report(
                        id,
                        path,
                        StructuralError::new(format!(
                            "Character data is not allowed in the element-only content of '{}'",
                            element.prefixed_name()
                        )),
                    );
                }
                let names: Vec<&QName> = children.iter().map(|&c| &doc.element(c).qname).collect();
                match model.check(&names) {
                    Ok(()) => {}
                    Err(MatchFailure::Unexpected(index)) => self.report(
                        id,
                        path,
                        StructuralError::unexpected_child(
                            &element.prefixed_name(),
                            &doc.element(children[index]).prefixed_name(),
                            index,
                        ),
                    ),
                    Err(MatchFailure::Incomplete) => self.report(
                        id,
                        path,
                        StructuralError::incomplete_content(&element.prefixed_name()),
                    ),
                }

                for (child, child_path) in children.iter().zip(child_paths(doc, path, &children)) {
                    if self.done() {
                        return;
                    }
                    let name = &doc.element(*child).qname;
                    match model.child_match(name) {
                        Some(ChildMatch::Element(ElementRef::Local(decl))) => {
                            self.validate_element(*child, decl, &child_path)
                        }
                        Some(ChildMatch::Element(ElementRef::Global(global))) => {
                            let schema = self.schema;
                            match schema.element(global) {
                                Some(decl) => self.validate_element(*child, decl, &child_path),
                                None => self.report(
                                    *child,
                                    &child_path,
                                    StructuralError::new(format!("Unknown element '{}'", global)),
                                ),
                            }
                        }
                        Some(ChildMatch::Wildcard(wildcard)) => {
                            self.validate_wildcard_child(*child, wildcard, &child_path)
                        }
                        // already reported as unexpected
                        None => {}
                    }
                }
            }
        }
    }

    fn validate_wildcard_child(&mut self, id: NodeId, wildcard: &Wildcard, path: &str) {
        let schema = self.schema;
        let doc = self.doc;
        let name = &doc.element(id).qname;
        match (wildcard.process_contents, schema.element(name)) {
            (ProcessContents::Skip, _) => {}
            (_, Some(decl)) => self.validate_element(id, decl, path),
            (ProcessContents::Strict, None) => self.report(
                id,
                path,
                StructuralError::new(format!("No global declaration for element '{}'", name)),
            ),
            (ProcessContents::Lax, None) => self.validate_lax(id, path),
        }
    }

    /// Lax assessment of an undeclared element: declared descendants are validated
    fn validate_lax(&mut self, id: NodeId, path: &str) {
        let doc = self.doc;
        let schema = self.schema;
        let children: Vec<NodeId> = doc.element(id).child_ids().collect();
        for (child, child_path) in children.iter().zip(child_paths(doc, path, &children)) {
            if self.done() {
                return;
            }
            match schema.element(&doc.element(*child).qname) {
                Some(decl) => self.validate_element(*child, decl, &child_path),
                None => self.validate_lax(*child, &child_path),
            }
        }
    }
}

/// Paths of `children` under `parent`; same-named siblings get a position
fn child_paths(doc: &Document, parent: &str, children: &[NodeId]) -> Vec<String> {
    let mut totals: HashMap<&QName, usize> = HashMap::new();
    for &child in children {
        *totals.entry(&doc.element(child).qname).or_default() += 1;
    }
    let mut seen: HashMap<&QName, usize> = HashMap::new();
    children
        .iter()
        .map(|&child| {
            let element = doc.element(child);
            let position = seen.entry(&element.qname).or_default();
            *position += 1;
            if totals.get(&element.qname).copied().unwrap_or(0) > 1 {
                format!("{}/{}[{}]", parent, element.prefixed_name(), position)
            } else {
                format!("{}/{}", parent, element.prefixed_name())
            }
        })
        .collect()
}
