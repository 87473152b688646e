//! XPath Support
//!
//! This module provides the XPath 1.0 subset used to locate coded
//! attributes in datasets.
//!
//! ## Overview
//!
//! XPath is used for:
//! - Codelist mapping rules (`//iati-activity/sector/@vocabulary`)
//! - Mapping conditions (`@vocabulary = '1' or not(@vocabulary)`)
//!
//! ## Limitations
//!
//! Supported: location paths with all axes except `namespace::`,
//! predicates, the boolean/comparison/arithmetic operators, unions and
//! the core function library. Variables are not supported.

mod evaluator;
mod parsers;
mod selectors;

pub use parsers::{
    parse_expression, ArithOp, CompareOp, Expr, Function, NodeTest, ParsedStep, XPathAxis,
    XPathParseError,
};
pub use selectors::{is_ncname, is_ncname_char, is_qname, split_path, AttributeSelector};
pub(crate) use selectors::is_ncname_start_char;

use std::fmt;

use crate::documents::{Document, NodeId};
use crate::namespaces::NamespaceContext;

use evaluator::Evaluator;

/// A node in an XPath result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XPathNode {
    /// The document node
    Root,
    /// An element
    Element(NodeId),
    /// The attribute at the given index of an element
    Attribute(NodeId, usize),
    /// The text run at the given content index of an element
    Text(NodeId, usize),
}

/// Result of XPath evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum XPathResult {
    /// A node set, in document order
    Nodes(Vec<XPathNode>),
    /// A boolean result
    Boolean(bool),
    /// A number result
    Number(f64),
    /// A string result
    String(String),
}

impl XPathResult {
    /// XPath `boolean()` conversion
    pub fn is_truthy(&self) -> bool {
        match self {
            XPathResult::Boolean(b) => *b,
            XPathResult::Nodes(nodes) => !nodes.is_empty(),
            XPathResult::Number(n) => *n != 0.0 && !n.is_nan(),
            XPathResult::String(s) => !s.is_empty(),
        }
    }

    /// Get as nodes if applicable
    pub fn as_nodes(&self) -> Option<&[XPathNode]> {
        if let XPathResult::Nodes(nodes) = self {
            Some(nodes)
        } else {
            None
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            XPathResult::Nodes(_) => "node-set",
            XPathResult::Boolean(_) => "boolean",
            XPathResult::Number(_) => "number",
            XPathResult::String(_) => "string",
        }
    }
}

/// A compiled XPath expression
#[derive(Debug, Clone, PartialEq)]
pub struct XPath {
    expression: String,
    expr: Expr,
}

impl XPath {
    /// Compile an expression; only the `xml` prefix is bound
    pub fn compile(expression: &str) -> Result<Self, XPathParseError> {
        Self::compile_with_namespaces(expression, &NamespaceContext::new())
    }

    /// Compile an expression, resolving prefixes through `namespaces`
    pub fn compile_with_namespaces(
        expression: &str,
        namespaces: &NamespaceContext,
    ) -> Result<Self, XPathParseError> {
        Ok(Self {
            expression: expression.to_string(),
            expr: parse_expression(expression, namespaces)?,
        })
    }

    /// The source expression
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// The parsed expression tree
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate with the document node as context
    pub fn evaluate(&self, doc: &Document) -> Result<XPathResult, XPathParseError> {
        self.evaluate_at(doc, XPathNode::Root)
    }

    /// Evaluate with `node` as context
    pub fn evaluate_at(&self, doc: &Document, node: XPathNode) -> Result<XPathResult, XPathParseError> {
        Evaluator::new(doc).evaluate(&self.expr, node)
    }

    /// Elements selected by the expression, in document order
    pub fn select_elements(&self, doc: &Document) -> Result<Vec<NodeId>, XPathParseError> {
        match self.evaluate(doc)? {
            XPathResult::Nodes(nodes) => Ok(nodes
                .into_iter()
                .filter_map(|n| match n {
                    XPathNode::Element(id) => Some(id),
                    _ => None,
                })
                .collect()),
            other => Err(XPathParseError::Type(format!(
                "'{}' evaluates to a {}, not a node-set",
                self.expression,
                other.type_name()
            ))),
        }
    }

    /// String value of the expression's result (XPath `string()`)
    pub fn evaluate_string(&self, doc: &Document) -> Result<String, XPathParseError> {
        let evaluator = Evaluator::new(doc);
        Ok(match evaluator.evaluate(&self.expr, XPathNode::Root)? {
            XPathResult::Nodes(nodes) => nodes
                .first()
                .map(|n| evaluator.string_value(*n))
                .unwrap_or_default(),
            XPathResult::Boolean(b) => b.to_string(),
            XPathResult::Number(n) => evaluator::format_number(n),
            XPathResult::String(s) => s,
        })
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}
