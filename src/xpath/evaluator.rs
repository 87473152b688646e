//! XPath 1.0 evaluation over [`Document`] trees

use std::collections::HashMap;

use once_cell::unsync::OnceCell;

use crate::documents::{Content, Document};
use crate::namespaces::QName;

use super::parsers::{ArithOp, CompareOp, Expr, Function, NodeTest, ParsedStep, XPathAxis, XPathParseError};
use super::{XPathNode, XPathResult};

type EvalResult<T> = Result<T, XPathParseError>;

/// Evaluation focus: context node, position and size
#[derive(Debug, Clone, Copy)]
struct Focus {
    node: XPathNode,
    position: usize,
    size: usize,
}

/// Evaluates expressions against one document.
///
/// Document order is computed lazily, the first time a node-set has to be
/// sorted, and reused for the rest of the evaluation.
pub(crate) struct Evaluator<'d> {
    doc: &'d Document,
    order: OnceCell<(Vec<XPathNode>, HashMap<XPathNode, usize>)>,
}

impl<'d> Evaluator<'d> {
    pub(crate) fn new(doc: &'d Document) -> Self {
        Self {
            doc,
            order: OnceCell::new(),
        }
    }

    pub(crate) fn evaluate(&self, expr: &Expr, node: XPathNode) -> EvalResult<XPathResult> {
        self.eval(
            expr,
            Focus {
                node,
                position: 1,
                size: 1,
            },
        )
    }

    fn document_order(&self) -> &(Vec<XPathNode>, HashMap<XPathNode, usize>) {
        self.order.get_or_init(|| {
            let mut nodes = vec![XPathNode::Root];
            if let Some(root) = self.doc.root() {
                let mut stack = vec![XPathNode::Element(root)];
                while let Some(node) = stack.pop() {
                    nodes.push(node);
                    if let XPathNode::Element(id) = node {
                        let element = self.doc.element(id);
                        nodes.extend((0..element.attributes.len()).map(|i| XPathNode::Attribute(id, i)));
                        for (index, content) in element.content.iter().enumerate().rev() {
                            stack.push(match content {
                                Content::Element(child) => XPathNode::Element(*child),
                                Content::Text(_) => XPathNode::Text(id, index),
                            });
                        }
                    }
                }
            }
            let index = nodes.iter().enumerate().map(|(i, n)| (*n, i)).collect();
            (nodes, index)
        })
    }

    fn sort_dedup(&self, mut nodes: Vec<XPathNode>) -> Vec<XPathNode> {
        if nodes.len() < 2 {
            return nodes;
        }
        let (_, index) = self.document_order();
        nodes.sort_by_key(|n| index.get(n).copied().unwrap_or(usize::MAX));
        nodes.dedup();
        nodes
    }

    fn eval(&self, expr: &Expr, focus: Focus) -> EvalResult<XPathResult> {
        match expr {
            Expr::Or(l, r) => {
                let value = self.eval(l, focus)?.is_truthy() || self.eval(r, focus)?.is_truthy();
                Ok(XPathResult::Boolean(value))
            }
            Expr::And(l, r) => {
                let value = self.eval(l, focus)?.is_truthy() && self.eval(r, focus)?.is_truthy();
                Ok(XPathResult::Boolean(value))
            }
            Expr::Compare(op, l, r) => {
                let left = self.eval(l, focus)?;
                let right = self.eval(r, focus)?;
                Ok(XPathResult::Boolean(self.compare(*op, &left, &right)))
            }
            Expr::Arith(op, l, r) => {
                let a = self.number(&self.eval(l, focus)?);
                let b = self.number(&self.eval(r, focus)?);
                Ok(XPathResult::Number(match op {
                    ArithOp::Add => a + b,
                    ArithOp::Sub => a - b,
                    ArithOp::Mul => a * b,
                    ArithOp::Div => a / b,
                    ArithOp::Mod => a % b,
                }))
            }
            Expr::Negate(operand) => Ok(XPathResult::Number(-self.number(&self.eval(operand, focus)?))),
            Expr::Union(l, r) => {
                let mut nodes = self.node_set(self.eval(l, focus)?, "|")?;
                nodes.extend(self.node_set(self.eval(r, focus)?, "|")?);
                Ok(XPathResult::Nodes(self.sort_dedup(nodes)))
            }
            Expr::Path { absolute, steps } => {
                let start = if *absolute { XPathNode::Root } else { focus.node };
                Ok(XPathResult::Nodes(self.apply_steps(vec![start], steps)?))
            }
            Expr::Filter {
                primary,
                predicates,
                steps,
            } => {
                let nodes = self.node_set(self.eval(primary, focus)?, "a filter expression")?;
                let nodes = self.apply_predicates(nodes, predicates)?;
                Ok(XPathResult::Nodes(self.apply_steps(nodes, steps)?))
            }
            Expr::Literal(s) => Ok(XPathResult::String(s.clone())),
            Expr::Number(n) => Ok(XPathResult::Number(*n)),
            Expr::Call(function, args) => self.call(*function, args, focus),
        }
    }

    fn node_set(&self, value: XPathResult, what: &str) -> EvalResult<Vec<XPathNode>> {
        match value {
            XPathResult::Nodes(nodes) => Ok(nodes),
            other => Err(XPathParseError::Type(format!(
                "{} requires a node-set, got {}",
                what,
                other.type_name()
            ))),
        }
    }

    fn apply_steps(&self, mut nodes: Vec<XPathNode>, steps: &[ParsedStep]) -> EvalResult<Vec<XPathNode>> {
        for step in steps {
            let multiple = nodes.len() > 1;
            let mut out = Vec::new();
            for node in nodes {
                let mut candidates: Vec<_> = self
                    .axis(node, step.axis)
                    .into_iter()
                    .filter(|n| self.matches(*n, &step.node_test, step.axis))
                    .collect();
                // Predicate positions count in proximity order
                if step.axis.is_reverse() {
                    candidates.reverse();
                }
                let mut selected = self.apply_predicates(candidates, &step.predicates)?;
                if step.axis.is_reverse() {
                    selected.reverse();
                }
                out.extend(selected);
            }
            nodes = if multiple { self.sort_dedup(out) } else { out };
        }
        Ok(nodes)
    }

    /// Filter `nodes` (in proximity order) through each predicate in turn
    fn apply_predicates(&self, mut nodes: Vec<XPathNode>, predicates: &[Expr]) -> EvalResult<Vec<XPathNode>> {
        for predicate in predicates {
            let size = nodes.len();
            let mut kept = Vec::with_capacity(size);
            for (i, node) in nodes.into_iter().enumerate() {
                let focus = Focus {
                    node,
                    position: i + 1,
                    size,
                };
                let keep = match self.eval(predicate, focus)? {
                    XPathResult::Number(n) => n == focus.position as f64,
                    other => other.is_truthy(),
                };
                if keep {
                    kept.push(node);
                }
            }
            nodes = kept;
        }
        Ok(nodes)
    }

    fn children(&self, node: XPathNode) -> Vec<XPathNode> {
        match node {
            XPathNode::Root => self.doc.root().map(XPathNode::Element).into_iter().collect(),
            XPathNode::Element(id) => self
                .doc
                .element(id)
                .content
                .iter()
                .enumerate()
                .map(|(index, content)| match content {
                    Content::Element(child) => XPathNode::Element(*child),
                    Content::Text(_) => XPathNode::Text(id, index),
                })
                .collect(),
            XPathNode::Attribute(..) | XPathNode::Text(..) => Vec::new(),
        }
    }

    fn parent(&self, node: XPathNode) -> Option<XPathNode> {
        match node {
            XPathNode::Root => None,
            XPathNode::Element(id) => Some(
                self.doc
                    .parent(id)
                    .map(XPathNode::Element)
                    .unwrap_or(XPathNode::Root),
            ),
            XPathNode::Attribute(id, _) | XPathNode::Text(id, _) => Some(XPathNode::Element(id)),
        }
    }

    fn descendants(&self, node: XPathNode, out: &mut Vec<XPathNode>) {
        let mut stack: Vec<_> = self.children(node).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).into_iter().rev());
        }
    }

    fn is_ancestor(&self, ancestor: XPathNode, node: XPathNode) -> bool {
        let mut current = self.parent(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Nodes on `axis` from `node`, in document order
    fn axis(&self, node: XPathNode, axis: XPathAxis) -> Vec<XPathNode> {
        match axis {
            XPathAxis::Child => self.children(node),
            XPathAxis::Descendant => {
                let mut out = Vec::new();
                self.descendants(node, &mut out);
                out
            }
            XPathAxis::DescendantOrSelf => {
                let mut out = vec![node];
                self.descendants(node, &mut out);
                out
            }
            XPathAxis::Self_ => vec![node],
            XPathAxis::Parent => self.parent(node).into_iter().collect(),
            XPathAxis::Ancestor | XPathAxis::AncestorOrSelf => {
                let mut out = Vec::new();
                if axis == XPathAxis::AncestorOrSelf {
                    out.push(node);
                }
                let mut current = self.parent(node);
                while let Some(n) = current {
                    out.push(n);
                    current = self.parent(n);
                }
                out.reverse();
                out
            }
            XPathAxis::FollowingSibling | XPathAxis::PrecedingSibling => {
                if matches!(node, XPathNode::Attribute(..) | XPathNode::Root) {
                    return Vec::new();
                }
                let siblings = self.parent(node).map(|p| self.children(p)).unwrap_or_default();
                let Some(index) = siblings.iter().position(|n| *n == node) else {
                    return Vec::new();
                };
                if axis == XPathAxis::FollowingSibling {
                    siblings[index + 1..].to_vec()
                } else {
                    siblings[..index].to_vec()
                }
            }
            XPathAxis::Following => {
                let base = match node {
                    XPathNode::Root => return Vec::new(),
                    XPathNode::Attribute(id, _) => XPathNode::Element(id),
                    other => other,
                };
                let (nodes, index) = self.document_order();
                let start = index.get(&base).copied().unwrap_or(nodes.len());
                nodes
                    .get(start + 1..)
                    .unwrap_or_default()
                    .iter()
                    .copied()
                    .filter(|n| !matches!(n, XPathNode::Attribute(..)))
                    .filter(|n| base != node || !self.is_ancestor(base, *n))
                    .collect()
            }
            XPathAxis::Preceding => {
                let base = match node {
                    XPathNode::Root => return Vec::new(),
                    XPathNode::Attribute(id, _) => XPathNode::Element(id),
                    other => other,
                };
                let (nodes, index) = self.document_order();
                let end = index.get(&base).copied().unwrap_or(0);
                nodes[..end]
                    .iter()
                    .copied()
                    .filter(|n| !matches!(n, XPathNode::Attribute(..) | XPathNode::Root))
                    .filter(|n| !self.is_ancestor(*n, base))
                    .collect()
            }
            XPathAxis::Attribute => match node {
                XPathNode::Element(id) => (0..self.doc.element(id).attributes.len())
                    .map(|i| XPathNode::Attribute(id, i))
                    .collect(),
                _ => Vec::new(),
            },
        }
    }

    fn qname(&self, node: XPathNode) -> Option<&QName> {
        match node {
            XPathNode::Element(id) => Some(&self.doc.element(id).qname),
            XPathNode::Attribute(id, i) => Some(&self.doc.element(id).attributes[i].qname),
            _ => None,
        }
    }

    fn matches(&self, node: XPathNode, test: &NodeTest, axis: XPathAxis) -> bool {
        let principal = if axis == XPathAxis::Attribute {
            matches!(node, XPathNode::Attribute(..))
        } else {
            matches!(node, XPathNode::Element(_))
        };
        match test {
            NodeTest::Node => true,
            NodeTest::Text => matches!(node, XPathNode::Text(..)),
            NodeTest::Comment | NodeTest::ProcessingInstruction => false,
            NodeTest::Wildcard => principal,
            NodeTest::NamespaceWildcard(uri) => {
                principal && self.qname(node).map_or(false, |q| q.is_in(Some(uri)))
            }
            NodeTest::Name(expected) => principal && self.qname(node) == Some(expected),
        }
    }

    pub(crate) fn string_value(&self, node: XPathNode) -> String {
        match node {
            XPathNode::Root => self
                .doc
                .root()
                .map(|id| self.doc.string_value(id))
                .unwrap_or_default(),
            XPathNode::Element(id) => self.doc.string_value(id),
            XPathNode::Attribute(id, i) => self.doc.element(id).attributes[i].value.clone(),
            XPathNode::Text(id, index) => match self.doc.element(id).content.get(index) {
                Some(Content::Text(t)) => t.clone(),
                _ => String::new(),
            },
        }
    }

    fn string(&self, value: &XPathResult) -> String {
        match value {
            XPathResult::Nodes(nodes) => nodes
                .first()
                .map(|n| self.string_value(*n))
                .unwrap_or_default(),
            XPathResult::Boolean(b) => b.to_string(),
            XPathResult::Number(n) => format_number(*n),
            XPathResult::String(s) => s.clone(),
        }
    }

    fn number(&self, value: &XPathResult) -> f64 {
        match value {
            XPathResult::Number(n) => *n,
            XPathResult::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            other => parse_number(&self.string(other)),
        }
    }

    fn compare(&self, op: CompareOp, left: &XPathResult, right: &XPathResult) -> bool {
        match (left, right) {
            (XPathResult::Nodes(a), XPathResult::Nodes(b)) => {
                let rights: Vec<String> = b.iter().map(|n| self.string_value(*n)).collect();
                a.iter().any(|n| {
                    let l = XPathResult::String(self.string_value(*n));
                    rights
                        .iter()
                        .any(|r| compare_atomic(op, &l, &XPathResult::String(r.clone())))
                })
            }
            (XPathResult::Nodes(nodes), other) => self.compare_nodes(op, nodes, other, false),
            (other, XPathResult::Nodes(nodes)) => self.compare_nodes(op, nodes, other, true),
            (l, r) => compare_atomic(op, l, r),
        }
    }

    /// Compare each node against an atomic value; `flipped` when the
    /// node-set was the right-hand operand.
    fn compare_nodes(&self, op: CompareOp, nodes: &[XPathNode], other: &XPathResult, flipped: bool) -> bool {
        let ordered = |l: &XPathResult, r: &XPathResult| {
            if flipped {
                compare_atomic(op, r, l)
            } else {
                compare_atomic(op, l, r)
            }
        };
        match other {
            XPathResult::Boolean(_) => ordered(&XPathResult::Boolean(!nodes.is_empty()), other),
            XPathResult::Number(_) => nodes.iter().any(|n| {
                ordered(&XPathResult::Number(parse_number(&self.string_value(*n))), other)
            }),
            _ => nodes
                .iter()
                .any(|n| ordered(&XPathResult::String(self.string_value(*n)), other)),
        }
    }

    fn call(&self, function: Function, args: &[Expr], focus: Focus) -> EvalResult<XPathResult> {
        let values = args
            .iter()
            .map(|a| self.eval(a, focus))
            .collect::<EvalResult<Vec<_>>>()?;
        let string_arg = |i: usize| -> String {
            match values.get(i) {
                Some(v) => self.string(v),
                None => self.string_value(focus.node),
            }
        };
        let arg = |i: usize| {
            values.get(i).ok_or_else(|| {
                XPathParseError::InvalidSyntax(format!("missing argument {} to {:?}", i + 1, function))
            })
        };
        let first_node = |what: &str| -> EvalResult<Option<XPathNode>> {
            match values.first() {
                Some(v) => Ok(self.node_set(v.clone(), what)?.first().copied()),
                None => Ok(Some(focus.node)),
            }
        };

        let result = match function {
            Function::Last => XPathResult::Number(focus.size as f64),
            Function::Position => XPathResult::Number(focus.position as f64),
            Function::Count => {
                XPathResult::Number(self.node_set(arg(0)?.clone(), "count()")?.len() as f64)
            }
            Function::Sum => XPathResult::Number(
                self.node_set(arg(0)?.clone(), "sum()")?
                    .iter()
                    .map(|n| parse_number(&self.string_value(*n)))
                    .sum(),
            ),
            Function::LocalName => XPathResult::String(
                first_node("local-name()")?
                    .and_then(|n| self.qname(n))
                    .map(|q| q.local_name.clone())
                    .unwrap_or_default(),
            ),
            Function::NamespaceUri => XPathResult::String(
                first_node("namespace-uri()")?
                    .and_then(|n| self.qname(n))
                    .and_then(|q| q.namespace.clone())
                    .unwrap_or_default(),
            ),
            Function::Name => XPathResult::String(
                first_node("name()")?
                    .map(|n| self.prefixed_name(n))
                    .unwrap_or_default(),
            ),
            Function::String => XPathResult::String(string_arg(0)),
            Function::Concat => XPathResult::String(values.iter().map(|v| self.string(v)).collect()),
            Function::StartsWith => XPathResult::Boolean(string_arg(0).starts_with(&string_arg(1))),
            Function::Contains => XPathResult::Boolean(string_arg(0).contains(&string_arg(1))),
            Function::SubstringBefore => {
                let (s, pat) = (string_arg(0), string_arg(1));
                XPathResult::String(s.find(&pat).map(|i| s[..i].to_string()).unwrap_or_default())
            }
            Function::SubstringAfter => {
                let (s, pat) = (string_arg(0), string_arg(1));
                XPathResult::String(
                    s.find(&pat)
                        .map(|i| s[i + pat.len()..].to_string())
                        .unwrap_or_default(),
                )
            }
            Function::Substring => {
                let s = string_arg(0);
                let start = xpath_round(self.number(arg(1)?));
                let end = match values.get(2) {
                    Some(len) => start + xpath_round(self.number(len)),
                    None => f64::INFINITY,
                };
                XPathResult::String(
                    s.chars()
                        .enumerate()
                        .filter(|(i, _)| {
                            let position = (*i + 1) as f64;
                            position >= start && position < end
                        })
                        .map(|(_, c)| c)
                        .collect(),
                )
            }
            Function::StringLength => XPathResult::Number(string_arg(0).chars().count() as f64),
            Function::NormalizeSpace => {
                XPathResult::String(string_arg(0).split_whitespace().collect::<Vec<_>>().join(" "))
            }
            Function::Translate => {
                let from: Vec<char> = string_arg(1).chars().collect();
                let to: Vec<char> = string_arg(2).chars().collect();
                XPathResult::String(
                    string_arg(0)
                        .chars()
                        .filter_map(|c| match from.iter().position(|f| *f == c) {
                            Some(i) => to.get(i).copied(),
                            None => Some(c),
                        })
                        .collect(),
                )
            }
            Function::Boolean => XPathResult::Boolean(arg(0)?.is_truthy()),
            Function::Not => XPathResult::Boolean(!arg(0)?.is_truthy()),
            Function::True => XPathResult::Boolean(true),
            Function::False => XPathResult::Boolean(false),
            Function::Number => XPathResult::Number(match values.first() {
                Some(v) => self.number(v),
                None => parse_number(&self.string_value(focus.node)),
            }),
            Function::Floor => XPathResult::Number(self.number(arg(0)?).floor()),
            Function::Ceiling => XPathResult::Number(self.number(arg(0)?).ceil()),
            Function::Round => XPathResult::Number(xpath_round(self.number(arg(0)?))),
        };
        Ok(result)
    }

    fn prefixed_name(&self, node: XPathNode) -> String {
        match node {
            XPathNode::Element(id) => self.doc.element(id).prefixed_name(),
            XPathNode::Attribute(id, i) => {
                let attr = &self.doc.element(id).attributes[i];
                match &attr.prefix {
                    Some(p) => format!("{}:{}", p, attr.qname.local_name),
                    None => attr.qname.local_name.clone(),
                }
            }
            XPathNode::Root | XPathNode::Text(..) => String::new(),
        }
    }
}

fn compare_atomic(op: CompareOp, left: &XPathResult, right: &XPathResult) -> bool {
    let as_number = |v: &XPathResult| match v {
        XPathResult::Number(n) => *n,
        XPathResult::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        XPathResult::String(s) => parse_number(s),
        XPathResult::Nodes(_) => f64::NAN,
    };

    match op {
        CompareOp::Eq | CompareOp::Ne => {
            let equal = match (left, right) {
                (XPathResult::Boolean(_), _) | (_, XPathResult::Boolean(_)) => {
                    left.is_truthy() == right.is_truthy()
                }
                (XPathResult::Number(_), _) | (_, XPathResult::Number(_)) => {
                    as_number(left) == as_number(right)
                }
                (XPathResult::String(a), XPathResult::String(b)) => a == b,
                _ => false,
            };
            if op == CompareOp::Eq {
                equal
            } else {
                !equal
            }
        }
        CompareOp::Lt => as_number(left) < as_number(right),
        CompareOp::Le => as_number(left) <= as_number(right),
        CompareOp::Gt => as_number(left) > as_number(right),
        CompareOp::Ge => as_number(left) >= as_number(right),
    }
}

/// XPath `number()` conversion of a string: NaN unless the whole
/// (trimmed) string is an optionally negative decimal number
pub(crate) fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    let body = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let valid = body.chars().any(|c| c.is_ascii_digit())
        && body.chars().all(|c| c.is_ascii_digit() || c == '.')
        && body.matches('.').count() <= 1;
    if valid {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

/// XPath string form of a number
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn xpath_round(n: f64) -> f64 {
    if n.is_finite() {
        (n + 0.5).floor()
    } else {
        n
    }
}
