//! XPath 1.0 parser
//!
//! Turns an expression into an [`Expr`] tree. Namespace prefixes in name
//! tests are resolved while parsing, so evaluation never needs the
//! prefix bindings.

use std::fmt;

use crate::namespaces::{NamespaceContext, QName};

use super::selectors::{is_ncname_char, is_ncname_start_char};

/// XPath axis types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XPathAxis {
    /// child:: axis (default)
    Child,
    /// descendant:: axis
    Descendant,
    /// descendant-or-self:: axis
    DescendantOrSelf,
    /// self:: axis
    Self_,
    /// parent:: axis
    Parent,
    /// ancestor:: axis
    Ancestor,
    /// ancestor-or-self:: axis
    AncestorOrSelf,
    /// following-sibling:: axis
    FollowingSibling,
    /// preceding-sibling:: axis
    PrecedingSibling,
    /// following:: axis
    Following,
    /// preceding:: axis
    Preceding,
    /// attribute:: axis
    Attribute,
}

impl XPathAxis {
    /// Parse axis from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Self::Child),
            "descendant" => Some(Self::Descendant),
            "descendant-or-self" => Some(Self::DescendantOrSelf),
            "self" => Some(Self::Self_),
            "parent" => Some(Self::Parent),
            "ancestor" => Some(Self::Ancestor),
            "ancestor-or-self" => Some(Self::AncestorOrSelf),
            "following-sibling" => Some(Self::FollowingSibling),
            "preceding-sibling" => Some(Self::PrecedingSibling),
            "following" => Some(Self::Following),
            "preceding" => Some(Self::Preceding),
            "attribute" => Some(Self::Attribute),
            _ => None,
        }
    }

    /// Check if this axis is reverse (proximity runs against document order)
    pub fn is_reverse(&self) -> bool {
        matches!(
            self,
            Self::Parent
                | Self::Ancestor
                | Self::AncestorOrSelf
                | Self::PrecedingSibling
                | Self::Preceding
        )
    }
}

impl fmt::Display for XPathAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Child => "child",
            Self::Descendant => "descendant",
            Self::DescendantOrSelf => "descendant-or-self",
            Self::Self_ => "self",
            Self::Parent => "parent",
            Self::Ancestor => "ancestor",
            Self::AncestorOrSelf => "ancestor-or-self",
            Self::FollowingSibling => "following-sibling",
            Self::PrecedingSibling => "preceding-sibling",
            Self::Following => "following",
            Self::Preceding => "preceding",
            Self::Attribute => "attribute",
        };
        write!(f, "{}", s)
    }
}

/// Node test in an XPath step
#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// Name test, with the prefix already resolved
    Name(QName),
    /// Wildcard test (*)
    Wildcard,
    /// Namespace wildcard (prefix:*), holding the namespace URI
    NamespaceWildcard(String),
    /// node() test
    Node,
    /// text() test
    Text,
    /// comment() test
    Comment,
    /// processing-instruction() test
    ProcessingInstruction,
}

/// A parsed step in a location path
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStep {
    /// The axis
    pub axis: XPathAxis,
    /// The node test
    pub node_test: NodeTest,
    /// Predicates
    pub predicates: Vec<Expr>,
}

impl ParsedStep {
    fn abbreviated(axis: XPathAxis) -> Self {
        Self {
            axis,
            node_test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Core library functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Last,
    Position,
    Count,
    LocalName,
    NamespaceUri,
    Name,
    String,
    Concat,
    StartsWith,
    Contains,
    SubstringBefore,
    SubstringAfter,
    Substring,
    StringLength,
    NormalizeSpace,
    Translate,
    Boolean,
    Not,
    True,
    False,
    Number,
    Sum,
    Floor,
    Ceiling,
    Round,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "last" => Self::Last,
            "position" => Self::Position,
            "count" => Self::Count,
            "local-name" => Self::LocalName,
            "namespace-uri" => Self::NamespaceUri,
            "name" => Self::Name,
            "string" => Self::String,
            "concat" => Self::Concat,
            "starts-with" => Self::StartsWith,
            "contains" => Self::Contains,
            "substring-before" => Self::SubstringBefore,
            "substring-after" => Self::SubstringAfter,
            "substring" => Self::Substring,
            "string-length" => Self::StringLength,
            "normalize-space" => Self::NormalizeSpace,
            "translate" => Self::Translate,
            "boolean" => Self::Boolean,
            "not" => Self::Not,
            "true" => Self::True,
            "false" => Self::False,
            "number" => Self::Number,
            "sum" => Self::Sum,
            "floor" => Self::Floor,
            "ceiling" => Self::Ceiling,
            "round" => Self::Round,
            _ => return None,
        })
    }

    /// Allowed argument counts (min, max); `None` max = variadic
    fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Self::Last | Self::Position | Self::True | Self::False => (0, Some(0)),
            Self::LocalName
            | Self::NamespaceUri
            | Self::Name
            | Self::String
            | Self::StringLength
            | Self::NormalizeSpace
            | Self::Number => (0, Some(1)),
            Self::Count
            | Self::Boolean
            | Self::Not
            | Self::Sum
            | Self::Floor
            | Self::Ceiling
            | Self::Round => (1, Some(1)),
            Self::StartsWith | Self::Contains | Self::SubstringBefore | Self::SubstringAfter => {
                (2, Some(2))
            }
            Self::Substring => (2, Some(3)),
            Self::Translate => (3, Some(3)),
            Self::Concat => (2, None),
        }
    }
}

/// XPath expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    Negate(Box<Expr>),
    Union(Box<Expr>, Box<Expr>),
    /// A location path, absolute or relative to the context node
    Path {
        absolute: bool,
        steps: Vec<ParsedStep>,
    },
    /// A primary expression with predicates, optionally followed by steps
    Filter {
        primary: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<ParsedStep>,
    },
    Literal(String),
    Number(f64),
    Call(Function, Vec<Expr>),
}

/// XPath parse error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XPathParseError {
    /// Unknown axis name
    UnknownAxis(String),
    /// Unknown function name
    UnknownFunction(String),
    /// Prefix with no namespace binding
    UnknownPrefix(String),
    /// Invalid syntax
    InvalidSyntax(String),
    /// Unexpected end of expression
    UnexpectedEnd,
    /// An operand of the wrong type at evaluation time
    Type(String),
}

impl fmt::Display for XPathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAxis(axis) => write!(f, "Unknown XPath axis: {}", axis),
            Self::UnknownFunction(name) => write!(f, "Unknown XPath function: {}", name),
            Self::UnknownPrefix(prefix) => write!(f, "Unknown namespace prefix: {}", prefix),
            Self::InvalidSyntax(msg) => write!(f, "Invalid XPath syntax: {}", msg),
            Self::UnexpectedEnd => write!(f, "Unexpected end of XPath expression"),
            Self::Type(msg) => write!(f, "XPath type error: {}", msg),
        }
    }
}

impl std::error::Error for XPathParseError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Dot,
    DotDot,
    Pipe,
    Plus,
    Minus,
    Star,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Literal(String),
    Number(f64),
    /// NCName, QName or `prefix:*`
    Name(String),
    /// Axis name, already followed by `::`
    Axis(String),
    Dollar,
}

fn tokenize(input: &str) -> Result<Vec<Token>, XPathParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '/' if next == Some('/') => {
                tokens.push(Token::DoubleSlash);
                i += 2;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '@' => {
                tokens.push(Token::At);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '$' => {
                tokens.push(Token::Dollar);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '<' if next == Some('=') => {
                tokens.push(Token::Le);
                i += 2;
            }
            '<' => {
                tokens.push(Token::Lt);
                i += 1;
            }
            '>' if next == Some('=') => {
                tokens.push(Token::Ge);
                i += 2;
            }
            '>' => {
                tokens.push(Token::Gt);
                i += 1;
            }
            '"' | '\'' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&q| q == c)
                    .ok_or_else(|| {
                        XPathParseError::InvalidSyntax("unterminated string literal".to_string())
                    })?;
                tokens.push(Token::Literal(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            '.' if next == Some('.') => {
                tokens.push(Token::DotDot);
                i += 2;
            }
            '.' if !next.map_or(false, |n| n.is_ascii_digit()) => {
                tokens.push(Token::Dot);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse::<f64>().map_err(|_| {
                    XPathParseError::InvalidSyntax(format!("invalid number '{}'", text))
                })?;
                tokens.push(Token::Number(value));
            }
            c if is_ncname_start_char(c) => {
                let start = i;
                while i < chars.len() && is_ncname_char(chars[i]) {
                    i += 1;
                }
                let mut name: String = chars[start..i].iter().collect();

                if chars.get(i) == Some(&':') && chars.get(i + 1) == Some(&':') {
                    tokens.push(Token::Axis(name));
                    i += 2;
                    continue;
                }
                if chars.get(i) == Some(&':') {
                    match chars.get(i + 1) {
                        Some('*') => {
                            name.push_str(":*");
                            i += 2;
                        }
                        Some(&n) if is_ncname_start_char(n) => {
                            name.push(':');
                            i += 1;
                            while i < chars.len() && is_ncname_char(chars[i]) {
                                name.push(chars[i]);
                                i += 1;
                            }
                        }
                        _ => {}
                    }
                }
                tokens.push(Token::Name(name));
            }
            other => {
                return Err(XPathParseError::InvalidSyntax(format!(
                    "unexpected character '{}'",
                    other
                )))
            }
        }
    }

    Ok(tokens)
}

/// Parse an XPath 1.0 expression, resolving prefixes through `namespaces`
pub fn parse_expression(input: &str, namespaces: &NamespaceContext) -> Result<Expr, XPathParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        namespaces,
    };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(XPathParseError::InvalidSyntax(format!(
            "unexpected {:?} in '{}'",
            token, input
        ))),
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    namespaces: &'a NamespaceContext,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<(), XPathParseError> {
        match self.advance() {
            Some(ref t) if *t == token => Ok(()),
            Some(t) => Err(XPathParseError::InvalidSyntax(format!(
                "expected {:?}, found {:?}",
                token, t
            ))),
            None => Err(XPathParseError::UnexpectedEnd),
        }
    }

    fn eat_operator_name(&mut self, name: &str) -> bool {
        if matches!(self.peek(), Some(Token::Name(n)) if n == name) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, XPathParseError> {
        let mut left = self.parse_and()?;
        while self.eat_operator_name("or") {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, XPathParseError> {
        let mut left = self.parse_equality()?;
        while self.eat_operator_name("and") {
            let right = self.parse_equality()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, XPathParseError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::Ne) => CompareOp::Ne,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_relational()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, XPathParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::Le) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::Ge) => CompareOp::Ge,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_additive()?;
            left = Expr::Compare(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, XPathParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::Arith(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, XPathParseError> {
        let mut left = self.parse_unary()?;
        loop {
            // After a complete operand, `*` and these names can only be operators
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Name(n)) if n == "div" => ArithOp::Div,
                Some(Token::Name(n)) if n == "mod" => ArithOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Arith(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, XPathParseError> {
        if self.eat(&Token::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Negate(Box::new(operand)));
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> Result<Expr, XPathParseError> {
        let mut left = self.parse_path()?;
        while self.eat(&Token::Pipe) {
            let right = self.parse_path()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn starts_filter(&self) -> bool {
        match self.peek() {
            Some(Token::LParen) | Some(Token::Literal(_)) | Some(Token::Number(_)) => true,
            Some(Token::Dollar) => true,
            Some(Token::Name(name)) => {
                self.peek_at(1) == Some(&Token::LParen) && !is_node_type(name)
            }
            _ => false,
        }
    }

    fn starts_step(&self) -> bool {
        match self.peek() {
            Some(Token::Dot) | Some(Token::DotDot) | Some(Token::At) | Some(Token::Star) => true,
            Some(Token::Axis(_)) => true,
            Some(Token::Name(name)) => {
                self.peek_at(1) != Some(&Token::LParen) || is_node_type(name)
            }
            _ => false,
        }
    }

    fn parse_path(&mut self) -> Result<Expr, XPathParseError> {
        if self.starts_filter() {
            let primary = self.parse_primary()?;
            let predicates = self.parse_predicates()?;
            let mut steps = Vec::new();
            self.parse_trailing_steps(&mut steps)?;
            if predicates.is_empty() && steps.is_empty() {
                return Ok(primary);
            }
            return Ok(Expr::Filter {
                primary: Box::new(primary),
                predicates,
                steps,
            });
        }

        let mut steps = Vec::new();
        let absolute = match self.peek() {
            Some(Token::Slash) => {
                self.pos += 1;
                if self.starts_step() {
                    steps.push(self.parse_step()?);
                }
                true
            }
            Some(Token::DoubleSlash) => {
                self.pos += 1;
                steps.push(ParsedStep::abbreviated(XPathAxis::DescendantOrSelf));
                steps.push(self.parse_step()?);
                true
            }
            Some(_) => {
                steps.push(self.parse_step()?);
                false
            }
            None => return Err(XPathParseError::UnexpectedEnd),
        };
        if !steps.is_empty() {
            self.parse_trailing_steps(&mut steps)?;
        }
        Ok(Expr::Path { absolute, steps })
    }

    fn parse_trailing_steps(&mut self, steps: &mut Vec<ParsedStep>) -> Result<(), XPathParseError> {
        loop {
            match self.peek() {
                Some(Token::Slash) => {
                    self.pos += 1;
                    steps.push(self.parse_step()?);
                }
                Some(Token::DoubleSlash) => {
                    self.pos += 1;
                    steps.push(ParsedStep::abbreviated(XPathAxis::DescendantOrSelf));
                    steps.push(self.parse_step()?);
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_step(&mut self) -> Result<ParsedStep, XPathParseError> {
        if self.eat(&Token::Dot) {
            return Ok(ParsedStep::abbreviated(XPathAxis::Self_));
        }
        if self.eat(&Token::DotDot) {
            return Ok(ParsedStep::abbreviated(XPathAxis::Parent));
        }

        let axis = match self.peek().cloned() {
            Some(Token::At) => {
                self.pos += 1;
                XPathAxis::Attribute
            }
            Some(Token::Axis(name)) => {
                self.pos += 1;
                XPathAxis::parse(&name).ok_or(XPathParseError::UnknownAxis(name))?
            }
            _ => XPathAxis::Child,
        };

        let node_test = self.parse_node_test()?;
        let predicates = self.parse_predicates()?;
        Ok(ParsedStep {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, XPathParseError> {
        match self.advance() {
            Some(Token::Star) => Ok(NodeTest::Wildcard),
            Some(Token::Name(name)) => {
                if is_node_type(&name) && self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    // processing-instruction('target') is accepted and ignored
                    if name == "processing-instruction" {
                        if let Some(Token::Literal(_)) = self.peek() {
                            self.pos += 1;
                        }
                    }
                    self.expect(Token::RParen)?;
                    return Ok(match name.as_str() {
                        "node" => NodeTest::Node,
                        "text" => NodeTest::Text,
                        "comment" => NodeTest::Comment,
                        _ => NodeTest::ProcessingInstruction,
                    });
                }
                if let Some(prefix) = name.strip_suffix(":*") {
                    let uri = self
                        .namespaces
                        .get_namespace(prefix)
                        .ok_or_else(|| XPathParseError::UnknownPrefix(prefix.to_string()))?;
                    return Ok(NodeTest::NamespaceWildcard(uri.to_string()));
                }
                let qname = match name.split_once(':') {
                    Some((prefix, local)) => {
                        let uri = self
                            .namespaces
                            .get_namespace(prefix)
                            .ok_or_else(|| XPathParseError::UnknownPrefix(prefix.to_string()))?;
                        QName::namespaced(uri, local)
                    }
                    None => QName::local(name),
                };
                Ok(NodeTest::Name(qname))
            }
            Some(t) => Err(XPathParseError::InvalidSyntax(format!(
                "expected a node test, found {:?}",
                t
            ))),
            None => Err(XPathParseError::UnexpectedEnd),
        }
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, XPathParseError> {
        let mut predicates = Vec::new();
        while self.eat(&Token::LBracket) {
            predicates.push(self.parse_or()?);
            self.expect(Token::RBracket)?;
        }
        Ok(predicates)
    }

    fn parse_primary(&mut self) -> Result<Expr, XPathParseError> {
        match self.advance() {
            Some(Token::LParen) => {
                let expr = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(Token::Literal(s)) => Ok(Expr::Literal(s)),
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Dollar) => Err(XPathParseError::InvalidSyntax(
                "variable references are not supported".to_string(),
            )),
            Some(Token::Name(name)) => {
                let function =
                    Function::lookup(&name).ok_or(XPathParseError::UnknownFunction(name.clone()))?;
                self.expect(Token::LParen)?;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.parse_or()?);
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        self.expect(Token::Comma)?;
                    }
                }
                let (min, max) = function.arity();
                if args.len() < min || max.map_or(false, |m| args.len() > m) {
                    return Err(XPathParseError::InvalidSyntax(format!(
                        "wrong number of arguments to {}()",
                        name
                    )));
                }
                Ok(Expr::Call(function, args))
            }
            Some(t) => Err(XPathParseError::InvalidSyntax(format!("unexpected {:?}", t))),
            None => Err(XPathParseError::UnexpectedEnd),
        }
    }
}

fn is_node_type(name: &str) -> bool {
    matches!(name, "node" | "text" | "comment" | "processing-instruction")
}
