//! XSD constraining facets
//!
//! Facets restrict the value space of a simple type. A [`Facets`] holds the
//! facets declared by one restriction step; the simple type chains steps so
//! that a value must satisfy every step from the built-in base down.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use super::builtins::XsdValue;
use super::exceptions::{StructuralError, ValueResult};
use crate::error::SchemaError;

/// White space handling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace and collapse multiple spaces
    Collapse,
}

impl FromStr for WhiteSpace {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "preserve" => Ok(WhiteSpace::Preserve),
            "replace" => Ok(WhiteSpace::Replace),
            "collapse" => Ok(WhiteSpace::Collapse),
            _ => Err(SchemaError::new(format!(
                "Invalid whiteSpace value: '{}'. Must be 'preserve', 'replace', or 'collapse'",
                s
            ))),
        }
    }
}

impl WhiteSpace {
    /// Normalize a string according to this white space mode
    pub fn normalize(&self, s: &str) -> String {
        match self {
            WhiteSpace::Preserve => s.to_string(),
            WhiteSpace::Replace => s.replace(['\t', '\n', '\r'], " "),
            WhiteSpace::Collapse => s.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// Pattern facet, an XSD regular expression matched against the whole value
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile an XSD regular expression
    pub fn new(pattern: &str) -> Result<Self, SchemaError> {
        let translated = translate_pattern(pattern);
        let regex = Regex::new(&translated).map_err(|e| {
            SchemaError::new(format!("Invalid pattern '{}'", pattern)).with_source(e.to_string())
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written in the schema
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the whole value matches
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Translate XSD regex syntax into `regex` crate syntax.
///
/// XSD patterns are implicitly anchored, treat `^` and `$` as literals and
/// add the `\i`/`\c` name-character escapes.
fn translate_pattern(pattern: &str) -> String {
    const NAME_START: &str = "_:A-Za-z\\x{C0}-\\x{D6}\\x{D8}-\\x{F6}\\x{F8}-\\x{2FF}";
    const NAME_CHAR: &str = "\\-.0-9\\x{B7}_:A-Za-z\\x{C0}-\\x{D6}\\x{D8}-\\x{F6}\\x{F8}-\\x{2FF}";

    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("^(?:");
    let mut in_class = false;
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('i') if in_class => out.push_str(NAME_START),
                Some('c') if in_class => out.push_str(NAME_CHAR),
                Some('i') => out.push_str(&format!("[{}]", NAME_START)),
                Some('c') => out.push_str(&format!("[{}]", NAME_CHAR)),
                Some('I') => out.push_str(&format!("[^{}]", NAME_START)),
                Some('C') => out.push_str(&format!("[^{}]", NAME_CHAR)),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push_str("\\\\"),
            },
            '[' if !in_class => {
                in_class = true;
                out.push('[');
            }
            ']' if in_class => {
                in_class = false;
                out.push(']');
            }
            '^' | '$' if !in_class => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push_str(")$");
    out
}

/// A bounding facet
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// minInclusive
    MinInclusive(XsdValue),
    /// minExclusive
    MinExclusive(XsdValue),
    /// maxInclusive
    MaxInclusive(XsdValue),
    /// maxExclusive
    MaxExclusive(XsdValue),
}

impl Bound {
    fn check(&self, value: &XsdValue) -> Option<bool> {
        use std::cmp::Ordering::*;
        Some(match self {
            Bound::MinInclusive(b) => value.compare(b)? != Less,
            Bound::MinExclusive(b) => value.compare(b)? == Greater,
            Bound::MaxInclusive(b) => value.compare(b)? != Greater,
            Bound::MaxExclusive(b) => value.compare(b)? == Less,
        })
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::MinInclusive(b) => write!(f, "value must be >= {}", b),
            Bound::MinExclusive(b) => write!(f, "value must be > {}", b),
            Bound::MaxInclusive(b) => write!(f, "value must be <= {}", b),
            Bound::MaxExclusive(b) => write!(f, "value must be < {}", b),
        }
    }
}

/// An allowed value of an enumeration facet
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    /// Lexical form as written in the schema
    pub lexical: String,
    /// Typed value, when the base type yields one
    pub value: Option<XsdValue>,
}

/// Facets declared by one restriction step
#[derive(Debug, Clone, Default)]
pub struct Facets {
    /// length
    pub length: Option<usize>,
    /// minLength
    pub min_length: Option<usize>,
    /// maxLength
    pub max_length: Option<usize>,
    /// pattern facets of this step; a value must match one of them
    pub patterns: Vec<Pattern>,
    /// enumeration
    pub enumeration: Option<Vec<EnumValue>>,
    /// whiteSpace
    pub white_space: Option<WhiteSpace>,
    /// min/max inclusive/exclusive
    pub bounds: Vec<Bound>,
    /// totalDigits
    pub total_digits: Option<u32>,
    /// fractionDigits
    pub fraction_digits: Option<u32>,
}

impl Facets {
    /// Create an empty facet set
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a normalized value.
    ///
    /// `length` is the value's length in the units of its type: characters,
    /// octets for binary types or items for lists. `typed` is the parsed
    /// value when one exists.
    pub fn validate(&self, lexical: &str, typed: Option<&XsdValue>, length: usize) -> ValueResult<()> {
        if let Some(expected) = self.length {
            if length != expected {
                return Err(facet_error(lexical, format!("Length must be exactly {}", expected))
                    .with_reason(format!("Actual length: {}", length)));
            }
        }
        if let Some(min) = self.min_length {
            if length < min {
                return Err(facet_error(lexical, format!("Length must be at least {}", min))
                    .with_reason(format!("Actual length: {}", length)));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(facet_error(lexical, format!("Length must be at most {}", max))
                    .with_reason(format!("Actual length: {}", length)));
            }
        }

        if !self.patterns.is_empty() && !self.patterns.iter().any(|p| p.is_match(lexical)) {
            let sources: Vec<&str> = self.patterns.iter().map(Pattern::as_str).collect();
            return Err(facet_error(
                lexical,
                format!("Value does not match pattern '{}'", sources.join("' or '")),
            ));
        }

        if let Some(ref values) = self.enumeration {
            let found = values.iter().any(|allowed| {
                allowed.lexical == lexical
                    || matches!((typed, &allowed.value), (Some(a), Some(b)) if a.compare(b) == Some(std::cmp::Ordering::Equal))
            });
            if !found {
                let allowed: Vec<&str> = values.iter().map(|v| v.lexical.as_str()).collect();
                return Err(facet_error(lexical, "Value is not in the enumeration")
                    .with_reason(format!("Allowed values: {}", allowed.join(", "))));
            }
        }

        if let Some(typed) = typed {
            for bound in &self.bounds {
                match bound.check(typed) {
                    Some(true) => {}
                    Some(false) => return Err(facet_error(lexical, bound.to_string())),
                    None => {
                        return Err(facet_error(lexical, "Value cannot be compared with the bound")
                            .with_reason(bound.to_string()))
                    }
                }
            }

            if self.total_digits.is_some() || self.fraction_digits.is_some() {
                if let Some((total, fraction)) = typed.digits() {
                    if let Some(max) = self.total_digits.filter(|max| total > *max) {
                        return Err(facet_error(lexical, format!("Value has more than {} digits", max)));
                    }
                    if let Some(max) = self.fraction_digits.filter(|max| fraction > *max) {
                        return Err(facet_error(
                            lexical,
                            format!("Value has more than {} fraction digits", max),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

fn facet_error(value: &str, message: impl Into<String>) -> StructuralError {
    StructuralError::new(format!("'{}' is not valid: {}", value, message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::builtins::validate_builtin;

    #[test]
    fn test_white_space_normalize() {
        assert_eq!(WhiteSpace::Preserve.normalize(" a\tb "), " a\tb ");
        assert_eq!(WhiteSpace::Replace.normalize(" a\tb\n"), " a b ");
        assert_eq!(WhiteSpace::Collapse.normalize("  a \t\n b  "), "a b");
        assert!("collapse".parse::<WhiteSpace>().is_ok());
        assert!("squash".parse::<WhiteSpace>().is_err());
    }

    #[test]
    fn test_pattern_is_anchored() {
        let p = Pattern::new("[A-Z]{2}").unwrap();
        assert!(p.is_match("GB"));
        assert!(!p.is_match("GBR"));
        assert!(!p.is_match("xGB"));
    }

    #[test]
    fn test_pattern_literal_anchor_chars() {
        let p = Pattern::new("a$b").unwrap();
        assert!(p.is_match("a$b"));
        let p = Pattern::new("[^a]+").unwrap();
        assert!(p.is_match("bcd"));
        assert!(!p.is_match("bad"));
    }

    #[test]
    fn test_pattern_name_escapes() {
        let p = Pattern::new(r"\i\c*").unwrap();
        assert!(p.is_match("iati-activity"));
        assert!(!p.is_match("1abc"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(Pattern::new("(unclosed").is_err());
    }

    #[test]
    fn test_length_facets() {
        let facets = Facets {
            min_length: Some(1),
            max_length: Some(3),
            ..Facets::default()
        };
        assert!(facets.validate("ab", None, 2).is_ok());
        assert!(facets.validate("", None, 0).is_err());
        let err = facets.validate("abcd", None, 4).unwrap_err();
        assert!(err.message().contains("at most 3"));
    }

    #[test]
    fn test_enumeration_compares_values() {
        let facets = Facets {
            enumeration: Some(vec![EnumValue {
                lexical: "1.0".to_string(),
                value: validate_builtin("decimal", "1.0").ok(),
            }]),
            ..Facets::default()
        };
        let one = validate_builtin("decimal", "1").unwrap();
        assert!(facets.validate("1", Some(&one), 1).is_ok());
        let two = validate_builtin("decimal", "2").unwrap();
        assert!(facets.validate("2", Some(&two), 1).is_err());
    }

    #[test]
    fn test_bounds_and_digits() {
        let facets = Facets {
            bounds: vec![
                Bound::MinInclusive(validate_builtin("decimal", "0").unwrap()),
                Bound::MaxExclusive(validate_builtin("decimal", "100").unwrap()),
            ],
            total_digits: Some(4),
            fraction_digits: Some(2),
            ..Facets::default()
        };
        let check = |s: &str| {
            let v = validate_builtin("decimal", s).unwrap();
            facets.validate(s, Some(&v), s.len())
        };
        assert!(check("0").is_ok());
        assert!(check("99.99").is_ok());
        assert!(check("100").is_err());
        assert!(check("-1").is_err());
        assert!(check("1.234").is_err());
    }

    #[test]
    fn test_date_bounds() {
        let facets = Facets {
            bounds: vec![Bound::MinInclusive(validate_builtin("date", "2000-01-01").unwrap())],
            ..Facets::default()
        };
        let early = validate_builtin("date", "1999-12-31").unwrap();
        assert!(facets.validate("1999-12-31", Some(&early), 10).is_err());
        let late = validate_builtin("date", "2000-01-01").unwrap();
        assert!(facets.validate("2000-01-01", Some(&late), 10).is_ok());
    }
}
