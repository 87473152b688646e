//! Attribute selectors for codelist mapping rules
//!
//! A mapping rule names an attribute through a path such as
//! `//iati-activity/sector/@vocabulary`. Checking a rule needs the path to
//! the *containing element* and the attribute name separately, so that a
//! condition can be attached to the element step.

use super::parsers::XPathParseError;

/// A mapping-rule path split into its element path and attribute name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// XPath selecting the elements that carry the attribute
    pub element_path: String,
    /// Attribute name (may be prefixed, e.g. `xml:lang`)
    pub attribute: String,
}

impl AttributeSelector {
    /// Split `xpath` at its final path segment, which must be an attribute step
    pub fn parse(xpath: &str) -> Result<Self, XPathParseError> {
        let xpath = xpath.trim();
        if xpath.ends_with('/') {
            return Err(XPathParseError::InvalidSyntax(format!(
                "'{}' ends with a path separator",
                xpath
            )));
        }
        let steps = split_path(xpath);
        let last = steps
            .last()
            .copied()
            .ok_or_else(|| XPathParseError::InvalidSyntax("empty attribute selector".to_string()))?;

        let attribute = last
            .strip_prefix('@')
            .or_else(|| last.strip_prefix("attribute::"))
            .map(str::trim)
            .filter(|name| is_qname(name))
            .ok_or_else(|| {
                XPathParseError::InvalidSyntax(format!(
                    "'{}' does not end in an attribute step",
                    xpath
                ))
            })?;

        let prefix = xpath[..xpath.len() - last.len()].trim_end();
        let element_path = if prefix.is_empty() {
            "self::node()".to_string()
        } else if prefix == "/" {
            return Err(XPathParseError::InvalidSyntax(format!(
                "'{}' selects an attribute of the document node",
                xpath
            )));
        } else if prefix.ends_with("//") {
            format!("{}descendant-or-self::*", &prefix[..prefix.len() - 1])
        } else {
            prefix.trim_end_matches('/').to_string()
        };

        Ok(Self {
            element_path,
            attribute: attribute.to_string(),
        })
    }

    /// Combined XPath selecting elements that have the attribute and, when
    /// given, satisfy `condition`.
    ///
    /// The condition is parenthesised so that an `or` inside it cannot
    /// bypass the attribute test.
    pub fn with_condition(&self, condition: Option<&str>) -> String {
        match condition.map(str::trim).filter(|c| !c.is_empty()) {
            Some(cond) => format!("{}[({}) and @{}]", self.element_path, cond, self.attribute),
            None => format!("{}[@{}]", self.element_path, self.attribute),
        }
    }
}

/// Split an XPath location path into its steps
///
/// Separators inside predicates and string literals are not split on;
/// `//` separators are kept as `//` entries.
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.trim();
    let bytes = path.as_bytes();
    let mut steps = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'\'') | (None, b'"') => quote = Some(b),
            (None, b'[') | (None, b'(') => depth += 1,
            (None, b']') | (None, b')') => depth = depth.saturating_sub(1),
            (None, b'/') if depth == 0 => {
                if i > start {
                    steps.push(&path[start..i]);
                }
                if bytes.get(i + 1) == Some(&b'/') {
                    steps.push("//");
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        steps.push(&path[start..]);
    }

    steps
}

/// Check if a string is a valid NCName (non-colonized name)
///
/// NCName is defined in XML Namespaces as a Name that does not contain colons.
pub fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();

    // First character must be a letter or underscore
    match chars.next() {
        Some(c) if is_ncname_start_char(c) => {}
        _ => return false,
    }

    chars.all(is_ncname_char)
}

/// Check if a string is a QName (`prefix:local` or an NCName)
pub fn is_qname(s: &str) -> bool {
    match s.split_once(':') {
        Some((prefix, local)) => is_ncname(prefix) && is_ncname(local),
        None => is_ncname(s),
    }
}

/// Check if a character is valid as the start of an NCName
pub(crate) fn is_ncname_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Check if a character is valid in an NCName (not at start)
pub fn is_ncname_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.' || c == '\u{B7}'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_simple() {
        assert_eq!(split_path("a/b/c"), vec!["a", "b", "c"]);
        assert_eq!(split_path("/a/b"), vec!["a", "b"]);
        assert_eq!(split_path("//a/@b"), vec!["//", "a", "@b"]);
    }

    #[test]
    fn test_split_path_ignores_separators_in_predicates() {
        assert_eq!(
            split_path("a[b/c = 'x/y']/@d"),
            vec!["a[b/c = 'x/y']", "@d"]
        );
        assert_eq!(split_path("a[contains(., ']/')]/b"), vec!["a[contains(., ']/')]", "b"]);
    }

    #[test]
    fn test_selector_split() {
        let sel = AttributeSelector::parse("//iati-activity/sector/@vocabulary").unwrap();
        assert_eq!(sel.element_path, "//iati-activity/sector");
        assert_eq!(sel.attribute, "vocabulary");

        let sel = AttributeSelector::parse("//narrative/@xml:lang").unwrap();
        assert_eq!(sel.attribute, "xml:lang");
    }

    #[test]
    fn test_selector_with_predicate_in_path() {
        let sel = AttributeSelector::parse("//sector[@vocabulary='1']/@code").unwrap();
        assert_eq!(sel.element_path, "//sector[@vocabulary='1']");
        assert_eq!(sel.attribute, "code");
    }

    #[test]
    fn test_selector_descendant_attribute() {
        let sel = AttributeSelector::parse("//iati-activity//@currency").unwrap();
        assert_eq!(sel.element_path, "//iati-activity/descendant-or-self::*");
        assert_eq!(sel.attribute, "currency");

        let sel = AttributeSelector::parse("@code").unwrap();
        assert_eq!(sel.element_path, "self::node()");
    }

    #[test]
    fn test_selector_rejects_non_attribute() {
        assert!(AttributeSelector::parse("//iati-activity/sector").is_err());
        assert!(AttributeSelector::parse("").is_err());
        assert!(AttributeSelector::parse("/@code").is_err());
    }

    #[test]
    fn test_combined_xpath() {
        let sel = AttributeSelector::parse("//sector/@code").unwrap();
        assert_eq!(sel.with_condition(None), "//sector[@code]");
        assert_eq!(
            sel.with_condition(Some("@vocabulary = '1' or not(@vocabulary)")),
            "//sector[(@vocabulary = '1' or not(@vocabulary)) and @code]"
        );
        assert_eq!(sel.with_condition(Some("  ")), "//sector[@code]");
    }

    #[test]
    fn test_is_ncname_valid() {
        assert!(is_ncname("element"));
        assert!(is_ncname("_private"));
        assert!(is_ncname("my-element"));
        assert!(is_ncname("element123"));
    }

    #[test]
    fn test_is_ncname_invalid() {
        assert!(!is_ncname("")); // Empty
        assert!(!is_ncname("123start")); // Starts with digit
        assert!(!is_ncname("ns:element")); // Contains colon
        assert!(!is_ncname("-hyphen")); // Starts with hyphen
    }

    #[test]
    fn test_is_qname() {
        assert!(is_qname("xml:lang"));
        assert!(is_qname("code"));
        assert!(!is_qname("xml:"));
        assert!(!is_qname(":lang"));
    }
}
