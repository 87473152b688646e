//! XSD built-in types
//!
//! The built-in primitive and derived datatypes of XML Schema 1.0 that
//! IATI schemas refer to. Each type knows its primitive ancestor, its
//! white space handling and how to turn a lexical value into an
//! [`XsdValue`] that facets can compare.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

use super::exceptions::{StructuralError, ValueResult};
use super::facets::WhiteSpace;
use crate::xpath::{is_ncname, is_qname};

// Type names
/// XSD anyType type name
pub const XSD_ANY_TYPE: &str = "anyType";
/// XSD anySimpleType type name
pub const XSD_ANY_SIMPLE_TYPE: &str = "anySimpleType";
/// XSD string type name
pub const XSD_STRING: &str = "string";

/// Primitive datatype a built-in type derives from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// anySimpleType
    AnySimple,
    /// string and its derivations
    String,
    /// boolean
    Boolean,
    /// decimal and the integer family
    Decimal,
    /// float
    Float,
    /// double
    Double,
    /// duration
    Duration,
    /// dateTime
    DateTime,
    /// time
    Time,
    /// date
    Date,
    /// gYearMonth, gYear, gMonthDay, gDay, gMonth
    Gregorian,
    /// hexBinary
    HexBinary,
    /// base64Binary
    Base64Binary,
    /// anyURI
    AnyUri,
    /// QName and NOTATION
    QName,
}

/// An XSD atomic value
#[derive(Debug, Clone, PartialEq)]
pub enum XsdValue {
    /// String value
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Decimal value
    Decimal(Decimal),
    /// Integer value
    Integer(i128),
    /// Float or double value
    Double(f64),
    /// Binary value (hex or base64 decoded)
    Binary(Vec<u8>),
    /// Date value
    Date(NaiveDate),
    /// DateTime value
    DateTime(NaiveDateTime),
    /// Time value
    Time(NaiveTime),
}

impl XsdValue {
    /// Order two values of compatible types, `None` when not comparable
    pub fn compare(&self, other: &XsdValue) -> Option<Ordering> {
        match (self, other) {
            (XsdValue::Integer(a), XsdValue::Integer(b)) => Some(a.cmp(b)),
            (XsdValue::Decimal(a), XsdValue::Decimal(b)) => Some(a.cmp(b)),
            (XsdValue::Integer(a), XsdValue::Decimal(b)) => {
                Decimal::from_str(&a.to_string()).ok().map(|a| a.cmp(b))
            }
            (XsdValue::Decimal(a), XsdValue::Integer(b)) => {
                Decimal::from_str(&b.to_string()).ok().map(|b| a.cmp(&b))
            }
            (XsdValue::Double(a), XsdValue::Double(b)) => a.partial_cmp(b),
            (XsdValue::Date(a), XsdValue::Date(b)) => Some(a.cmp(b)),
            (XsdValue::DateTime(a), XsdValue::DateTime(b)) => Some(a.cmp(b)),
            (XsdValue::Time(a), XsdValue::Time(b)) => Some(a.cmp(b)),
            (XsdValue::String(a), XsdValue::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Decimal digits of a numeric value as (total, fraction)
    pub fn digits(&self) -> Option<(u32, u32)> {
        let text = match self {
            XsdValue::Integer(i) => i.unsigned_abs().to_string(),
            XsdValue::Decimal(d) => d.normalize().abs().to_string(),
            _ => return None,
        };
        let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
        let frac_part = frac_part.trim_end_matches('0');
        let int_part = int_part.trim_start_matches('0');
        let total = (int_part.len() + frac_part.len()).max(1);
        Some((total as u32, frac_part.len() as u32))
    }
}

impl fmt::Display for XsdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XsdValue::String(s) => write!(f, "{}", s),
            XsdValue::Boolean(b) => write!(f, "{}", b),
            XsdValue::Decimal(d) => write!(f, "{}", d),
            XsdValue::Integer(i) => write!(f, "{}", i),
            XsdValue::Double(v) if v.is_nan() => write!(f, "NaN"),
            XsdValue::Double(v) if *v == f64::INFINITY => write!(f, "INF"),
            XsdValue::Double(v) if *v == f64::NEG_INFINITY => write!(f, "-INF"),
            XsdValue::Double(v) => write!(f, "{}", v),
            XsdValue::Binary(b) => {
                for byte in b {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
            XsdValue::Date(d) => write!(f, "{}", d),
            XsdValue::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S%.f")),
            XsdValue::Time(t) => write!(f, "{}", t),
        }
    }
}

/// Definition of a built-in XSD type
#[derive(Debug)]
pub struct BuiltinType {
    /// Type name (local name in the XSD namespace)
    pub name: &'static str,
    /// Primitive ancestor
    pub primitive: Primitive,
    /// White space handling
    pub white_space: WhiteSpace,
    validator: fn(&str) -> ValueResult<XsdValue>,
}

impl BuiltinType {
    /// Normalize white space and validate a lexical value
    pub fn validate(&self, value: &str) -> ValueResult<XsdValue> {
        let normalized = self.white_space.normalize(value);
        (self.validator)(&normalized)
    }

    /// Whether this is one of the list types (NMTOKENS, IDREFS, ENTITIES)
    pub fn is_list(&self) -> bool {
        matches!(self.name, "NMTOKENS" | "IDREFS" | "ENTITIES")
    }
}

fn invalid(type_name: &str, value: &str) -> StructuralError {
    StructuralError::new(format!("'{}' is not a valid value of type xs:{}", value, type_name))
}

fn validate_string(value: &str) -> ValueResult<XsdValue> {
    Ok(XsdValue::String(value.to_string()))
}

fn validate_normalized_string(value: &str) -> ValueResult<XsdValue> {
    if value.contains(['\r', '\n', '\t']) {
        return Err(invalid("normalizedString", value)
            .with_reason("normalizedString cannot contain CR, LF, or TAB characters"));
    }
    validate_string(value)
}

fn validate_token(value: &str) -> ValueResult<XsdValue> {
    if value.starts_with(' ') || value.ends_with(' ') || value.contains("  ") {
        return Err(invalid("token", value)
            .with_reason("token cannot have leading/trailing spaces or consecutive spaces"));
    }
    validate_normalized_string(value)
}

fn validate_language(value: &str) -> ValueResult<XsdValue> {
    let mut parts = value.split('-');
    let primary_ok = parts
        .next()
        .is_some_and(|p| (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphabetic()));
    let rest_ok =
        parts.all(|p| (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()));
    if primary_ok && rest_ok {
        Ok(XsdValue::String(value.to_string()))
    } else {
        Err(invalid("language", value))
    }
}

fn validate_name(value: &str) -> ValueResult<XsdValue> {
    let mut chars = value.chars();
    let valid = match chars.next() {
        Some(c) if c == ':' || crate::xpath::is_ncname_start_char(c) => {
            chars.all(|c| c == ':' || crate::xpath::is_ncname_char(c))
        }
        _ => false,
    };
    if valid {
        Ok(XsdValue::String(value.to_string()))
    } else {
        Err(invalid("Name", value))
    }
}

fn validate_ncname(value: &str) -> ValueResult<XsdValue> {
    if is_ncname(value) {
        Ok(XsdValue::String(value.to_string()))
    } else {
        Err(invalid("NCName", value))
    }
}

fn validate_nmtoken(value: &str) -> ValueResult<XsdValue> {
    if !value.is_empty() && value.chars().all(|c| c == ':' || crate::xpath::is_ncname_char(c)) {
        Ok(XsdValue::String(value.to_string()))
    } else {
        Err(invalid("NMTOKEN", value))
    }
}

fn validate_nmtokens(value: &str) -> ValueResult<XsdValue> {
    validate_items(value, "NMTOKENS", validate_nmtoken)
}

fn validate_ncnames(value: &str) -> ValueResult<XsdValue> {
    validate_items(value, "IDREFS", validate_ncname)
}

fn validate_items(
    value: &str,
    type_name: &str,
    item: fn(&str) -> ValueResult<XsdValue>,
) -> ValueResult<XsdValue> {
    if value.split_whitespace().next().is_none() {
        return Err(invalid(type_name, value).with_reason("a list type needs at least one item"));
    }
    for token in value.split_whitespace() {
        item(token)?;
    }
    Ok(XsdValue::String(value.to_string()))
}

fn validate_boolean(value: &str) -> ValueResult<XsdValue> {
    match value {
        "true" | "1" => Ok(XsdValue::Boolean(true)),
        "false" | "0" => Ok(XsdValue::Boolean(false)),
        _ => Err(invalid("boolean", value)),
    }
}

/// Check decimal lexical form: optional sign, digits, optional fraction
fn is_decimal_lexical(value: &str) -> bool {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    !(int_part.is_empty() && frac_part.is_empty())
        && int_part.chars().all(|c| c.is_ascii_digit())
        && frac_part.chars().all(|c| c.is_ascii_digit())
}

fn validate_decimal(value: &str) -> ValueResult<XsdValue> {
    if !is_decimal_lexical(value) {
        return Err(invalid("decimal", value));
    }
    let trimmed = value.strip_prefix('+').unwrap_or(value);
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    match Decimal::from_str(trimmed) {
        Ok(d) => Ok(XsdValue::Decimal(d)),
        // beyond rust_decimal precision; still a lexically valid decimal
        Err(_) => trimmed
            .parse::<f64>()
            .map(XsdValue::Double)
            .map_err(|_| invalid("decimal", value)),
    }
}

fn integer_in(
    value: &str,
    type_name: &str,
    min: Option<i128>,
    max: Option<i128>,
) -> ValueResult<XsdValue> {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    if unsigned.is_empty() || !unsigned.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(type_name, value));
    }
    let number: i128 = value
        .strip_prefix('+')
        .unwrap_or(value)
        .parse()
        .map_err(|_| invalid(type_name, value).with_reason("value out of range"))?;
    let below = min.is_some_and(|min| number < min);
    let above = max.is_some_and(|max| number > max);
    if below || above {
        let bound = |b: Option<i128>| b.map(|b| b.to_string()).unwrap_or_else(|| "unbounded".into());
        return Err(invalid(type_name, value)
            .with_reason(format!("value must be {} <= x <= {}", bound(min), bound(max))));
    }
    Ok(XsdValue::Integer(number))
}

fn validate_integer(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "integer", None, None)
}

fn validate_long(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "long", Some(i64::MIN as i128), Some(i64::MAX as i128))
}

fn validate_int(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "int", Some(i32::MIN as i128), Some(i32::MAX as i128))
}

fn validate_short(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "short", Some(i16::MIN as i128), Some(i16::MAX as i128))
}

fn validate_byte(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "byte", Some(i8::MIN as i128), Some(i8::MAX as i128))
}

fn validate_non_negative_integer(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "nonNegativeInteger", Some(0), None)
}

fn validate_positive_integer(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "positiveInteger", Some(1), None)
}

fn validate_non_positive_integer(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "nonPositiveInteger", None, Some(0))
}

fn validate_negative_integer(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "negativeInteger", None, Some(-1))
}

fn validate_unsigned_long(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "unsignedLong", Some(0), Some(u64::MAX as i128))
}

fn validate_unsigned_int(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "unsignedInt", Some(0), Some(u32::MAX as i128))
}

fn validate_unsigned_short(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "unsignedShort", Some(0), Some(u16::MAX as i128))
}

fn validate_unsigned_byte(value: &str) -> ValueResult<XsdValue> {
    integer_in(value, "unsignedByte", Some(0), Some(u8::MAX as i128))
}

fn validate_double(value: &str) -> ValueResult<XsdValue> {
    match value {
        "NaN" => return Ok(XsdValue::Double(f64::NAN)),
        "INF" => return Ok(XsdValue::Double(f64::INFINITY)),
        "-INF" => return Ok(XsdValue::Double(f64::NEG_INFINITY)),
        _ => {}
    }
    // Rust also accepts "inf" and "nan", which XSD does not
    let lexical_ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
    match value.parse::<f64>() {
        Ok(v) if lexical_ok => Ok(XsdValue::Double(v)),
        _ => Err(invalid("double", value)),
    }
}

fn validate_duration(value: &str) -> ValueResult<XsdValue> {
    let err = || invalid("duration", value);
    let body = value.strip_prefix('-').unwrap_or(value);
    let body = body.strip_prefix('P').ok_or_else(err)?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((d, t)) if !t.is_empty() => (d, Some(t)),
        Some(_) => return Err(err()),
        None => (body, None),
    };

    fn components(part: &str, designators: &[char], allow_fraction_on: Option<char>) -> Option<usize> {
        let mut count = 0;
        let mut rest = part;
        let mut next_designator = 0;
        while !rest.is_empty() {
            let end = rest.find(|c: char| !c.is_ascii_digit() && c != '.')?;
            let (number, tail) = rest.split_at(end);
            let designator = tail.chars().next()?;
            let position = designators[next_designator..].iter().position(|d| *d == designator)?;
            next_designator += position + 1;
            let fraction_ok = allow_fraction_on == Some(designator);
            let valid_number = if fraction_ok {
                is_decimal_lexical(number) && !number.starts_with(['+', '-'])
            } else {
                !number.is_empty() && number.chars().all(|c| c.is_ascii_digit())
            };
            if !valid_number {
                return None;
            }
            count += 1;
            rest = &tail[designator.len_utf8()..];
        }
        Some(count)
    }

    let date_count = components(date_part, &['Y', 'M', 'D'], None).ok_or_else(err)?;
    let time_count = match time_part {
        Some(t) => match components(t, &['H', 'M', 'S'], Some('S')) {
            Some(0) | None => return Err(err()),
            Some(n) => n,
        },
        None => 0,
    };
    if date_count + time_count == 0 {
        return Err(err());
    }
    Ok(XsdValue::String(value.to_string()))
}

/// Split an optional timezone (`Z` or `+hh:mm`/`-hh:mm`) off a date/time value
fn split_timezone(value: &str) -> Option<&str> {
    if let Some(rest) = value.strip_suffix('Z') {
        return Some(rest);
    }
    let bytes = value.as_bytes();
    let n = bytes.len();
    if n >= 6 && matches!(bytes[n - 6], b'+' | b'-') && bytes[n - 3] == b':' {
        let hours: u32 = value[n - 5..n - 3].parse().ok()?;
        let minutes: u32 = value[n - 2..].parse().ok()?;
        if hours > 14 || minutes > 59 || (hours == 14 && minutes > 0) {
            return None;
        }
        return Some(&value[..n - 6]);
    }
    Some(value)
}

/// Years need at least four digits
fn has_four_digit_year(value: &str) -> bool {
    let unsigned = value.strip_prefix('-').unwrap_or(value);
    unsigned.find('-').unwrap_or(unsigned.len()) >= 4
}

fn validate_date(value: &str) -> ValueResult<XsdValue> {
    let local = split_timezone(value).ok_or_else(|| invalid("date", value))?;
    if !has_four_digit_year(local) {
        return Err(invalid("date", value));
    }
    NaiveDate::parse_from_str(local, "%Y-%m-%d")
        .map(XsdValue::Date)
        .map_err(|e| invalid("date", value).with_reason(e.to_string()))
}

fn validate_datetime(value: &str) -> ValueResult<XsdValue> {
    let local = split_timezone(value).ok_or_else(|| invalid("dateTime", value))?;
    if !has_four_digit_year(local) || !local.contains('T') {
        return Err(invalid("dateTime", value));
    }
    NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S%.f")
        .map(XsdValue::DateTime)
        .map_err(|e| invalid("dateTime", value).with_reason(e.to_string()))
}

fn validate_time(value: &str) -> ValueResult<XsdValue> {
    let local = split_timezone(value).ok_or_else(|| invalid("time", value))?;
    NaiveTime::parse_from_str(local, "%H:%M:%S%.f")
        .map(XsdValue::Time)
        .map_err(|e| invalid("time", value).with_reason(e.to_string()))
}

/// Validate a gYear (`YYYY`) or gYearMonth (`YYYY-MM`) value
fn year_fragment(value: &str, type_name: &str, with_month: bool) -> ValueResult<XsdValue> {
    let local = split_timezone(value).ok_or_else(|| invalid(type_name, value))?;
    let unsigned = local.strip_prefix('-').unwrap_or(local);
    let (year, month) = match unsigned.split_once('-') {
        Some((y, m)) => (y, Some(m)),
        None => (unsigned, None),
    };
    let year_ok = year.len() >= 4 && year.chars().all(|c| c.is_ascii_digit());
    let month_ok = match month {
        Some(m) => with_month && two_digits_in(m, 1, 12),
        None => !with_month,
    };
    if year_ok && month_ok {
        Ok(XsdValue::String(value.to_string()))
    } else {
        Err(invalid(type_name, value))
    }
}

/// Validate a gMonth (`--MM`), gMonthDay (`--MM-DD`) or gDay (`---DD`) value
fn day_fragment(value: &str, type_name: &str) -> ValueResult<XsdValue> {
    let local = split_timezone(value).ok_or_else(|| invalid(type_name, value))?;
    let ok = match type_name {
        "gDay" => local.strip_prefix("---").is_some_and(|d| two_digits_in(d, 1, 31)),
        "gMonth" => local.strip_prefix("--").is_some_and(|m| two_digits_in(m, 1, 12)),
        _ => local
            .strip_prefix("--")
            .and_then(|rest| rest.split_once('-'))
            .is_some_and(|(m, d)| two_digits_in(m, 1, 12) && two_digits_in(d, 1, 31)),
    };
    if ok {
        Ok(XsdValue::String(value.to_string()))
    } else {
        Err(invalid(type_name, value))
    }
}

fn two_digits_in(text: &str, min: u32, max: u32) -> bool {
    text.len() == 2 && text.parse::<u32>().is_ok_and(|n| (min..=max).contains(&n))
}

fn validate_gyear(value: &str) -> ValueResult<XsdValue> {
    year_fragment(value, "gYear", false)
}

fn validate_gyear_month(value: &str) -> ValueResult<XsdValue> {
    year_fragment(value, "gYearMonth", true)
}

fn validate_gmonth(value: &str) -> ValueResult<XsdValue> {
    day_fragment(value, "gMonth")
}

fn validate_gmonth_day(value: &str) -> ValueResult<XsdValue> {
    day_fragment(value, "gMonthDay")
}

fn validate_gday(value: &str) -> ValueResult<XsdValue> {
    day_fragment(value, "gDay")
}

fn validate_hex_binary(value: &str) -> ValueResult<XsdValue> {
    if value.len() % 2 != 0 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("hexBinary", value));
    }
    (0..value.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&value[i..i + 2], 16).map_err(|_| invalid("hexBinary", value)))
        .collect::<ValueResult<Vec<u8>>>()
        .map(XsdValue::Binary)
}

fn validate_base64_binary(value: &str) -> ValueResult<XsdValue> {
    let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(&cleaned)
        .map(XsdValue::Binary)
        .map_err(|e| invalid("base64Binary", value).with_reason(e.to_string()))
}

fn validate_any_uri(value: &str) -> ValueResult<XsdValue> {
    if value.contains(['\n', '\r', '\t']) {
        return Err(invalid("anyURI", value)
            .with_reason("anyURI cannot contain newline or tab characters"));
    }
    Ok(XsdValue::String(value.to_string()))
}

fn validate_qname(value: &str) -> ValueResult<XsdValue> {
    if is_qname(value) {
        Ok(XsdValue::String(value.to_string()))
    } else {
        Err(invalid("QName", value))
    }
}

macro_rules! builtin {
    ($name:expr, $primitive:ident, $ws:ident, $validator:expr) => {
        BuiltinType {
            name: $name,
            primitive: Primitive::$primitive,
            white_space: WhiteSpace::$ws,
            validator: $validator,
        }
    };
}

static BUILTIN_TYPES: &[BuiltinType] = &[
    builtin!(XSD_ANY_SIMPLE_TYPE, AnySimple, Preserve, validate_string),
    builtin!(XSD_STRING, String, Preserve, validate_string),
    builtin!("normalizedString", String, Replace, validate_normalized_string),
    builtin!("token", String, Collapse, validate_token),
    builtin!("language", String, Collapse, validate_language),
    builtin!("Name", String, Collapse, validate_name),
    builtin!("NCName", String, Collapse, validate_ncname),
    builtin!("ID", String, Collapse, validate_ncname),
    builtin!("IDREF", String, Collapse, validate_ncname),
    builtin!("ENTITY", String, Collapse, validate_ncname),
    builtin!("NMTOKEN", String, Collapse, validate_nmtoken),
    builtin!("NMTOKENS", String, Collapse, validate_nmtokens),
    builtin!("IDREFS", String, Collapse, validate_ncnames),
    builtin!("ENTITIES", String, Collapse, validate_ncnames),
    builtin!("boolean", Boolean, Collapse, validate_boolean),
    builtin!("decimal", Decimal, Collapse, validate_decimal),
    builtin!("integer", Decimal, Collapse, validate_integer),
    builtin!("long", Decimal, Collapse, validate_long),
    builtin!("int", Decimal, Collapse, validate_int),
    builtin!("short", Decimal, Collapse, validate_short),
    builtin!("byte", Decimal, Collapse, validate_byte),
    builtin!("nonNegativeInteger", Decimal, Collapse, validate_non_negative_integer),
    builtin!("positiveInteger", Decimal, Collapse, validate_positive_integer),
    builtin!("nonPositiveInteger", Decimal, Collapse, validate_non_positive_integer),
    builtin!("negativeInteger", Decimal, Collapse, validate_negative_integer),
    builtin!("unsignedLong", Decimal, Collapse, validate_unsigned_long),
    builtin!("unsignedInt", Decimal, Collapse, validate_unsigned_int),
    builtin!("unsignedShort", Decimal, Collapse, validate_unsigned_short),
    builtin!("unsignedByte", Decimal, Collapse, validate_unsigned_byte),
    builtin!("float", Float, Collapse, validate_double),
    builtin!("double", Double, Collapse, validate_double),
    builtin!("duration", Duration, Collapse, validate_duration),
    builtin!("dateTime", DateTime, Collapse, validate_datetime),
    builtin!("time", Time, Collapse, validate_time),
    builtin!("date", Date, Collapse, validate_date),
    builtin!("gYearMonth", Gregorian, Collapse, validate_gyear_month),
    builtin!("gYear", Gregorian, Collapse, validate_gyear),
    builtin!("gMonthDay", Gregorian, Collapse, validate_gmonth_day),
    builtin!("gDay", Gregorian, Collapse, validate_gday),
    builtin!("gMonth", Gregorian, Collapse, validate_gmonth),
    builtin!("hexBinary", HexBinary, Collapse, validate_hex_binary),
    builtin!("base64Binary", Base64Binary, Collapse, validate_base64_binary),
    builtin!("anyURI", AnyUri, Collapse, validate_any_uri),
    builtin!("QName", QName, Collapse, validate_qname),
    builtin!("NOTATION", QName, Collapse, validate_qname),
];

/// xs:anySimpleType, the root of the simple type hierarchy
pub fn any_simple_type() -> &'static BuiltinType {
    &BUILTIN_TYPES[0]
}

/// Look up a built-in simple type by local name
pub fn get_builtin_type(name: &str) -> Option<&'static BuiltinType> {
    BUILTIN_TYPES.iter().find(|t| t.name == name)
}

/// Validate a value against a built-in type by name
pub fn validate_builtin(type_name: &str, value: &str) -> ValueResult<XsdValue> {
    get_builtin_type(type_name)
        .ok_or_else(|| StructuralError::new(format!("unknown built-in type xs:{}", type_name)))?
        .validate(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_family() {
        assert!(validate_builtin("string", "  any\tthing ").is_ok());
        // white space is collapsed before the token check
        assert!(validate_builtin("token", "  a   b ").is_ok());
        assert!(validate_builtin("language", "en").is_ok());
        assert!(validate_builtin("language", "en-GB").is_ok());
        assert!(validate_builtin("language", "english-language").is_ok());
        assert!(validate_builtin("language", "en-abcdefghij").is_err());
        assert!(validate_builtin("language", "en_GB").is_err());
        assert!(validate_builtin("NCName", "iati-activity").is_ok());
        assert!(validate_builtin("NCName", "xml:lang").is_err());
        assert!(validate_builtin("Name", "xml:lang").is_ok());
        assert!(validate_builtin("NMTOKENS", "a b c").is_ok());
        assert!(validate_builtin("NMTOKENS", "   ").is_err());
    }

    #[test]
    fn test_boolean() {
        assert_eq!(validate_builtin("boolean", " 1 ").unwrap(), XsdValue::Boolean(true));
        assert_eq!(validate_builtin("boolean", "false").unwrap(), XsdValue::Boolean(false));
        assert!(validate_builtin("boolean", "yes").is_err());
    }

    #[test]
    fn test_numeric() {
        assert!(validate_builtin("decimal", "123.456").is_ok());
        assert!(validate_builtin("decimal", "-.5").is_ok());
        assert!(validate_builtin("decimal", "5.").is_ok());
        assert!(validate_builtin("decimal", "1e3").is_err());
        assert!(validate_builtin("decimal", ".").is_err());

        assert_eq!(validate_builtin("integer", "+42").unwrap(), XsdValue::Integer(42));
        assert!(validate_builtin("integer", "4.2").is_err());
        assert!(validate_builtin("byte", "127").is_ok());
        assert!(validate_builtin("byte", "128").is_err());
        assert!(validate_builtin("positiveInteger", "0").is_err());
        assert!(validate_builtin("nonNegativeInteger", "0").is_ok());
        assert!(validate_builtin("unsignedInt", "-1").is_err());

        assert!(validate_builtin("double", "1.5e10").is_ok());
        assert!(validate_builtin("double", "INF").is_ok());
        assert!(validate_builtin("double", "inf").is_err());
        assert!(validate_builtin("float", "abc").is_err());
    }

    #[test]
    fn test_dates() {
        assert!(validate_builtin("date", "2014-01-31").is_ok());
        assert!(validate_builtin("date", "2014-01-31Z").is_ok());
        assert!(validate_builtin("date", "2014-01-31+05:30").is_ok());
        assert!(validate_builtin("date", "2014-02-30").is_err());
        assert!(validate_builtin("date", "14-01-31").is_err());
        assert!(validate_builtin("date", "31/01/2014").is_err());

        assert!(validate_builtin("dateTime", "2014-01-31T10:00:00").is_ok());
        assert!(validate_builtin("dateTime", "2014-01-31T10:00:00.123Z").is_ok());
        assert!(validate_builtin("dateTime", "2014-01-31").is_err());
        assert!(validate_builtin("time", "23:59:59").is_ok());
        assert!(validate_builtin("time", "25:00:00").is_err());

        assert!(validate_builtin("gYear", "2014").is_ok());
        assert!(validate_builtin("gYear", "14").is_err());
        assert!(validate_builtin("gYearMonth", "2014-12").is_ok());
        assert!(validate_builtin("gYearMonth", "2014-13").is_err());
        assert!(validate_builtin("gMonth", "--05").is_ok());
        assert!(validate_builtin("gMonthDay", "--05-31").is_ok());
        assert!(validate_builtin("gDay", "---31").is_ok());
        assert!(validate_builtin("gDay", "---32").is_err());
    }

    #[test]
    fn test_duration() {
        assert!(validate_builtin("duration", "P1Y2M3DT4H5M6.5S").is_ok());
        assert!(validate_builtin("duration", "-P3D").is_ok());
        assert!(validate_builtin("duration", "PT1H").is_ok());
        assert!(validate_builtin("duration", "P").is_err());
        assert!(validate_builtin("duration", "P1DT").is_err());
        assert!(validate_builtin("duration", "P1D2Y").is_err());
        assert!(validate_builtin("duration", "P1.5Y").is_err());
    }

    #[test]
    fn test_binary_and_misc() {
        assert_eq!(
            validate_builtin("hexBinary", "0a1B").unwrap(),
            XsdValue::Binary(vec![0x0a, 0x1b])
        );
        assert!(validate_builtin("hexBinary", "0").is_err());
        assert!(validate_builtin("base64Binary", "SGVs bG8=").is_ok());
        assert!(validate_builtin("base64Binary", "!!!").is_err());
        assert!(validate_builtin("anyURI", "http://iatistandard.org/").is_ok());
        assert!(validate_builtin("QName", "xsd:string").is_ok());
        assert!(validate_builtin("QName", "1bad").is_err());
        assert!(validate_builtin("notAType", "x").is_err());
    }

    #[test]
    fn test_compare_and_digits() {
        let a = validate_builtin("integer", "10").unwrap();
        let b = validate_builtin("decimal", "9.5").unwrap();
        assert_eq!(a.compare(&b), Some(Ordering::Greater));
        let d1 = validate_builtin("date", "2014-01-01").unwrap();
        let d2 = validate_builtin("date", "2015-01-01").unwrap();
        assert_eq!(d1.compare(&d2), Some(Ordering::Less));
        assert_eq!(a.compare(&d1), None);

        assert_eq!(validate_builtin("decimal", "123.4500").unwrap().digits(), Some((5, 2)));
        assert_eq!(validate_builtin("integer", "-007").unwrap().digits(), Some((1, 0)));
        assert_eq!(validate_builtin("decimal", "0").unwrap().digits(), Some((1, 0)));
    }
}
