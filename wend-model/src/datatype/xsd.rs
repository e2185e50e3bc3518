//! The XSD simple-type datatype library.
//!
//! Each type is compiled together with its parameter facets into an
//! [`XsdDatatype`]; `value` literals are parsed into typed
//! [`XsdDatatypeValues`] so that comparison happens in the value space
//! (`1.00` equals `1.0` as a decimal, base64 text compares as octets).

use super::{Datatype, DatatypeError, Namespaces, Param};
use crate::datatype::relax::normalize_whitespace;
use crate::regexp::{self, RegexpError, XsdRegex, is_name_char, is_name_start_char};
use base64::Engine as _;
use lazy_static::lazy_static;
use std::fmt;
use std::str::FromStr;

pub const NAMESPACE_URI: &str = "http://www.w3.org/2001/XMLSchema-datatypes";

lazy_static! {
    static ref LANG_RE: regex::Regex =
        regex::Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").unwrap();
    static ref DATE_RE: regex::Regex =
        regex::Regex::new(r"^-?\d{4,}-\d{2}-\d{2}(Z|[+-]\d{2}:\d{2})?$").unwrap();
    static ref DATETIME_RE: regex::Regex = regex::Regex::new(
        r"^-?\d{4,}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$"
    )
    .unwrap();
    static ref TIME_RE: regex::Regex =
        regex::Regex::new(r"^\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap();
    static ref DURATION_RE: regex::Regex = regex::Regex::new(
        r"^-?P([0-9]+Y)?([0-9]+M)?([0-9]+D)?(T([0-9]+H)?([0-9]+M)?([0-9]+(\.[0-9]+)?S)?)?$"
    )
    .unwrap();
    static ref GYEAR_RE: regex::Regex =
        regex::Regex::new(r"^-?\d{4,}(Z|[+-]\d{2}:\d{2})?$").unwrap();
    static ref GYEARMONTH_RE: regex::Regex =
        regex::Regex::new(r"^-?\d{4,}-\d{2}(Z|[+-]\d{2}:\d{2})?$").unwrap();
    static ref GMONTH_RE: regex::Regex =
        regex::Regex::new(r"^--\d{2}(Z|[+-]\d{2}:\d{2})?$").unwrap();
    static ref GMONTHDAY_RE: regex::Regex =
        regex::Regex::new(r"^--\d{2}-\d{2}(Z|[+-]\d{2}:\d{2})?$").unwrap();
    static ref GDAY_RE: regex::Regex =
        regex::Regex::new(r"^---\d{2}(Z|[+-]\d{2}:\d{2})?$").unwrap();
}

#[derive(Debug)]
pub enum FacetError {
    ConflictingFacet(&'static str),
    InvalidNumber { param: &'static str, value: String },
    InvalidPattern(RegexpError),
    UnknownParam(String),
}

impl fmt::Display for FacetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacetError::ConflictingFacet(what) => write!(f, "conflicting facets: {what}"),
            FacetError::InvalidNumber { param, value } => {
                write!(f, "invalid {param} value {value:?}")
            }
            FacetError::InvalidPattern(e) => write!(f, "invalid pattern facet: {e}"),
            FacetError::UnknownParam(name) => {
                write!(f, "parameter {name:?} is not applicable to this datatype")
            }
        }
    }
}

/// A length constraint, counted in characters for textual types and in
/// octets for the binary types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LengthFacet {
    Unbounded,
    MinLength(usize),
    MaxLength(usize),
    MinMaxLength(usize, usize),
    Length(usize),
}

impl LengthFacet {
    fn is_valid(&self, actual: usize) -> bool {
        match self {
            LengthFacet::Unbounded => true,
            LengthFacet::MinLength(min) => *min <= actual,
            LengthFacet::MaxLength(max) => actual <= *max,
            LengthFacet::MinMaxLength(min, max) => *min <= actual && actual <= *max,
            LengthFacet::Length(len) => actual == *len,
        }
    }

    fn merge(&mut self, other: LengthFacet) -> Result<(), FacetError> {
        *self = match (&*self, other) {
            (LengthFacet::Unbounded, other) => other,
            (LengthFacet::MinLength(min), LengthFacet::MaxLength(max)) => {
                if *min > max {
                    return Err(FacetError::ConflictingFacet(
                        "minLength greater than maxLength",
                    ));
                }
                LengthFacet::MinMaxLength(*min, max)
            }
            (LengthFacet::MaxLength(max), LengthFacet::MinLength(min)) => {
                if min > *max {
                    return Err(FacetError::ConflictingFacet(
                        "minLength greater than maxLength",
                    ));
                }
                LengthFacet::MinMaxLength(min, *max)
            }
            (LengthFacet::MinLength(_), LengthFacet::MinLength(_)) => {
                return Err(FacetError::ConflictingFacet("minLength given twice"));
            }
            (LengthFacet::MaxLength(_), LengthFacet::MaxLength(_)) => {
                return Err(FacetError::ConflictingFacet("maxLength given twice"));
            }
            (LengthFacet::Length(_), _) | (_, LengthFacet::Length(_)) => {
                return Err(FacetError::ConflictingFacet(
                    "length combined with another length facet",
                ));
            }
            (LengthFacet::MinMaxLength(_, _), _) => {
                return Err(FacetError::ConflictingFacet("length facet given twice"));
            }
            (_, LengthFacet::Unbounded) | (_, LengthFacet::MinMaxLength(_, _)) => unreachable!(),
        };
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Min<T: PartialOrd> {
    Unbounded,
    Inclusive(T),
    Exclusive(T),
}

impl<T: PartialOrd> Min<T> {
    fn is_valid(&self, v: &T) -> bool {
        match self {
            Min::Unbounded => true,
            Min::Inclusive(min) => min <= v,
            Min::Exclusive(min) => min < v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Max<T: PartialOrd> {
    Unbounded,
    Inclusive(T),
    Exclusive(T),
}

impl<T: PartialOrd> Max<T> {
    fn is_valid(&self, v: &T) -> bool {
        match self {
            Max::Unbounded => true,
            Max::Inclusive(max) => v <= max,
            Max::Exclusive(max) => v < max,
        }
    }
}

/// minInclusive / minExclusive / maxInclusive / maxExclusive bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxFacet<T: PartialOrd> {
    min: Min<T>,
    max: Max<T>,
}

impl<T: PartialOrd> Default for MinMaxFacet<T> {
    fn default() -> Self {
        MinMaxFacet {
            min: Min::Unbounded,
            max: Max::Unbounded,
        }
    }
}

impl<T: PartialOrd> MinMaxFacet<T> {
    fn check_against_max(&self, val: &T) -> Result<(), FacetError> {
        if self.max.is_valid(val) {
            Ok(())
        } else {
            Err(FacetError::ConflictingFacet(
                "lower bound conflicts with upper bound",
            ))
        }
    }

    fn check_against_min(&self, val: &T) -> Result<(), FacetError> {
        if self.min.is_valid(val) {
            Ok(())
        } else {
            Err(FacetError::ConflictingFacet(
                "lower bound conflicts with upper bound",
            ))
        }
    }

    fn min_inclusive(&mut self, val: T) -> Result<(), FacetError> {
        self.check_against_max(&val)?;
        match self.min {
            Min::Unbounded => self.min = Min::Inclusive(val),
            _ => return Err(FacetError::ConflictingFacet("lower bound given twice")),
        }
        Ok(())
    }

    fn min_exclusive(&mut self, val: T) -> Result<(), FacetError> {
        self.check_against_max(&val)?;
        match self.min {
            Min::Unbounded => self.min = Min::Exclusive(val),
            _ => return Err(FacetError::ConflictingFacet("lower bound given twice")),
        }
        Ok(())
    }

    fn max_inclusive(&mut self, val: T) -> Result<(), FacetError> {
        self.check_against_min(&val)?;
        match self.max {
            Max::Unbounded => self.max = Max::Inclusive(val),
            _ => return Err(FacetError::ConflictingFacet("upper bound given twice")),
        }
        Ok(())
    }

    fn max_exclusive(&mut self, val: T) -> Result<(), FacetError> {
        self.check_against_min(&val)?;
        match self.max {
            Max::Unbounded => self.max = Max::Exclusive(val),
            _ => return Err(FacetError::ConflictingFacet("upper bound given twice")),
        }
        Ok(())
    }

    fn is_valid(&self, v: &T) -> bool {
        self.min.is_valid(v) && self.max.is_valid(v)
    }
}

/// A compiled `pattern` facet. Equality considers the source expression
/// only.
#[derive(Clone)]
pub struct PatternFacet(XsdRegex);

impl PartialEq for PatternFacet {
    fn eq(&self, other: &Self) -> bool {
        self.0.source() == other.0.source()
    }
}

impl Eq for PatternFacet {}

impl fmt::Debug for PatternFacet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("PatternFacet")
            .field(&self.0.source())
            .finish()
    }
}

impl PatternFacet {
    fn is_valid(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}

fn check_pattern(pattern: &Option<PatternFacet>, lexical: &str) -> bool {
    pattern.as_ref().map(|p| p.is_valid(lexical)).unwrap_or(true)
}

/// Length and pattern constraints shared by the textual types.
#[derive(Debug, Clone, PartialEq)]
pub struct StringFacets {
    len: LengthFacet,
    pattern: Option<PatternFacet>,
}

impl StringFacets {
    fn is_valid(&self, value: &str) -> bool {
        self.len.is_valid(value.chars().count()) && check_pattern(&self.pattern, value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum XsdDatatypes {
    String(StringFacets),
    NormalizedString(StringFacets),
    Token(StringFacets),
    Language(StringFacets),
    Name(StringFacets),
    NcName(StringFacets),
    NmToken(StringFacets),
    Boolean(Option<PatternFacet>),
    Decimal {
        min_max: MinMaxFacet<bigdecimal::BigDecimal>,
        pattern: Option<PatternFacet>,
        fraction_digits: Option<u16>,
        total_digits: Option<u16>,
    },
    Integer(MinMaxFacet<num_bigint::BigInt>, Option<PatternFacet>),
    NonPositiveInteger(MinMaxFacet<num_bigint::BigInt>, Option<PatternFacet>),
    NegativeInteger(MinMaxFacet<num_bigint::BigInt>, Option<PatternFacet>),
    NonNegativeInteger(MinMaxFacet<num_bigint::BigInt>, Option<PatternFacet>),
    PositiveInteger(MinMaxFacet<num_bigint::BigInt>, Option<PatternFacet>),
    Long(MinMaxFacet<i64>, Option<PatternFacet>),
    Int(MinMaxFacet<i32>, Option<PatternFacet>),
    Short(MinMaxFacet<i16>, Option<PatternFacet>),
    Byte(MinMaxFacet<i8>, Option<PatternFacet>),
    UnsignedLong(MinMaxFacet<u64>, Option<PatternFacet>),
    UnsignedInt(MinMaxFacet<u32>, Option<PatternFacet>),
    UnsignedShort(MinMaxFacet<u16>, Option<PatternFacet>),
    UnsignedByte(MinMaxFacet<u8>, Option<PatternFacet>),
    Float(Option<PatternFacet>),
    Double(Option<PatternFacet>),
    AnyUri(StringFacets),
    QNameData,
    Base64Binary(LengthFacet, Option<PatternFacet>),
    HexBinary(LengthFacet, Option<PatternFacet>),
    Date(Option<PatternFacet>),
    Datetime(Option<PatternFacet>),
    Time(Option<PatternFacet>),
    Duration(Option<PatternFacet>),
    GYear(Option<PatternFacet>),
    GYearMonth(Option<PatternFacet>),
    GMonth(Option<PatternFacet>),
    GMonthDay(Option<PatternFacet>),
    GDay(Option<PatternFacet>),
}

fn big_int_in(
    lex: &str,
    min_max: &MinMaxFacet<num_bigint::BigInt>,
    extra: impl Fn(&num_bigint::BigInt) -> bool,
) -> bool {
    parse_big_int(lex)
        .map(|v| extra(&v) && min_max.is_valid(&v))
        .unwrap_or(false)
}

fn int_in<T>(lex: &str, min_max: &MinMaxFacet<T>) -> bool
where
    T: FromStr + PartialOrd,
{
    parse_int::<T>(lex)
        .map(|v| min_max.is_valid(&v))
        .unwrap_or(false)
}

impl Datatype for XsdDatatypes {
    fn is_valid(&self, value: &str) -> bool {
        use num_bigint::BigInt;
        let lex = normalize_whitespace(value);
        match self {
            XsdDatatypes::String(facets) => facets.is_valid(value),
            XsdDatatypes::NormalizedString(facets) => {
                facets.is_valid(&value.replace(['\t', '\n', '\r'], " "))
            }
            XsdDatatypes::Token(facets) => facets.is_valid(&lex),
            XsdDatatypes::Language(facets) => LANG_RE.is_match(&lex) && facets.is_valid(&lex),
            XsdDatatypes::Name(facets) => is_xml_name(&lex) && facets.is_valid(&lex),
            XsdDatatypes::NcName(facets) => is_ncname(&lex) && facets.is_valid(&lex),
            XsdDatatypes::NmToken(facets) => is_nmtoken(&lex) && facets.is_valid(&lex),
            XsdDatatypes::Boolean(pattern) => {
                matches!(lex.as_str(), "true" | "false" | "1" | "0") && check_pattern(pattern, &lex)
            }
            XsdDatatypes::Decimal {
                min_max,
                pattern,
                fraction_digits,
                total_digits,
            } => {
                parse_decimal(&lex).is_some_and(|v| {
                    min_max.is_valid(&v)
                        && fraction_digits
                            .map(|fd| decimal_fraction_digits(&lex) <= fd as usize)
                            .unwrap_or(true)
                        && total_digits
                            .map(|td| decimal_total_digits(&lex) <= td as usize)
                            .unwrap_or(true)
                }) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::Integer(min_max, pattern) => {
                big_int_in(&lex, min_max, |_| true) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::NonPositiveInteger(min_max, pattern) => {
                big_int_in(&lex, min_max, |v| v <= &BigInt::from(0)) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::NegativeInteger(min_max, pattern) => {
                big_int_in(&lex, min_max, |v| v < &BigInt::from(0)) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::NonNegativeInteger(min_max, pattern) => {
                big_int_in(&lex, min_max, |v| v >= &BigInt::from(0)) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::PositiveInteger(min_max, pattern) => {
                big_int_in(&lex, min_max, |v| v > &BigInt::from(0)) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::Long(min_max, pattern) => {
                int_in(&lex, min_max) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::Int(min_max, pattern) => {
                int_in(&lex, min_max) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::Short(min_max, pattern) => {
                int_in(&lex, min_max) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::Byte(min_max, pattern) => {
                int_in(&lex, min_max) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::UnsignedLong(min_max, pattern) => {
                int_in(&lex, min_max) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::UnsignedInt(min_max, pattern) => {
                int_in(&lex, min_max) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::UnsignedShort(min_max, pattern) => {
                int_in(&lex, min_max) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::UnsignedByte(min_max, pattern) => {
                int_in(&lex, min_max) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::Float(pattern) => {
                parse_float(&lex).is_some() && check_pattern(pattern, &lex)
            }
            XsdDatatypes::Double(pattern) => {
                parse_double(&lex).is_some() && check_pattern(pattern, &lex)
            }
            XsdDatatypes::AnyUri(facets) => is_uri_shaped(&lex) && facets.is_valid(&lex),
            // QName validation requires namespace context; is_valid_with_ns
            // must be used instead
            XsdDatatypes::QNameData => false,
            XsdDatatypes::Base64Binary(len, pattern) => {
                decode_base64(&lex).is_some_and(|bytes| len.is_valid(bytes.len()))
                    && check_pattern(pattern, &lex)
            }
            XsdDatatypes::HexBinary(len, pattern) => {
                decode_hex(&lex).is_some_and(|bytes| len.is_valid(bytes.len()))
                    && check_pattern(pattern, &lex)
            }
            XsdDatatypes::Date(pattern) => DATE_RE.is_match(&lex) && check_pattern(pattern, &lex),
            XsdDatatypes::Datetime(pattern) => {
                DATETIME_RE.is_match(&lex) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::Time(pattern) => TIME_RE.is_match(&lex) && check_pattern(pattern, &lex),
            XsdDatatypes::Duration(pattern) => {
                lex != "P"
                    && lex != "-P"
                    && DURATION_RE.is_match(&lex)
                    && check_pattern(pattern, &lex)
            }
            XsdDatatypes::GYear(pattern) => GYEAR_RE.is_match(&lex) && check_pattern(pattern, &lex),
            XsdDatatypes::GYearMonth(pattern) => {
                GYEARMONTH_RE.is_match(&lex) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::GMonth(pattern) => {
                GMONTH_RE.is_match(&lex) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::GMonthDay(pattern) => {
                GMONTHDAY_RE.is_match(&lex) && check_pattern(pattern, &lex)
            }
            XsdDatatypes::GDay(pattern) => GDAY_RE.is_match(&lex) && check_pattern(pattern, &lex),
        }
    }
}

impl XsdDatatypes {
    /// Value-space equality of two lexical forms, used by the
    /// `enumeration` facet.
    fn lexical_equal(&self, a: &str, b: &str) -> bool {
        let (a, b) = (normalize_whitespace(a), normalize_whitespace(b));
        match self {
            XsdDatatypes::String(_) | XsdDatatypes::NormalizedString(_) => a == b,
            XsdDatatypes::Decimal { .. } => match (parse_decimal(&a), parse_decimal(&b)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            XsdDatatypes::Integer(..)
            | XsdDatatypes::NonPositiveInteger(..)
            | XsdDatatypes::NegativeInteger(..)
            | XsdDatatypes::NonNegativeInteger(..)
            | XsdDatatypes::PositiveInteger(..)
            | XsdDatatypes::Long(..)
            | XsdDatatypes::Int(..)
            | XsdDatatypes::Short(..)
            | XsdDatatypes::Byte(..)
            | XsdDatatypes::UnsignedLong(..)
            | XsdDatatypes::UnsignedInt(..)
            | XsdDatatypes::UnsignedShort(..)
            | XsdDatatypes::UnsignedByte(..) => match (parse_big_int(&a), parse_big_int(&b)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            XsdDatatypes::Float(_) => match (parse_float(&a), parse_float(&b)) {
                (Some(a), Some(b)) => float_eq(a as f64, b as f64),
                _ => false,
            },
            XsdDatatypes::Double(_) => match (parse_double(&a), parse_double(&b)) {
                (Some(a), Some(b)) => float_eq(a, b),
                _ => false,
            },
            XsdDatatypes::Boolean(_) => match (parse_boolean(&a), parse_boolean(&b)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            XsdDatatypes::Base64Binary(..) => match (decode_base64(&a), decode_base64(&b)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            XsdDatatypes::HexBinary(..) => match (decode_hex(&a), decode_hex(&b)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
            _ => a == b,
        }
    }
}

/// An XSD datatype plus the generic `enumeration` facet.
#[derive(Debug, Clone, PartialEq)]
pub struct XsdDatatype {
    base: XsdDatatypes,
    enumeration: Option<Vec<String>>,
}

impl XsdDatatype {
    /// Unconstrained text, standing in for a type the library does not
    /// implement when incomplete types are tolerated.
    pub(crate) fn unconstrained() -> XsdDatatype {
        XsdDatatype {
            base: XsdDatatypes::String(StringFacets {
                len: LengthFacet::Unbounded,
                pattern: None,
            }),
            enumeration: None,
        }
    }

    fn enumeration_allows(&self, value: &str) -> bool {
        self.enumeration
            .as_ref()
            .map(|alternatives| alternatives.iter().any(|e| self.base.lexical_equal(e, value)))
            .unwrap_or(true)
    }

    pub fn is_valid_with_ns(&self, value: &str, ns: &dyn Namespaces) -> bool {
        let base_ok = match &self.base {
            XsdDatatypes::QNameData => QNameVal::from_val_with_dyn_ns(value, ns).is_some(),
            base => base.is_valid(value),
        };
        base_ok && self.enumeration_allows(value)
    }

    pub fn needs_context(&self) -> bool {
        matches!(self.base, XsdDatatypes::QNameData)
    }
}

impl Datatype for XsdDatatype {
    fn is_valid(&self, value: &str) -> bool {
        self.base.is_valid(value) && self.enumeration_allows(value)
    }
}

/// A QName expanded against a namespace context: (namespace URI, local name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QNameVal(String, String);

impl QNameVal {
    pub fn from_val_with_dyn_ns(value: &str, ns: &dyn Namespaces) -> Option<QNameVal> {
        let lex = normalize_whitespace(value);
        match lex.split_once(':') {
            Some((prefix, local)) => {
                if !is_ncname(prefix) || !is_ncname(local) {
                    return None;
                }
                let uri = ns.resolve_prefix(prefix)?;
                Some(QNameVal(uri.to_string(), local.to_string()))
            }
            None => {
                if !is_ncname(&lex) {
                    return None;
                }
                let uri = ns.resolve_prefix("").unwrap_or("");
                Some(QNameVal(uri.to_string(), lex))
            }
        }
    }
}

/// A parsed `value` literal.
#[derive(Debug, Clone)]
pub enum XsdDatatypeValues {
    String(String),
    Token(String),
    QName(QNameVal),
    Integer(num_bigint::BigInt),
    Decimal(bigdecimal::BigDecimal),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Base64Binary(Vec<u8>),
    HexBinary(Vec<u8>),
    /// Types compared by collapsed lexical form (dates, URIs, ...).
    Lexical(String),
}

impl PartialEq for XsdDatatypeValues {
    fn eq(&self, other: &Self) -> bool {
        use XsdDatatypeValues::*;
        match (self, other) {
            (String(a), String(b)) => a == b,
            (Token(a), Token(b)) => a == b,
            (QName(a), QName(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Decimal(a), Decimal(b)) => a == b,
            (Float(a), Float(b)) => float_eq(*a as f64, *b as f64),
            (Double(a), Double(b)) => float_eq(*a, *b),
            (Boolean(a), Boolean(b)) => a == b,
            (Base64Binary(a), Base64Binary(b)) => a == b,
            (HexBinary(a), HexBinary(b)) => a == b,
            (Lexical(a), Lexical(b)) => a == b,
            _ => false,
        }
    }
}

impl Datatype for XsdDatatypeValues {
    fn is_valid(&self, value: &str) -> bool {
        match self {
            XsdDatatypeValues::String(s) => s == value,
            XsdDatatypeValues::Token(s) => s == &normalize_whitespace(value),
            // QName comparison requires namespace context; use
            // is_valid_with_ns instead
            XsdDatatypeValues::QName(_) => false,
            XsdDatatypeValues::Integer(v) => {
                parse_big_int(&normalize_whitespace(value)).as_ref() == Some(v)
            }
            XsdDatatypeValues::Decimal(v) => {
                parse_decimal(&normalize_whitespace(value)).as_ref() == Some(v)
            }
            XsdDatatypeValues::Float(v) => parse_float(&normalize_whitespace(value))
                .map(|p| float_eq(p as f64, *v as f64))
                .unwrap_or(false),
            XsdDatatypeValues::Double(v) => parse_double(&normalize_whitespace(value))
                .map(|p| float_eq(p, *v))
                .unwrap_or(false),
            XsdDatatypeValues::Boolean(v) => parse_boolean(&normalize_whitespace(value)) == Some(*v),
            XsdDatatypeValues::Base64Binary(v) => {
                decode_base64(&normalize_whitespace(value)).as_ref() == Some(v)
            }
            XsdDatatypeValues::HexBinary(v) => {
                decode_hex(&normalize_whitespace(value)).as_ref() == Some(v)
            }
            XsdDatatypeValues::Lexical(s) => s == &normalize_whitespace(value),
        }
    }
}

impl XsdDatatypeValues {
    pub fn is_valid_with_ns(&self, value: &str, ns: &dyn Namespaces) -> bool {
        match self {
            XsdDatatypeValues::QName(v) => QNameVal::from_val_with_dyn_ns(value, ns)
                .map(|parsed| &parsed == v)
                .unwrap_or(false),
            _ => self.is_valid(value),
        }
    }
}

// --- lexical parsing helpers ---

fn parse_int<T: FromStr>(lex: &str) -> Option<T> {
    // XSD integer forms permit a leading '+' that FromStr rejects
    lex.strip_prefix('+').unwrap_or(lex).parse().ok()
}

fn parse_big_int(lex: &str) -> Option<num_bigint::BigInt> {
    if lex.is_empty() || lex.contains(['.', 'e', 'E']) {
        return None;
    }
    num_bigint::BigInt::from_str(lex.strip_prefix('+').unwrap_or(lex)).ok()
}

fn parse_decimal(lex: &str) -> Option<bigdecimal::BigDecimal> {
    // BigDecimal accepts scientific notation, the XSD lexical space does not
    if lex.contains(['e', 'E']) {
        return None;
    }
    bigdecimal::BigDecimal::from_str(lex.strip_prefix('+').unwrap_or(lex)).ok()
}

fn decimal_fraction_digits(lex: &str) -> usize {
    lex.split_once('.')
        .map(|(_, frac)| frac.chars().filter(|c| c.is_ascii_digit()).count())
        .unwrap_or(0)
}

fn decimal_total_digits(lex: &str) -> usize {
    lex.chars().filter(|c| c.is_ascii_digit()).count()
}

fn parse_double(lex: &str) -> Option<f64> {
    match lex {
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => {
            // reject forms Rust accepts but the XSD lexical space does not
            let bare = lex.strip_prefix(['+', '-']).unwrap_or(lex);
            if !bare.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                return None;
            }
            lex.strip_prefix('+').unwrap_or(lex).parse().ok()
        }
    }
}

fn parse_float(lex: &str) -> Option<f32> {
    parse_double(lex).map(|v| v as f32)
}

fn parse_boolean(lex: &str) -> Option<bool> {
    match lex {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    // in the XSD value space NaN is equal to itself
    (a.is_nan() && b.is_nan()) || a == b
}

fn decode_base64(lex: &str) -> Option<Vec<u8>> {
    let compact: String = lex.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD.decode(compact).ok()
}

fn decode_hex(lex: &str) -> Option<Vec<u8>> {
    if lex.len() % 2 != 0 || !lex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    (0..lex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&lex[i..i + 2], 16).ok())
        .collect()
}

fn is_xml_name(lex: &str) -> bool {
    let mut chars = lex.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}

fn is_ncname(lex: &str) -> bool {
    is_xml_name(lex) && !lex.contains(':')
}

fn is_nmtoken(lex: &str) -> bool {
    !lex.is_empty() && lex.chars().all(is_name_char)
}

fn is_uri_shaped(lex: &str) -> bool {
    // a pragmatic check: URI references exclude spaces, control characters
    // and the characters RFC 3986 never permits raw
    !lex.contains(|c: char| {
        c.is_control() || matches!(c, ' ' | '<' | '>' | '"' | '`' | '{' | '}' | '|' | '\\' | '^')
    })
}

// --- parameter facet compilation ---

fn parse_usize_param(p: &Param, param: &'static str) -> Result<usize, FacetError> {
    normalize_whitespace(&p.value)
        .parse()
        .map_err(|_| FacetError::InvalidNumber {
            param,
            value: p.value.clone(),
        })
}

fn pattern_param(pattern: &mut Option<PatternFacet>, p: &Param) -> Result<(), FacetError> {
    if pattern.is_some() {
        return Err(FacetError::ConflictingFacet("pattern given twice"));
    }
    let compiled = regexp::translate(&p.value).map_err(FacetError::InvalidPattern)?;
    *pattern = Some(PatternFacet(compiled));
    Ok(())
}

fn string_facets(params: &[&Param]) -> Result<StringFacets, FacetError> {
    let mut len = LengthFacet::Unbounded;
    let mut pattern = None;
    for p in params {
        match p.name.as_str() {
            "length" => len.merge(LengthFacet::Length(parse_usize_param(p, "length")?))?,
            "minLength" => len.merge(LengthFacet::MinLength(parse_usize_param(p, "minLength")?))?,
            "maxLength" => len.merge(LengthFacet::MaxLength(parse_usize_param(p, "maxLength")?))?,
            "pattern" => pattern_param(&mut pattern, p)?,
            other => return Err(FacetError::UnknownParam(other.to_string())),
        }
    }
    Ok(StringFacets { len, pattern })
}

fn length_facets(params: &[&Param]) -> Result<(LengthFacet, Option<PatternFacet>), FacetError> {
    let f = string_facets(params)?;
    Ok((f.len, f.pattern))
}

fn pattern_only(params: &[&Param]) -> Result<Option<PatternFacet>, FacetError> {
    let mut pattern = None;
    for p in params {
        match p.name.as_str() {
            "pattern" => pattern_param(&mut pattern, p)?,
            other => return Err(FacetError::UnknownParam(other.to_string())),
        }
    }
    Ok(pattern)
}

fn decimal_facets(params: &[&Param]) -> Result<XsdDatatypes, FacetError> {
    let mut fraction_digits = None;
    let mut total_digits = None;
    let mut rest = vec![];
    for p in params {
        match p.name.as_str() {
            "fractionDigits" => {
                fraction_digits = Some(parse_usize_param(p, "fractionDigits")? as u16)
            }
            "totalDigits" => total_digits = Some(parse_usize_param(p, "totalDigits")? as u16),
            _ => rest.push(*p),
        }
    }
    let (min_max, pattern) = min_max_facets(&rest, parse_decimal)?;
    Ok(XsdDatatypes::Decimal {
        min_max,
        pattern,
        fraction_digits,
        total_digits,
    })
}

fn min_max_facets<T, F>(
    params: &[&Param],
    parse: F,
) -> Result<(MinMaxFacet<T>, Option<PatternFacet>), FacetError>
where
    T: PartialOrd,
    F: Fn(&str) -> Option<T>,
{
    let mut min_max = MinMaxFacet::default();
    let mut pattern = None;
    for p in params {
        let bound = |param| {
            parse(&normalize_whitespace(&p.value)).ok_or(FacetError::InvalidNumber {
                param,
                value: p.value.clone(),
            })
        };
        match p.name.as_str() {
            "minInclusive" => min_max.min_inclusive(bound("minInclusive")?)?,
            "minExclusive" => min_max.min_exclusive(bound("minExclusive")?)?,
            "maxInclusive" => min_max.max_inclusive(bound("maxInclusive")?)?,
            "maxExclusive" => min_max.max_exclusive(bound("maxExclusive")?)?,
            "pattern" => pattern_param(&mut pattern, p)?,
            other => return Err(FacetError::UnknownParam(other.to_string())),
        }
    }
    Ok((min_max, pattern))
}

/// Compile an XSD type and its parameters. Unknown type names fail
/// closed; the caller decides whether to tolerate them.
pub(crate) fn compile(name: &str, params: &[Param]) -> Result<XsdDatatype, DatatypeError> {
    let mut enumeration: Vec<String> = vec![];
    let mut rest: Vec<&Param> = vec![];
    for p in params {
        if p.name == "enumeration" {
            enumeration.push(p.value.clone());
        } else {
            rest.push(p);
        }
    }
    let base = compile_base(name, &rest)?;
    Ok(XsdDatatype {
        base,
        enumeration: if enumeration.is_empty() {
            None
        } else {
            Some(enumeration)
        },
    })
}

fn compile_base(name: &str, params: &[&Param]) -> Result<XsdDatatypes, DatatypeError> {
    let result = match name {
        "string" => string_facets(params).map(XsdDatatypes::String),
        "normalizedString" => string_facets(params).map(XsdDatatypes::NormalizedString),
        "token" => string_facets(params).map(XsdDatatypes::Token),
        "language" => string_facets(params).map(XsdDatatypes::Language),
        "Name" => string_facets(params).map(XsdDatatypes::Name),
        "NCName" => string_facets(params).map(XsdDatatypes::NcName),
        "NMTOKEN" => string_facets(params).map(XsdDatatypes::NmToken),
        "boolean" => pattern_only(params).map(XsdDatatypes::Boolean),
        "decimal" => decimal_facets(params),
        "integer" => {
            min_max_facets(params, parse_big_int).map(|(mm, p)| XsdDatatypes::Integer(mm, p))
        }
        "nonPositiveInteger" => min_max_facets(params, parse_big_int)
            .map(|(mm, p)| XsdDatatypes::NonPositiveInteger(mm, p)),
        "negativeInteger" => min_max_facets(params, parse_big_int)
            .map(|(mm, p)| XsdDatatypes::NegativeInteger(mm, p)),
        "nonNegativeInteger" => min_max_facets(params, parse_big_int)
            .map(|(mm, p)| XsdDatatypes::NonNegativeInteger(mm, p)),
        "positiveInteger" => min_max_facets(params, parse_big_int)
            .map(|(mm, p)| XsdDatatypes::PositiveInteger(mm, p)),
        "long" => min_max_facets(params, parse_int::<i64>).map(|(mm, p)| XsdDatatypes::Long(mm, p)),
        "int" => min_max_facets(params, parse_int::<i32>).map(|(mm, p)| XsdDatatypes::Int(mm, p)),
        "short" => {
            min_max_facets(params, parse_int::<i16>).map(|(mm, p)| XsdDatatypes::Short(mm, p))
        }
        "byte" => min_max_facets(params, parse_int::<i8>).map(|(mm, p)| XsdDatatypes::Byte(mm, p)),
        "unsignedLong" => min_max_facets(params, parse_int::<u64>)
            .map(|(mm, p)| XsdDatatypes::UnsignedLong(mm, p)),
        "unsignedInt" => min_max_facets(params, parse_int::<u32>)
            .map(|(mm, p)| XsdDatatypes::UnsignedInt(mm, p)),
        "unsignedShort" => min_max_facets(params, parse_int::<u16>)
            .map(|(mm, p)| XsdDatatypes::UnsignedShort(mm, p)),
        "unsignedByte" => min_max_facets(params, parse_int::<u8>)
            .map(|(mm, p)| XsdDatatypes::UnsignedByte(mm, p)),
        "float" => pattern_only(params).map(XsdDatatypes::Float),
        "double" => pattern_only(params).map(XsdDatatypes::Double),
        "anyURI" => string_facets(params).map(XsdDatatypes::AnyUri),
        "QName" => match params.first() {
            Some(p) => Err(FacetError::UnknownParam(p.name.clone())),
            None => Ok(XsdDatatypes::QNameData),
        },
        "base64Binary" => length_facets(params).map(|(l, p)| XsdDatatypes::Base64Binary(l, p)),
        "hexBinary" => length_facets(params).map(|(l, p)| XsdDatatypes::HexBinary(l, p)),
        "date" => pattern_only(params).map(XsdDatatypes::Date),
        "dateTime" => pattern_only(params).map(XsdDatatypes::Datetime),
        "time" => pattern_only(params).map(XsdDatatypes::Time),
        "duration" => pattern_only(params).map(XsdDatatypes::Duration),
        "gYear" => pattern_only(params).map(XsdDatatypes::GYear),
        "gYearMonth" => pattern_only(params).map(XsdDatatypes::GYearMonth),
        "gMonth" => pattern_only(params).map(XsdDatatypes::GMonth),
        "gMonthDay" => pattern_only(params).map(XsdDatatypes::GMonthDay),
        "gDay" => pattern_only(params).map(XsdDatatypes::GDay),
        _ => {
            return Err(DatatypeError::UnsupportedDatatype {
                library: NAMESPACE_URI.to_string(),
                name: name.to_string(),
            });
        }
    };
    result.map_err(|facet| DatatypeError::Facet {
        type_name: name.to_string(),
        facet,
    })
}

/// Parse a `value` literal in the named type.
pub(crate) fn compile_value(
    name: &str,
    raw: &str,
    ns: &dyn Namespaces,
) -> Result<XsdDatatypeValues, DatatypeError> {
    let invalid = || DatatypeError::InvalidValue {
        type_name: name.to_string(),
        value: raw.to_string(),
    };
    let lex = normalize_whitespace(raw);
    match name {
        "string" => Ok(XsdDatatypeValues::String(raw.to_string())),
        "normalizedString" => Ok(XsdDatatypeValues::Lexical(lex)),
        "token" => Ok(XsdDatatypeValues::Token(lex)),
        "language" => {
            if LANG_RE.is_match(&lex) {
                Ok(XsdDatatypeValues::Token(lex))
            } else {
                Err(invalid())
            }
        }
        "Name" => {
            if is_xml_name(&lex) {
                Ok(XsdDatatypeValues::Token(lex))
            } else {
                Err(invalid())
            }
        }
        "NCName" => {
            if is_ncname(&lex) {
                Ok(XsdDatatypeValues::Token(lex))
            } else {
                Err(invalid())
            }
        }
        "NMTOKEN" => {
            if is_nmtoken(&lex) {
                Ok(XsdDatatypeValues::Token(lex))
            } else {
                Err(invalid())
            }
        }
        "QName" => QNameVal::from_val_with_dyn_ns(raw, ns)
            .map(XsdDatatypeValues::QName)
            .ok_or_else(invalid),
        "integer" | "nonPositiveInteger" | "negativeInteger" | "nonNegativeInteger"
        | "positiveInteger" | "long" | "int" | "short" | "byte" | "unsignedLong" | "unsignedInt"
        | "unsignedShort" | "unsignedByte" => {
            let dt = compile_base(name, &[])?;
            if !dt.is_valid(raw) {
                return Err(invalid());
            }
            parse_big_int(&lex)
                .map(XsdDatatypeValues::Integer)
                .ok_or_else(invalid)
        }
        "decimal" => parse_decimal(&lex)
            .map(XsdDatatypeValues::Decimal)
            .ok_or_else(invalid),
        "float" => parse_float(&lex)
            .map(XsdDatatypeValues::Float)
            .ok_or_else(invalid),
        "double" => parse_double(&lex)
            .map(XsdDatatypeValues::Double)
            .ok_or_else(invalid),
        "boolean" => parse_boolean(&lex)
            .map(XsdDatatypeValues::Boolean)
            .ok_or_else(invalid),
        "base64Binary" => decode_base64(&lex)
            .map(XsdDatatypeValues::Base64Binary)
            .ok_or_else(invalid),
        "hexBinary" => decode_hex(&lex)
            .map(XsdDatatypeValues::HexBinary)
            .ok_or_else(invalid),
        "anyURI" | "date" | "dateTime" | "time" | "duration" | "gYear" | "gYearMonth" | "gMonth"
        | "gMonthDay" | "gDay" => {
            let dt = compile_base(name, &[])?;
            if dt.is_valid(raw) {
                Ok(XsdDatatypeValues::Lexical(lex))
            } else {
                Err(invalid())
            }
        }
        _ => Err(DatatypeError::UnsupportedDatatype {
            library: NAMESPACE_URI.to_string(),
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoNs;
    impl Namespaces for NoNs {
        fn resolve_prefix(&self, _prefix: &str) -> Option<&str> {
            None
        }
    }

    struct OneNs;
    impl Namespaces for OneNs {
        fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
            match prefix {
                "p" | "q" => Some("urn:p"),
                "" => Some(""),
                _ => None,
            }
        }
    }

    fn compile_ok(name: &str, params: &[(&str, &str)]) -> XsdDatatype {
        let params: Vec<Param> = params
            .iter()
            .map(|(n, v)| Param {
                name: n.to_string(),
                value: v.to_string(),
            })
            .collect();
        compile(name, &params).unwrap()
    }

    #[test]
    fn integer_with_bounds() {
        let dt = compile_ok("integer", &[("minInclusive", "0"), ("maxExclusive", "10")]);
        assert!(dt.is_valid("0"));
        assert!(dt.is_valid("9"));
        assert!(dt.is_valid("+5"));
        assert!(dt.is_valid(" 5 "));
        assert!(!dt.is_valid("10"));
        assert!(!dt.is_valid("-1"));
        assert!(!dt.is_valid("12x"));
        assert!(!dt.is_valid("1.0"));
    }

    #[test]
    fn conflicting_bounds_rejected() {
        let params = [
            Param {
                name: "minInclusive".to_string(),
                value: "10".to_string(),
            },
            Param {
                name: "maxInclusive".to_string(),
                value: "3".to_string(),
            },
        ];
        assert!(matches!(
            compile("integer", &params),
            Err(DatatypeError::Facet { .. })
        ));
    }

    #[test]
    fn short_range_is_enforced() {
        let dt = compile_ok("short", &[]);
        assert!(dt.is_valid("32767"));
        assert!(!dt.is_valid("32768"));
    }

    #[test]
    fn string_length_facets() {
        let dt = compile_ok("string", &[("minLength", "2"), ("maxLength", "3")]);
        assert!(!dt.is_valid("a"));
        assert!(dt.is_valid("ab"));
        assert!(dt.is_valid("abc"));
        assert!(!dt.is_valid("abcd"));
    }

    #[test]
    fn min_greater_than_max_length_rejected() {
        let params = [
            Param {
                name: "minLength".to_string(),
                value: "5".to_string(),
            },
            Param {
                name: "maxLength".to_string(),
                value: "2".to_string(),
            },
        ];
        assert!(matches!(
            compile("string", &params),
            Err(DatatypeError::Facet {
                facet: FacetError::ConflictingFacet(_),
                ..
            })
        ));
    }

    #[test]
    fn pattern_facet_uses_translated_regex() {
        let dt = compile_ok("token", &[("pattern", "[a-z]{2}\\d")]);
        assert!(dt.is_valid("ab1"));
        assert!(!dt.is_valid("ab12"));
        assert!(!dt.is_valid("AB1"));
        // malformed patterns are schema errors
        let params = [Param {
            name: "pattern".to_string(),
            value: "a{2,1}".to_string(),
        }];
        assert!(matches!(
            compile("token", &params),
            Err(DatatypeError::Facet {
                facet: FacetError::InvalidPattern(_),
                ..
            })
        ));
    }

    #[test]
    fn enumeration_facet_compares_values() {
        let dt = compile_ok("integer", &[("enumeration", "1"), ("enumeration", "02")]);
        assert!(dt.is_valid("1"));
        assert!(dt.is_valid("2"));
        assert!(dt.is_valid("+01"));
        assert!(!dt.is_valid("3"));
    }

    #[test]
    fn boolean_lexicals() {
        let dt = compile_ok("boolean", &[]);
        for ok in ["true", "false", "1", "0", " true "] {
            assert!(dt.is_valid(ok), "{ok:?}");
        }
        assert!(!dt.is_valid("TRUE"));
        assert!(!dt.is_valid("yes"));
    }

    #[test]
    fn decimal_digits_facets() {
        let dt = compile_ok("decimal", &[("fractionDigits", "2"), ("totalDigits", "5")]);
        assert!(dt.is_valid("123.45"));
        assert!(dt.is_valid("-0.5"));
        assert!(!dt.is_valid("1.234"));
        assert!(!dt.is_valid("123456"));
        assert!(!dt.is_valid("1e3"));
    }

    #[test]
    fn float_and_double_specials() {
        let dt = compile_ok("double", &[]);
        for ok in ["1.5", "-0.5e10", "INF", "-INF", "NaN", "0"] {
            assert!(dt.is_valid(ok), "{ok:?}");
        }
        assert!(!dt.is_valid("infinity"));
        assert!(!dt.is_valid("inf"));
        let nan = compile_value("double", "NaN", &NoNs).unwrap();
        assert!(nan.is_valid("NaN"));
    }

    #[test]
    fn binary_types_decode() {
        let dt = compile_ok("hexBinary", &[("length", "2")]);
        assert!(dt.is_valid("DEAD"));
        assert!(!dt.is_valid("DEADBE"));
        assert!(!dt.is_valid("XY"));
        let dt = compile_ok("base64Binary", &[]);
        assert!(dt.is_valid("AGZvbw=="));
        assert!(!dt.is_valid("!!!!"));
        // equality is over octets, not text
        let v = compile_value("base64Binary", "AGZvbw==", &NoNs).unwrap();
        assert!(v.is_valid("AGZv bw=="));
    }

    #[test]
    fn date_and_time_shapes() {
        assert!(compile_ok("date", &[]).is_valid("2001-12-31"));
        assert!(compile_ok("date", &[]).is_valid("2001-12-31Z"));
        assert!(!compile_ok("date", &[]).is_valid("2001-13"));
        assert!(compile_ok("dateTime", &[]).is_valid("2001-12-31T23:59:59.5Z"));
        assert!(compile_ok("time", &[]).is_valid("23:59:59+01:00"));
        assert!(compile_ok("duration", &[]).is_valid("P1Y2M3DT4H5M6.7S"));
        assert!(compile_ok("duration", &[]).is_valid("PT0S"));
        assert!(!compile_ok("duration", &[]).is_valid("P"));
    }

    #[test]
    fn qname_needs_context() {
        let dt = compile_ok("QName", &[]);
        assert!(dt.needs_context());
        assert!(dt.is_valid_with_ns("p:foo", &OneNs));
        assert!(!dt.is_valid_with_ns("nope:foo", &OneNs));
        // different prefixes bound to one namespace denote the same value
        let v = compile_value("QName", "p:foo", &OneNs).unwrap();
        assert!(v.is_valid_with_ns("q:foo", &OneNs));
        assert!(!v.is_valid_with_ns("q:bar", &OneNs));
    }

    #[test]
    fn name_family() {
        assert!(compile_ok("NCName", &[]).is_valid("foo-bar"));
        assert!(!compile_ok("NCName", &[]).is_valid("p:foo"));
        assert!(compile_ok("Name", &[]).is_valid("p:foo"));
        assert!(!compile_ok("Name", &[]).is_valid("-foo"));
        assert!(compile_ok("NMTOKEN", &[]).is_valid("-foo"));
        assert!(!compile_ok("NMTOKEN", &[]).is_valid("a b"));
    }

    #[test]
    fn language_shape() {
        assert!(compile_ok("language", &[]).is_valid("en"));
        assert!(compile_ok("language", &[]).is_valid("en-GB-x-private"));
        assert!(!compile_ok("language", &[]).is_valid("verylongprimarytag"));
    }

    #[test]
    fn value_literals_parse_or_fail() {
        assert!(compile_value("integer", "12", &NoNs).is_ok());
        assert!(matches!(
            compile_value("integer", "12x", &NoNs),
            Err(DatatypeError::InvalidValue { .. })
        ));
        let v = compile_value("integer", "012", &NoNs).unwrap();
        assert!(v.is_valid("12"));
        assert!(!v.is_valid("13"));
    }

    #[test]
    fn unknown_params_rejected() {
        let params = [Param {
            name: "whiteSpace".to_string(),
            value: "collapse".to_string(),
        }];
        assert!(matches!(
            compile("token", &params),
            Err(DatatypeError::Facet {
                facet: FacetError::UnknownParam(_),
                ..
            })
        ));
    }
}
