//! The built-in RELAX NG datatype library (`datatypeLibrary=""`).
//!
//! Two types only: `string` compares text as-is, `token` compares after
//! whitespace normalization. Neither takes parameters.

use super::{Datatype, DatatypeError};

/// Collapse XML whitespace: leading and trailing runs are removed, inner
/// runs of space, tab, newline and carriage return become single spaces.
pub fn normalize_whitespace(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_ws = true;
    for c in value.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r') {
            if !in_ws {
                out.push(' ');
                in_ws = true;
            }
        } else {
            out.push(c);
            in_ws = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxDatatypes {
    String,
    Token,
}

impl Datatype for RelaxDatatypes {
    // without facets every string is a value of both types
    fn is_valid(&self, _value: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelaxDatatypeValues {
    String(String),
    Token(String),
}

impl Datatype for RelaxDatatypeValues {
    fn is_valid(&self, value: &str) -> bool {
        match self {
            RelaxDatatypeValues::String(s) => s == value,
            RelaxDatatypeValues::Token(s) => s == &normalize_whitespace(value),
        }
    }
}

pub(crate) fn compile(name: &str) -> Result<RelaxDatatypes, DatatypeError> {
    match name {
        "string" => Ok(RelaxDatatypes::String),
        "token" => Ok(RelaxDatatypes::Token),
        _ => Err(DatatypeError::UnsupportedDatatype {
            library: String::new(),
            name: name.to_string(),
        }),
    }
}

pub(crate) fn compile_value(name: &str, raw: &str) -> Result<RelaxDatatypeValues, DatatypeError> {
    match name {
        "string" => Ok(RelaxDatatypeValues::String(raw.to_string())),
        "token" => Ok(RelaxDatatypeValues::Token(normalize_whitespace(raw))),
        _ => Err(DatatypeError::UnsupportedDatatype {
            library: String::new(),
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_normalization() {
        assert_eq!(normalize_whitespace("  a  b\t\nc "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace(" \t\n "), "");
    }

    #[test]
    fn string_values_compare_verbatim() {
        let v = compile_value("string", " a b ").unwrap();
        assert!(v.is_valid(" a b "));
        assert!(!v.is_valid("a b"));
    }

    #[test]
    fn token_values_compare_collapsed() {
        let v = compile_value("token", "one two").unwrap();
        assert!(v.is_valid("one two"));
        assert!(v.is_valid("  one\n\ttwo "));
        assert!(!v.is_valid("one  three"));
    }
}
