//! Reader for the compiled-schema JSON wire format, version 3.
//!
//! The document shape is `{"v": 3, "o": <flags>, "d": <node>}` where a
//! node is a JSON array `[ctor, path?, arg, ...]`. Constructors are small
//! integers in the compact form or names in the verbose (debugging) form;
//! the mapping is table-driven so a newer conversion tool can grow the
//! table without touching the walkers. Bit 0 of `o` (`OPTION_NO_PATHS`)
//! says path strings were omitted; when clear, every non-`Array` node
//! carries a path string right after its constructor.
//!
//! Argument lists (grammar defines, data params) are `Array` nodes
//! (`[0, item, ...]`) in the compact form and plain JSON arrays in the
//! verbose form; the reader accepts both.

use crate::datatype::{
    self, DatatypeError, Param, StaticContext,
};
use crate::model::{
    DataPattern, DefineId, NameClass, PatId, Pattern, Schema, SchemaBuilder, ValuePattern,
};
use serde_json::Value as Json;
use std::collections::HashMap;

/// Bit 0 of the `o` field: path strings are omitted.
pub const OPTION_NO_PATHS: u64 = 1;

#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Tolerate datatype names the library does not implement, degrading
    /// them to unconstrained text. The degraded names are reported on the
    /// loaded schema so a driver can warn.
    pub allow_incomplete_types: bool,
}

/// A loaded schema plus load-time notes.
pub struct LoadedSchema {
    pub schema: Schema,
    /// Datatype names that were degraded to unconstrained text.
    pub incomplete_types: Vec<String>,
}

#[derive(Debug)]
pub enum SchemaError {
    Json(serde_json::Error),
    /// Only format version 3 is readable.
    UnsupportedVersion(u64),
    UnknownConstructor(String),
    /// A `ref` whose name is missing from the grammar's defines.
    DanglingRef(String),
    Datatype(DatatypeError),
    Malformed(String),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::Json(e) => write!(f, "schema is not valid JSON: {e}"),
            SchemaError::UnsupportedVersion(v) => {
                write!(f, "unsupported schema format version {v}")
            }
            SchemaError::UnknownConstructor(what) => {
                write!(f, "unknown pattern constructor {what}")
            }
            SchemaError::DanglingRef(name) => {
                write!(f, "ref {name:?} does not match any define")
            }
            SchemaError::Datatype(e) => write!(f, "{e}"),
            SchemaError::Malformed(message) => write!(f, "malformed schema: {message}"),
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<DatatypeError> for SchemaError {
    fn from(e: DatatypeError) -> SchemaError {
        SchemaError::Datatype(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctor {
    Array,
    Empty,
    Data,
    List,
    Param,
    Value,
    NotAllowed,
    Text,
    Ref,
    OneOrMore,
    Choice,
    Group,
    Attribute,
    Element,
    Define,
    Grammar,
    Interleave,
    Name,
    NameChoice,
    NsName,
    AnyName,
}

// code 16 belonged to an earlier format revision and stays reserved
const CTORS: &[(u8, &str, Ctor)] = &[
    (0, "Array", Ctor::Array),
    (1, "Empty", Ctor::Empty),
    (2, "Data", Ctor::Data),
    (3, "List", Ctor::List),
    (4, "Param", Ctor::Param),
    (5, "Value", Ctor::Value),
    (6, "NotAllowed", Ctor::NotAllowed),
    (7, "Text", Ctor::Text),
    (8, "Ref", Ctor::Ref),
    (9, "OneOrMore", Ctor::OneOrMore),
    (10, "Choice", Ctor::Choice),
    (11, "Group", Ctor::Group),
    (12, "Attribute", Ctor::Attribute),
    (13, "Element", Ctor::Element),
    (14, "Define", Ctor::Define),
    (15, "Grammar", Ctor::Grammar),
    (17, "Interleave", Ctor::Interleave),
    (18, "Name", Ctor::Name),
    (19, "NameChoice", Ctor::NameChoice),
    (20, "NsName", Ctor::NsName),
    (21, "AnyName", Ctor::AnyName),
];

fn ctor_by_code(code: u64) -> Option<Ctor> {
    CTORS
        .iter()
        .find(|(c, _, _)| u64::from(*c) == code)
        .map(|(_, _, ctor)| *ctor)
}

fn ctor_by_name(name: &str) -> Option<Ctor> {
    CTORS
        .iter()
        .find(|(_, n, _)| *n == name)
        .map(|(_, _, ctor)| *ctor)
}

/// Read a schema with default options.
pub fn schema_from_str(json: &str) -> Result<Schema, SchemaError> {
    load_str(json, &LoaderOptions::default()).map(|loaded| loaded.schema)
}

pub fn load_str(json: &str, options: &LoaderOptions) -> Result<LoadedSchema, SchemaError> {
    let value: Json = serde_json::from_str(json).map_err(SchemaError::Json)?;
    load_value(&value, options)
}

pub fn load_value(root: &Json, options: &LoaderOptions) -> Result<LoadedSchema, SchemaError> {
    let obj = root
        .as_object()
        .ok_or_else(|| SchemaError::Malformed("top level is not an object".to_string()))?;
    let version = obj
        .get("v")
        .and_then(Json::as_u64)
        .ok_or_else(|| SchemaError::Malformed("missing format version".to_string()))?;
    if version != 3 {
        return Err(SchemaError::UnsupportedVersion(version));
    }
    let flags = obj.get("o").and_then(Json::as_u64).unwrap_or(0);
    let top = obj
        .get("d")
        .ok_or_else(|| SchemaError::Malformed("missing schema data".to_string()))?;
    let mut loader = Loader {
        builder: SchemaBuilder::new(),
        include_paths: flags & OPTION_NO_PATHS == 0,
        allow_incomplete_types: options.allow_incomplete_types,
        defines: HashMap::new(),
        incomplete_types: Vec::new(),
    };
    let start = loader.grammar(top)?;
    Ok(LoadedSchema {
        schema: loader.builder.finish(start),
        incomplete_types: loader.incomplete_types,
    })
}

struct Loader {
    builder: SchemaBuilder,
    include_paths: bool,
    allow_incomplete_types: bool,
    defines: HashMap<String, DefineId>,
    incomplete_types: Vec<String>,
}

impl Loader {
    /// Split a node into its constructor and argument slice, skipping the
    /// path string when the format carries paths.
    fn node<'j>(&self, v: &'j Json) -> Result<(Ctor, &'j [Json]), SchemaError> {
        let arr = v
            .as_array()
            .ok_or_else(|| SchemaError::Malformed(format!("expected a node, found {v}")))?;
        let head = arr
            .first()
            .ok_or_else(|| SchemaError::Malformed("empty node".to_string()))?;
        let ctor = match head {
            Json::Number(n) => {
                let code = n
                    .as_u64()
                    .ok_or_else(|| SchemaError::UnknownConstructor(n.to_string()))?;
                ctor_by_code(code).ok_or_else(|| SchemaError::UnknownConstructor(code.to_string()))?
            }
            Json::String(name) => ctor_by_name(name)
                .ok_or_else(|| SchemaError::UnknownConstructor(format!("{name:?}")))?,
            other => {
                return Err(SchemaError::Malformed(format!(
                    "node constructor must be a number or string, found {other}"
                )));
            }
        };
        let mut args = &arr[1..];
        if self.include_paths && ctor != Ctor::Array {
            match args.first() {
                Some(Json::String(_)) => args = &args[1..],
                _ => {
                    return Err(SchemaError::Malformed(
                        "node is missing its path string".to_string(),
                    ));
                }
            }
        }
        Ok((ctor, args))
    }

    /// An argument list: an `Array` node or a plain JSON array.
    fn list<'j>(&self, v: &'j Json) -> Result<&'j [Json], SchemaError> {
        let arr = v
            .as_array()
            .ok_or_else(|| SchemaError::Malformed(format!("expected a list, found {v}")))?;
        match arr.first() {
            Some(Json::Number(n)) if n.as_u64() == Some(0) => Ok(&arr[1..]),
            Some(Json::String(s)) if s == "Array" => Ok(&arr[1..]),
            _ => Ok(arr),
        }
    }

    fn str_arg<'j>(&self, args: &'j [Json], i: usize, what: &str) -> Result<&'j str, SchemaError> {
        args.get(i)
            .and_then(Json::as_str)
            .ok_or_else(|| SchemaError::Malformed(format!("expected {what} string argument")))
    }

    /// Define and ref names are strings, or numbers when the conversion
    /// tool has renamed them to compact ids.
    fn name_arg(&self, args: &[Json], i: usize) -> Result<String, SchemaError> {
        match args.get(i) {
            Some(Json::String(s)) => Ok(s.clone()),
            Some(Json::Number(n)) => Ok(n.to_string()),
            _ => Err(SchemaError::Malformed(
                "expected a string or numeric name".to_string(),
            )),
        }
    }

    fn arg<'j>(&self, args: &'j [Json], i: usize, what: &str) -> Result<&'j Json, SchemaError> {
        args.get(i)
            .ok_or_else(|| SchemaError::Malformed(format!("missing {what} argument")))
    }

    /// The top-level Grammar node: declare every define first so that
    /// mutually recursive refs resolve, then build the bodies and the
    /// start pattern.
    fn grammar(&mut self, v: &Json) -> Result<PatId, SchemaError> {
        let (ctor, args) = self.node(v)?;
        if ctor != Ctor::Grammar {
            return Err(SchemaError::Malformed(
                "top-level node is not a Grammar".to_string(),
            ));
        }
        let start_node = self.arg(args, 0, "start")?;
        let defines: Vec<(String, &Json)> = match args.get(1) {
            Some(list) => {
                let items = self.list(list)?;
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let (ctor, dargs) = self.node(item)?;
                    if ctor != Ctor::Define {
                        return Err(SchemaError::Malformed(
                            "grammar definitions must be Define nodes".to_string(),
                        ));
                    }
                    let name = self.name_arg(dargs, 0)?;
                    out.push((name, self.arg(dargs, 1, "define body")?));
                }
                out
            }
            None => Vec::new(),
        };
        for (name, _) in &defines {
            let id = self.builder.declare_define(name.clone());
            if self.defines.insert(name.clone(), id).is_some() {
                return Err(SchemaError::Malformed(format!(
                    "define {name:?} appears twice"
                )));
            }
        }
        for (name, body) in &defines {
            let pattern = self.pattern(body)?;
            let id = self.defines[name];
            self.builder.resolve_define(id, pattern);
        }
        self.pattern(start_node)
    }

    fn pattern(&mut self, v: &Json) -> Result<PatId, SchemaError> {
        let (ctor, args) = self.node(v)?;
        match ctor {
            Ctor::Empty => Ok(self.builder.empty()),
            Ctor::Text => Ok(self.builder.text()),
            Ctor::NotAllowed => Ok(self.builder.not_allowed()),
            Ctor::Choice => {
                let a = self.pattern(self.arg(args, 0, "choice operand")?)?;
                let b = self.pattern(self.arg(args, 1, "choice operand")?)?;
                Ok(self.builder.choice(a, b))
            }
            Ctor::Group => {
                let a = self.pattern(self.arg(args, 0, "group operand")?)?;
                let b = self.pattern(self.arg(args, 1, "group operand")?)?;
                Ok(self.builder.group(a, b))
            }
            Ctor::Interleave => {
                let a = self.pattern(self.arg(args, 0, "interleave operand")?)?;
                let b = self.pattern(self.arg(args, 1, "interleave operand")?)?;
                Ok(self.builder.interleave(a, b))
            }
            Ctor::OneOrMore => {
                let p = self.pattern(self.arg(args, 0, "oneOrMore body")?)?;
                Ok(self.builder.one_or_more(p))
            }
            Ctor::List => {
                let p = self.pattern(self.arg(args, 0, "list body")?)?;
                Ok(self.builder.list(p))
            }
            Ctor::Element => {
                let name = self.name_class(self.arg(args, 0, "element name")?)?;
                let p = self.pattern(self.arg(args, 1, "element body")?)?;
                Ok(self.builder.element(name, p))
            }
            Ctor::Attribute => {
                let name = self.name_class(self.arg(args, 0, "attribute name")?)?;
                let p = self.pattern(self.arg(args, 1, "attribute body")?)?;
                Ok(self.builder.attribute(name, p))
            }
            Ctor::Ref => {
                let name = self.name_arg(args, 0)?;
                let id = *self
                    .defines
                    .get(&name)
                    .ok_or(SchemaError::DanglingRef(name))?;
                Ok(self.builder.reference(id))
            }
            Ctor::Value => {
                let raw = self.str_arg(args, 0, "value literal")?.to_string();
                let type_name = self.str_arg(args, 1, "value type")?.to_string();
                let library = self.str_arg(args, 2, "value datatype library")?;
                let ns = self.str_arg(args, 3, "value namespace")?;
                let ctx = StaticContext {
                    default_namespace: ns,
                };
                let value = datatype::compile_value(library, &type_name, &raw, &ctx)?;
                Ok(self.builder.push(Pattern::Value(Box::new(ValuePattern {
                    value,
                    raw,
                    type_name,
                }))))
            }
            Ctor::Data => {
                let type_name = self.str_arg(args, 0, "data type")?.to_string();
                let library = self.str_arg(args, 1, "data datatype library")?.to_string();
                let params = match args.get(2) {
                    Some(list) => self.params(list)?,
                    None => Vec::new(),
                };
                let except = match args.get(3) {
                    Some(node) => Some(self.pattern(node)?),
                    None => None,
                };
                let dt = match datatype::compile_datatype(&library, &type_name, &params, false) {
                    Ok(dt) => dt,
                    Err(DatatypeError::UnsupportedDatatype { .. })
                        if self.allow_incomplete_types =>
                    {
                        self.incomplete_types.push(type_name.clone());
                        datatype::compile_datatype(&library, &type_name, &params, true)?
                    }
                    Err(e) => return Err(e.into()),
                };
                Ok(self.builder.push(Pattern::Data(Box::new(DataPattern {
                    datatype: dt,
                    type_name,
                    except,
                }))))
            }
            Ctor::Grammar => Err(SchemaError::Malformed(
                "nested grammars are not part of the simple form".to_string(),
            )),
            Ctor::Array | Ctor::Param | Ctor::Define | Ctor::Name | Ctor::NameChoice
            | Ctor::NsName | Ctor::AnyName => Err(SchemaError::Malformed(format!(
                "{ctor:?} node in pattern position"
            ))),
        }
    }

    fn params(&self, v: &Json) -> Result<Vec<Param>, SchemaError> {
        let items = self.list(v)?;
        let mut params = Vec::with_capacity(items.len());
        for item in items {
            let (ctor, args) = self.node(item)?;
            if ctor != Ctor::Param {
                return Err(SchemaError::Malformed(
                    "data params must be Param nodes".to_string(),
                ));
            }
            params.push(Param {
                name: self.str_arg(args, 0, "param name")?.to_string(),
                value: self.str_arg(args, 1, "param value")?.to_string(),
            });
        }
        Ok(params)
    }

    fn name_class(&self, v: &Json) -> Result<NameClass, SchemaError> {
        let (ctor, args) = self.node(v)?;
        match ctor {
            Ctor::Name => Ok(NameClass::Named {
                namespace_uri: self.str_arg(args, 0, "name namespace")?.to_string(),
                name: self.str_arg(args, 1, "local name")?.to_string(),
            }),
            Ctor::NsName => {
                let except = match args.get(1) {
                    Some(node) => Some(Box::new(self.name_class(node)?)),
                    None => None,
                };
                Ok(NameClass::NsName {
                    namespace_uri: self.str_arg(args, 0, "nsName namespace")?.to_string(),
                    except,
                })
            }
            Ctor::AnyName => {
                let except = match args.first() {
                    Some(node) => Some(Box::new(self.name_class(node)?)),
                    None => None,
                };
                Ok(NameClass::AnyName { except })
            }
            Ctor::NameChoice => Ok(NameClass::Alt {
                a: Box::new(self.name_class(self.arg(args, 0, "name choice")?)?),
                b: Box::new(self.name_class(self.arg(args, 1, "name choice")?)?),
            }),
            other => Err(SchemaError::Malformed(format!(
                "{other:?} node in name-class position"
            ))),
        }
    }
}
