//! Datatype libraries for `data` and `value` patterns.
//!
//! Libraries are keyed by `datatypeLibrary` URI: the empty URI selects the
//! built-in RELAX NG library (`string` and `token`), and the XSD URI
//! selects the simple-type library in [`xsd`]. A compiled datatype checks
//! instance text against its parameter facets; a compiled value compares
//! instance text against a literal in the datatype's value space.

pub mod relax;
pub mod xsd;

pub use xsd::FacetError;

/// Prefix lookup used by context-sensitive datatypes (`QName`).
pub trait Namespaces {
    fn resolve_prefix(&self, prefix: &str) -> Option<&str>;
}

/// Namespace bindings captured in a schema, usable where no live document
/// context exists (schema-side `value` literals).
pub struct StaticContext<'a> {
    pub default_namespace: &'a str,
}

impl Namespaces for StaticContext<'_> {
    fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        match prefix {
            "" => Some(self.default_namespace),
            "xml" => Some(crate::resolver::XML_NAMESPACE_URI),
            _ => None,
        }
    }
}

/// A `name="value"` parameter of a `data` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub value: String,
}

#[derive(Debug)]
pub enum DatatypeError {
    UnknownLibrary {
        uri: String,
    },
    UnsupportedDatatype {
        library: String,
        name: String,
    },
    /// The built-in library's types take no parameters.
    ParamsNotAllowed {
        name: String,
    },
    /// A facet combination the schema supplied is invalid.
    Facet {
        type_name: String,
        facet: FacetError,
    },
    /// A schema-side literal is not a value of its datatype.
    InvalidValue {
        type_name: String,
        value: String,
    },
}

impl std::fmt::Display for DatatypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatatypeError::UnknownLibrary { uri } => {
                write!(f, "unknown datatype library {uri:?}")
            }
            DatatypeError::UnsupportedDatatype { library, name } => {
                write!(f, "datatype {name:?} is not supported by library {library:?}")
            }
            DatatypeError::ParamsNotAllowed { name } => {
                write!(f, "the built-in datatype {name:?} takes no parameters")
            }
            DatatypeError::Facet { type_name, facet } => {
                write!(f, "bad parameters for datatype {type_name:?}: {facet}")
            }
            DatatypeError::InvalidValue { type_name, value } => {
                write!(f, "{value:?} is not a valid value of datatype {type_name:?}")
            }
        }
    }
}

/// Context-free validity check, the seam both libraries implement.
pub trait Datatype {
    fn is_valid(&self, value: &str) -> bool;
}

/// A compiled datatype with its parameter facets applied.
#[derive(Debug, Clone)]
pub enum Datatypes {
    Relax(relax::RelaxDatatypes),
    Xsd(Box<xsd::XsdDatatype>),
}

impl Datatypes {
    /// Whether instance text is accepted, with namespace context available
    /// for the types that need it.
    pub fn allows(&self, value: &str, ns: &dyn Namespaces) -> bool {
        match self {
            Datatypes::Relax(dt) => dt.is_valid(value),
            Datatypes::Xsd(dt) => dt.is_valid_with_ns(value, ns),
        }
    }

    pub fn needs_context(&self) -> bool {
        match self {
            Datatypes::Relax(_) => false,
            Datatypes::Xsd(dt) => dt.needs_context(),
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Datatypes::Relax(_))
    }
}

/// A compiled `value` literal.
#[derive(Debug, Clone, PartialEq)]
pub enum DatatypeValues {
    Relax(relax::RelaxDatatypeValues),
    Xsd(xsd::XsdDatatypeValues),
}

impl DatatypeValues {
    /// Whether instance text denotes the same value.
    pub fn matches(&self, value: &str, ns: &dyn Namespaces) -> bool {
        match self {
            DatatypeValues::Relax(v) => v.is_valid(value),
            DatatypeValues::Xsd(v) => v.is_valid_with_ns(value, ns),
        }
    }
}

/// Compile a `data` pattern's datatype: look the library up by URI and
/// apply the parameter facets. Facet problems are schema-time errors.
///
/// With `allow_incomplete` set, a type name the XSD library does not
/// implement degrades to unconstrained `string` semantics instead of
/// failing; the loader records the degradation.
pub fn compile_datatype(
    library: &str,
    name: &str,
    params: &[Param],
    allow_incomplete: bool,
) -> Result<Datatypes, DatatypeError> {
    match library {
        "" => {
            if !params.is_empty() {
                return Err(DatatypeError::ParamsNotAllowed {
                    name: name.to_string(),
                });
            }
            relax::compile(name).map(Datatypes::Relax)
        }
        xsd::NAMESPACE_URI => match xsd::compile(name, params) {
            Ok(dt) => Ok(Datatypes::Xsd(Box::new(dt))),
            Err(DatatypeError::UnsupportedDatatype { .. }) if allow_incomplete => {
                Ok(Datatypes::Xsd(Box::new(xsd::XsdDatatype::unconstrained())))
            }
            Err(e) => Err(e),
        },
        _ => Err(DatatypeError::UnknownLibrary {
            uri: library.to_string(),
        }),
    }
}

/// Compile a `value` pattern's literal in the named datatype.
pub fn compile_value(
    library: &str,
    name: &str,
    raw: &str,
    ns: &dyn Namespaces,
) -> Result<DatatypeValues, DatatypeError> {
    match library {
        "" => relax::compile_value(name, raw).map(DatatypeValues::Relax),
        xsd::NAMESPACE_URI => xsd::compile_value(name, raw, ns).map(DatatypeValues::Xsd),
        _ => Err(DatatypeError::UnknownLibrary {
            uri: library.to_string(),
        }),
    }
}
