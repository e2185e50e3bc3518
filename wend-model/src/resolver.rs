//! Namespace-prefix resolution during validation.
//!
//! The caller pushes a context per open element, defines the prefixes its
//! `xmlns` attributes introduce, and resolves qualified names against the
//! whole stack. Attribute resolution differs from element resolution: an
//! unprefixed attribute is in no namespace, while an unprefixed element
//! takes the default namespace.

use crate::datatype::Namespaces;
use crate::model::ExpandedName;

/// The namespace the `xml` prefix is permanently bound to.
pub const XML_NAMESPACE_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace reserved for namespace declarations themselves.
pub const XMLNS_NAMESPACE_URI: &str = "http://www.w3.org/2000/xmlns/";

#[derive(Debug, PartialEq, Eq)]
pub enum ResolverError {
    UndefinedPrefix { prefix: String },
    ReservedPrefix { prefix: String },
    LeaveRootContext,
}

impl std::fmt::Display for ResolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolverError::UndefinedPrefix { prefix } => {
                write!(f, "the namespace prefix {prefix:?} is not defined")
            }
            ResolverError::ReservedPrefix { prefix } => {
                write!(f, "the namespace prefix {prefix:?} cannot be redefined")
            }
            ResolverError::LeaveRootContext => f.write_str("cannot leave the root context"),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Frame {
    // (prefix, namespace URI); "" as prefix is the default namespace
    bindings: Vec<(String, String)>,
}

/// A stack of prefix-binding frames.
#[derive(Debug, Clone)]
pub struct Resolver {
    frames: Vec<Frame>,
}

impl Default for Resolver {
    fn default() -> Resolver {
        Resolver::new()
    }
}

impl Resolver {
    pub fn new() -> Resolver {
        Resolver {
            frames: vec![Frame::default()],
        }
    }

    pub fn enter_context(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn leave_context(&mut self) -> Result<(), ResolverError> {
        if self.frames.len() == 1 {
            return Err(ResolverError::LeaveRootContext);
        }
        self.frames.pop();
        Ok(())
    }

    pub fn define_prefix(
        &mut self,
        prefix: impl Into<String>,
        uri: impl Into<String>,
    ) -> Result<(), ResolverError> {
        let prefix = prefix.into();
        if prefix == "xml" || prefix == "xmlns" {
            return Err(ResolverError::ReservedPrefix { prefix });
        }
        let frame = self.frames.last_mut().expect("root frame always present");
        // a redefinition within one frame shadows the earlier binding
        frame.bindings.retain(|(p, _)| p != &prefix);
        frame.bindings.push((prefix, uri.into()));
        Ok(())
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE_URI);
        }
        self.frames.iter().rev().find_map(|frame| {
            frame
                .bindings
                .iter()
                .rev()
                .find(|(p, _)| p == prefix)
                .map(|(_, uri)| uri.as_str())
        })
    }

    /// Expand `prefix:local` (or plain `local`) against the current stack.
    ///
    /// For `attribute = true` an unprefixed name resolves to no namespace;
    /// otherwise it takes the default namespace, if one is in scope. An
    /// empty-string default namespace undeclares the default, per the XML
    /// namespaces recommendation.
    pub fn resolve_name(&self, qname: &str, attribute: bool) -> Result<ExpandedName, ResolverError> {
        if let Some((prefix, local)) = qname.split_once(':') {
            let uri = self
                .lookup(prefix)
                .ok_or_else(|| ResolverError::UndefinedPrefix {
                    prefix: prefix.to_string(),
                })?;
            Ok(ExpandedName::new(uri, local))
        } else if attribute {
            Ok(ExpandedName::new("", qname))
        } else {
            let uri = self.lookup("").unwrap_or("");
            Ok(ExpandedName::new(uri, qname))
        }
    }
}

impl Namespaces for Resolver {
    fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        self.lookup(prefix)
    }
}
