//! The compiled grammar model: name classes and the immutable pattern tree.
//!
//! Patterns are stored in an arena indexed by [`PatId`] so that composite
//! patterns and `ref`-style back references are plain indices rather than
//! owned recursion. A [`Schema`] is frozen once the loader has built it;
//! validators only ever read it.

use crate::datatype::{Datatypes, DatatypeValues};

/// An XML name after namespace-prefix resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExpandedName {
    pub namespace_uri: String,
    pub local_name: String,
}

impl ExpandedName {
    pub fn new(namespace_uri: impl Into<String>, local_name: impl Into<String>) -> ExpandedName {
        ExpandedName {
            namespace_uri: namespace_uri.into(),
            local_name: local_name.into(),
        }
    }
}

impl std::fmt::Display for ExpandedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace_uri.is_empty() {
            f.write_str(&self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.namespace_uri, self.local_name)
        }
    }
}

/// A RELAX NG name class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameClass {
    Named {
        namespace_uri: String,
        name: String,
    },
    NsName {
        namespace_uri: String,
        except: Option<Box<NameClass>>,
    },
    AnyName {
        except: Option<Box<NameClass>>,
    },
    Alt {
        a: Box<NameClass>,
        b: Box<NameClass>,
    },
}

impl NameClass {
    pub fn contains(&self, name: &ExpandedName) -> bool {
        match self {
            NameClass::Named {
                namespace_uri,
                name: local,
            } => namespace_uri == &name.namespace_uri && local == &name.local_name,
            NameClass::NsName {
                namespace_uri,
                except,
            } => {
                namespace_uri == &name.namespace_uri
                    && !except.as_ref().is_some_and(|e| e.contains(name))
            }
            NameClass::AnyName { except } => !except.as_ref().is_some_and(|e| e.contains(name)),
            NameClass::Alt { a, b } => a.contains(name) || b.contains(name),
        }
    }

    /// Enumerate the names this class accepts, or `None` if the set is open
    /// (`NsName`/`AnyName` match infinitely many names).
    pub fn to_names(&self) -> Option<Vec<ExpandedName>> {
        match self {
            NameClass::Named {
                namespace_uri,
                name,
            } => Some(vec![ExpandedName::new(namespace_uri.clone(), name.clone())]),
            NameClass::NsName { .. } | NameClass::AnyName { .. } => None,
            NameClass::Alt { a, b } => {
                let mut names = a.to_names()?;
                names.extend(b.to_names()?);
                Some(names)
            }
        }
    }

    pub fn describe(&self, desc: &mut String) {
        match self {
            NameClass::Named {
                namespace_uri,
                name,
            } => {
                if namespace_uri.is_empty() {
                    desc.push_str(name);
                } else {
                    desc.push('{');
                    desc.push_str(namespace_uri);
                    desc.push('}');
                    desc.push_str(name);
                }
            }
            NameClass::NsName {
                namespace_uri,
                except,
            } => {
                desc.push('{');
                desc.push_str(namespace_uri);
                desc.push_str("}*");
                if let Some(except) = except {
                    desc.push('-');
                    except.describe(desc);
                }
            }
            NameClass::AnyName { except } => {
                desc.push('*');
                if let Some(except) = except {
                    desc.push('-');
                    except.describe(desc);
                }
            }
            NameClass::Alt { a, b } => {
                a.describe(desc);
                desc.push('|');
                b.describe(desc);
            }
        }
    }
}

/// Index of a pattern in the [`Schema`] arena.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub struct PatId(pub(crate) u32);

/// Index of a named definition in the [`Schema`] defines table.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub struct DefineId(pub(crate) u32);

/// A `value` pattern: text must equal a literal, compared in the value
/// space of its datatype.
#[derive(Debug, Clone)]
pub struct ValuePattern {
    pub value: DatatypeValues,
    pub raw: String,
    pub type_name: String,
}

/// A `data` pattern: text must be accepted by the datatype with its
/// parameter facets applied, and must not match `except`, if present.
#[derive(Debug, Clone)]
pub struct DataPattern {
    pub datatype: Datatypes,
    pub type_name: String,
    pub except: Option<PatId>,
}

// NameClass and the datatype payloads are boxed to keep the Pattern enum
// small; the arena is iterated a lot during nullability computation.
#[derive(Debug, Clone)]
pub enum Pattern {
    Empty,
    Text,
    NotAllowed,
    Choice(PatId, PatId),
    Group(PatId, PatId),
    Interleave(PatId, PatId),
    OneOrMore(PatId),
    List(PatId),
    Value(Box<ValuePattern>),
    Data(Box<DataPattern>),
    Attribute(Box<NameClass>, PatId),
    Element(Box<NameClass>, PatId),
    Ref(DefineId),
}

/// A named definition. In the simple form each define holds a single
/// `element` pattern; `ref`s resolve to it by index.
#[derive(Debug, Clone)]
pub struct Define {
    pub name: String,
    pub pattern: PatId,
}

/// A frozen, compiled grammar: the pattern arena, the defines table, the
/// start pattern, and the memoized nullability / attribute-reach bits.
///
/// Immutable after construction; shareable between threads and between any
/// number of concurrently running walkers.
#[derive(Debug)]
pub struct Schema {
    patterns: Vec<Pattern>,
    nullable: Vec<bool>,
    attrs: Vec<bool>,
    defines: Vec<Define>,
    start: PatId,
}

impl Schema {
    pub fn start(&self) -> PatId {
        self.start
    }

    pub fn pat(&self, id: PatId) -> &Pattern {
        &self.patterns[id.0 as usize]
    }

    pub fn define(&self, id: DefineId) -> &Define {
        &self.defines[id.0 as usize]
    }

    pub fn defines(&self) -> &[Define] {
        &self.defines
    }

    /// Whether the pattern accepts the empty event sequence.
    pub fn nullable(&self, id: PatId) -> bool {
        self.nullable[id.0 as usize]
    }

    /// Whether the pattern may contribute to attribute matching.
    pub fn has_attrs(&self, id: PatId) -> bool {
        self.attrs[id.0 as usize]
    }
}

/// Accumulates patterns while the loader reconstructs a grammar, then
/// freezes them into a [`Schema`].
///
/// The constructor methods perform the standard simplifications so that
/// degenerate input (`choice` against `notAllowed`, `group` against
/// `empty`, ...) does not survive into the frozen tree.
#[derive(Default)]
pub struct SchemaBuilder {
    patterns: Vec<Pattern>,
    defines: Vec<Define>,
}

impl SchemaBuilder {
    pub fn new() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn push(&mut self, p: Pattern) -> PatId {
        let id = PatId(self.patterns.len() as u32);
        self.patterns.push(p);
        id
    }

    fn is_not_allowed(&self, id: PatId) -> bool {
        matches!(self.patterns[id.0 as usize], Pattern::NotAllowed)
    }

    fn is_empty(&self, id: PatId) -> bool {
        matches!(self.patterns[id.0 as usize], Pattern::Empty)
    }

    pub fn empty(&mut self) -> PatId {
        self.push(Pattern::Empty)
    }

    pub fn text(&mut self) -> PatId {
        self.push(Pattern::Text)
    }

    pub fn not_allowed(&mut self) -> PatId {
        self.push(Pattern::NotAllowed)
    }

    pub fn choice(&mut self, left: PatId, right: PatId) -> PatId {
        if self.is_not_allowed(left) {
            return right;
        }
        if self.is_not_allowed(right) {
            return left;
        }
        if left == right {
            return left;
        }
        self.push(Pattern::Choice(left, right))
    }

    pub fn group(&mut self, left: PatId, right: PatId) -> PatId {
        if self.is_not_allowed(left) || self.is_not_allowed(right) {
            return self.not_allowed();
        }
        if self.is_empty(left) {
            return right;
        }
        if self.is_empty(right) {
            return left;
        }
        self.push(Pattern::Group(left, right))
    }

    pub fn interleave(&mut self, left: PatId, right: PatId) -> PatId {
        if self.is_not_allowed(left) || self.is_not_allowed(right) {
            return self.not_allowed();
        }
        if self.is_empty(left) {
            return right;
        }
        if self.is_empty(right) {
            return left;
        }
        self.push(Pattern::Interleave(left, right))
    }

    pub fn one_or_more(&mut self, p: PatId) -> PatId {
        if self.is_not_allowed(p) {
            return self.not_allowed();
        }
        self.push(Pattern::OneOrMore(p))
    }

    pub fn list(&mut self, p: PatId) -> PatId {
        self.push(Pattern::List(p))
    }

    pub fn element(&mut self, name: NameClass, p: PatId) -> PatId {
        self.push(Pattern::Element(Box::new(name), p))
    }

    pub fn attribute(&mut self, name: NameClass, p: PatId) -> PatId {
        self.push(Pattern::Attribute(Box::new(name), p))
    }

    /// Reserve a slot in the defines table. The pattern is filled in later
    /// by [`SchemaBuilder::resolve_define`], allowing mutually recursive
    /// definitions to reference each other by index while being built.
    pub fn declare_define(&mut self, name: impl Into<String>) -> DefineId {
        let id = DefineId(self.defines.len() as u32);
        self.defines.push(Define {
            name: name.into(),
            // placeholder until resolve_define(); never read before then
            pattern: PatId(u32::MAX),
        });
        id
    }

    pub fn resolve_define(&mut self, id: DefineId, pattern: PatId) {
        self.defines[id.0 as usize].pattern = pattern;
    }

    pub fn reference(&mut self, id: DefineId) -> PatId {
        self.push(Pattern::Ref(id))
    }

    /// Freeze the arena, computing the nullability and attribute-reach
    /// memos by fixpoint (recursion through `ref` needs iteration to
    /// stabilise; element boundaries make it converge quickly).
    pub fn finish(self, start: PatId) -> Schema {
        let SchemaBuilder { patterns, defines } = self;
        let mut nullable = vec![false; patterns.len()];
        let mut attrs = vec![false; patterns.len()];
        loop {
            let mut changed = false;
            for (i, p) in patterns.iter().enumerate() {
                let (n, a) = match *p {
                    Pattern::Empty | Pattern::Text => (true, false),
                    Pattern::NotAllowed => (false, false),
                    Pattern::Choice(l, r) => (
                        nullable[l.0 as usize] || nullable[r.0 as usize],
                        attrs[l.0 as usize] || attrs[r.0 as usize],
                    ),
                    Pattern::Group(l, r) | Pattern::Interleave(l, r) => (
                        nullable[l.0 as usize] && nullable[r.0 as usize],
                        attrs[l.0 as usize] || attrs[r.0 as usize],
                    ),
                    Pattern::OneOrMore(c) => (nullable[c.0 as usize], attrs[c.0 as usize]),
                    Pattern::List(_) | Pattern::Value(_) | Pattern::Data(_) => (false, false),
                    Pattern::Attribute(_, _) => (false, true),
                    Pattern::Element(_, _) => (false, false),
                    Pattern::Ref(d) => {
                        let target = defines[d.0 as usize].pattern;
                        (nullable[target.0 as usize], attrs[target.0 as usize])
                    }
                };
                if n != nullable[i] || a != attrs[i] {
                    nullable[i] = n;
                    attrs[i] = a;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        Schema {
            patterns,
            nullable,
            attrs,
            defines,
            start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(local: &str) -> NameClass {
        NameClass::Named {
            namespace_uri: String::new(),
            name: local.to_string(),
        }
    }

    #[test]
    fn name_class_matching() {
        let nc = NameClass::Alt {
            a: Box::new(name("a")),
            b: Box::new(NameClass::NsName {
                namespace_uri: "urn:x".to_string(),
                except: Some(Box::new(NameClass::Named {
                    namespace_uri: "urn:x".to_string(),
                    name: "hidden".to_string(),
                })),
            }),
        };
        assert!(nc.contains(&ExpandedName::new("", "a")));
        assert!(!nc.contains(&ExpandedName::new("", "b")));
        assert!(nc.contains(&ExpandedName::new("urn:x", "anything")));
        assert!(!nc.contains(&ExpandedName::new("urn:x", "hidden")));
    }

    #[test]
    fn name_class_enumeration() {
        let nc = NameClass::Alt {
            a: Box::new(name("a")),
            b: Box::new(name("b")),
        };
        let names = nc.to_names().unwrap();
        assert_eq!(
            names,
            vec![ExpandedName::new("", "a"), ExpandedName::new("", "b")]
        );
        assert_eq!(NameClass::AnyName { except: None }.to_names(), None);
    }

    #[test]
    fn builder_simplifications() {
        let mut b = SchemaBuilder::new();
        let e = b.empty();
        let na = b.not_allowed();
        let t = b.text();
        // choice against notAllowed folds to the other operand
        assert_eq!(b.choice(t, na), t);
        assert_eq!(b.choice(na, t), t);
        // group and interleave against empty fold to the other operand
        assert_eq!(b.group(t, e), t);
        assert_eq!(b.interleave(e, t), t);
    }

    #[test]
    fn nullability_memo() {
        let mut b = SchemaBuilder::new();
        let e = b.empty();
        let t = b.text();
        let elem = b.element(name("x"), e);
        let one = b.one_or_more(elem);
        let opt = b.choice(one, e);
        let g = b.group(t, elem);
        let schema = b.finish(opt);
        assert!(schema.nullable(e));
        assert!(schema.nullable(t));
        assert!(!schema.nullable(elem));
        assert!(!schema.nullable(one));
        assert!(schema.nullable(opt));
        assert!(!schema.nullable(g));
    }

    #[test]
    fn attribute_reach_memo() {
        let mut b = SchemaBuilder::new();
        let t = b.text();
        let att = b.attribute(name("a"), t);
        let elem = b.element(name("x"), att);
        let g = b.group(att, elem);
        let schema = b.finish(g);
        assert!(schema.has_attrs(att));
        // attributes inside a child element do not leak upward
        assert!(!schema.has_attrs(elem));
        assert!(schema.has_attrs(g));
    }

    #[test]
    fn recursive_ref_nullability_terminates() {
        // d1 = element a { ref d2 ? }   d2 = element b { ref d1 ? }
        let mut b = SchemaBuilder::new();
        let d1 = b.declare_define("d1");
        let d2 = b.declare_define("d2");
        let r2 = b.reference(d2);
        let e1 = b.empty();
        let opt2 = b.choice(r2, e1);
        let el1 = b.element(name("a"), opt2);
        b.resolve_define(d1, el1);
        let r1 = b.reference(d1);
        let e2 = b.empty();
        let opt1 = b.choice(r1, e2);
        let el2 = b.element(name("b"), opt1);
        b.resolve_define(d2, el2);
        let start = b.reference(d1);
        let schema = b.finish(start);
        assert!(!schema.nullable(start));
        assert!(!schema.has_attrs(start));
    }
}
