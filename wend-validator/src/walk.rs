//! The pattern automaton: one mutable walker per pattern variant, plus
//! the top-level [`GrammarWalker`] that expands qualified names and keeps
//! validation going after errors.
//!
//! Walkers are stateful derivatives: instead of constructing a new
//! pattern for every event, each walker mutates itself (or forks, for
//! `choice`) to represent the derivative. The contract shared by every
//! variant:
//!
//! * `fire` consumes an event or leaves the walker untouched — a
//!   `matched = false` result guarantees no state changed, which is what
//!   lets `choice` and `interleave` offer one event to several branches.
//! * `can_end` / `can_end_attribute` answer whether the walker could
//!   legally stop now; `end` / `end_attributes` report why not.
//! * `Clone` is a deep copy with identical future behaviour; walkers own
//!   their sub-walkers outright, so no sharing needs to be preserved.

use crate::event::{
    Event, FireResult, NameSpec, PossibleEvent, QEvent, ValidationError, ValueSpec,
    describe_possible,
};
use fnv::FnvHashSet;
use wend_model::model::{DataPattern, NameClass, PatId, Pattern, Schema, ValuePattern};
use wend_model::resolver::Resolver;
use wend_model::ExpandedName;

pub(crate) fn is_whitespace_str(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}

/// Everything a walker needs besides its own state.
pub(crate) struct Ctx<'a> {
    pub schema: &'a Schema,
    pub resolver: &'a Resolver,
}

fn push_name_specs(
    nc: &NameClass,
    out: &mut FnvHashSet<PossibleEvent>,
    make: fn(NameSpec) -> PossibleEvent,
) {
    match nc {
        NameClass::Named {
            namespace_uri,
            name,
        } => {
            out.insert(make(NameSpec::Name(ExpandedName::new(
                namespace_uri.clone(),
                name.clone(),
            ))));
        }
        NameClass::NsName { namespace_uri, .. } => {
            out.insert(make(NameSpec::AnyIn(namespace_uri.clone())));
        }
        NameClass::AnyName { .. } => {
            out.insert(make(NameSpec::Any));
        }
        NameClass::Alt { a, b } => {
            push_name_specs(a, out, make);
            push_name_specs(b, out, make);
        }
    }
}

/// Feed a lone text value to a fresh walker for `pat` and see whether it
/// forms a complete match. Whitespace-only values also match nullable
/// patterns.
fn value_match(ctx: &Ctx<'_>, pat: PatId, value: &str) -> bool {
    if ctx.schema.nullable(pat) && is_whitespace_str(value) {
        return true;
    }
    let mut w = new_walker(ctx.schema, pat);
    if value.is_empty() {
        return w.can_end(ctx);
    }
    let r = w.fire(ctx, &Event::Text(value.to_string()));
    r.matched && w.can_end(ctx)
}

pub(crate) fn new_walker(schema: &Schema, pat: PatId) -> Walker {
    match schema.pat(pat) {
        Pattern::Empty => Walker::Empty,
        Pattern::Text => Walker::Text,
        Pattern::NotAllowed => Walker::NotAllowed,
        Pattern::Value(_) => Walker::Value(ValueWalker {
            pat,
            matched: false,
        }),
        Pattern::Data(_) => Walker::Data(DataWalker {
            pat,
            matched: false,
        }),
        Pattern::List(_) => Walker::List(ListWalker {
            pat,
            matched: false,
        }),
        Pattern::OneOrMore(child) => Walker::OneOrMore(OneOrMoreWalker {
            child: *child,
            current: Box::new(new_walker(schema, *child)),
        }),
        Pattern::Choice(a, b) => Walker::Choice(ChoiceWalker {
            a: Some(Box::new(new_walker(schema, *a))),
            b: Some(Box::new(new_walker(schema, *b))),
        }),
        Pattern::Group(a, b) => Walker::Group(GroupWalker {
            a: Box::new(new_walker(schema, *a)),
            b: Box::new(new_walker(schema, *b)),
            in_b: false,
        }),
        Pattern::Interleave(a, b) => Walker::Interleave(InterleaveWalker {
            a: Box::new(new_walker(schema, *a)),
            b: Box::new(new_walker(schema, *b)),
            in_flight: None,
            depth: 0,
        }),
        Pattern::Attribute(_, _) => Walker::Attribute(AttributeWalker {
            pat,
            name: None,
            value_ok: false,
            closed: false,
        }),
        // the content walker is created lazily at the start tag, which is
        // what keeps ref-recursion bounded by document depth
        Pattern::Element(_, _) => Walker::Element(ElementWalker {
            pat,
            state: ElemState::ExpectStart,
        }),
        Pattern::Ref(define) => new_walker(schema, schema.define(*define).pattern),
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Walker {
    Empty,
    Text,
    NotAllowed,
    Value(ValueWalker),
    Data(DataWalker),
    List(ListWalker),
    OneOrMore(OneOrMoreWalker),
    Choice(ChoiceWalker),
    Group(GroupWalker),
    Interleave(InterleaveWalker),
    Attribute(AttributeWalker),
    Element(ElementWalker),
}

#[derive(Debug, Clone)]
pub(crate) struct ValueWalker {
    pat: PatId,
    matched: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct DataWalker {
    pat: PatId,
    matched: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ListWalker {
    pat: PatId,
    matched: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct OneOrMoreWalker {
    child: PatId,
    current: Box<Walker>,
}

#[derive(Debug, Clone)]
pub(crate) struct ChoiceWalker {
    a: Option<Box<Walker>>,
    b: Option<Box<Walker>>,
}

#[derive(Debug, Clone)]
pub(crate) struct GroupWalker {
    a: Box<Walker>,
    b: Box<Walker>,
    // once the second member consumes a content event the first is done;
    // attribute events stay order-free and never set this
    in_b: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    A,
    B,
}

#[derive(Debug, Clone)]
pub(crate) struct InterleaveWalker {
    a: Box<Walker>,
    b: Box<Walker>,
    /// The branch currently inside an open element, if any; it must reach
    /// tag balance before control may switch to the other branch.
    in_flight: Option<Branch>,
    depth: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct AttributeWalker {
    pat: PatId,
    name: Option<ExpandedName>,
    value_ok: bool,
    closed: bool,
}

#[derive(Debug, Clone)]
enum ElemState {
    ExpectStart,
    InAttributes(Box<Walker>),
    InContent(Box<Walker>),
    Ended,
}

#[derive(Debug, Clone)]
pub(crate) struct ElementWalker {
    pat: PatId,
    state: ElemState,
}

impl ElementWalker {
    fn parts<'s>(&self, schema: &'s Schema) -> (&'s NameClass, PatId) {
        match schema.pat(self.pat) {
            Pattern::Element(nc, child) => (nc, *child),
            other => unreachable!("element walker bound to {other:?}"),
        }
    }
}

impl AttributeWalker {
    fn parts<'s>(&self, schema: &'s Schema) -> (&'s NameClass, PatId) {
        match schema.pat(self.pat) {
            Pattern::Attribute(nc, child) => (nc, *child),
            other => unreachable!("attribute walker bound to {other:?}"),
        }
    }
}

fn value_pattern<'s>(schema: &'s Schema, pat: PatId) -> &'s ValuePattern {
    match schema.pat(pat) {
        Pattern::Value(v) => v,
        other => unreachable!("value walker bound to {other:?}"),
    }
}

fn data_pattern<'s>(schema: &'s Schema, pat: PatId) -> &'s DataPattern {
    match schema.pat(pat) {
        Pattern::Data(d) => d,
        other => unreachable!("data walker bound to {other:?}"),
    }
}

fn list_child(schema: &Schema, pat: PatId) -> PatId {
    match schema.pat(pat) {
        Pattern::List(child) => *child,
        other => unreachable!("list walker bound to {other:?}"),
    }
}

/// Would a fresh walker for `pat` accept `token` as its complete input?
fn pattern_accepts_token(ctx: &Ctx<'_>, pat: PatId, token: &str) -> bool {
    let mut w = new_walker(ctx.schema, pat);
    if token.is_empty() {
        return w.can_end(ctx);
    }
    let r = w.fire(ctx, &Event::Text(token.to_string()));
    r.matched && w.can_end(ctx)
}

fn data_allows(ctx: &Ctx<'_>, data: &DataPattern, value: &str) -> bool {
    data.datatype.allows(value, ctx.resolver)
        && !data
            .except
            .is_some_and(|except| pattern_accepts_token(ctx, except, value))
}

impl Walker {
    pub(crate) fn fire(&mut self, ctx: &Ctx<'_>, event: &Event) -> FireResult {
        match self {
            // whitespace-only text around markup is dropped at the top
            // level, never consumed by a walker; letting walkers eat it
            // would disturb choice pruning and oneOrMore restarts
            Walker::Empty => FireResult::not_matched(),
            Walker::Text => match event {
                Event::Text(_) => FireResult::matched(),
                _ => FireResult::not_matched(),
            },
            Walker::NotAllowed => FireResult::not_matched(),
            Walker::Value(w) => match event {
                Event::Text(text) if !w.matched => {
                    let value = value_pattern(ctx.schema, w.pat);
                    if value.value.matches(text, ctx.resolver) {
                        w.matched = true;
                        FireResult::matched()
                    } else {
                        FireResult::not_matched()
                    }
                }
                _ => FireResult::not_matched(),
            },
            Walker::Data(w) => match event {
                Event::Text(text) if !w.matched => {
                    let data = data_pattern(ctx.schema, w.pat);
                    if data_allows(ctx, data, text) {
                        w.matched = true;
                        FireResult::matched()
                    } else {
                        FireResult::not_matched()
                    }
                }
                _ => FireResult::not_matched(),
            },
            Walker::List(w) => match event {
                Event::Text(text) if !w.matched => {
                    let child = list_child(ctx.schema, w.pat);
                    let mut item_walker = new_walker(ctx.schema, child);
                    for token in text.split([' ', '\t', '\r', '\n']).filter(|t| !t.is_empty()) {
                        let r = item_walker.fire(ctx, &Event::Text(token.to_string()));
                        if !r.matched {
                            return FireResult::not_matched();
                        }
                    }
                    if item_walker.can_end(ctx) {
                        w.matched = true;
                        FireResult::matched()
                    } else {
                        FireResult::not_matched()
                    }
                }
                _ => FireResult::not_matched(),
            },
            Walker::OneOrMore(w) => {
                let r = w.current.fire(ctx, event);
                if r.matched {
                    return r;
                }
                if w.current.can_end(ctx) {
                    let mut fresh = new_walker(ctx.schema, w.child);
                    let r = fresh.fire(ctx, event);
                    if r.matched {
                        w.current = Box::new(fresh);
                        return r;
                    }
                }
                FireResult::not_matched()
            }
            Walker::Choice(w) => match (&mut w.a, &mut w.b) {
                (Some(a), Some(b)) => {
                    let ra = a.fire(ctx, event);
                    let rb = b.fire(ctx, event);
                    match (ra.matched, rb.matched) {
                        (true, true) => {
                            if ra.errors.is_empty() || !rb.errors.is_empty() {
                                FireResult::matched_with(ra.errors)
                            } else {
                                FireResult::matched()
                            }
                        }
                        (true, false) => {
                            w.b = None;
                            ra
                        }
                        (false, true) => {
                            w.a = None;
                            rb
                        }
                        (false, false) => FireResult::not_matched(),
                    }
                }
                (Some(only), None) | (None, Some(only)) => only.fire(ctx, event),
                (None, None) => FireResult::not_matched(),
            },
            Walker::Group(w) => {
                if event.is_attribute_event() {
                    // attributes match in any order, wherever they sit in
                    // the group
                    let ra = w.a.fire(ctx, event);
                    if ra.matched {
                        return ra;
                    }
                    return w.b.fire(ctx, event);
                }
                if w.in_b {
                    return w.b.fire(ctx, event);
                }
                let ra = w.a.fire(ctx, event);
                if ra.matched {
                    return ra;
                }
                if w.a.can_end(ctx) {
                    let rb = w.b.fire(ctx, event);
                    if rb.matched {
                        w.in_b = true;
                        return rb;
                    }
                }
                FireResult::not_matched()
            }
            Walker::Interleave(w) => {
                if let Some(branch) = w.in_flight {
                    if !event.is_attribute_event() || w.depth > 0 {
                        let side = match branch {
                            Branch::A => &mut w.a,
                            Branch::B => &mut w.b,
                        };
                        let r = side.fire(ctx, event);
                        if r.matched {
                            match event {
                                Event::EnterStartTag(_) => w.depth += 1,
                                Event::EndTag(_) => {
                                    w.depth -= 1;
                                    if w.depth == 0 {
                                        w.in_flight = None;
                                    }
                                }
                                _ => {}
                            }
                        }
                        return r;
                    }
                }
                let ra = w.a.fire(ctx, event);
                if ra.matched {
                    if let Event::EnterStartTag(_) = event {
                        w.in_flight = Some(Branch::A);
                        w.depth = 1;
                    }
                    return ra;
                }
                let rb = w.b.fire(ctx, event);
                if rb.matched {
                    if let Event::EnterStartTag(_) = event {
                        w.in_flight = Some(Branch::B);
                        w.depth = 1;
                    }
                    return rb;
                }
                FireResult::not_matched()
            }
            Walker::Attribute(w) => match event {
                Event::AttributeName(name) if w.name.is_none() && !w.closed => {
                    let (nc, _) = w.parts(ctx.schema);
                    if nc.contains(name) {
                        w.name = Some(name.clone());
                        FireResult::matched()
                    } else {
                        FireResult::not_matched()
                    }
                }
                Event::AttributeValue(value) if w.name.is_some() && !w.value_ok => {
                    let (_, child) = w.parts(ctx.schema);
                    let ok = value_match(ctx, child, value);
                    w.value_ok = true;
                    if ok {
                        FireResult::matched()
                    } else {
                        let name = w.name.as_ref().unwrap().to_string();
                        FireResult::matched_with(vec![ValidationError::AttributeValue {
                            name,
                            value: value.clone(),
                        }])
                    }
                }
                _ => FireResult::not_matched(),
            },
            Walker::Element(w) => match &mut w.state {
                ElemState::ExpectStart => match event {
                    Event::EnterStartTag(name) => {
                        let (nc, child) = w.parts(ctx.schema);
                        if nc.contains(name) {
                            w.state =
                                ElemState::InAttributes(Box::new(new_walker(ctx.schema, child)));
                            FireResult::matched()
                        } else {
                            FireResult::not_matched()
                        }
                    }
                    _ => FireResult::not_matched(),
                },
                ElemState::InAttributes(content) => match event {
                    Event::AttributeName(_) | Event::AttributeValue(_) => {
                        content.fire(ctx, event)
                    }
                    Event::LeaveStartTag => {
                        let errors = content.end_attributes(ctx);
                        let content = std::mem::replace(content, Box::new(Walker::Empty));
                        w.state = ElemState::InContent(content);
                        FireResult::matched_with(errors)
                    }
                    _ => FireResult::not_matched(),
                },
                ElemState::InContent(content) => match event {
                    Event::EndTag(_) => {
                        let nested = content.fire(ctx, event);
                        if nested.matched {
                            return nested;
                        }
                        let errors = if content.can_end(ctx) {
                            Vec::new()
                        } else {
                            let mut errors = content.end(ctx);
                            if errors.is_empty() {
                                errors.push(ValidationError::Unexpected {
                                    message: "element ended before its content was complete"
                                        .to_string(),
                                });
                            }
                            errors
                        };
                        w.state = ElemState::Ended;
                        FireResult::matched_with(errors)
                    }
                    _ => content.fire(ctx, event),
                },
                ElemState::Ended => FireResult::not_matched(),
            },
        }
    }

    pub(crate) fn can_end(&self, ctx: &Ctx<'_>) -> bool {
        match self {
            Walker::Empty | Walker::Text => true,
            Walker::NotAllowed => false,
            Walker::Value(w) => {
                w.matched || {
                    let value = value_pattern(ctx.schema, w.pat);
                    value.value.matches("", ctx.resolver)
                }
            }
            Walker::Data(w) => {
                w.matched || {
                    let data = data_pattern(ctx.schema, w.pat);
                    data_allows(ctx, data, "")
                }
            }
            Walker::List(w) => {
                w.matched || pattern_accepts_token(ctx, list_child(ctx.schema, w.pat), "")
            }
            Walker::OneOrMore(w) => w.current.can_end(ctx),
            Walker::Choice(w) => {
                w.a.as_ref().map(|a| a.can_end(ctx)).unwrap_or(false)
                    || w.b.as_ref().map(|b| b.can_end(ctx)).unwrap_or(false)
            }
            Walker::Group(w) => w.a.can_end(ctx) && w.b.can_end(ctx),
            Walker::Interleave(w) => w.a.can_end(ctx) && w.b.can_end(ctx),
            Walker::Attribute(w) => w.value_ok || w.closed,
            Walker::Element(w) => matches!(w.state, ElemState::Ended),
        }
    }

    pub(crate) fn can_end_attribute(&self, ctx: &Ctx<'_>) -> bool {
        match self {
            Walker::Empty
            | Walker::Text
            | Walker::NotAllowed
            | Walker::Value(_)
            | Walker::Data(_)
            | Walker::List(_)
            | Walker::Element(_) => true,
            Walker::OneOrMore(w) => w.current.can_end_attribute(ctx),
            Walker::Choice(w) => {
                w.a.as_ref().map(|a| a.can_end_attribute(ctx)).unwrap_or(false)
                    || w.b.as_ref().map(|b| b.can_end_attribute(ctx)).unwrap_or(false)
            }
            Walker::Group(w) => w.a.can_end_attribute(ctx) && w.b.can_end_attribute(ctx),
            Walker::Interleave(w) => w.a.can_end_attribute(ctx) && w.b.can_end_attribute(ctx),
            Walker::Attribute(w) => w.value_ok,
        }
    }

    /// Report why the walker cannot end; empty when it can.
    pub(crate) fn end(&self, ctx: &Ctx<'_>) -> Vec<ValidationError> {
        if self.can_end(ctx) {
            return Vec::new();
        }
        match self {
            Walker::Empty | Walker::Text => Vec::new(),
            Walker::NotAllowed => vec![ValidationError::Unexpected {
                message: "content not allowed here".to_string(),
            }],
            Walker::Value(w) => {
                let value = value_pattern(ctx.schema, w.pat);
                vec![ValidationError::Unexpected {
                    message: format!("expected text equal to {:?}", value.raw),
                }]
            }
            Walker::Data(w) => {
                let data = data_pattern(ctx.schema, w.pat);
                vec![ValidationError::Unexpected {
                    message: format!("expected a value of datatype {}", data.type_name),
                }]
            }
            Walker::List(_) => vec![ValidationError::Unexpected {
                message: "expected a whitespace-separated list of values".to_string(),
            }],
            Walker::OneOrMore(w) => w.current.end(ctx),
            Walker::Choice(_) => {
                let mut possible = FnvHashSet::default();
                self.possible(ctx, &mut possible);
                vec![ValidationError::Choice {
                    expected: describe_possible(&possible),
                }]
            }
            Walker::Group(w) => {
                let mut errors = w.a.end(ctx);
                errors.extend(w.b.end(ctx));
                errors
            }
            Walker::Interleave(w) => {
                let mut errors = w.a.end(ctx);
                errors.extend(w.b.end(ctx));
                errors
            }
            Walker::Attribute(_) => Vec::new(),
            Walker::Element(w) => {
                let (nc, _) = w.parts(ctx.schema);
                let mut desc = String::new();
                nc.describe(&mut desc);
                match w.state {
                    ElemState::ExpectStart => vec![ValidationError::Unexpected {
                        message: format!("missing required element: {desc}"),
                    }],
                    _ => vec![ValidationError::Unexpected {
                        message: format!("element {desc} left unclosed"),
                    }],
                }
            }
        }
    }

    /// Close the attribute phase: report required attributes that never
    /// arrived and stop attribute walkers from matching content-phase
    /// events. Called exactly once, at `LeaveStartTag`.
    pub(crate) fn end_attributes(&mut self, ctx: &Ctx<'_>) -> Vec<ValidationError> {
        match self {
            Walker::Empty
            | Walker::Text
            | Walker::NotAllowed
            | Walker::Value(_)
            | Walker::Data(_)
            | Walker::List(_)
            | Walker::Element(_) => Vec::new(),
            Walker::OneOrMore(w) => w.current.end_attributes(ctx),
            Walker::Choice(w) => match (&mut w.a, &mut w.b) {
                (Some(a), Some(b)) => {
                    match (a.can_end_attribute(ctx), b.can_end_attribute(ctx)) {
                        (true, true) => {
                            let mut errors = a.end_attributes(ctx);
                            errors.extend(b.end_attributes(ctx));
                            errors
                        }
                        (true, false) => {
                            let errors = a.end_attributes(ctx);
                            w.b = None;
                            errors
                        }
                        (false, true) => {
                            let errors = b.end_attributes(ctx);
                            w.a = None;
                            errors
                        }
                        (false, false) => {
                            let mut possible = FnvHashSet::default();
                            a.possible_attributes(ctx, &mut possible);
                            b.possible_attributes(ctx, &mut possible);
                            a.end_attributes(ctx);
                            b.end_attributes(ctx);
                            vec![ValidationError::Choice {
                                expected: describe_possible(&possible),
                            }]
                        }
                    }
                }
                (Some(only), None) | (None, Some(only)) => only.end_attributes(ctx),
                (None, None) => Vec::new(),
            },
            Walker::Group(w) => {
                let mut errors = w.a.end_attributes(ctx);
                errors.extend(w.b.end_attributes(ctx));
                errors
            }
            Walker::Interleave(w) => {
                let mut errors = w.a.end_attributes(ctx);
                errors.extend(w.b.end_attributes(ctx));
                errors
            }
            Walker::Attribute(w) => {
                let missing = w.name.is_none() && !w.closed;
                w.closed = true;
                if missing {
                    let (nc, _) = w.parts(ctx.schema);
                    let mut expected = String::new();
                    nc.describe(&mut expected);
                    vec![ValidationError::AttributeMissing { expected }]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Accumulate the content events currently acceptable.
    pub(crate) fn possible(&self, ctx: &Ctx<'_>, out: &mut FnvHashSet<PossibleEvent>) {
        match self {
            Walker::Empty | Walker::NotAllowed => {}
            Walker::Text => {
                out.insert(PossibleEvent::Text);
            }
            Walker::Value(w) => {
                if !w.matched {
                    out.insert(PossibleEvent::Text);
                }
            }
            Walker::Data(w) => {
                if !w.matched {
                    out.insert(PossibleEvent::Text);
                }
            }
            Walker::List(w) => {
                if !w.matched {
                    out.insert(PossibleEvent::Text);
                }
            }
            Walker::OneOrMore(w) => {
                w.current.possible(ctx, out);
                if w.current.can_end(ctx) {
                    new_walker(ctx.schema, w.child).possible(ctx, out);
                }
            }
            Walker::Choice(w) => {
                if let Some(a) = &w.a {
                    a.possible(ctx, out);
                }
                if let Some(b) = &w.b {
                    b.possible(ctx, out);
                }
            }
            Walker::Group(w) => {
                if w.in_b {
                    w.b.possible(ctx, out);
                } else {
                    w.a.possible(ctx, out);
                    if w.a.can_end(ctx) {
                        w.b.possible(ctx, out);
                    }
                }
            }
            Walker::Interleave(w) => match w.in_flight {
                Some(Branch::A) => w.a.possible(ctx, out),
                Some(Branch::B) => w.b.possible(ctx, out),
                None => {
                    w.a.possible(ctx, out);
                    w.b.possible(ctx, out);
                }
            },
            Walker::Attribute(_) => {}
            Walker::Element(w) => match &w.state {
                ElemState::ExpectStart => {
                    let (nc, _) = w.parts(ctx.schema);
                    push_name_specs(nc, out, PossibleEvent::EnterStartTag);
                }
                ElemState::InAttributes(content) => {
                    content.possible_attributes(ctx, out);
                    if content.can_end_attribute(ctx) {
                        out.insert(PossibleEvent::LeaveStartTag);
                    }
                }
                ElemState::InContent(content) => {
                    content.possible(ctx, out);
                    if content.can_end(ctx) {
                        out.insert(PossibleEvent::EndTag);
                    }
                }
                ElemState::Ended => {}
            },
        }
    }

    /// Accumulate the attribute events currently acceptable.
    pub(crate) fn possible_attributes(&self, ctx: &Ctx<'_>, out: &mut FnvHashSet<PossibleEvent>) {
        match self {
            Walker::Empty
            | Walker::Text
            | Walker::NotAllowed
            | Walker::Value(_)
            | Walker::Data(_)
            | Walker::List(_)
            | Walker::Element(_) => {}
            Walker::OneOrMore(w) => {
                w.current.possible_attributes(ctx, out);
            }
            Walker::Choice(w) => {
                if let Some(a) = &w.a {
                    a.possible_attributes(ctx, out);
                }
                if let Some(b) = &w.b {
                    b.possible_attributes(ctx, out);
                }
            }
            Walker::Group(w) => {
                w.a.possible_attributes(ctx, out);
                w.b.possible_attributes(ctx, out);
            }
            Walker::Interleave(w) => {
                w.a.possible_attributes(ctx, out);
                w.b.possible_attributes(ctx, out);
            }
            Walker::Attribute(w) => {
                if w.closed {
                    return;
                }
                let (nc, child) = w.parts(ctx.schema);
                if w.name.is_none() {
                    push_name_specs(nc, out, PossibleEvent::AttributeName);
                } else if !w.value_ok {
                    let spec = match ctx.schema.pat(child) {
                        Pattern::Value(v) => ValueSpec::Literal(v.raw.clone()),
                        _ => ValueSpec::Any,
                    };
                    out.insert(PossibleEvent::AttributeValue(spec));
                }
            }
        }
    }
}

/// The top-level driver for one validation session: owns the name
/// resolver, expands qualified names, dispatches events to the walker
/// tree, and keeps the session usable after errors by skipping unmatched
/// subtrees.
#[derive(Clone)]
pub struct GrammarWalker<'s> {
    schema: &'s Schema,
    resolver: Resolver,
    root: Walker,
    /// Depth of an unmatched element subtree being skipped.
    skip_depth: u32,
    /// Swallow the value event paired with a rejected attribute name.
    swallow_attribute_value: bool,
}

impl<'s> GrammarWalker<'s> {
    pub fn new(schema: &'s Schema) -> GrammarWalker<'s> {
        GrammarWalker {
            schema,
            resolver: Resolver::new(),
            root: new_walker(schema, schema.start()),
            skip_depth: 0,
            swallow_attribute_value: false,
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// The resolver this walker expands names against. The driving layer
    /// is expected to push a context per open element, define the
    /// prefixes its `xmlns` attributes introduce, and pop the context
    /// after the matching end tag.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut Resolver {
        &mut self.resolver
    }

    /// Offer one event. An empty result means the event was accepted;
    /// errors are reported, never raised, and the walker remains usable.
    pub fn fire_event(&mut self, event: QEvent<'_>) -> Vec<ValidationError> {
        if self.skip_depth > 0 {
            match event {
                QEvent::EnterStartTag { .. } => self.skip_depth += 1,
                QEvent::EndTag { .. } => self.skip_depth -= 1,
                _ => {}
            }
            return Vec::new();
        }
        if self.swallow_attribute_value {
            self.swallow_attribute_value = false;
            if let QEvent::AttributeValue { .. } = event {
                return Vec::new();
            }
        }
        let expanded = match event {
            QEvent::EnterStartTag { name } => {
                match self.resolver.resolve_name(name, false) {
                    Ok(name) => Event::EnterStartTag(name),
                    Err(_) => {
                        // the whole subtree under the unresolvable name is
                        // unmatchable; skip it
                        self.skip_depth = 1;
                        return vec![ValidationError::ElementName {
                            name: ExpandedName::new("", name),
                        }];
                    }
                }
            }
            QEvent::LeaveStartTag => Event::LeaveStartTag,
            QEvent::AttributeName { name } => match self.resolver.resolve_name(name, true) {
                Ok(name) => Event::AttributeName(name),
                Err(_) => {
                    self.swallow_attribute_value = true;
                    return vec![ValidationError::AttributeName {
                        name: ExpandedName::new("", name),
                    }];
                }
            },
            QEvent::AttributeValue { value } => Event::AttributeValue(value.to_string()),
            QEvent::Text { text } => Event::Text(text.to_string()),
            QEvent::EndTag { name } => {
                // a prefix failure here was already reported at the start
                // tag; close with the raw name
                let name = self
                    .resolver
                    .resolve_name(name, false)
                    .unwrap_or_else(|_| ExpandedName::new("", name));
                Event::EndTag(name)
            }
        };
        let ctx = Ctx {
            schema: self.schema,
            resolver: &self.resolver,
        };
        let result = self.root.fire(&ctx, &expanded);
        if result.matched {
            return result.errors;
        }
        match expanded {
            Event::EnterStartTag(name) => {
                self.skip_depth = 1;
                vec![ValidationError::ElementName { name }]
            }
            Event::AttributeName(name) => {
                self.swallow_attribute_value = true;
                vec![ValidationError::AttributeName { name }]
            }
            Event::AttributeValue(_) => vec![ValidationError::Unexpected {
                message: "attribute value without a matching attribute name".to_string(),
            }],
            Event::Text(text) => {
                if is_whitespace_str(&text) {
                    Vec::new()
                } else {
                    vec![ValidationError::Unexpected {
                        message: "text not allowed here".to_string(),
                    }]
                }
            }
            Event::LeaveStartTag => vec![ValidationError::Unexpected {
                message: "unexpected end of start tag".to_string(),
            }],
            Event::EndTag(name) => vec![ValidationError::Unexpected {
                message: format!("unexpected end tag for element {name}"),
            }],
        }
    }

    /// End of the document. Empty result: the grammar accepted it.
    pub fn end(&self) -> Vec<ValidationError> {
        let ctx = Ctx {
            schema: self.schema,
            resolver: &self.resolver,
        };
        if self.root.can_end(&ctx) {
            return Vec::new();
        }
        let mut errors = self.root.end(&ctx);
        if errors.is_empty() {
            errors.push(ValidationError::Unexpected {
                message: "document ended before the grammar was satisfied".to_string(),
            });
        }
        errors
    }

    pub fn can_end(&self) -> bool {
        let ctx = Ctx {
            schema: self.schema,
            resolver: &self.resolver,
        };
        self.root.can_end(&ctx)
    }

    /// The set of events currently acceptable.
    pub fn possible(&self) -> FnvHashSet<PossibleEvent> {
        let ctx = Ctx {
            schema: self.schema,
            resolver: &self.resolver,
        };
        let mut out = FnvHashSet::default();
        self.root.possible(&ctx, &mut out);
        out
    }

    /// The attribute events currently acceptable.
    pub fn possible_attributes(&self) -> FnvHashSet<PossibleEvent> {
        let ctx = Ctx {
            schema: self.schema,
            resolver: &self.resolver,
        };
        let mut out = FnvHashSet::default();
        self.root.possible_attributes(&ctx, &mut out);
        out
    }
}
