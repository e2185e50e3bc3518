//! Incremental validation of XML documents against compiled RELAX NG
//! grammars.
//!
//! The core is event-driven: a [`GrammarWalker`] consumes start-tag,
//! attribute, text and end-tag events and reports validation errors as
//! values, staying usable after each one. [`Validator`] is a convenience
//! driver that produces those events from an `xmlparser` token stream,
//! for callers that just want to validate a document.

mod event;
mod walk;

pub use event::{
    Event, FireResult, NameSpec, PossibleEvent, QEvent, ValidationError, ValueSpec,
    describe_possible,
};
pub use walk::GrammarWalker;

use std::collections::HashMap;
use wend_model::Schema;
use xmlparser::{ElementEnd, EntityDefinition, StrSpan, Token, Tokenizer};

#[derive(Debug)]
pub enum ValidatorError<'a> {
    Xml(xmlparser::Error),
    /// The document is well-formed but the grammar rejected something.
    Invalid {
        errors: Vec<ValidationError>,
        span: std::ops::Range<usize>,
    },
    UndefinedEntity {
        name: &'a str,
        span: std::ops::Range<usize>,
    },
    InvalidOrUnclosedEntity {
        span: std::ops::Range<usize>,
    },
}

struct PendingAttr<'a> {
    prefix: StrSpan<'a>,
    local: StrSpan<'a>,
    value: StrSpan<'a>,
}

/// A start tag being assembled: xmlparser delivers attributes one by one,
/// and namespace declarations among them must take effect before the
/// element name itself resolves.
struct PendingTag<'a> {
    prefix: StrSpan<'a>,
    local: StrSpan<'a>,
    namespaces: Vec<(String, String)>,
    attributes: Vec<PendingAttr<'a>>,
}

pub struct Validator<'a, 's> {
    walker: GrammarWalker<'s>,
    tokenizer: Tokenizer<'a>,
    pending: Option<PendingTag<'a>>,
    entity_definitions: HashMap<String, String>,
    /// Buffer for accumulating text content that may be split by
    /// processing instructions, CDATA sections or character references.
    /// Flushed before non-text events.
    text_buffer: String,
    text_span: std::ops::Range<usize>,
}

impl<'a, 's> Validator<'a, 's> {
    pub fn new(schema: &'s Schema, tokenizer: Tokenizer<'a>) -> Validator<'a, 's> {
        let mut entity_definitions = HashMap::new();
        entity_definitions.insert("lt".to_string(), "<".to_string());
        entity_definitions.insert("gt".to_string(), ">".to_string());
        entity_definitions.insert("amp".to_string(), "&".to_string());
        entity_definitions.insert("apos".to_string(), "'".to_string());
        entity_definitions.insert("quot".to_string(), "\"".to_string());
        Validator {
            walker: GrammarWalker::new(schema),
            tokenizer,
            pending: None,
            entity_definitions,
            text_buffer: String::new(),
            text_span: 0..0,
        }
    }

    /// The walker driving this session, e.g. for possible-event queries.
    pub fn walker(&self) -> &GrammarWalker<'s> {
        &self.walker
    }

    /// Pull the next token and validate it. `None` once the input is
    /// exhausted; [`Validator::finish`] then checks the grammar was
    /// satisfied.
    pub fn validate_next(&mut self) -> Option<Result<(), ValidatorError<'a>>> {
        match self.tokenizer.next() {
            Some(Ok(token)) => Some(self.validate(token)),
            Some(Err(err)) => Some(Err(ValidatorError::Xml(err))),
            None => None,
        }
    }

    /// End of input: report anything the grammar still requires.
    pub fn finish(&mut self) -> Result<(), ValidatorError<'a>> {
        let errors = self.walker.end();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidatorError::Invalid {
                errors,
                span: self.text_span.end..self.text_span.end,
            })
        }
    }

    fn qname(prefix: &str, local: &str) -> String {
        if prefix.is_empty() {
            local.to_string()
        } else {
            format!("{prefix}:{local}")
        }
    }

    /// Send buffered text through the walker, if any.
    fn flush_text(&mut self) -> Result<(), ValidatorError<'a>> {
        if self.text_buffer.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.text_buffer);
        let errors = self.walker.fire_event(QEvent::Text { text: &text });
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidatorError::Invalid {
                errors,
                span: self.text_span.clone(),
            })
        }
    }

    /// The start tag is complete: establish its namespace context, then
    /// fire the enter / attribute / leave event run (and the end-tag
    /// event too, for a self-closing element).
    fn open_pending(
        &mut self,
        self_closing: bool,
        span: StrSpan<'a>,
    ) -> Result<(), ValidatorError<'a>> {
        let Some(tag) = self.pending.take() else {
            return Ok(());
        };
        self.walker.resolver_mut().enter_context();
        let mut errors = Vec::new();
        for (prefix, uri) in &tag.namespaces {
            if let Err(e) = self.walker.resolver_mut().define_prefix(prefix, uri) {
                errors.push(ValidationError::Unexpected {
                    message: e.to_string(),
                });
            }
        }
        let name = Self::qname(tag.prefix.as_str(), tag.local.as_str());
        errors.extend(self.walker.fire_event(QEvent::EnterStartTag { name: &name }));
        for attr in &tag.attributes {
            let attr_name = Self::qname(attr.prefix.as_str(), attr.local.as_str());
            errors.extend(
                self.walker
                    .fire_event(QEvent::AttributeName { name: &attr_name }),
            );
            errors.extend(self.walker.fire_event(QEvent::AttributeValue {
                value: attr.value.as_str(),
            }));
        }
        errors.extend(self.walker.fire_event(QEvent::LeaveStartTag));
        if self_closing {
            errors.extend(self.walker.fire_event(QEvent::EndTag { name: &name }));
            let _ = self.walker.resolver_mut().leave_context();
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidatorError::Invalid {
                errors,
                span: span.start()..span.end(),
            })
        }
    }

    fn validate(&mut self, token: Token<'a>) -> Result<(), ValidatorError<'a>> {
        match token {
            Token::Declaration { .. }
            | Token::DtdStart { .. }
            | Token::DtdEnd { .. }
            | Token::EmptyDtd { .. }
            | Token::Comment { .. } => Ok(()),
            Token::ProcessingInstruction { .. } => {
                // PIs may appear within text content, e.g. "x<?pi?>y" is
                // the single text string "xy"; do not flush
                Ok(())
            }
            Token::EntityDeclaration {
                name, definition, ..
            } => match definition {
                EntityDefinition::EntityValue(value) => {
                    self.entity_definitions
                        .insert(name.to_string(), value.to_string());
                    Ok(())
                }
                // no support for resolving external ids
                EntityDefinition::ExternalId(_) => Err(ValidatorError::InvalidOrUnclosedEntity {
                    span: name.start()..name.end(),
                }),
            },
            Token::ElementStart { prefix, local, .. } => {
                self.flush_text()?;
                self.pending = Some(PendingTag {
                    prefix,
                    local,
                    namespaces: Vec::new(),
                    attributes: Vec::new(),
                });
                Ok(())
            }
            Token::Attribute {
                prefix,
                local,
                value,
                ..
            } => {
                let Some(tag) = self.pending.as_mut() else {
                    return Ok(());
                };
                if prefix.as_str() == "xmlns" {
                    tag.namespaces
                        .push((local.as_str().to_string(), value.as_str().to_string()));
                } else if prefix.as_str().is_empty() && local.as_str() == "xmlns" {
                    tag.namespaces
                        .push((String::new(), value.as_str().to_string()));
                } else {
                    tag.attributes.push(PendingAttr {
                        prefix,
                        local,
                        value,
                    });
                }
                Ok(())
            }
            Token::ElementEnd { end, span } => match end {
                ElementEnd::Open => self.open_pending(false, span),
                ElementEnd::Empty => self.open_pending(true, span),
                ElementEnd::Close(prefix, local) => {
                    self.flush_text()?;
                    let name = Self::qname(prefix.as_str(), local.as_str());
                    let errors = self.walker.fire_event(QEvent::EndTag { name: &name });
                    let _ = self.walker.resolver_mut().leave_context();
                    if errors.is_empty() {
                        Ok(())
                    } else {
                        Err(ValidatorError::Invalid {
                            errors,
                            span: span.start()..span.end(),
                        })
                    }
                }
            },
            Token::Cdata { text, .. } => {
                if self.text_buffer.is_empty() {
                    self.text_span = text.start()..text.end();
                } else {
                    self.text_span.end = text.end();
                }
                self.text_buffer.push_str(text.as_str());
                Ok(())
            }
            Token::Text { text } => {
                if self.text_buffer.is_empty() {
                    self.text_span = text.start()..text.end();
                } else {
                    self.text_span.end = text.end();
                }
                for piece in parse_entities(text.start(), text.as_str()) {
                    match piece? {
                        Txt::Text(_, value) => self.text_buffer.push_str(value),
                        Txt::Char(_, c) => self.text_buffer.push(c),
                        Txt::Entity(pos, name) => match self.entity_definitions.get(name) {
                            Some(replacement) => self.text_buffer.push_str(replacement),
                            None => {
                                return Err(ValidatorError::UndefinedEntity {
                                    name,
                                    span: pos..pos + name.len(),
                                });
                            }
                        },
                    }
                }
                Ok(())
            }
        }
    }

    /// Render an error as source-anchored diagnostics.
    pub fn diagnostic(
        &self,
        name: String,
        source: String,
        err: &ValidatorError<'_>,
    ) -> (codemap::CodeMap, Vec<codemap_diagnostic::Diagnostic>) {
        let mut map = codemap::CodeMap::new();
        let file = map.add_file(name, source);
        let span_label = |span: &std::ops::Range<usize>| codemap_diagnostic::SpanLabel {
            span: file.span.subspan(span.start as _, span.end as _),
            label: None,
            style: codemap_diagnostic::SpanStyle::Primary,
        };
        let mut diagnostics = vec![];
        match err {
            ValidatorError::Xml(e) => {
                diagnostics.push(codemap_diagnostic::Diagnostic {
                    level: codemap_diagnostic::Level::Error,
                    message: format!("{e}"),
                    code: None,
                    spans: vec![],
                });
            }
            ValidatorError::Invalid { errors, span } => {
                for error in errors {
                    diagnostics.push(codemap_diagnostic::Diagnostic {
                        level: codemap_diagnostic::Level::Error,
                        message: error.to_string(),
                        code: None,
                        spans: vec![span_label(span)],
                    });
                }
                let expected = describe_possible(&self.walker.possible());
                if !expected.is_empty() {
                    diagnostics.push(codemap_diagnostic::Diagnostic {
                        level: codemap_diagnostic::Level::Help,
                        message: format!("expected {expected}"),
                        code: None,
                        spans: vec![],
                    });
                }
            }
            ValidatorError::UndefinedEntity { name, span } => {
                diagnostics.push(codemap_diagnostic::Diagnostic {
                    level: codemap_diagnostic::Level::Error,
                    message: format!("the entity &{name}; is not defined"),
                    code: None,
                    spans: vec![span_label(span)],
                });
            }
            ValidatorError::InvalidOrUnclosedEntity { span } => {
                diagnostics.push(codemap_diagnostic::Diagnostic {
                    level: codemap_diagnostic::Level::Error,
                    message: "invalid or unclosed entity reference".to_string(),
                    code: None,
                    spans: vec![span_label(span)],
                });
            }
        }
        (map, diagnostics)
    }
}

#[derive(Debug)]
enum Txt<'a> {
    Text(usize, &'a str),
    Entity(usize, &'a str),
    Char(usize, char),
}

/// Split text content into literal runs and entity / character
/// references.
fn parse_entities(
    pos: usize,
    text: &str,
) -> impl Iterator<Item = Result<Txt<'_>, ValidatorError<'_>>> {
    struct Entities<'a> {
        text: &'a str,
        pos: usize,
        offset: usize,
        in_entity: bool,
    }
    impl<'a> Iterator for Entities<'a> {
        type Item = Result<Txt<'a>, ValidatorError<'a>>;

        fn next(&mut self) -> Option<Self::Item> {
            if self.offset == self.text.len() {
                return None;
            }
            for (i, c) in self.text[self.offset..].char_indices() {
                if self.in_entity {
                    if c == ';' {
                        self.in_entity = false;
                        let body = &self.text[self.offset..self.offset + i];
                        let result = if let Some(body) = body.strip_prefix('#') {
                            numeric_entity(self.offset + self.pos, body)
                        } else {
                            Ok(Txt::Entity(self.offset + self.pos, body))
                        };
                        self.offset += i + 1;
                        return Some(result);
                    }
                } else if c == '&' {
                    self.in_entity = true;
                    let result = Txt::Text(
                        self.offset + self.pos,
                        &self.text[self.offset..self.offset + i],
                    );
                    self.offset += i + 1;
                    return Some(Ok(result));
                }
            }
            if self.in_entity {
                Some(Err(ValidatorError::InvalidOrUnclosedEntity {
                    span: self.pos + self.offset - 1..self.pos + self.offset,
                }))
            } else {
                let result = Txt::Text(self.offset + self.pos, &self.text[self.offset..]);
                self.offset = self.text.len();
                Some(Ok(result))
            }
        }
    }
    fn numeric_entity(pos: usize, body: &str) -> Result<Txt<'_>, ValidatorError<'_>> {
        if body.is_empty() {
            return Err(ValidatorError::InvalidOrUnclosedEntity { span: pos..pos });
        }
        let code = if let Some(hex) = body.strip_prefix('x') {
            u32::from_str_radix(hex, 16)
                .map_err(|_| ValidatorError::InvalidOrUnclosedEntity { span: pos..pos })?
        } else {
            body.parse()
                .map_err(|_| ValidatorError::InvalidOrUnclosedEntity { span: pos..pos })?
        };
        Ok(Txt::Char(
            pos,
            std::char::from_u32(code)
                .ok_or(ValidatorError::InvalidOrUnclosedEntity { span: pos..pos })?,
        ))
    }
    Entities {
        text,
        pos,
        offset: 0,
        in_entity: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wend_model::schema_from_str;

    const XSD: &str = "http://www.w3.org/2001/XMLSchema-datatypes";

    struct Fixture {
        schema: Schema,
    }

    impl Fixture {
        fn new(json: &str) -> Fixture {
            Fixture {
                schema: schema_from_str(json).expect("schema should load"),
            }
        }

        fn run(&self, xml: &str) -> Result<(), String> {
            let tokenizer = Tokenizer::from(xml);
            let mut v = Validator::new(&self.schema, tokenizer);
            while let Some(step) = v.validate_next() {
                if let Err(err) = step {
                    return Err(format!("{err:?}"));
                }
            }
            v.finish().map_err(|err| format!("{err:?}"))
        }

        fn valid(&self, xml: &str) {
            if let Err(err) = self.run(xml) {
                panic!("expected {xml:?} to validate, got {err}");
            }
        }

        fn invalid(&self, xml: &str) {
            if self.run(xml).is_ok() {
                panic!("invalid input {xml:?} was accepted by the validator");
            }
        }
    }

    // element foo { empty }
    fn empty_foo() -> Fixture {
        Fixture::new(r#"{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[1]],[0]]}"#)
    }

    #[test]
    fn element_with_empty_content() {
        let f = empty_foo();
        f.valid("<foo/>");
        f.valid("<foo></foo>");
        f.valid("<foo> </foo>");
        f.invalid("<foo>x</foo>");
        f.invalid("<bar/>");
    }

    #[test]
    fn possible_events_track_progress() {
        let f = empty_foo();
        let mut w = GrammarWalker::new(&f.schema);
        let possible = w.possible();
        assert!(possible.contains(&PossibleEvent::EnterStartTag(NameSpec::Name(
            wend_model::ExpandedName::new("", "foo")
        ))));
        assert!(w.fire_event(QEvent::EnterStartTag { name: "foo" }).is_empty());
        assert!(w.fire_event(QEvent::LeaveStartTag).is_empty());
        assert!(w.possible().contains(&PossibleEvent::EndTag));
        assert!(w.fire_event(QEvent::EndTag { name: "foo" }).is_empty());
        assert!(w.possible().is_empty());
        assert!(w.can_end());
        assert!(w.end().is_empty());
    }

    // element foo { attribute a { text } }
    fn attr_foo() -> Fixture {
        Fixture::new(r#"{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[12,[18,"","a"],[7]]],[0]]}"#)
    }

    #[test]
    fn required_attribute() {
        let f = attr_foo();
        f.valid(r#"<foo a="x"/>"#);
        f.valid(r#"<foo a=""/>"#);
        f.invalid("<foo/>");
        f.invalid(r#"<foo b="x"/>"#);
        f.invalid(r#"<foo a="x" b="y"/>"#);
    }

    #[test]
    fn missing_attribute_reported_at_start_tag_close() {
        let f = attr_foo();
        let mut w = GrammarWalker::new(&f.schema);
        assert!(w.fire_event(QEvent::EnterStartTag { name: "foo" }).is_empty());
        let errors = w.fire_event(QEvent::LeaveStartTag);
        assert_matches!(errors[..], [ValidationError::AttributeMissing { .. }]);
        // the walker keeps going afterwards
        assert!(w.fire_event(QEvent::EndTag { name: "foo" }).is_empty());
        assert!(w.can_end());
    }

    #[test]
    fn unexpected_attribute_swallows_its_value() {
        let f = attr_foo();
        let mut w = GrammarWalker::new(&f.schema);
        assert!(w.fire_event(QEvent::EnterStartTag { name: "foo" }).is_empty());
        let errors = w.fire_event(QEvent::AttributeName { name: "b" });
        assert_matches!(errors[..], [ValidationError::AttributeName { .. }]);
        assert!(w.fire_event(QEvent::AttributeValue { value: "y" }).is_empty());
        assert!(w.fire_event(QEvent::AttributeName { name: "a" }).is_empty());
        assert!(w.fire_event(QEvent::AttributeValue { value: "x" }).is_empty());
        assert!(w.fire_event(QEvent::LeaveStartTag).is_empty());
    }

    // element foo { interleave of element a { empty }, element b { empty } }
    fn interleave_foo(swapped: bool) -> Fixture {
        let (first, second) = if swapped { ("b", "a") } else { ("a", "b") };
        Fixture::new(&format!(
            r#"{{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[17,[13,[18,"","{first}"],[1]],[13,[18,"","{second}"],[1]]]],[0]]}}"#
        ))
    }

    #[test]
    fn interleave_is_order_independent() {
        let f = interleave_foo(false);
        f.valid("<foo><a/><b/></foo>");
        f.valid("<foo><b/><a/></foo>");
        f.invalid("<foo><a/></foo>");
        f.invalid("<foo><a/><b/><a/></foo>");
    }

    #[test]
    fn interleave_commutes() {
        for doc in [
            "<foo><a/><b/></foo>",
            "<foo><b/><a/></foo>",
            "<foo><a/></foo>",
            "<foo><b/><b/></foo>",
        ] {
            let plain = interleave_foo(false).run(doc).is_ok();
            let swapped = interleave_foo(true).run(doc).is_ok();
            assert_eq!(plain, swapped, "{doc}");
        }
    }

    #[test]
    fn interleave_confines_open_subtrees() {
        // interleave of element a { element b { empty } }, element b { empty }:
        // while <a> is open, its <b> child must not satisfy the other branch
        let f = Fixture::new(
            r#"{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[17,[13,[18,"","a"],[13,[18,"","b"],[1]]],[13,[18,"","b"],[1]]]],[0]]}"#,
        );
        f.valid("<foo><a><b/></a><b/></foo>");
        f.valid("<foo><b/><a><b/></a></foo>");
        f.invalid("<foo><a><b/></a></foo>");
        f.invalid("<foo><a/><b/></foo>");
    }

    // element foo { oneOrMore of element a { empty } }
    fn one_or_more_foo() -> Fixture {
        Fixture::new(r#"{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[9,[13,[18,"","a"],[1]]]],[0]]}"#)
    }

    #[test]
    fn one_or_more_requires_one() {
        let f = one_or_more_foo();
        f.invalid("<foo/>");
        f.valid("<foo><a/></foo>");
        f.valid("<foo><a/><a/><a/></foo>");
        f.invalid("<foo><a/><b/></foo>");
    }

    #[test]
    fn datatype_text_content() {
        // element foo { data of xsd integer }
        let f = Fixture::new(&format!(
            r#"{{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[2,"integer","{XSD}"]],[0]]}}"#
        ));
        f.valid("<foo>12</foo>");
        f.valid("<foo> -3 </foo>");
        f.invalid("<foo>12x</foo>");
        f.invalid("<foo/>");
    }

    #[test]
    fn value_text_content() {
        // element foo { value "12" of xsd integer }
        let f = Fixture::new(&format!(
            r#"{{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[5,"12","integer","{XSD}",""]],[0]]}}"#
        ));
        f.valid("<foo>12</foo>");
        f.valid("<foo>012</foo>");
        f.invalid("<foo>13</foo>");
    }

    #[test]
    fn data_except_rejects_excluded_values() {
        // element foo { data token except value "no" }
        let f = Fixture::new(&format!(
            r#"{{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[2,"token","{XSD}",[0],[5,"no","token","{XSD}",""]]],[0]]}}"#
        ));
        f.valid("<foo>yes</foo>");
        f.invalid("<foo>no</foo>");
    }

    #[test]
    fn list_content_tokenizes() {
        // element foo { list of oneOrMore data integer }
        let f = Fixture::new(&format!(
            r#"{{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[3,[9,[2,"integer","{XSD}"]]]],[0]]}}"#
        ));
        f.valid("<foo>1 2 3</foo>");
        f.valid("<foo>\t42\n</foo>");
        f.invalid("<foo>1 x 3</foo>");
        f.invalid("<foo/>");
    }

    #[test]
    fn choice_of_attributes() {
        // element foo { attribute a { text } or attribute b { text } }
        let f = Fixture::new(
            r#"{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[10,[12,[18,"","a"],[7]],[12,[18,"","b"],[7]]]],[0]]}"#,
        );
        f.valid(r#"<foo a="1"/>"#);
        f.valid(r#"<foo b="2"/>"#);
        f.invalid("<foo/>");
        f.invalid(r#"<foo a="1" b="2"/>"#);
    }

    #[test]
    fn optional_attribute() {
        // element foo { choice of attribute a { text }, empty }
        let f = Fixture::new(
            r#"{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[10,[12,[18,"","a"],[7]],[1]]],[0]]}"#,
        );
        f.valid("<foo/>");
        f.valid(r#"<foo a="x"/>"#);
        f.invalid(r#"<foo b="x"/>"#);
    }

    #[test]
    fn attribute_value_checked_by_datatype() {
        // element foo { attribute n { data of xsd integer } }
        let f = Fixture::new(&format!(
            r#"{{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[12,[18,"","n"],[2,"integer","{XSD}"]]],[0]]}}"#
        ));
        f.valid(r#"<foo n="12"/>"#);
        f.invalid(r#"<foo n="12x"/>"#);
        let mut w = GrammarWalker::new(&f.schema);
        assert!(w.fire_event(QEvent::EnterStartTag { name: "foo" }).is_empty());
        assert!(w.fire_event(QEvent::AttributeName { name: "n" }).is_empty());
        let errors = w.fire_event(QEvent::AttributeValue { value: "12x" });
        assert_matches!(errors[..], [ValidationError::AttributeValue { .. }]);
        // the value was consumed; the start tag can still close
        assert!(w.fire_event(QEvent::LeaveStartTag).is_empty());
    }

    #[test]
    fn namespaced_elements_resolve_prefixes() {
        // element {urn:x}foo { empty }
        let f = Fixture::new(r#"{"v":3,"o":1,"d":[15,[13,[18,"urn:x","foo"],[1]],[0]]}"#);
        f.valid(r#"<foo xmlns="urn:x"/>"#);
        f.valid(r#"<p:foo xmlns:p="urn:x"/>"#);
        f.invalid("<foo/>");
        f.invalid(r#"<q:foo xmlns:q="urn:y"/>"#);
    }

    #[test]
    fn undefined_prefix_is_reported_not_fatal() {
        let f = empty_foo();
        let mut w = GrammarWalker::new(&f.schema);
        let errors = w.fire_event(QEvent::EnterStartTag { name: "nope:foo" });
        assert_matches!(errors[..], [ValidationError::ElementName { .. }]);
        // the unmatched subtree is skipped and validation continues
        assert!(w.fire_event(QEvent::LeaveStartTag).is_empty());
        assert!(w.fire_event(QEvent::EndTag { name: "nope:foo" }).is_empty());
        assert!(w.fire_event(QEvent::EnterStartTag { name: "foo" }).is_empty());
    }

    #[test]
    fn wildcard_namespace_attributes() {
        // element foo { optional attribute of any name in urn:x { text } }
        let f = Fixture::new(
            r#"{"v":3,"o":1,"d":[15,[13,[18,"","foo"],[10,[12,[20,"urn:x"],[7]],[1]]],[0]]}"#,
        );
        f.valid(r#"<foo xmlns:p="urn:x" p:anything="1"/>"#);
        f.valid("<foo/>");
        f.invalid(r#"<foo other="1"/>"#);
    }

    #[test]
    fn recursive_schema_nests_by_document_depth() {
        // d1: element a { optional ref d1 }
        let f = Fixture::new(
            r#"{"v":3,"o":1,"d":[15,[8,"d1"],[0,[14,"d1",[13,[18,"","a"],[10,[8,"d1"],[1]]]]]]}"#,
        );
        f.valid("<a/>");
        f.valid("<a><a><a/></a></a>");
        f.invalid("<a><b/></a>");
        let depth = 512;
        let mut doc = String::new();
        for _ in 0..depth {
            doc.push_str("<a>");
        }
        for _ in 0..depth {
            doc.push_str("</a>");
        }
        f.valid(&doc);
    }

    #[test]
    fn cloned_walkers_behave_identically() {
        let f = interleave_foo(false);
        let mut w = GrammarWalker::new(&f.schema);
        assert!(w.fire_event(QEvent::EnterStartTag { name: "foo" }).is_empty());
        assert!(w.fire_event(QEvent::LeaveStartTag).is_empty());
        let mut clone = w.clone();
        // the clone accepts the same continuation as the original
        for event in [
            QEvent::EnterStartTag { name: "b" },
            QEvent::LeaveStartTag,
            QEvent::EndTag { name: "b" },
            QEvent::EnterStartTag { name: "a" },
            QEvent::LeaveStartTag,
            QEvent::EndTag { name: "a" },
            QEvent::EndTag { name: "foo" },
        ] {
            let original = w.fire_event(event);
            let cloned = clone.fire_event(event);
            assert_eq!(original, cloned);
        }
        assert_eq!(w.can_end(), clone.can_end());
    }

    #[test]
    fn cloned_walkers_diverge_independently() {
        let f = interleave_foo(false);
        let mut w = GrammarWalker::new(&f.schema);
        assert!(w.fire_event(QEvent::EnterStartTag { name: "foo" }).is_empty());
        assert!(w.fire_event(QEvent::LeaveStartTag).is_empty());
        let mut clone = w.clone();
        assert!(clone.fire_event(QEvent::EnterStartTag { name: "a" }).is_empty());
        // the original still offers both branches
        assert!(w.possible().contains(&PossibleEvent::EnterStartTag(NameSpec::Name(
            wend_model::ExpandedName::new("", "a")
        ))));
        assert!(w.possible().contains(&PossibleEvent::EnterStartTag(NameSpec::Name(
            wend_model::ExpandedName::new("", "b")
        ))));
    }

    #[test]
    fn can_end_matches_end_result() {
        let f = one_or_more_foo();
        let mut w = GrammarWalker::new(&f.schema);
        assert_eq!(w.can_end(), w.end().is_empty());
        assert!(w.fire_event(QEvent::EnterStartTag { name: "foo" }).is_empty());
        assert_eq!(w.can_end(), w.end().is_empty());
        assert!(w.fire_event(QEvent::LeaveStartTag).is_empty());
        assert_eq!(w.can_end(), w.end().is_empty());
    }

    #[test]
    fn text_split_by_references_is_one_value() {
        // element a { value "foo & bar" of the builtin string type }
        let f = Fixture::new(
            r#"{"v":3,"o":1,"d":[15,[13,[18,"","a"],[5,"foo & bar","string","",""]],[0]]}"#,
        );
        f.valid("<a>foo &amp; bar</a>");
        f.invalid("<a>foo bar</a>");
    }

    #[test]
    fn declared_entities_resolve() {
        let f = Fixture::new(
            r#"{"v":3,"o":1,"d":[15,[13,[18,"","a"],[5,"xy","token","",""]],[0]]}"#,
        );
        f.valid("<!DOCTYPE a [<!ENTITY y \"y\">]><a>x&y;</a>");
        f.invalid("<a>x&nope;</a>");
    }

    #[test]
    fn whitespace_around_child_elements_is_ignored() {
        let f = one_or_more_foo();
        f.valid("<foo> <a/>\n  <a/>\t</foo>");
    }

    #[test]
    fn parse_entities_splits_text() {
        let mut iter = parse_entities(0, "foo &bar; blat");
        assert_matches!(iter.next(), Some(Ok(Txt::Text(0, "foo "))));
        assert_matches!(iter.next(), Some(Ok(Txt::Entity(5, "bar"))));
        assert_matches!(iter.next(), Some(Ok(Txt::Text(9, " blat"))));
        let mut iter = parse_entities(0, "a&#x41;b");
        assert_matches!(iter.next(), Some(Ok(Txt::Text(0, "a"))));
        assert_matches!(iter.next(), Some(Ok(Txt::Char(_, 'A'))));
        assert_matches!(iter.next(), Some(Ok(Txt::Text(_, "b"))));
    }
}
