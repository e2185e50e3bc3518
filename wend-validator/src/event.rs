//! Validation events, results, and error values.

use wend_model::ExpandedName;

/// An event with namespaces already expanded; what the walkers consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    EnterStartTag(ExpandedName),
    LeaveStartTag,
    AttributeName(ExpandedName),
    AttributeValue(String),
    Text(String),
    EndTag(ExpandedName),
}

impl Event {
    pub fn is_attribute_event(&self) -> bool {
        matches!(self, Event::AttributeName(_) | Event::AttributeValue(_))
    }
}

/// An event as the document producer sees it: names are still qualified
/// (`prefix:local`). The grammar walker expands them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QEvent<'a> {
    EnterStartTag { name: &'a str },
    LeaveStartTag,
    AttributeName { name: &'a str },
    AttributeValue { value: &'a str },
    Text { text: &'a str },
    EndTag { name: &'a str },
}

/// The outcome of offering one event to a walker. `matched = false` means
/// the event was not consumed and the walker state is unchanged.
#[derive(Debug, Default)]
pub struct FireResult {
    pub matched: bool,
    pub errors: Vec<ValidationError>,
}

impl FireResult {
    pub fn matched() -> FireResult {
        FireResult {
            matched: true,
            errors: Vec::new(),
        }
    }

    pub fn not_matched() -> FireResult {
        FireResult::default()
    }

    pub fn matched_with(errors: Vec<ValidationError>) -> FireResult {
        FireResult {
            matched: true,
            errors,
        }
    }
}

/// The name side of a possible event: a concrete name, any name within a
/// namespace, or any name at all (the open name classes cannot be
/// enumerated).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NameSpec {
    Name(ExpandedName),
    AnyIn(String),
    Any,
}

impl std::fmt::Display for NameSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameSpec::Name(name) => write!(f, "{name}"),
            NameSpec::AnyIn(ns) => write!(f, "{{{ns}}}*"),
            NameSpec::Any => f.write_str("*"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueSpec {
    Literal(String),
    Any,
}

/// An event the automaton would currently accept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PossibleEvent {
    EnterStartTag(NameSpec),
    LeaveStartTag,
    AttributeName(NameSpec),
    AttributeValue(ValueSpec),
    Text,
    EndTag,
}

impl std::fmt::Display for PossibleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PossibleEvent::EnterStartTag(name) => write!(f, "element {name}"),
            PossibleEvent::LeaveStartTag => f.write_str("end of start tag"),
            PossibleEvent::AttributeName(name) => write!(f, "attribute {name}"),
            PossibleEvent::AttributeValue(ValueSpec::Literal(v)) => {
                write!(f, "attribute value {v:?}")
            }
            PossibleEvent::AttributeValue(ValueSpec::Any) => f.write_str("attribute value"),
            PossibleEvent::Text => f.write_str("text"),
            PossibleEvent::EndTag => f.write_str("end tag"),
        }
    }
}

/// A validation problem, reported as a value; the walker that produced it
/// stays usable so validation can continue past the error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An element name outside the expected name class.
    ElementName { name: ExpandedName },
    /// An attribute name outside the expected name class.
    AttributeName { name: ExpandedName },
    /// A required attribute was absent when the start tag closed.
    AttributeMissing { expected: String },
    /// An attribute value its datatype rejects.
    AttributeValue { name: String, value: String },
    /// No branch of a choice accepts.
    Choice { expected: String },
    /// Anything else, e.g. an unexpected end tag.
    Unexpected { message: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::ElementName { name } => {
                write!(f, "element {name} not allowed here")
            }
            ValidationError::AttributeName { name } => {
                write!(f, "attribute {name} not allowed here")
            }
            ValidationError::AttributeMissing { expected } => {
                write!(f, "required attribute missing: {expected}")
            }
            ValidationError::AttributeValue { name, value } => {
                write!(f, "invalid value {value:?} for attribute {name}")
            }
            ValidationError::Choice { expected } => {
                write!(f, "none of the allowed alternatives matched; expected {expected}")
            }
            ValidationError::Unexpected { message } => f.write_str(message),
        }
    }
}

/// A deterministic, human-oriented rendering of a possible-event set.
pub fn describe_possible<'a>(events: impl IntoIterator<Item = &'a PossibleEvent>) -> String {
    let mut descriptions: Vec<String> = events.into_iter().map(|e| e.to_string()).collect();
    descriptions.sort();
    descriptions.dedup();
    descriptions.join(", ")
}
