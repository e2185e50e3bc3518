//! Translation of XSD regular expressions into `regex` crate syntax.
//!
//! XSD regexes differ from the target flavour in a few ways: the whole
//! expression is implicitly anchored, `^`/`$` are ordinary characters,
//! groups never capture, character classes support subtraction, and there
//! is a family of multi-character escapes (`\s \S \d \D \w \W \i \I \c
//! \C`) with XML-specific definitions. The translator rewrites all of
//! these; subtraction maps onto the target's class set operations rather
//! than the lookahead workarounds older ECMA-targeting translators used.
//!
//! A translated expression is tagged [`RegexKind::Ascii`] when it only
//! uses ASCII features, and [`RegexKind::Unicode`] when the translation
//! relies on Unicode character categories.

use std::fmt;

/// Whether a translated expression needs a Unicode-aware engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexKind {
    Ascii,
    Unicode,
}

/// A compiled XSD regular expression.
#[derive(Clone)]
pub struct XsdRegex {
    source: String,
    translated: String,
    kind: RegexKind,
    compiled: regex::Regex,
}

impl XsdRegex {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The translated, anchored pattern in the target flavour.
    pub fn translated(&self) -> &str {
        &self.translated
    }

    pub fn kind(&self) -> RegexKind {
        self.kind
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.compiled.is_match(value)
    }
}

impl fmt::Debug for XsdRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XsdRegex")
            .field("source", &self.source)
            .field("translated", &self.translated)
            .field("kind", &self.kind)
            .finish()
    }
}

#[derive(Debug)]
pub enum RegexpError {
    Syntax { pos: usize, message: String },
    Compile(regex::Error),
}

impl fmt::Display for RegexpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegexpError::Syntax { pos, message } => {
                write!(f, "invalid expression at offset {pos}: {message}")
            }
            RegexpError::Compile(e) => write!(f, "translated expression rejected: {e}"),
        }
    }
}

// XML NameStartChar / NameChar ranges, written as class items in the
// target flavour. Shared with the datatype layer's name checks.
const NAME_START_ITEMS: &str = "A-Z_a-z:\\u{C0}-\\u{D6}\\u{D8}-\\u{F6}\\u{F8}-\\u{2FF}\
\\u{370}-\\u{37D}\\u{37F}-\\u{1FFF}\\u{200C}-\\u{200D}\\u{2070}-\\u{218F}\
\\u{2C00}-\\u{2FEF}\\u{3001}-\\u{D7FF}\\u{F900}-\\u{FDCF}\\u{FDF0}-\\u{FFFD}\
\\u{10000}-\\u{EFFFF}";
const NAME_CHAR_EXTRA_ITEMS: &str = "\\-.0-9\\u{B7}\\u{300}-\\u{36F}\\u{203F}-\\u{2040}";

pub fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

pub fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

/// A multi-character escape, reduced to class items plus a complement bit.
/// `\S` is the complement of `\s`'s items, `\w` is the complement of the
/// `\p{P}\p{Z}\p{C}` union, and so on.
struct EscSet {
    items: String,
    complement: bool,
}

/// Translate an XSD regular expression and compile the result.
pub fn translate(source: &str) -> Result<XsdRegex, RegexpError> {
    let mut tr = Translator {
        chars: source.chars().collect(),
        pos: 0,
        unicode: false,
    };
    let (body, branches) = tr.regexp(true)?;
    let translated = if branches > 1 {
        format!("^(?:{body})$")
    } else {
        format!("^{body}$")
    };
    let compiled = regex::Regex::new(&translated).map_err(RegexpError::Compile)?;
    Ok(XsdRegex {
        source: source.to_string(),
        translated,
        kind: if tr.unicode {
            RegexKind::Unicode
        } else {
            RegexKind::Ascii
        },
        compiled,
    })
}

struct Translator {
    chars: Vec<char>,
    pos: usize,
    unicode: bool,
}

impl Translator {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn expect(&mut self, c: char) -> Result<(), RegexpError> {
        if self.next() == Some(c) {
            Ok(())
        } else {
            Err(self.err(format!("expected {c:?}")))
        }
    }

    fn err(&self, message: impl Into<String>) -> RegexpError {
        RegexpError::Syntax {
            pos: self.pos,
            message: message.into(),
        }
    }

    /// regExp ::= branch ( '|' branch )*
    /// Returns the translated body and the number of top-level branches.
    fn regexp(&mut self, top: bool) -> Result<(String, usize), RegexpError> {
        let mut out = String::new();
        let mut branches = 1;
        self.branch(&mut out)?;
        while self.peek() == Some('|') {
            self.next();
            branches += 1;
            out.push('|');
            self.branch(&mut out)?;
        }
        if top {
            if let Some(c) = self.peek() {
                return Err(self.err(format!("unexpected {c:?}")));
            }
        }
        Ok((out, branches))
    }

    fn branch(&mut self, out: &mut String) -> Result<(), RegexpError> {
        while let Some(c) = self.peek() {
            match c {
                '|' | ')' => break,
                _ => self.piece(out)?,
            }
        }
        Ok(())
    }

    /// piece ::= atom quantifier?
    fn piece(&mut self, out: &mut String) -> Result<(), RegexpError> {
        self.atom(out)?;
        match self.peek() {
            Some(q @ ('?' | '*' | '+')) => {
                self.next();
                out.push(q);
            }
            Some('{') => {
                self.next();
                self.quantity(out)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// quantity ::= n | n, | n,m   (already inside braces)
    fn quantity(&mut self, out: &mut String) -> Result<(), RegexpError> {
        let min = self.number()?;
        let mut max = None;
        let mut open = false;
        if self.peek() == Some(',') {
            self.next();
            open = true;
            if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                max = Some(self.number()?);
            }
        }
        self.expect('}')?;
        if let Some(max) = max {
            if min > max {
                return Err(self.err("quantifier minimum exceeds maximum"));
            }
            out.push_str(&format!("{{{min},{max}}}"));
        } else if open {
            out.push_str(&format!("{{{min},}}"));
        } else {
            out.push_str(&format!("{{{min}}}"));
        }
        Ok(())
    }

    fn number(&mut self) -> Result<u32, RegexpError> {
        let mut digits = String::new();
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            digits.push(self.next().unwrap());
        }
        digits
            .parse()
            .map_err(|_| self.err("expected a quantifier number"))
    }

    fn atom(&mut self, out: &mut String) -> Result<(), RegexpError> {
        match self.peek() {
            Some('(') => {
                self.next();
                let (body, _) = self.regexp(false)?;
                self.expect(')')?;
                out.push_str("(?:");
                out.push_str(&body);
                out.push(')');
                Ok(())
            }
            Some('[') => {
                self.next();
                let class = self.char_class()?;
                out.push_str(&class.into_atom());
                Ok(())
            }
            Some('\\') => {
                self.next();
                match self.escape()? {
                    Escape::Literal(c) => {
                        push_literal(out, c);
                        Ok(())
                    }
                    Escape::Set(set) => {
                        if set.complement {
                            out.push_str(&format!("[^{}]", set.items));
                        } else if set.items.starts_with("\\p") && !set.items.contains(']') {
                            // a lone category escape needs no brackets
                            out.push_str(&set.items);
                        } else {
                            out.push_str(&format!("[{}]", set.items));
                        }
                        Ok(())
                    }
                }
            }
            Some('.') => {
                self.next();
                // the XSD wildcard excludes both newline and carriage return
                out.push_str("[^\\n\\r]");
                Ok(())
            }
            Some(c @ ('?' | '*' | '+' | '{' | '}' | ']')) => {
                Err(self.err(format!("unescaped metacharacter {c:?}")))
            }
            Some(c) => {
                self.next();
                push_literal(out, c);
                Ok(())
            }
            None => Err(self.err("unexpected end of expression")),
        }
    }

    /// An escape, with the leading backslash already consumed.
    fn escape(&mut self) -> Result<Escape, RegexpError> {
        let c = self.next().ok_or_else(|| self.err("dangling backslash"))?;
        let set = |items: &str, complement: bool| {
            Ok(Escape::Set(EscSet {
                items: items.to_string(),
                complement,
            }))
        };
        match c {
            'n' => Ok(Escape::Literal('\n')),
            'r' => Ok(Escape::Literal('\r')),
            't' => Ok(Escape::Literal('\t')),
            '\\' | '|' | '.' | '-' | '^' | '?' | '*' | '+' | '{' | '}' | '(' | ')' | '[' | ']'
            | '$' => Ok(Escape::Literal(c)),
            's' => set(" \\t\\n\\r", false),
            'S' => set(" \\t\\n\\r", true),
            'd' => {
                self.unicode = true;
                set("\\p{Nd}", false)
            }
            'D' => {
                self.unicode = true;
                set("\\p{Nd}", true)
            }
            'w' => {
                self.unicode = true;
                set("\\p{P}\\p{Z}\\p{C}", true)
            }
            'W' => {
                self.unicode = true;
                set("\\p{P}\\p{Z}\\p{C}", false)
            }
            'i' => {
                self.unicode = true;
                set(NAME_START_ITEMS, false)
            }
            'I' => {
                self.unicode = true;
                set(NAME_START_ITEMS, true)
            }
            'c' => {
                self.unicode = true;
                Ok(Escape::Set(EscSet {
                    items: format!("{NAME_START_ITEMS}{NAME_CHAR_EXTRA_ITEMS}"),
                    complement: false,
                }))
            }
            'C' => {
                self.unicode = true;
                Ok(Escape::Set(EscSet {
                    items: format!("{NAME_START_ITEMS}{NAME_CHAR_EXTRA_ITEMS}"),
                    complement: true,
                }))
            }
            'p' | 'P' => {
                self.unicode = true;
                self.expect('{')?;
                let mut name = String::new();
                while let Some(c) = self.peek() {
                    if c == '}' {
                        break;
                    }
                    if !(c.is_ascii_alphanumeric() || c == '-') {
                        return Err(self.err(format!("bad character {c:?} in category name")));
                    }
                    name.push(self.next().unwrap());
                }
                self.expect('}')?;
                if name.is_empty() {
                    return Err(self.err("empty category name"));
                }
                // XSD spells Unicode blocks \p{IsFoo}; the target spells
                // them \p{InFoo}
                let name = match name.strip_prefix("Is") {
                    Some(block) => format!("In{block}"),
                    None => name,
                };
                Ok(Escape::Set(EscSet {
                    items: format!("\\p{{{name}}}"),
                    complement: c == 'P',
                }))
            }
            other => Err(self.err(format!("unknown escape \\{other}"))),
        }
    }

    /// charGroup ( '-' charClassExpr )? ']' — the opening '[' is consumed.
    fn char_class(&mut self) -> Result<ClassEmit, RegexpError> {
        let negated = if self.peek() == Some('^') {
            self.next();
            true
        } else {
            false
        };
        let mut pos_items = String::new();
        let mut neg_items = String::new();
        let mut subtraction = None;
        let mut first = true;
        loop {
            match self.peek() {
                None => return Err(self.err("unterminated character class")),
                Some(']') => {
                    self.next();
                    break;
                }
                Some('-') if !first => {
                    self.next();
                    match self.peek() {
                        Some('[') => {
                            self.next();
                            let inner = self.char_class()?;
                            subtraction = Some(inner);
                            self.expect(']')?;
                            break;
                        }
                        Some(']') => {
                            self.next();
                            pos_items.push_str("\\-");
                            break;
                        }
                        _ => pos_items.push_str("\\-"),
                    }
                }
                _ => self.class_member(&mut pos_items, &mut neg_items)?,
            }
            first = false;
        }
        if pos_items.is_empty() && neg_items.is_empty() {
            return Err(self.err("empty character class"));
        }
        let body = match (negated, neg_items.is_empty()) {
            // plain positive class
            (false, true) => ClassEmit::Class(format!("[{pos_items}]")),
            // negative escapes in a positive class become the complement
            // of the union of their base sets, alternated with the rest
            (false, false) => {
                if pos_items.is_empty() {
                    ClassEmit::Class(format!("[^{neg_items}]"))
                } else {
                    ClassEmit::Group(format!("(?:[^{neg_items}]|[{pos_items}])"))
                }
            }
            // plain negated class; positive escapes were expanded inline
            (true, true) => ClassEmit::Class(format!("[^{pos_items}]")),
            // a negative escape under class negation contributes its base
            // set, minus whatever else the class names
            (true, false) => {
                if pos_items.is_empty() {
                    ClassEmit::Class(format!("[{neg_items}]"))
                } else {
                    ClassEmit::Class(format!("[[{neg_items}]--[{pos_items}]]"))
                }
            }
        };
        match subtraction {
            None => Ok(body),
            Some(sub) => {
                let sub = match sub {
                    ClassEmit::Class(c) => c,
                    ClassEmit::Group(_) => {
                        return Err(
                            self.err("negative escapes are not supported in a subtracted class")
                        );
                    }
                };
                match body {
                    ClassEmit::Class(c) => Ok(ClassEmit::Class(format!("[{c}--{sub}]"))),
                    ClassEmit::Group(_) => {
                        // distribute the subtraction over both alternatives
                        if pos_items.is_empty() {
                            Ok(ClassEmit::Class(format!("[[^{neg_items}]--{sub}]")))
                        } else {
                            Ok(ClassEmit::Group(format!(
                                "(?:[[^{neg_items}]--{sub}]|[[{pos_items}]--{sub}])"
                            )))
                        }
                    }
                }
            }
        }
    }

    /// One range, character, or escape inside a class.
    fn class_member(
        &mut self,
        pos_items: &mut String,
        neg_items: &mut String,
    ) -> Result<(), RegexpError> {
        let start = match self.next().unwrap() {
            '\\' => match self.escape()? {
                Escape::Literal(c) => c,
                Escape::Set(set) => {
                    if set.complement {
                        neg_items.push_str(&set.items);
                    } else {
                        pos_items.push_str(&set.items);
                    }
                    return Ok(());
                }
            },
            '[' => return Err(self.err("unescaped '[' in character class")),
            c => c,
        };
        // a trailing or pre-subtraction '-' is handled by the caller, so a
        // '-' here always introduces a range
        if self.peek() == Some('-')
            && !matches!(self.chars.get(self.pos + 1).copied(), Some(']') | Some('[') | None)
        {
            self.next();
            let end = match self.next().unwrap() {
                '\\' => match self.escape()? {
                    Escape::Literal(c) => c,
                    Escape::Set(_) => {
                        return Err(self.err("multi-character escape as a range endpoint"));
                    }
                },
                c => c,
            };
            if start > end {
                return Err(self.err("range endpoints out of order"));
            }
            push_class_literal(pos_items, start);
            pos_items.push('-');
            push_class_literal(pos_items, end);
        } else {
            push_class_literal(pos_items, start);
        }
        Ok(())
    }
}

enum Escape {
    Literal(char),
    Set(EscSet),
}

/// A translated character class: either something that can participate in
/// further class set operations, or an alternation that cannot.
enum ClassEmit {
    Class(String),
    Group(String),
}

impl ClassEmit {
    fn into_atom(self) -> String {
        match self {
            ClassEmit::Class(s) | ClassEmit::Group(s) => s,
        }
    }
}

fn push_literal(out: &mut String, c: char) {
    match c {
        '\\' | '.' | '?' | '*' | '+' | '{' | '}' | '(' | ')' | '[' | ']' | '|' | '^' | '$' => {
            out.push('\\');
            out.push(c);
        }
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        _ => out.push(c),
    }
}

fn push_class_literal(out: &mut String, c: char) {
    match c {
        '\\' | '[' | ']' | '^' | '-' | '&' | '~' => {
            out.push('\\');
            out.push(c);
        }
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        _ => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_literal() {
        let re = translate("abc").unwrap();
        assert_eq!(re.translated(), "^abc$");
        assert_eq!(re.kind(), RegexKind::Ascii);
        assert!(re.is_match("abc"));
        assert!(!re.is_match("xabc"));
        assert!(!re.is_match("abcx"));
    }

    #[test]
    fn whitespace_escape_is_ascii() {
        let re = translate("ab\\scd").unwrap();
        assert_eq!(re.translated(), "^ab[ \\t\\n\\r]cd$");
        assert_eq!(re.kind(), RegexKind::Ascii);
        assert!(re.is_match("ab cd"));
        assert!(re.is_match("ab\tcd"));
        assert!(!re.is_match("abxcd"));
    }

    #[test]
    fn class_subtraction() {
        let re = translate("ab[abcd-[bc]]cd").unwrap();
        assert_eq!(re.translated(), "^ab[[abcd]--[bc]]cd$");
        assert!(re.is_match("abacd"));
        assert!(re.is_match("abdcd"));
        assert!(!re.is_match("abbcd"));
        assert!(!re.is_match("abccd"));
        assert!(!re.is_match("ab1cd"));
    }

    #[test]
    fn negative_escapes_in_positive_class() {
        let re = translate("ab[a\\S\\Dq]cd").unwrap();
        assert_eq!(re.kind(), RegexKind::Unicode);
        assert_eq!(re.translated(), "^ab(?:[^ \\t\\n\\r\\p{Nd}]|[aq])cd$");
        assert!(re.is_match("abwcd"));
        assert!(re.is_match("abacd"));
        assert!(!re.is_match("ab cd"));
    }

    #[test]
    fn positive_escapes_in_negated_class() {
        let re = translate("ab[^a\\s\\dq]cd").unwrap();
        assert_eq!(re.kind(), RegexKind::Unicode);
        assert_eq!(re.translated(), "^ab[^a \\t\\n\\r\\p{Nd}q]cd$");
        assert!(re.is_match("abwcd"));
        assert!(!re.is_match("abacd"));
        assert!(!re.is_match("abqcd"));
        assert!(!re.is_match("ab cd"));
        assert!(!re.is_match("ab1cd"));
    }

    #[test]
    fn negative_escape_in_negated_class() {
        // [^\S] accepts exactly the XSD whitespace set
        let re = translate("[^\\S]+").unwrap();
        assert!(re.is_match(" \t\r\n"));
        assert!(!re.is_match("x"));
        // [^a\S] is the whitespace set minus 'a' (which it never held)
        let re = translate("[^a\\S]").unwrap();
        assert_eq!(re.translated(), "^[[ \\t\\n\\r]--[a]]$");
        assert!(re.is_match(" "));
        assert!(!re.is_match("a"));
    }

    #[test]
    fn unicode_categories_pass_through() {
        let re = translate("(\\p{L}|\\p{N}|\\p{P}|\\p{S})+").unwrap();
        assert_eq!(re.kind(), RegexKind::Unicode);
        assert_eq!(re.translated(), "^(?:\\p{L}|\\p{N}|\\p{P}|\\p{S})+$");
        assert!(re.is_match("aΩ3!"));
        assert!(!re.is_match("a b"));
    }

    #[test]
    fn block_escape_renamed() {
        let re = translate("\\p{IsBasicLatin}+").unwrap();
        assert_eq!(re.translated(), "^\\p{InBasicLatin}+$");
        assert!(re.is_match("abc"));
        assert!(!re.is_match("é"));
    }

    #[test]
    fn groups_do_not_capture() {
        let re = translate("(ab)+(cd)?").unwrap();
        assert_eq!(re.translated(), "^(?:ab)+(?:cd)?$");
        assert!(re.is_match("abab"));
        assert!(re.is_match("abcd"));
    }

    #[test]
    fn top_level_alternation_is_wrapped() {
        let re = translate("a|b").unwrap();
        assert_eq!(re.translated(), "^(?:a|b)$");
        assert!(re.is_match("a"));
        assert!(!re.is_match("ab"));
    }

    #[test]
    fn wildcard_excludes_line_ends() {
        let re = translate("a.c").unwrap();
        assert_eq!(re.translated(), "^a[^\\n\\r]c$");
        assert!(re.is_match("abc"));
        assert!(!re.is_match("a\nc"));
        assert!(!re.is_match("a\rc"));
    }

    #[test]
    fn caret_and_dollar_are_literals() {
        let re = translate("a^b$c").unwrap();
        assert_eq!(re.translated(), "^a\\^b\\$c$");
        assert!(re.is_match("a^b$c"));
    }

    #[test]
    fn quantity_ranges() {
        let re = translate("a{2,3}b{2,}c{2}").unwrap();
        assert_eq!(re.translated(), "^a{2,3}b{2,}c{2}$");
        assert!(re.is_match("aabbcc"));
        assert!(re.is_match("aaabbbbcc"));
        assert!(!re.is_match("abbcc"));
    }

    #[test]
    fn name_char_escapes() {
        let re = translate("\\i\\c*").unwrap();
        assert_eq!(re.kind(), RegexKind::Unicode);
        assert!(re.is_match("foo"));
        assert!(re.is_match("_a-b.c"));
        assert!(!re.is_match("-foo"));
        assert!(!re.is_match("1foo"));
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(
            translate("ab["),
            Err(RegexpError::Syntax { .. })
        ));
        assert!(matches!(
            translate("a{3,1}"),
            Err(RegexpError::Syntax { .. })
        ));
        assert!(matches!(translate("*a"), Err(RegexpError::Syntax { .. })));
        assert!(matches!(
            translate("a\\q"),
            Err(RegexpError::Syntax { .. })
        ));
        assert!(matches!(
            translate("a)b"),
            Err(RegexpError::Syntax { .. })
        ));
    }
}
