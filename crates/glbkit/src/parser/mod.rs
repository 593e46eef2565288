//! Lazy JSON parser over borrowed text.
//!
//! Overview
//! - [`parse`] classifies the first non-whitespace byte of the input and
//!   returns a [`JsonNode`]: a tagged kind plus a [`StrSpan`] over the exact
//!   source text the value occupies. Nothing is copied and no tree is built.
//! - Scalars (strings, numbers, booleans, null) are scanned to their end
//!   immediately and are always resolved.
//! - Containers (arrays, objects) start out unresolved: their end is unknown
//!   until someone walks the children. [`JsonNode::resolve`] is a pure
//!   function returning a new, resolved node; the original node is left as is,
//!   so nodes are `Copy` and safe to share.
//!
//! Child walking
//! - [`JsonNode::items`] and [`JsonNode::entries`] return forward-only
//!   iterators that parse one child per step. Iterating again starts over from
//!   the opening bracket and re-parses; there is no cursor to resume.
//! - Keyed and indexed lookup are linear walks built on the same iterators.
//!
//! Invariants
//! - For a resolved container, the spans of its direct children are strictly
//!   ordered, non-overlapping and lie within the parent's span.
//! - An iterator that yielded an error yields nothing afterwards.

mod error;
mod numbers;
mod scanner;

use std::borrow::Cow;
use std::iter::FusedIterator;

pub use error::{ParseError, SyntaxError};
use numbers::{NumberLexeme, lex_number};
use scanner::{scan_literal, scan_string, skip_whitespace};

use crate::{
    error::{Error, Result},
    escape::unescape_string,
    options::ParseMode,
    span::StrSpan,
    value::{Map, Value},
    writer::JsonWriter,
};

/// Containers nested deeper than this are rejected while walking.
pub const MAX_DEPTH: usize = 256;

/// JSON value kind, decided by the first byte of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// `null`
    Null,
    /// `true` or `false`
    Boolean,
    /// Any number; integer getters check the range on extraction.
    Number,
    /// A quoted string, escapes still in place.
    String,
    /// `[...]`
    Array,
    /// `{...}`
    Object,
}

impl NodeKind {
    /// Lower-case name used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Boolean => "boolean",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Array => "array",
            NodeKind::Object => "object",
        }
    }

    /// Arrays and objects.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Array | NodeKind::Object)
    }
}

/// Whether a node's span is known to end at its closing bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Container whose extent has not been walked; the span runs to the end of
    /// the text.
    Unresolved,
    /// The span covers exactly the value.
    Resolved,
}

enum Token {
    Scalar(NodeKind),
    Open(NodeKind),
    Close,
}

fn syntax(kind: SyntaxError, position: usize) -> Error {
    Error::Syntax(ParseError::new(kind, position))
}

fn classify(text: &str, pos: usize) -> Result<Token> {
    let Some(&b) = text.as_bytes().get(pos) else {
        return Err(syntax(SyntaxError::UnexpectedEndOfInput, pos));
    };
    Ok(match b {
        b'{' => Token::Open(NodeKind::Object),
        b'[' => Token::Open(NodeKind::Array),
        b'"' => Token::Scalar(NodeKind::String),
        b't' | b'f' => Token::Scalar(NodeKind::Boolean),
        b'n' => Token::Scalar(NodeKind::Null),
        b'-' | b'0'..=b'9' => Token::Scalar(NodeKind::Number),
        b'}' | b']' => Token::Close,
        _ => {
            let c = text
                .get(pos..)
                .and_then(|s| s.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(syntax(SyntaxError::InvalidCharacter(c), pos));
        }
    })
}

fn scan_scalar(text: &str, start: usize, kind: NodeKind) -> Result<(JsonNode<'_>, usize)> {
    let bytes = text.as_bytes();
    let end = if kind == NodeKind::String {
        scan_string(bytes, start)?
    } else {
        let end = scan_literal(bytes, start);
        let tok = &text[start..end];
        let valid = match kind {
            NodeKind::Boolean => tok == "true" || tok == "false",
            NodeKind::Null => tok == "null",
            NodeKind::Number => lex_number(tok).is_some(),
            _ => false,
        };
        if !valid {
            return Err(syntax(SyntaxError::InvalidLiteral(tok.to_owned()), start));
        }
        end
    };
    let node = JsonNode {
        kind,
        span: StrSpan::with_range(text, start, end - start)?,
        resolution: Resolution::Resolved,
    };
    Ok((node, end))
}

/// Parses one complete value starting at or after `pos`, returning it resolved
/// together with the offset one past its end.
fn scan_value(text: &str, pos: usize, depth: usize) -> Result<(JsonNode<'_>, usize)> {
    let start = skip_whitespace(text.as_bytes(), pos);
    match classify(text, start)? {
        Token::Scalar(kind) => scan_scalar(text, start, kind),
        Token::Open(kind) => {
            if depth >= MAX_DEPTH {
                return Err(syntax(SyntaxError::NestingTooDeep(MAX_DEPTH), start));
            }
            let node = JsonNode::unresolved(kind, text, start)?;
            let end = node.children(depth + 1).run_to_end()?;
            Ok((node.with_end(end)?, end))
        }
        Token::Close => Err(syntax(SyntaxError::Expected("value"), start)),
    }
}

/// Parses the value at the start of `text`.
///
/// Scalars are always returned resolved. Containers follow `mode`; see
/// [`ParseMode`].
///
/// # Errors
///
/// [`Error::Syntax`] for grammar violations found while scanning.
pub fn parse(text: &str, mode: ParseMode) -> Result<JsonNode<'_>> {
    let start = skip_whitespace(text.as_bytes(), 0);
    let node = match classify(text, start)? {
        Token::Scalar(kind) => scan_scalar(text, start, kind)?.0,
        Token::Open(kind) => JsonNode::unresolved(kind, text, start)?,
        Token::Close => return Err(syntax(SyntaxError::Expected("value"), start)),
    };
    match mode {
        ParseMode::Lazy => Ok(node),
        ParseMode::Recursive => node.resolve(),
        ParseMode::ToEnd => node.assume_to_end(),
    }
}

/// Parses `text`, which must hold exactly one value surrounded by optional
/// whitespace. The whole value is validated.
///
/// # Errors
///
/// [`Error::Syntax`] for grammar violations or trailing characters.
pub fn parse_complete(text: &str) -> Result<JsonNode<'_>> {
    let node = parse(text, ParseMode::Recursive)?;
    let rest = skip_whitespace(text.as_bytes(), node.end()?);
    if rest != text.len() {
        return Err(syntax(SyntaxError::TrailingCharacters, rest));
    }
    Ok(node)
}

/// A JSON value located in borrowed source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonNode<'a> {
    kind: NodeKind,
    span: StrSpan<'a>,
    resolution: Resolution,
}

impl<'a> JsonNode<'a> {
    fn unresolved(kind: NodeKind, text: &'a str, start: usize) -> Result<Self> {
        Ok(Self {
            kind,
            span: StrSpan::with_range(text, start, text.len() - start)?,
            resolution: Resolution::Unresolved,
        })
    }

    fn with_end(self, end: usize) -> Result<Self> {
        let start = self.span.offset();
        Ok(Self {
            kind: self.kind,
            span: StrSpan::with_range(self.span.owner(), start, end - start)?,
            resolution: Resolution::Resolved,
        })
    }

    fn children(&self, depth: usize) -> Children<'a> {
        Children {
            text: self.span.owner(),
            object: self.kind == NodeKind::Object,
            close: if self.kind == NodeKind::Object { b'}' } else { b']' },
            pos: self.span.offset() + 1,
            first: true,
            depth,
            end: self.is_resolved().then(|| self.span.end()),
            state: WalkState::Walking,
        }
    }

    /// Trusts that the container extends to the last non-whitespace byte of
    /// the text, checking only that this byte closes it.
    fn assume_to_end(self) -> Result<Self> {
        let bytes = self.span.owner().as_bytes();
        let last = bytes
            .iter()
            .rposition(|&b| !scanner::is_whitespace(b))
            .map_or(0, |i| i + 1);
        if !self.kind.is_container() {
            if last != self.span.end() {
                return Err(syntax(SyntaxError::TrailingCharacters, self.span.end()));
            }
            return Ok(self);
        }
        let close = if self.kind == NodeKind::Object { b'}' } else { b']' };
        if last <= self.span.offset() + 1 || bytes[last - 1] != close {
            let expected = if close == b'}' { "'}'" } else { "']'" };
            return Err(syntax(SyntaxError::Expected(expected), last));
        }
        self.with_end(last)
    }

    /// Kind of the value.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Whether the span is exact.
    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Shorthand for `resolution() == Resolution::Resolved`.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolution == Resolution::Resolved
    }

    /// The span over the source text. For an unresolved container this runs to
    /// the end of the text.
    #[must_use]
    pub fn span(&self) -> StrSpan<'a> {
        self.span
    }

    /// Byte offset of the first character of the value.
    #[must_use]
    pub fn start(&self) -> usize {
        self.span.offset()
    }

    /// Byte offset one past the last character of the value.
    ///
    /// # Errors
    ///
    /// [`Error::ValueTypeMismatch`] if the node is an unresolved container.
    pub fn end(&self) -> Result<usize> {
        match self.resolution {
            Resolution::Resolved => Ok(self.span.end()),
            Resolution::Unresolved => Err(Error::mismatch(
                "resolved node",
                format!("unresolved {}", self.kind.name()),
            )),
        }
    }

    /// Walks the full extent of a container and returns it resolved.
    /// Descendants are validated on the way. Resolved nodes are returned as is.
    ///
    /// # Errors
    ///
    /// [`Error::Syntax`] for grammar violations anywhere inside the container.
    pub fn resolve(&self) -> Result<Self> {
        match self.resolution {
            Resolution::Resolved => Ok(*self),
            Resolution::Unresolved => {
                let end = self.children(0).run_to_end()?;
                self.with_end(end)
            }
        }
    }

    /// The exact source text of the value, resolving it first if needed.
    ///
    /// # Errors
    ///
    /// See [`JsonNode::resolve`].
    pub fn raw(&self) -> Result<&'a str> {
        Ok(self.resolve()?.span.as_str())
    }

    /// `true` for the `null` literal. Classification uses an explicit
    /// [`NodeKind::Null`], so this agrees with comparing the text to `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.kind == NodeKind::Null
    }

    fn expect_kind(&self, kind: NodeKind) -> Result<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(Error::mismatch(kind.name(), self.kind.name()))
        }
    }

    /// # Errors
    ///
    /// [`Error::ValueTypeMismatch`] unless the node is a boolean.
    pub fn get_bool(&self) -> Result<bool> {
        self.expect_kind(NodeKind::Boolean)?;
        Ok(self.span.as_str() == "true")
    }

    /// The unescaped string value, borrowed when it contains no escapes.
    ///
    /// # Errors
    ///
    /// [`Error::ValueTypeMismatch`] unless the node is a string.
    pub fn get_str(&self) -> Result<Cow<'a, str>> {
        self.expect_kind(NodeKind::String)?;
        let quoted = self.span.as_str();
        let inner = &quoted[1..quoted.len() - 1];
        unescape_string(inner).map_err(|e| syntax(e, self.start()))
    }

    /// # Errors
    ///
    /// [`Error::ValueTypeMismatch`] unless the node is a number.
    pub fn get_f64(&self) -> Result<f64> {
        self.expect_kind(NodeKind::Number)?;
        let tok = self.span.as_str();
        tok.parse::<f64>().map_err(|_| Error::mismatch("f64", tok))
    }

    /// Parsed directly as `f32` so the result is the nearest `f32` to the text.
    ///
    /// # Errors
    ///
    /// [`Error::ValueTypeMismatch`] unless the node is a number.
    pub fn get_f32(&self) -> Result<f32> {
        self.expect_kind(NodeKind::Number)?;
        let tok = self.span.as_str();
        tok.parse::<f32>().map_err(|_| Error::mismatch("f32", tok))
    }

    /// Integral value. Tokens with a fraction or exponent are accepted when
    /// they denote a whole number (`2.0`, `1e3`).
    ///
    /// # Errors
    ///
    /// [`Error::ValueTypeMismatch`] unless the node is a whole number that fits
    /// in `i64`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn get_i64(&self) -> Result<i64> {
        self.expect_kind(NodeKind::Number)?;
        let tok = self.span.as_str();
        match lex_number(tok) {
            Some(NumberLexeme::Integer(t)) => t.parse::<i64>().map_err(|_| Error::mismatch("i64", t)),
            Some(NumberLexeme::Float(t)) => {
                let v = t.parse::<f64>().map_err(|_| Error::mismatch("i64", t))?;
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                    Ok(v as i64)
                } else {
                    Err(Error::mismatch("i64", t))
                }
            }
            None => Err(Error::mismatch("i64", tok)),
        }
    }

    /// # Errors
    ///
    /// See [`JsonNode::get_i64`]; also fails if the value does not fit.
    pub fn get_i32(&self) -> Result<i32> {
        i32::try_from(self.get_i64()?).map_err(|_| Error::mismatch("i32", self.span.as_str()))
    }

    /// # Errors
    ///
    /// See [`JsonNode::get_i64`]; also fails if the value does not fit.
    pub fn get_u32(&self) -> Result<u32> {
        u32::try_from(self.get_i64()?).map_err(|_| Error::mismatch("u32", self.span.as_str()))
    }

    /// # Errors
    ///
    /// See [`JsonNode::get_i64`]; also fails for negative values.
    pub fn get_usize(&self) -> Result<usize> {
        usize::try_from(self.get_i64()?).map_err(|_| Error::mismatch("usize", self.span.as_str()))
    }

    /// Lazily parsed array items.
    ///
    /// # Errors
    ///
    /// [`Error::ValueTypeMismatch`] unless the node is an array.
    pub fn items(&self) -> Result<Items<'a>> {
        self.expect_kind(NodeKind::Array)?;
        Ok(Items(self.children(0)))
    }

    /// Lazily parsed `(key, value)` pairs; keys are string nodes.
    ///
    /// # Errors
    ///
    /// [`Error::ValueTypeMismatch`] unless the node is an object.
    pub fn entries(&self) -> Result<Entries<'a>> {
        self.expect_kind(NodeKind::Object)?;
        Ok(Entries(self.children(0)))
    }

    /// Number of direct children of a container.
    ///
    /// # Errors
    ///
    /// [`Error::ValueTypeMismatch`] for scalars; syntax errors from the walk.
    pub fn item_count(&self) -> Result<usize> {
        if !self.kind.is_container() {
            return Err(Error::mismatch("array or object", self.kind.name()));
        }
        let mut n = 0;
        for child in self.children(0) {
            child?;
            n += 1;
        }
        Ok(n)
    }

    /// The `i`-th array item.
    ///
    /// # Errors
    ///
    /// [`Error::BoundsViolation`] if the array has fewer than `i + 1` items.
    pub fn index(&self, i: usize) -> Result<JsonNode<'a>> {
        let mut n = 0;
        for item in self.items()? {
            let item = item?;
            if n == i {
                return Ok(item);
            }
            n += 1;
        }
        Err(Error::out_of_bounds("array index", i, n))
    }

    /// The value stored under `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the object has no such key.
    pub fn get(&self, key: &str) -> Result<JsonNode<'a>> {
        self.try_get(key)?
            .ok_or_else(|| Error::KeyNotFound(key.to_owned()))
    }

    /// The value stored under `key`, if any. The walk stops at the first match.
    ///
    /// # Errors
    ///
    /// [`Error::ValueTypeMismatch`] unless the node is an object.
    pub fn try_get(&self, key: &str) -> Result<Option<JsonNode<'a>>> {
        for entry in self.entries()? {
            let (k, v) = entry?;
            if k.get_str()? == key {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    /// Builds an owned [`Value`] tree.
    ///
    /// # Errors
    ///
    /// Any syntax error inside the value.
    pub fn to_value(&self) -> Result<Value> {
        Ok(match self.kind {
            NodeKind::Null => Value::Null,
            NodeKind::Boolean => Value::Boolean(self.get_bool()?),
            NodeKind::Number => Value::Number(self.get_f64()?),
            NodeKind::String => Value::String(self.get_str()?.into_owned()),
            NodeKind::Array => Value::Array(
                self.items()?
                    .map(|item| item?.to_value())
                    .collect::<Result<_>>()?,
            ),
            NodeKind::Object => {
                let mut map = Map::new();
                for entry in self.entries()? {
                    let (k, v) = entry?;
                    map.insert(k.get_str()?.into_owned(), v.to_value()?);
                }
                Value::Object(map)
            }
        })
    }

    /// Re-serializes the value into `w`. Numbers keep their source text.
    ///
    /// # Errors
    ///
    /// Syntax errors inside the value, or writer placement errors.
    pub fn write_to(&self, w: &mut JsonWriter) -> Result<()> {
        match self.kind {
            NodeKind::Null => w.value_null(),
            NodeKind::Boolean => w.value_bool(self.get_bool()?),
            NodeKind::Number => w.dump(self.span.as_str()),
            NodeKind::String => w.value_str(&self.get_str()?),
            NodeKind::Array => {
                w.begin_array()?;
                for item in self.items()? {
                    item?.write_to(w)?;
                }
                w.end_array()
            }
            NodeKind::Object => {
                w.begin_map()?;
                for entry in self.entries()? {
                    let (k, v) = entry?;
                    w.key(&k.get_str()?)?;
                    v.write_to(w)?;
                }
                w.end_map()
            }
        }
    }
}

enum WalkState {
    Walking,
    Closed(usize),
    Failed,
}

/// One step of a child walk: an array item or an object entry.
struct Child<'a> {
    key: Option<JsonNode<'a>>,
    value: JsonNode<'a>,
}

struct Children<'a> {
    text: &'a str,
    object: bool,
    close: u8,
    pos: usize,
    first: bool,
    depth: usize,
    /// Where a resolved container ends; the walk must close exactly there.
    end: Option<usize>,
    state: WalkState,
}

impl<'a> Children<'a> {
    fn step(&mut self) -> Result<Option<Child<'a>>> {
        let bytes = self.text.as_bytes();
        let mut pos = skip_whitespace(bytes, self.pos);
        let Some(&b) = bytes.get(pos) else {
            return Err(syntax(SyntaxError::UnexpectedEndOfInput, pos));
        };
        if b == self.close {
            if self.end.is_some_and(|end| end != pos + 1) {
                return Err(syntax(SyntaxError::TrailingCharacters, pos + 1));
            }
            self.state = WalkState::Closed(pos + 1);
            return Ok(None);
        }
        if !self.first {
            if b != b',' {
                let expected = if self.object { "',' or '}'" } else { "',' or ']'" };
                return Err(syntax(SyntaxError::Expected(expected), pos));
            }
            pos += 1;
        }
        self.first = false;

        let key = if self.object {
            let start = skip_whitespace(bytes, pos);
            match bytes.get(start) {
                Some(b'"') => {}
                Some(b'}' | b']') => return Err(syntax(SyntaxError::Expected("object key"), start)),
                Some(_) => return Err(syntax(SyntaxError::NonStringKey, start)),
                None => return Err(syntax(SyntaxError::UnexpectedEndOfInput, start)),
            }
            let (key, key_end) = scan_scalar(self.text, start, NodeKind::String)?;
            let colon = skip_whitespace(bytes, key_end);
            if bytes.get(colon) != Some(&b':') {
                return Err(syntax(SyntaxError::Expected("':'"), colon));
            }
            pos = colon + 1;
            Some(key)
        } else {
            None
        };

        let (value, end) = scan_value(self.text, pos, self.depth)?;
        self.pos = end;
        Ok(Some(Child { key, value }))
    }

    /// Drains the walk and returns the offset one past the closing bracket.
    fn run_to_end(mut self) -> Result<usize> {
        for child in &mut self {
            child?;
        }
        match self.state {
            WalkState::Closed(end) => Ok(end),
            _ => Err(syntax(SyntaxError::UnexpectedEndOfInput, self.pos)),
        }
    }
}

impl<'a> Iterator for Children<'a> {
    type Item = Result<Child<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if !matches!(self.state, WalkState::Walking) {
            return None;
        }
        match self.step() {
            Ok(Some(child)) => Some(Ok(child)),
            Ok(None) => None,
            Err(e) => {
                self.state = WalkState::Failed;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Children<'_> {}

/// Iterator over array items, see [`JsonNode::items`].
pub struct Items<'a>(Children<'a>);

impl<'a> Iterator for Items<'a> {
    type Item = Result<JsonNode<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|child| child.map(|c| c.value))
    }
}

impl FusedIterator for Items<'_> {}

/// Iterator over object entries, see [`JsonNode::entries`].
pub struct Entries<'a>(Children<'a>);

impl<'a> Iterator for Entries<'a> {
    type Item = Result<(JsonNode<'a>, JsonNode<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|child| {
            child.and_then(|c| match c.key {
                Some(key) => Ok((key, c.value)),
                None => Err(Error::mismatch("object entry", "array item")),
            })
        })
    }
}

impl FusedIterator for Entries<'_> {}
