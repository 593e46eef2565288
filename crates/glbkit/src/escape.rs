//! JSON string escaping in both directions.
//!
//! The scanner, the unescaper and the writer share one table of two-character
//! escapes so that `unescape(escape(s)) == s` holds for every string and
//! `escape(unescape(e)) == e` holds for every escape in the table.

use std::borrow::Cow;
use core::fmt;

use crate::parser::SyntaxError;

/// `(escape letter, decoded char)` pairs.
const SIMPLE_ESCAPES: [(u8, char); 8] = [
    (b'"', '"'),
    (b'\\', '\\'),
    (b'/', '/'),
    (b'b', '\u{08}'),
    (b'f', '\u{0C}'),
    (b'n', '\n'),
    (b'r', '\r'),
    (b't', '\t'),
];

/// Decoded char for `\<letter>`, `None` if `letter` is not a simple escape.
pub(crate) fn decode_simple_escape(letter: u8) -> Option<char> {
    SIMPLE_ESCAPES
        .iter()
        .find(|(l, _)| *l == letter)
        .map(|(_, c)| *c)
}

fn encode_simple_escape(c: char) -> Option<u8> {
    SIMPLE_ESCAPES
        .iter()
        .find(|(_, d)| *d == c)
        .map(|(l, _)| *l)
}

/// Accumulates the four hex digits of a `\u` escape.
#[derive(Debug, Default)]
pub(crate) struct UnicodeEscapeBuffer {
    value: u32,
    len: u8,
}

impl UnicodeEscapeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one hex digit. Returns the UTF-16 code unit once four digits have
    /// been seen, and resets for the next escape.
    pub fn feed(&mut self, b: u8) -> Result<Option<u32>, SyntaxError> {
        let digit = (b as char)
            .to_digit(16)
            .ok_or(SyntaxError::InvalidUnicodeEscapeChar(b as char))?;
        self.value = (self.value << 4) | digit;
        self.len += 1;
        if self.len == 4 {
            let unit = self.value;
            *self = Self::default();
            Ok(Some(unit))
        } else {
            Ok(None)
        }
    }
}

/// Reads the four hex digits at the start of `bytes` as one code unit.
pub(crate) fn read_code_unit(bytes: &[u8]) -> Result<u32, SyntaxError> {
    let mut buf = UnicodeEscapeBuffer::new();
    for &b in bytes.iter().take(4) {
        if let Some(unit) = buf.feed(b)? {
            return Ok(unit);
        }
    }
    Err(SyntaxError::UnexpectedEndOfInput)
}

/// Decodes the body of a JSON string literal (without the quotes).
///
/// Borrows the input when it contains no escapes. Surrogate pairs written as
/// two `\u` escapes are combined; lone surrogates are rejected.
pub fn unescape_string(raw: &str) -> Result<Cow<'_, str>, SyntaxError> {
    let Some(first) = raw.find('\\') else {
        return Ok(Cow::Borrowed(raw));
    };

    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..first]);
    let mut i = first;
    while i < bytes.len() {
        let Some(rel) = raw[i..].find('\\') else {
            out.push_str(&raw[i..]);
            break;
        };
        out.push_str(&raw[i..i + rel]);
        i += rel + 1;
        let letter = *bytes.get(i).ok_or(SyntaxError::UnexpectedEndOfInput)?;
        i += 1;
        if letter != b'u' {
            out.push(decode_simple_escape(letter).ok_or(SyntaxError::InvalidEscape(letter as char))?);
            continue;
        }

        let unit = read_code_unit(&bytes[i..])?;
        i += 4;
        let code = if (0xD800..0xDC00).contains(&unit) {
            if bytes.get(i..i + 2) != Some(&b"\\u"[..]) {
                return Err(SyntaxError::InvalidUnicodeEscapeSequence(unit));
            }
            let low = read_code_unit(&bytes[i + 2..])?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(SyntaxError::InvalidUnicodeEscapeSequence(low));
            }
            i += 6;
            0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00)
        } else {
            unit
        };
        out.push(char::from_u32(code).ok_or(SyntaxError::InvalidUnicodeEscapeSequence(code))?);
    }
    Ok(Cow::Owned(out))
}

/// Writes `src` escaped for inclusion in a JSON string literal.
///
/// Table characters use their two-character form, other control characters
/// use `\u00XX`.
pub(crate) fn write_escaped_string<W: fmt::Write>(src: &str, f: &mut W) -> fmt::Result {
    for c in src.chars() {
        if let Some(letter) = encode_simple_escape(c) {
            f.write_char('\\')?;
            f.write_char(letter as char)?;
        } else if c.is_control() && (c as u32) <= 0xFFFF {
            write!(f, "\\u{:04X}", c as u32)?;
        } else {
            f.write_char(c)?;
        }
    }
    Ok(())
}

/// Escapes `src` for inclusion in a JSON string literal.
#[must_use]
pub fn escape_string(src: &str) -> String {
    let mut result = String::with_capacity(src.len() + 2);
    // Writing into a String cannot fail.
    let _ = write_escaped_string(src, &mut result);
    result
}
