//! Token-end scanning over JSON source bytes.
//!
//! Every function takes the full text and an absolute start offset and
//! returns the absolute offset one past the token. Positions in errors are
//! absolute as well.

use bstr::ByteSlice;

use super::error::{ParseError, SyntaxError};
use crate::escape::{decode_simple_escape, read_code_unit};

#[inline]
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline]
pub(crate) fn is_structural(b: u8) -> bool {
    matches!(b, b'{' | b'}' | b'[' | b']' | b',' | b':')
}

/// Offset of the first non-whitespace byte at or after `pos`.
pub(crate) fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).copied().is_some_and(is_whitespace) {
        pos += 1;
    }
    pos
}

/// Scans a string literal whose opening quote is at `start`.
///
/// Validates escapes (the two-character table and `\u` + 4 hex digits) and
/// rejects raw control characters.
pub(crate) fn scan_string(bytes: &[u8], start: usize) -> Result<usize, ParseError> {
    let mut i = start + 1;
    loop {
        let Some(rel) = bytes[i..].find_byteset(b"\"\\") else {
            return Err(ParseError::new(SyntaxError::UnterminatedString, start));
        };
        if let Some(bad) = bytes[i..i + rel].iter().position(|&b| b < 0x20) {
            return Err(ParseError::new(
                SyntaxError::ControlCharacter(u32::from(bytes[i + bad])),
                i + bad,
            ));
        }
        i += rel;
        if bytes[i] == b'"' {
            return Ok(i + 1);
        }

        let Some(&letter) = bytes.get(i + 1) else {
            return Err(ParseError::new(SyntaxError::UnterminatedString, start));
        };
        if letter == b'u' {
            read_code_unit(&bytes[i + 2..]).map_err(|e| match e {
                SyntaxError::UnexpectedEndOfInput => {
                    ParseError::new(SyntaxError::UnterminatedString, start)
                }
                other => ParseError::new(other, i),
            })?;
            i += 6;
        } else if decode_simple_escape(letter).is_some() {
            i += 2;
        } else {
            return Err(ParseError::new(SyntaxError::InvalidEscape(letter as char), i));
        }
    }
}

/// Scans a bare literal (number, `true`, `false`, `null`) up to whitespace, a
/// structural byte or the end of input.
pub(crate) fn scan_literal(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| is_whitespace(b) || is_structural(b) || b == b'"')
        .map_or(bytes.len(), |rel| start + rel)
}
