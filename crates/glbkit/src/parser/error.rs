use thiserror::Error;

/// A JSON grammar violation together with the byte offset it was detected at.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source} at byte {position}")]
pub struct ParseError {
    pub(crate) source: SyntaxError,
    pub(crate) position: usize,
}

impl ParseError {
    pub(crate) fn new(source: SyntaxError, position: usize) -> Self {
        Self { source, position }
    }

    /// The kind of grammar violation.
    #[must_use]
    pub fn kind(&self) -> &SyntaxError {
        &self.source
    }

    /// Byte offset into the parsed text.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }
}

/// The grammar rule a [`ParseError`] violated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// A byte that cannot start a value.
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    /// A backslash followed by a letter outside the escape table.
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),
    /// A non-hex digit inside `\u`.
    #[error("invalid unicode escape sequence at character: '{0}'")]
    InvalidUnicodeEscapeChar(char),
    /// A `\u` escape that does not form a scalar value, such as a lone
    /// surrogate.
    #[error("invalid unicode escape sequence \\u{0:04X}")]
    InvalidUnicodeEscapeSequence(u32),
    /// An unescaped control character inside a string.
    #[error("control character U+{0:04X} in string")]
    ControlCharacter(u32),
    /// A bare token that is neither a keyword nor a well-formed number.
    #[error("invalid literal '{0}'")]
    InvalidLiteral(String),
    /// A structural byte other than the one named.
    #[error("expected {0}")]
    Expected(&'static str),
    /// An object key that is not a string.
    #[error("object key must be a string")]
    NonStringKey,
    /// End of input inside a string.
    #[error("unterminated string")]
    UnterminatedString,
    /// Non-whitespace after a value that should end the text.
    #[error("trailing characters after value")]
    TrailingCharacters,
    /// End of input inside a container.
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    /// More nested containers than [`MAX_DEPTH`](super::MAX_DEPTH).
    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),
}
