/// Lexical class of a validated number token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberLexeme<'a> {
    Integer(&'a str), // no '.' and no exponent
    Float(&'a str),   // has '.' or exponent
}

/// Validates `tok` against the JSON number grammar:
/// `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
pub(crate) fn lex_number(tok: &str) -> Option<NumberLexeme<'_>> {
    let b = tok.as_bytes();
    let mut i = usize::from(b.first() == Some(&b'-'));

    match b.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => {
            while b.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
            }
        }
        _ => return None,
    }

    let mut float = false;
    if b.get(i) == Some(&b'.') {
        float = true;
        i += 1;
        let digits = i;
        while b.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        if i == digits {
            return None;
        }
    }

    if matches!(b.get(i), Some(b'e' | b'E')) {
        float = true;
        i += 1;
        if matches!(b.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let digits = i;
        while b.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        if i == digits {
            return None;
        }
    }

    if i != b.len() {
        return None;
    }
    Some(if float {
        NumberLexeme::Float(tok)
    } else {
        NumberLexeme::Integer(tok)
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("0", true)]
    #[case("-0", true)]
    #[case("22", true)]
    #[case("3.3", false)]
    #[case("-5e-4", false)]
    #[case("1E+10", false)]
    #[case("-4.44444444444444444444", false)]
    fn accepts(#[case] tok: &str, #[case] integer: bool) {
        let lexeme = lex_number(tok).unwrap();
        assert_eq!(matches!(lexeme, NumberLexeme::Integer(_)), integer);
    }

    #[rstest]
    #[case("")]
    #[case("-")]
    #[case("01")]
    #[case("1.")]
    #[case(".5")]
    #[case("1e")]
    #[case("+1")]
    #[case("1x")]
    #[case("0x10")]
    fn rejects(#[case] tok: &str) {
        assert_eq!(lex_number(tok), None);
    }
}
