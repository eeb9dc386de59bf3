//! Backslash escape resolution
//!
//! Shared by expression string literals and by the script compiler for
//! quoted-string nodes, so both accept exactly the same escape set.

/// Characters accepted after a backslash, paired with what they stand for
const ESCAPES: &[(char, char)] = &[
    ('n', '\n'),
    ('r', '\r'),
    ('t', '\t'),
    ('b', '\u{08}'),
    ('f', '\u{0C}'),
    ('v', '\u{0B}'),
    ('0', '\0'),
    ('a', '\u{07}'),
    ('e', '\u{1B}'),
    ('\\', '\\'),
    ('"', '"'),
    ('\'', '\''),
];

/// Map the character following a backslash to its resolved value
pub fn escaped_char(c: char) -> Option<char> {
    ESCAPES
        .iter()
        .find(|(key, _)| *key == c)
        .map(|(_, value)| *value)
}

/// Resolve every escape sequence in `raw`.
///
/// On failure returns one message per offending sequence, each naming the
/// sequence as written in the source.
pub fn unescape(raw: &str) -> Result<String, Vec<String>> {
    let mut out = String::with_capacity(raw.len());
    let mut errors = Vec::new();
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) => match escaped_char(next) {
                Some(resolved) => out.push(resolved),
                None => errors.push(format!("unknown escape sequence '\\{next}'")),
            },
            None => errors.push("incomplete escape sequence '\\' at end of string".to_string()),
        }
    }

    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_string_unchanged() {
        assert_eq!(unescape("hello world").unwrap(), "hello world");
    }

    #[test]
    fn test_all_known_escapes() {
        let resolved = unescape(r#"\n\r\t\b\f\v\0\a\e\\\"\'"#).unwrap();
        assert_eq!(
            resolved,
            "\n\r\t\u{08}\u{0C}\u{0B}\0\u{07}\u{1B}\\\"'"
        );
    }

    #[test]
    fn test_newline_in_middle() {
        assert_eq!(unescape(r"a\nb").unwrap(), "a\nb");
    }

    #[test]
    fn test_unknown_escape_named() {
        let errors = unescape(r"bad \q here").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("\\q"));
    }

    #[test]
    fn test_each_unknown_escape_reported() {
        let errors = unescape(r"\x and \y").unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_trailing_backslash() {
        let errors = unescape("oops\\").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("incomplete"));
    }
}
