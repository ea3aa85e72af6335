//! Decoder for multi-valued cells.
//!
//! The source export stores artists, writers, producers and tags as
//! Python-literal lists of strings, e.g. `['Taylor Swift', "Liz Rose"]`.
//! This module turns one such cell into an ordered `Vec<String>`.
//!
//! Decoding never panics. A malformed cell yields a [`ListDecodeError`];
//! whether that error is fatal is the caller's decision.

use thiserror::Error;

/// Why a list cell could not be decoded. `pos` is a char offset into the cell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListDecodeError {
    #[error("expected '[' or '(' at {pos}")]
    NotAList { pos: usize },
    #[error("expected a quoted string at {pos}")]
    NotAString { pos: usize },
    #[error("unterminated string starting at {pos}")]
    UnterminatedString { pos: usize },
    #[error("invalid escape sequence at {pos}")]
    InvalidEscape { pos: usize },
    #[error("expected ',' or a closing bracket at {pos}")]
    ExpectedSeparator { pos: usize },
    #[error("unexpected trailing input at {pos}")]
    TrailingInput { pos: usize },
    #[error("unexpected end of input")]
    UnexpectedEnd,
}

/// Decode an optional list cell.
///
/// A missing cell is an empty list, not an error.
pub fn decode_list(cell: Option<&str>) -> Result<Vec<String>, ListDecodeError> {
    match cell {
        None => Ok(Vec::new()),
        Some(text) if text.trim().is_empty() => Ok(Vec::new()),
        Some(text) => Parser::new(text).parse_list(),
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// A list `[...]` or a tuple `(...)` of strings.
    fn parse_list(&mut self) -> Result<Vec<String>, ListDecodeError> {
        self.skip_whitespace();
        let close = match self.peek() {
            Some('[') => ']',
            Some('(') => ')',
            _ => return Err(ListDecodeError::NotAList { pos: self.pos }),
        };
        let open_pos = self.pos;
        self.pos += 1;

        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ListDecodeError::UnexpectedEnd),
                Some(c) if c == close => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {}
            }

            items.push(self.parse_string()?);
            trailing_comma = false;

            self.skip_whitespace();
            match self.peek() {
                None => return Err(ListDecodeError::UnexpectedEnd),
                Some(',') => {
                    self.pos += 1;
                    trailing_comma = true;
                }
                Some(c) if c == close => {
                    self.pos += 1;
                    break;
                }
                Some(_) => return Err(ListDecodeError::ExpectedSeparator { pos: self.pos }),
            }
        }

        // `('a')` is a parenthesized string, not a one-element tuple
        if close == ')' && items.len() == 1 && !trailing_comma {
            return Err(ListDecodeError::NotAList { pos: open_pos });
        }

        self.skip_whitespace();
        if self.pos < self.chars.len() {
            return Err(ListDecodeError::TrailingInput { pos: self.pos });
        }
        Ok(items)
    }

    /// One list element: one or more adjacent string literals, concatenated.
    fn parse_string(&mut self) -> Result<String, ListDecodeError> {
        let mut value = self.parse_literal()?;
        loop {
            let save = self.pos;
            self.skip_whitespace();
            if self.at_literal_start() {
                value.push_str(&self.parse_literal()?);
            } else {
                self.pos = save;
                return Ok(value);
            }
        }
    }

    fn at_literal_start(&self) -> bool {
        match self.peek() {
            Some('\'') | Some('"') => true,
            Some('u' | 'U' | 'r' | 'R') => {
                matches!(self.chars.get(self.pos + 1), Some('\'') | Some('"'))
            }
            _ => false,
        }
    }

    fn parse_literal(&mut self) -> Result<String, ListDecodeError> {
        if !self.at_literal_start() {
            return Err(ListDecodeError::NotAString { pos: self.pos });
        }
        let start = self.pos;
        let mut raw = false;
        if let Some(prefix) = self.peek().filter(|c| c.is_alphabetic()) {
            raw = matches!(prefix, 'r' | 'R');
            self.pos += 1;
        }
        let quote = self.chars[self.pos];
        self.pos += 1;

        let mut out = String::new();
        loop {
            let c = self
                .peek()
                .ok_or(ListDecodeError::UnterminatedString { pos: start })?;
            self.pos += 1;
            match c {
                c if c == quote => return Ok(out),
                '\n' => return Err(ListDecodeError::UnterminatedString { pos: start }),
                '\\' if raw => {
                    // Raw strings keep the backslash but still cannot end on an escaped quote.
                    out.push('\\');
                    if let Some(next) = self.peek() {
                        out.push(next);
                        self.pos += 1;
                    }
                }
                '\\' => self.parse_escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), ListDecodeError> {
        let escape_pos = self.pos - 1;
        let c = self.peek().ok_or(ListDecodeError::UnexpectedEnd)?;
        self.pos += 1;
        match c {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'v' => out.push('\u{0B}'),
            '0'..='7' => {
                let mut value = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                let ch = char::from_u32(value)
                    .ok_or(ListDecodeError::InvalidEscape { pos: escape_pos })?;
                out.push(ch);
            }
            'x' => out.push(self.parse_hex(2, escape_pos)?),
            'u' => out.push(self.parse_hex(4, escape_pos)?),
            'U' => out.push(self.parse_hex(8, escape_pos)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn parse_hex(&mut self, digits: usize, escape_pos: usize) -> Result<char, ListDecodeError> {
        let mut value: u32 = 0;
        for _ in 0..digits {
            let d = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or(ListDecodeError::InvalidEscape { pos: escape_pos })?;
            value = value * 16 + d;
            self.pos += 1;
        }
        char::from_u32(value).ok_or(ListDecodeError::InvalidEscape { pos: escape_pos })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_blank_cells_are_empty() {
        assert_eq!(decode_list(None), Ok(vec![]));
        assert_eq!(decode_list(Some("")), Ok(vec![]));
        assert_eq!(decode_list(Some("   ")), Ok(vec![]));
        assert_eq!(decode_list(Some("[]")), Ok(vec![]));
        assert_eq!(decode_list(Some(" [ ] ")), Ok(vec![]));
    }

    #[test]
    fn test_single_and_double_quotes() {
        assert_eq!(
            decode_list(Some("['Taylor Swift', \"Liz Rose\"]")).unwrap(),
            vec!["Taylor Swift", "Liz Rose"]
        );
    }

    #[test]
    fn test_apostrophe_inside_double_quotes() {
        assert_eq!(
            decode_list(Some(r#"["Taylor's Version", 'Folk']"#)).unwrap(),
            vec!["Taylor's Version", "Folk"]
        );
    }

    #[test]
    fn test_escapes() {
        assert_eq!(
            decode_list(Some(r"['It\'s', 'a\tb', 'caf\xe9', 'é']")).unwrap(),
            vec!["It's", "a\tb", "café", "é"]
        );
        // Unknown escapes keep the backslash
        assert_eq!(decode_list(Some(r"['a\qb']")).unwrap(), vec![r"a\qb"]);
    }

    #[test]
    fn test_unicode_and_octal_escapes() {
        assert_eq!(
            decode_list(Some(r"['caf\u00e9', '\U0001F3B5']")).unwrap(),
            vec!["café", "\u{1F3B5}"]
        );
        assert_eq!(
            decode_list(Some(r"['\0', '\101']")).unwrap(),
            vec!["\0", "A"]
        );
    }

    #[test]
    fn test_line_continuation_is_dropped() {
        assert_eq!(
            decode_list(Some("['Taylor \\\nSwift']")).unwrap(),
            vec!["Taylor Swift"]
        );
    }

    #[test]
    fn test_invalid_code_point_rejected() {
        assert!(matches!(
            decode_list(Some(r"['\U00110000']")),
            Err(ListDecodeError::InvalidEscape { .. })
        ));
    }

    #[test]
    fn test_tuple_cells() {
        assert_eq!(
            decode_list(Some("('Pop', 'Synth-Pop')")).unwrap(),
            vec!["Pop", "Synth-Pop"]
        );
        assert_eq!(decode_list(Some("('Pop',)")).unwrap(), vec!["Pop"]);
        assert_eq!(decode_list(Some("()")), Ok(vec![]));
        // A parenthesized string is not a tuple
        assert!(matches!(
            decode_list(Some("('Pop')")),
            Err(ListDecodeError::NotAList { .. })
        ));
        assert!(matches!(
            decode_list(Some("('Pop']")),
            Err(ListDecodeError::ExpectedSeparator { .. })
        ));
    }

    #[test]
    fn test_whitespace_is_preserved_inside_strings() {
        assert_eq!(
            decode_list(Some("[' Jack Antonoff ', 'Aaron Dessner']")).unwrap(),
            vec![" Jack Antonoff ", "Aaron Dessner"]
        );
    }

    #[test]
    fn test_trailing_comma_and_concatenation() {
        assert_eq!(decode_list(Some("['a', 'b',]")).unwrap(), vec!["a", "b"]);
        assert_eq!(decode_list(Some("['a' 'b', u'c']")).unwrap(), vec!["ab", "c"]);
        assert_eq!(decode_list(Some(r"[r'a\n']")).unwrap(), vec![r"a\n"]);
    }

    #[test]
    fn test_malformed_cells() {
        assert!(matches!(
            decode_list(Some("['a', 'b'")),
            Err(ListDecodeError::UnexpectedEnd)
        ));
        assert!(matches!(
            decode_list(Some("['a, 'b']")),
            Err(ListDecodeError::ExpectedSeparator { .. })
        ));
        assert!(matches!(
            decode_list(Some("['unterminated]")),
            Err(ListDecodeError::UnterminatedString { .. })
        ));
        assert!(matches!(
            decode_list(Some("Taylor Swift")),
            Err(ListDecodeError::NotAList { .. })
        ));
        assert!(matches!(
            decode_list(Some("[1, 2]")),
            Err(ListDecodeError::NotAString { .. })
        ));
        assert!(matches!(
            decode_list(Some("['a'] extra")),
            Err(ListDecodeError::TrailingInput { .. })
        ));
        assert!(matches!(
            decode_list(Some(r"['\x4']")),
            Err(ListDecodeError::InvalidEscape { .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = decode_list(Some("oops")).unwrap_err();
        assert_eq!(err.to_string(), "expected '[' or '(' at 0");
    }
}
