//! Phase 1: Tokenizer
//!
//! The tokenizer scans JSON text left to right and emits value and
//! container tokens. It has no notion of nesting. Whitespace, `:` and `,`
//! are separators: the scanner recognizes them (the strict validator needs
//! them) but the public token stream drops them, and the parser infers
//! structure from the order of value and container tokens alone.
//!
//! At each position the scanner tries, in order: a keyword
//! (`true`, `false`, `null`), a structural character, a number
//! `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`, or a double-quoted
//! string. Keywords and numbers must end on a word boundary. A position
//! that matches nothing is a `MalformedJson` error carrying its byte
//! offset.

use crate::error::{CodecError, ParseContext, Result};

/// A syntactic token. Tokens carry no position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `{`
    ObjectOpen,
    /// `}`
    ObjectClose,
    /// `[`
    ArrayOpen,
    /// `]`
    ArrayClose,
    /// String content between the quotes, escapes not yet decoded.
    StringLiteral(String),
    /// Number text exactly as written.
    NumberLiteral(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
}

/// A token or a separator, as seen by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lexeme {
    Token(Token),
    Colon,
    Comma,
}

/// Low-level scanner shared by the tokenizer and the strict validator.
pub(crate) struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    ctx: ParseContext,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(input: &'a str, ctx: ParseContext) -> Self {
        Self { input, pos: 0, ctx }
    }

    /// Next lexeme and its byte offset, or `None` at end of input.
    pub(crate) fn next_lexeme(&mut self) -> Option<Result<(usize, Lexeme)>> {
        self.skip_whitespace();
        let bytes = self.input.as_bytes();
        let start = self.pos;
        let &b = bytes.get(start)?;

        let lexeme = match b {
            b'{' => self.single(Lexeme::Token(Token::ObjectOpen)),
            b'}' => self.single(Lexeme::Token(Token::ObjectClose)),
            b'[' => self.single(Lexeme::Token(Token::ArrayOpen)),
            b']' => self.single(Lexeme::Token(Token::ArrayClose)),
            b':' => self.single(Lexeme::Colon),
            b',' => self.single(Lexeme::Comma),
            b't' => self.keyword("true", Token::True),
            b'f' => self.keyword("false", Token::False),
            b'n' => self.keyword("null", Token::Null),
            b'"' => self.string(),
            b'-' | b'0'..=b'9' => self.number(),
            _ => Err(self.unexpected_char(start)),
        };

        Some(lexeme.map(|l| (start, l)))
    }

    /// Byte offset of the next unread character.
    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = bytes.get(self.pos) {
            self.pos += 1;
        }
    }

    fn single(&mut self, lexeme: Lexeme) -> Result<Lexeme> {
        self.pos += 1;
        Ok(lexeme)
    }

    fn keyword(&mut self, word: &str, token: Token) -> Result<Lexeme> {
        let start = self.pos;
        if !self.input[start..].starts_with(word) {
            return Err(self.malformed(format!("Expected '{}'", word), start));
        }
        self.pos += word.len();
        self.expect_boundary(start)?;
        Ok(Lexeme::Token(token))
    }

    fn number(&mut self) -> Result<Lexeme> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        let mut end = start;

        if bytes.get(end) == Some(&b'-') {
            end += 1;
        }

        // Integer part: a lone zero, or a non-zero digit run.
        match bytes.get(end) {
            Some(b'0') => end += 1,
            Some(b'1'..=b'9') => end = digits_end(bytes, end),
            _ => return Err(self.malformed("Invalid number", start)),
        }

        // Fraction and exponent are only taken when complete.
        if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
            end = digits_end(bytes, end + 1);
        }
        if let Some(b'e' | b'E') = bytes.get(end) {
            let mut exp = end + 1;
            if let Some(b'+' | b'-') = bytes.get(exp) {
                exp += 1;
            }
            if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
                end = digits_end(bytes, exp);
            }
        }

        self.pos = end;
        self.expect_boundary(start)?;
        Ok(Lexeme::Token(Token::NumberLiteral(
            self.input[start..end].to_string(),
        )))
    }

    fn string(&mut self) -> Result<Lexeme> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        let mut i = start + 1;

        loop {
            match bytes.get(i) {
                None => return Err(self.malformed("Unterminated string", start)),
                Some(b'"') => break,
                Some(b'\\') => match bytes.get(i + 1) {
                    Some(b'"' | b'/' | b'\\' | b'b' | b'f' | b'n' | b'r' | b't') => i += 2,
                    Some(b'u') => {
                        let hex = bytes.get(i + 2..i + 6);
                        if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                            return Err(self.malformed("Bad Unicode escape", i));
                        }
                        i += 6;
                    }
                    None => return Err(self.malformed("Unterminated string", start)),
                    Some(_) => return Err(self.malformed("Bad escaped character", i)),
                },
                // TAB is the one control character allowed raw.
                Some(&c) if c < 0x20 && c != b'\t' => {
                    return Err(self.malformed("Bad character in string", i));
                }
                Some(_) => i += 1,
            }
        }

        self.pos = i + 1;
        Ok(Lexeme::Token(Token::StringLiteral(
            self.input[start + 1..i].to_string(),
        )))
    }

    fn expect_boundary(&self, start: usize) -> Result<()> {
        match self.input.as_bytes().get(self.pos) {
            Some(&c) if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' => Err(self.malformed(
                format!("Unexpected '{}' after literal", c as char),
                start,
            )),
            _ => Ok(()),
        }
    }

    fn unexpected_char(&self, at: usize) -> CodecError {
        let c = self.input[at..].chars().next().unwrap_or('\u{fffd}');
        self.malformed(format!("Unexpected character {:?}", c), at)
    }

    fn malformed(&self, detail: impl Into<String>, at: usize) -> CodecError {
        CodecError::malformed(detail).with_location(&self.ctx, Some(at))
    }
}

fn digits_end(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    i
}

/// Lazy token stream over JSON text.
///
/// Yields each token once, top to bottom. After the first error the stream
/// is exhausted.
pub struct Lexer<'a> {
    scanner: Scanner<'a>,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_context(input, ParseContext::default())
    }

    pub fn with_context(input: &'a str, ctx: ParseContext) -> Self {
        Self {
            scanner: Scanner::new(input, ctx),
            failed: false,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            match self.scanner.next_lexeme()? {
                Ok((_, Lexeme::Token(token))) => return Some(Ok(token)),
                Ok((_, Lexeme::Colon | Lexeme::Comma)) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Scan JSON text into tokens.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> Token {
        Token::StringLiteral(s.to_string())
    }

    fn number(s: &str) -> Token {
        Token::NumberLiteral(s.to_string())
    }

    #[test]
    fn test_structural_and_literals() {
        assert_eq!(
            tokenize("{}[] true false null").unwrap(),
            vec![
                Token::ObjectOpen,
                Token::ObjectClose,
                Token::ArrayOpen,
                Token::ArrayClose,
                Token::True,
                Token::False,
                Token::Null,
            ]
        );
    }

    #[test]
    fn test_separators_produce_no_tokens() {
        assert_eq!(
            tokenize("{\"key\" :\t\"value\" ,\r\n}").unwrap(),
            vec![
                Token::ObjectOpen,
                string("key"),
                string("value"),
                Token::ObjectClose,
            ]
        );
        assert_eq!(tokenize(" , : ").unwrap(), vec![]);
        assert_eq!(tokenize("").unwrap(), vec![]);
    }

    #[test]
    fn test_numbers() {
        for text in ["0", "-0", "123", "-123", "1.5", "-0.25", "1e10", "1E+10", "2.5e-3"] {
            assert_eq!(tokenize(text).unwrap(), vec![number(text)], "{}", text);
        }
    }

    #[test]
    fn test_number_edge_cases_rejected() {
        for text in ["01", "-", "1.", ".5", "1e", "1e+", "+1", "1.5.5", "-a", "0x10"] {
            let err = tokenize(text).unwrap_err();
            assert!(err.is_malformed(), "{}", text);
        }
    }

    #[test]
    fn test_keyword_needs_boundary() {
        assert!(tokenize("truex").is_err());
        assert!(tokenize("nul").is_err());
        assert!(tokenize("fals").is_err());
        assert_eq!(tokenize("[true]").unwrap().len(), 3);
    }

    #[test]
    fn test_string_keeps_raw_escapes() {
        assert_eq!(
            tokenize(r#""a\nb\"c\u0041\/""#).unwrap(),
            vec![string(r#"a\nb\"c\u0041\/"#)]
        );
    }

    #[test]
    fn test_string_non_ascii() {
        assert_eq!(
            tokenize("\"olá_こんにちは_💩\"").unwrap(),
            vec![string("olá_こんにちは_💩")]
        );
    }

    #[test]
    fn test_string_allows_raw_tab_only() {
        assert_eq!(tokenize("\"a\tb\"").unwrap(), vec![string("a\tb")]);
        assert!(tokenize("\"a\nb\"").is_err());
        assert!(tokenize("\"a\u{1}b\"").is_err());
    }

    #[test]
    fn test_string_errors() {
        let err = tokenize("\"unclosed").unwrap_err();
        assert_eq!(err.to_string(), "Malformed JSON: Unterminated string at byte 0");

        let err = tokenize("[\"bad \\x\"]").unwrap_err();
        assert_eq!(err.to_string(), "Malformed JSON: Bad escaped character at byte 6");

        assert!(tokenize(r#""\u12""#).is_err());
        assert!(tokenize(r#""\uXXXX""#).is_err());
        assert!(tokenize("\"trailing\\").is_err());
    }

    #[test]
    fn test_unexpected_character_offset() {
        let err = tokenize("[1, @]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed JSON: Unexpected character '@' at byte 4"
        );
        assert!(tokenize("not json").is_err());
    }

    #[test]
    fn test_lexer_is_lazy_and_fused() {
        let mut lexer = Lexer::new("[1 @ 2]");
        assert_eq!(lexer.next().unwrap().unwrap(), Token::ArrayOpen);
        assert_eq!(lexer.next().unwrap().unwrap(), number("1"));
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_error_names_file() {
        let ctx = ParseContext::new(Some("reply.json"));
        let err = Lexer::with_context("?", ctx).next().unwrap().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed JSON: Unexpected character '?' at byte 0 of <reply.json>"
        );
    }
}
