//! Strict syntax check.
//!
//! The stack-machine parser ignores separators, so it accepts text such as
//! `["a" "b"]`. This module runs the same scanner with separators kept and
//! enforces the full JSON grammar: colons between keys and values, commas
//! between members, no trailing commas, and exactly one top-level value.
//! Unlike the parser, any value kind is accepted at the top level.

use crate::error::{CodecError, ParseContext, Result};
use crate::lexer::{Lexeme, Scanner, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// A value is required.
    Value,
    /// Just after `[`.
    ValueOrClose,
    /// Just after `{`.
    KeyOrClose,
    /// After a comma inside an object.
    Key,
    Colon,
    CommaOrClose,
    /// The top-level value is complete.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nest {
    Array,
    Object,
}

/// Returns `true` if `input` is a complete, well-formed JSON text.
pub fn is_json(input: &str) -> bool {
    validate(input).is_ok()
}

/// Check `input` against the JSON grammar, reporting the first violation.
pub fn validate(input: &str) -> Result<()> {
    validate_with_context(input, &ParseContext::default())
}

pub(crate) fn validate_with_context(input: &str, ctx: &ParseContext) -> Result<()> {
    let mut scanner = Scanner::new(input, ctx.clone());
    let mut nest: Vec<Nest> = Vec::new();
    let mut expect = Expect::Value;

    while let Some(next) = scanner.next_lexeme() {
        let (at, lexeme) = next?;
        let fail = |detail: &str| CodecError::malformed(detail).with_location(ctx, Some(at));

        expect = match (expect, lexeme) {
            (Expect::End, _) => return Err(fail("Unexpected content after value")),

            (Expect::Key | Expect::KeyOrClose, Lexeme::Token(Token::StringLiteral(_))) => {
                Expect::Colon
            }
            (Expect::KeyOrClose, Lexeme::Token(Token::ObjectClose)) => {
                nest.pop();
                after_value(&nest)
            }
            (Expect::Key | Expect::KeyOrClose, _) => return Err(fail("Expected string key")),

            (Expect::Colon, Lexeme::Colon) => Expect::Value,
            (Expect::Colon, _) => return Err(fail("Expected ':' after key")),

            (Expect::ValueOrClose, Lexeme::Token(Token::ArrayClose)) => {
                nest.pop();
                after_value(&nest)
            }
            (Expect::Value | Expect::ValueOrClose, Lexeme::Token(token)) => match token {
                Token::ObjectOpen => {
                    nest.push(Nest::Object);
                    Expect::KeyOrClose
                }
                Token::ArrayOpen => {
                    nest.push(Nest::Array);
                    Expect::ValueOrClose
                }
                Token::ObjectClose | Token::ArrayClose => {
                    return Err(fail("Expected value"));
                }
                _ => after_value(&nest),
            },
            (Expect::Value | Expect::ValueOrClose, _) => return Err(fail("Expected value")),

            (Expect::CommaOrClose, Lexeme::Comma) => match nest.last() {
                Some(Nest::Object) => Expect::Key,
                _ => Expect::Value,
            },
            (Expect::CommaOrClose, Lexeme::Token(Token::ArrayClose))
                if nest.last() == Some(&Nest::Array) =>
            {
                nest.pop();
                after_value(&nest)
            }
            (Expect::CommaOrClose, Lexeme::Token(Token::ObjectClose))
                if nest.last() == Some(&Nest::Object) =>
            {
                nest.pop();
                after_value(&nest)
            }
            (Expect::CommaOrClose, _) => match nest.last() {
                Some(Nest::Object) => return Err(fail("Expected ',' or '}'")),
                _ => return Err(fail("Expected ',' or ']'")),
            },
        };
    }

    let at_end = Some(scanner.offset());
    match expect {
        Expect::End => Ok(()),
        Expect::Value if nest.is_empty() => {
            Err(CodecError::malformed("Empty input").with_location(ctx, at_end))
        }
        _ => Err(CodecError::malformed("Unexpected end of input").with_location(ctx, at_end)),
    }
}

fn after_value(nest: &[Nest]) -> Expect {
    if nest.is_empty() {
        Expect::End
    } else {
        Expect::CommaOrClose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_documents() {
        for text in [
            "{}",
            "[]",
            r#"{"a": 1, "b": [true, false, null], "c": {"d": "e"}}"#,
            "[1, -2.5e3, \"x\", [], {}]",
            "  [ 1 ,\n 2 ]  ",
            "null",
            "42",
            "\"scalar\"",
        ] {
            assert!(is_json(text), "{}", text);
        }
    }

    #[test]
    fn test_rejects_separator_mistakes() {
        for text in [
            r#"["a" "b"]"#,
            r#"{"a" 1}"#,
            r#"{"a": 1 "b": 2}"#,
            "[1,]",
            r#"{"a": 1,}"#,
            "[,1]",
            r#"{,"a": 1}"#,
            "[1 : 2]",
            r#"{"a": 1: 2}"#,
            "{1: 2}",
        ] {
            assert!(!is_json(text), "{}", text);
        }
    }

    #[test]
    fn test_rejects_structure_errors() {
        for text in ["", "   ", "[", "[1", "{\"a\": ", "]", "[}", "{]", "[] []", "1 2"] {
            assert!(!is_json(text), "{:?}", text);
        }
    }

    #[test]
    fn test_error_messages_carry_offsets() {
        let err = validate("[1,]").unwrap_err();
        assert_eq!(err.to_string(), "Malformed JSON: Expected value at byte 3");

        let err = validate(r#"{"a" 1}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed JSON: Expected ':' after key at byte 5"
        );

        let err = validate("[1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed JSON: Unexpected end of input at byte 2"
        );

        let err = validate("").unwrap_err();
        assert_eq!(err.to_string(), "Malformed JSON: Empty input at byte 0");
    }

    #[test]
    fn test_deep_nesting() {
        let text = format!("{}{}", "[".repeat(50_000), "]".repeat(50_000));
        assert!(is_json(&text));
        let text = format!("{}{}", "[".repeat(50_000), "]".repeat(49_999));
        assert!(!is_json(&text));
    }
}
