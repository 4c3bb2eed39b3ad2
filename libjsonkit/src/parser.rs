//! Phase 2: Stack-Machine Parser
//!
//! The parser consumes the token stream and builds a value tree without
//! recursion. It keeps an explicit stack of open containers; the top of the
//! stack is the innermost open array or object. An opener checks that its
//! parent has a slot ready (objects need a pending key); the finished child
//! fills that slot when its closer arrives, exactly like a scalar would.
//! Nesting depth is therefore bounded by memory, not by the call stack.
//!
//! Objects track an optional pending key. A string token seen while no key
//! is pending becomes the key; the next value token fills it. The empty
//! string is a valid key, distinct from "no key pending".

use crate::error::{CodecError, ParseContext, Result};
use crate::lexer::{Lexer, Token};
use crate::value::{Map, Value};

const MISSING_KEY: &str = "Expected a string key inside object";

#[derive(Debug)]
enum Container {
    Array(Vec<Value>),
    Object { map: Map, pending: Option<String> },
}

impl Container {
    fn object() -> Self {
        Container::Object {
            map: Map::new(),
            pending: None,
        }
    }

    /// Fail unless a value may go here next. Does not claim the slot.
    fn expect_value(&self) -> std::result::Result<(), &'static str> {
        match self {
            Container::Object { pending: None, .. } => Err(MISSING_KEY),
            _ => Ok(()),
        }
    }

    /// Append to an array, or fill the pending key of an object.
    fn attach_value(&mut self, value: Value) -> std::result::Result<(), &'static str> {
        match self {
            Container::Array(arr) => arr.push(value),
            Container::Object { map, pending } => {
                let key = pending.take().ok_or(MISSING_KEY)?;
                // A repeated key keeps its first position and takes the later value.
                map.insert(key, value);
            }
        }
        Ok(())
    }

    /// A string is a key when an object has none pending, otherwise a value.
    fn accept_string(&mut self, s: String) {
        match self {
            Container::Object { pending, .. } if pending.is_none() => *pending = Some(s),
            Container::Object { pending, map } => {
                if let Some(key) = pending.take() {
                    map.insert(key, Value::String(s));
                }
            }
            Container::Array(arr) => arr.push(Value::String(s)),
        }
    }

    fn close(self, token: &Token) -> std::result::Result<Value, &'static str> {
        match (self, token) {
            (Container::Array(arr), Token::ArrayClose) => Ok(Value::Array(arr)),
            (Container::Object { pending: Some(_), .. }, Token::ObjectClose) => {
                Err("Object closed while a key is waiting for its value")
            }
            (Container::Object { map, .. }, Token::ObjectClose) => Ok(Value::Object(map)),
            (Container::Array(_), _) => Err("Expected ']' to close array"),
            (Container::Object { .. }, _) => Err("Expected '}' to close object"),
        }
    }
}

/// Parse JSON text into a value.
pub fn parse_str(input: &str, ctx: &ParseContext) -> Result<Value> {
    parse_stream(Lexer::with_context(input, ctx.clone()), ctx)
}

/// Parse an already tokenized document.
pub fn parse_tokens<I>(tokens: I) -> Result<Value>
where
    I: IntoIterator<Item = Token>,
{
    parse_stream(tokens.into_iter().map(Ok), &ParseContext::default())
}

/// Drive the stack machine over a fallible token stream.
pub(crate) fn parse_stream<I>(tokens: I, ctx: &ParseContext) -> Result<Value>
where
    I: IntoIterator<Item = Result<Token>>,
{
    let fail = |detail: &str| CodecError::malformed(detail).with_location(ctx, None);

    let mut tokens = tokens.into_iter();
    let root = match tokens.next().transpose()? {
        None => return Err(fail("Empty input")),
        Some(Token::ObjectOpen) => Container::object(),
        Some(Token::ArrayOpen) => Container::Array(Vec::new()),
        Some(_) => return Err(fail("Expected '{' or '[' at start of document")),
    };

    let mut stack = vec![root];
    let mut result = None;

    for token in tokens {
        let token = token?;
        let Some(top) = stack.last_mut() else {
            return Err(fail("Unexpected content after the root value"));
        };

        match token {
            Token::ObjectOpen | Token::ArrayOpen => {
                top.expect_value().map_err(fail)?;
                stack.push(if token == Token::ObjectOpen {
                    Container::object()
                } else {
                    Container::Array(Vec::new())
                });
            }
            Token::ObjectClose | Token::ArrayClose => {
                let container = stack.pop().ok_or_else(|| fail("Unbalanced closer"))?;
                let value = container.close(&token).map_err(fail)?;
                match stack.last_mut() {
                    Some(parent) => parent.attach_value(value).map_err(fail)?,
                    None => result = Some(value),
                }
            }
            Token::StringLiteral(raw) => {
                let s = decode_string(&raw).map_err(fail)?;
                top.accept_string(s);
            }
            Token::NumberLiteral(raw) => {
                let n = decode_number(&raw).map_err(fail)?;
                top.attach_value(Value::Number(n)).map_err(fail)?;
            }
            Token::True => top.attach_value(Value::Bool(true)).map_err(fail)?,
            Token::False => top.attach_value(Value::Bool(false)).map_err(fail)?,
            Token::Null => top.attach_value(Value::Null).map_err(fail)?,
        }
    }

    result.ok_or_else(|| fail("Unterminated container at end of input"))
}

/// Decode the escape sequences of a raw string literal.
///
/// UTF-16 surrogate pairs written as two `\u` escapes are combined; a
/// surrogate without its partner becomes U+FFFD.
pub(crate) fn decode_string(raw: &str) -> std::result::Result<String, &'static str> {
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut pending_high: Option<u32> = None;

    while let Some(c) = chars.next() {
        if c != '\\' {
            flush_surrogate(&mut out, &mut pending_high);
            out.push(c);
            continue;
        }
        let escaped = chars.next().ok_or("Unterminated escape sequence")?;
        if escaped != 'u' {
            flush_surrogate(&mut out, &mut pending_high);
            out.push(unescape_one(escaped).ok_or("Bad escaped character")?);
            continue;
        }

        let mut code = 0u32;
        for _ in 0..4 {
            let digit = chars
                .next()
                .and_then(|h| h.to_digit(16))
                .ok_or("Bad Unicode escape")?;
            code = code * 16 + digit;
        }

        match (pending_high.take(), code) {
            (Some(high), 0xDC00..=0xDFFF) => {
                let combined = 0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00);
                out.push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            (high, 0xD800..=0xDBFF) => {
                if high.is_some() {
                    out.push(char::REPLACEMENT_CHARACTER);
                }
                pending_high = Some(code);
            }
            (high, _) => {
                if high.is_some() {
                    out.push(char::REPLACEMENT_CHARACTER);
                }
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
    }
    flush_surrogate(&mut out, &mut pending_high);

    Ok(out)
}

fn flush_surrogate(out: &mut String, pending_high: &mut Option<u32>) {
    if pending_high.take().is_some() {
        out.push(char::REPLACEMENT_CHARACTER);
    }
}

/// The escape map: `\"`, `\/`, `\\`, `\b`, `\f`, `\n`, `\r`, `\t`.
fn unescape_one(c: char) -> Option<char> {
    match c {
        '"' => Some('"'),
        '/' => Some('/'),
        '\\' => Some('\\'),
        'b' => Some('\u{8}'),
        'f' => Some('\u{c}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        _ => None,
    }
}

/// Numbers decode to `f64`; integers beyond 2^53 lose precision silently.
fn decode_number(raw: &str) -> std::result::Result<f64, &'static str> {
    raw.parse::<f64>().map_err(|_| "Invalid number")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse(input: &str) -> Result<Value> {
        parse_str(input, &ParseContext::default())
    }

    fn obj<const N: usize>(pairs: [(&str, Value); N]) -> Value {
        pairs.into_iter().collect()
    }

    #[test]
    fn test_parse_tokens_directly() {
        // [null, [true]]
        let tokens = vec![
            Token::ArrayOpen,
            Token::Null,
            Token::ArrayOpen,
            Token::True,
            Token::ArrayClose,
            Token::ArrayClose,
        ];
        assert_eq!(
            parse_tokens(tokens).unwrap(),
            Value::Array(vec![Value::Null, Value::Array(vec![Value::Bool(true)])])
        );
    }

    #[test]
    fn test_parse_object_keeps_insertion_order() {
        let value = parse(r#"{"b": 2, "a": 1, "c": [true, false, null]}"#).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(
            value,
            obj([
                ("b", Value::Number(2.0)),
                ("a", Value::Number(1.0)),
                (
                    "c",
                    Value::Array(vec![Value::Bool(true), Value::Bool(false), Value::Null])
                ),
            ])
        );
    }

    #[test]
    fn test_parse_empty_containers() {
        assert_eq!(parse("[]").unwrap(), Value::Array(vec![]));
        assert_eq!(parse("{}").unwrap(), Value::Object(Map::new()));
        assert_eq!(
            parse(r#"{"a": {}, "b": []}"#).unwrap(),
            obj([("a", Value::Object(Map::new())), ("b", Value::Array(vec![]))])
        );
    }

    #[test]
    fn test_empty_key_is_a_real_key() {
        let value = parse(r#"{"": 1, "x": ""}"#).unwrap();
        assert_eq!(
            value,
            obj([("", Value::Number(1.0)), ("x", Value::String(String::new()))])
        );
    }

    #[test]
    fn test_empty_key_holding_a_container() {
        let value = parse(r#"{"": {"": []}}"#).unwrap();
        assert_eq!(value, obj([("", obj([("", Value::Array(vec![]))]))]));
    }

    #[test]
    fn test_string_value_after_key() {
        let value = parse(r#"{"k": "v", "k2": "v2"}"#).unwrap();
        assert_eq!(value.get("k").and_then(Value::as_str), Some("v"));
        assert_eq!(value.get("k2").and_then(Value::as_str), Some("v2"));
    }

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        let value = parse(r#"{"a": 1, "b": 2, "a": 3}"#).unwrap();
        assert_eq!(value, obj([("a", Value::Number(3.0)), ("b", Value::Number(2.0))]));
    }

    #[test]
    fn test_numbers() {
        let value = parse("[0, -0, 1.5, -2.5e3, 1E+2, 9007199254740993]").unwrap();
        let nums: Vec<f64> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect();
        assert_eq!(nums, [0.0, -0.0, 1.5, -2500.0, 100.0, 9007199254740992.0]);
    }

    #[test]
    fn test_escapes() {
        let value = parse(r#"["a\nb\"c", "\/\\\b\f\r\t", "\u0041\u00e9"]"#).unwrap();
        let arr = value.as_array().unwrap();
        assert_eq!(arr[0].as_str(), Some("a\nb\"c"));
        assert_eq!(arr[0].as_str().unwrap().chars().count(), 5);
        assert_eq!(arr[1].as_str(), Some("/\\\u{8}\u{c}\r\t"));
        assert_eq!(arr[2].as_str(), Some("Aé"));
    }

    #[test]
    fn test_surrogate_pairs() {
        assert_eq!(decode_string(r"\ud83d\ude00").unwrap(), "😀");
        assert_eq!(decode_string(r"\ud83dx").unwrap(), "\u{fffd}x");
        assert_eq!(decode_string(r"\ude00").unwrap(), "\u{fffd}");
        assert_eq!(decode_string(r"\ud83d").unwrap(), "\u{fffd}");
        assert_eq!(decode_string(r"\ud83d\ud83d\ude00").unwrap(), "\u{fffd}😀");
    }

    #[test]
    fn test_separators_are_not_checked() {
        // Structure comes from token order alone.
        assert_eq!(
            parse(r#"["a" "b" 1]"#).unwrap(),
            Value::Array(vec!["a".into(), "b".into(), 1.into()])
        );
    }

    #[test]
    fn test_malformed_inputs() {
        for input in ["", "   ", "{", "[1,2", "not json", "1", "\"s\"", "null"] {
            let err = parse(input).unwrap_err();
            assert!(err.is_malformed(), "{:?}", input);
        }
    }

    #[test]
    fn test_trailing_content_rejected() {
        assert!(parse("[] []").is_err());
        assert!(parse("{} 1").is_err());
        assert!(parse("[]]").is_err());
    }

    #[test]
    fn test_mismatched_closer_rejected() {
        assert!(parse("[}").is_err());
        assert!(parse(r#"{"a": 1]"#).is_err());
    }

    #[test]
    fn test_object_key_errors() {
        let err = parse("{1: 2}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed JSON: Expected a string key inside object"
        );
        assert!(parse(r#"{"a": 1, []}"#).is_err());
        let err = parse(r#"{"a"}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed JSON: Object closed while a key is waiting for its value"
        );
    }

    #[test]
    fn test_errors_name_the_file() {
        let ctx = ParseContext::new(Some("reply.json"));
        let err = parse_str("[1,", &ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed JSON: Unterminated container at end of input in <reply.json>"
        );
    }

    #[test]
    fn test_tokenizer_error_propagates() {
        let err = parse("[1, 2, ?]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Malformed JSON: Unexpected character '?' at byte 7"
        );
    }

    #[test]
    fn test_parse_from_collected_tokens() {
        let tokens = tokenize(r#"{"k": [1]}"#).unwrap();
        assert_eq!(
            parse_tokens(tokens).unwrap(),
            obj([("k", Value::Array(vec![Value::Number(1.0)]))])
        );
    }

    #[test]
    fn test_deep_nesting_on_small_stack() {
        const DEPTH: usize = 10_000;
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let text = format!("{}{}", "[".repeat(DEPTH), "]".repeat(DEPTH));
                let value = parse(&text).unwrap();
                value.depth()
            })
            .unwrap();
        assert_eq!(handle.join().unwrap(), DEPTH);
    }

    #[test]
    fn test_deep_nesting_error_on_small_stack() {
        const DEPTH: usize = 10_000;
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let text = format!("[{}{}}}", "[".repeat(DEPTH), "]".repeat(DEPTH));
                parse(&text).map_err(|e| e.to_string())
            })
            .unwrap();
        assert_eq!(
            handle.join().unwrap().unwrap_err(),
            "Malformed JSON: Expected ']' to close array"
        );
    }
}
