//! Encode values as JSON text.
//!
//! One exhaustive match over [`Value`] decides the encoding of each kind:
//!
//! | kind        | output                                                    |
//! |-------------|-----------------------------------------------------------|
//! | Null        | `null`                                                    |
//! | Bool        | `true` / `false`                                          |
//! | Number      | shortest round-trip decimal; NaN and infinities as `null` |
//! | String      | quoted, see [`encode_string`]                             |
//! | Array       | `[a, b]`                                                  |
//! | Object      | `{"k": v, "k2": v2}` in insertion order                   |
//! | Date        | `{"jsonclass":["sys.ISODate", ["YYYYMMDDTHH:MM:SS"]]}`    |
//! | Foreign     | whatever its encoder returns, spliced verbatim            |
//! | Unsupported | `null` at top level and in arrays; member omitted in objects |
//!
//! The date wrapper is not standard JSON. It parses as an ordinary object
//! everywhere; only decoders that know the `jsonclass` hint turn it back
//! into a date.

use crate::error::{CodecError, Result};
use crate::Value;
use std::fmt::Write;

/// Encode a value as compact JSON text.
///
/// Fails only when a foreign object's encoder fails.
pub fn stringify(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::Null | Value::Unsupported => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(out, *n),
        Value::String(s) => write_string(out, s),
        Value::Array(arr) => {
            out.push('[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        Value::Object(obj) => {
            out.push('{');
            let members = obj.iter().filter(|(_, v)| !v.is_unsupported());
            for (i, (key, item)) in members.enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(out, key);
                out.push_str(": ");
                write_value(out, item)?;
            }
            out.push('}');
        }
        Value::Date(d) => {
            out.push_str("{\"jsonclass\":[\"sys.ISODate\", [\"");
            out.push_str(&d.to_compact());
            out.push_str("\"]]}");
        }
        Value::Foreign(obj) => out.push_str(&obj.encode().map_err(CodecError::Foreign)?),
    }
    Ok(())
}

fn write_number(out: &mut String, n: f64) {
    if n.is_finite() {
        // `{}` on f64 prints integers without a fraction and never uses
        // exponent notation; switch to `{:e}` for very large/small magnitudes.
        let abs = n.abs();
        if abs != 0.0 && !(1e-7..1e21).contains(&abs) {
            let _ = write!(out, "{:e}", n);
        } else {
            let _ = write!(out, "{}", n);
        }
    } else {
        out.push_str("null");
    }
}

/// Quote a string as a JSON string literal.
///
/// `"` and `\` are backslash-escaped, line feeds become `\n`, carriage
/// returns are dropped, and any other control character is escaped
/// (`\t`, `\b`, `\f`, or `\u00XX`). Everything else, `/` included, is
/// written as-is.
pub fn encode_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    write_string(&mut out, s);
    out
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("\\t"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::UtcDateTime;
    use crate::foreign::{CallWrapper, ForeignObject};
    use crate::value::Map;

    fn enc(value: &Value) -> String {
        stringify(value).unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(enc(&Value::Null), "null");
        assert_eq!(enc(&Value::Bool(true)), "true");
        assert_eq!(enc(&Value::Bool(false)), "false");
        assert_eq!(enc(&Value::Number(42.0)), "42");
        assert_eq!(enc(&Value::Number(-1.5)), "-1.5");
        assert_eq!(enc(&Value::Number(0.1)), "0.1");
        assert_eq!(enc(&Value::Number(-0.0)), "-0");
    }

    #[test]
    fn test_number_exponent_forms() {
        assert_eq!(enc(&Value::Number(1e21)), "1e21");
        assert_eq!(enc(&Value::Number(1.5e-9)), "1.5e-9");
        assert_eq!(enc(&Value::Number(1e20)), "100000000000000000000");
        assert_eq!(enc(&Value::Number(1e-7)), "0.0000001");
    }

    #[test]
    fn test_non_finite_numbers_are_null() {
        assert_eq!(enc(&Value::Number(f64::NAN)), "null");
        assert_eq!(enc(&Value::Number(f64::INFINITY)), "null");
        assert_eq!(enc(&Value::Number(f64::NEG_INFINITY)), "null");
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(enc(&Value::from("a\nb\"c")), r#""a\nb\"c""#);
        assert_eq!(enc(&Value::from("back\\slash/ok")), r#""back\\slash/ok""#);
        assert_eq!(enc(&Value::from("cr\r\nlf")), r#""cr\nlf""#);
        assert_eq!(enc(&Value::from("\t\u{8}\u{c}\u{1}")), r#""\t\b\f\u0001""#);
        assert_eq!(enc(&Value::from("こんにちは")), "\"こんにちは\"");
    }

    #[test]
    fn test_array_and_object_layout() {
        let value: Value = [
            ("list", Value::Array(vec![1.into(), "two".into(), Value::Null])),
            ("flag", true.into()),
            ("empty", Value::Object(Map::new())),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            enc(&value),
            r#"{"list": [1, "two", null], "flag": true, "empty": {}}"#
        );
        assert_eq!(enc(&Value::Array(vec![])), "[]");
    }

    #[test]
    fn test_object_keys_are_escaped() {
        let value: Value = [("say \"hi\"", 1)].into_iter().collect();
        assert_eq!(enc(&value), r#"{"say \"hi\"": 1}"#);
    }

    #[test]
    fn test_date_wrapper() {
        let d = UtcDateTime::new(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(
            enc(&Value::Date(d)),
            r#"{"jsonclass":["sys.ISODate", ["20240305T07:08:09"]]}"#
        );
    }

    #[test]
    fn test_unsupported_policy() {
        assert_eq!(enc(&Value::Unsupported), "null");
        assert_eq!(
            enc(&Value::Array(vec![1.into(), Value::Unsupported])),
            "[1, null]"
        );
        let value: Value = [
            ("a", Value::Unsupported),
            ("b", 1.into()),
            ("c", Value::Unsupported),
        ]
        .into_iter()
        .collect();
        assert_eq!(enc(&value), r#"{"b": 1}"#);
    }

    #[test]
    fn test_foreign_spliced_verbatim() {
        let value = Value::Array(vec![
            Value::Foreign(ForeignObject::from_fn(|| Ok("{\"ref\": 7}".to_string()))),
            Value::Foreign(ForeignObject::new(CallWrapper::new("getXml", "<a/>"))),
        ]);
        assert_eq!(enc(&value), r#"[{"ref": 7}, "getXml(\"<a/>\")"]"#);
    }

    #[test]
    fn test_foreign_failure_propagates() {
        let value: Value = [(
            "node",
            Value::Foreign(ForeignObject::from_fn(|| Err("detached".into()))),
        )]
        .into_iter()
        .collect();
        let err = stringify(&value).unwrap_err();
        assert!(matches!(err, CodecError::Foreign(_)));
        assert_eq!(err.to_string(), "Foreign object encoder failed: detached");
    }
}
