//! CBOR transcoding: convert between JSON values and CBOR binary data.
//!
//! Mapping from CBOR to JSON:
//!   - CBOR integer / float       -> Value::Number (f64)
//!   - CBOR text string           -> Value::String
//!   - CBOR array / map           -> Value::Array / Value::Object
//!                                   (text string keys only)
//!   - CBOR tag 0 (date text)     -> Value::Date (`YYYY-MM-DDTHH:MM:SSZ` only)
//!   - CBOR tag 1 (epoch seconds) -> Value::Date
//!   - CBOR byte string, other tags, simple values -> error
//!
//! Mapping from JSON to CBOR:
//!   - Value::Number      -> smallest CBOR integer when integral and within
//!                           i64, otherwise float64 (never downgraded)
//!   - Value::Date        -> tag 0 wrapping an RFC 3339 text string
//!   - Value::Object      -> map in insertion order
//!   - Value::Unsupported -> null, or the member is dropped inside a map
//!   - Value::Foreign     -> error

use ciborium::value::Value as CborValue;
use libjsonkit::{Map, UtcDateTime, Value};
use num_traits::ToPrimitive;
use std::fmt::Write as FmtWrite;

const TAG_DATE_TEXT: u64 = 0;
const TAG_EPOCH: u64 = 1;

/// Decode CBOR bytes into a JSON Value.
pub fn decode(input: &[u8]) -> Result<Value, String> {
    let cbor_value: CborValue =
        ciborium::de::from_reader(input).map_err(|e| format!("CBOR decode error: {}", e))?;
    cbor_to_value(&cbor_value)
}

fn cbor_to_value(cbor: &CborValue) -> Result<Value, String> {
    match cbor {
        CborValue::Null => Ok(Value::Null),
        CborValue::Bool(b) => Ok(Value::Bool(*b)),
        CborValue::Integer(i) => Ok(Value::Number(cbor_integer_to_f64(*i)?)),
        CborValue::Float(f) => Ok(Value::Number(*f)),
        CborValue::Text(s) => Ok(Value::String(s.clone())),
        CborValue::Array(arr) => {
            let items: Result<Vec<Value>, String> = arr.iter().map(cbor_to_value).collect();
            Ok(Value::Array(items?))
        }
        CborValue::Map(pairs) => {
            let mut obj = Map::with_capacity(pairs.len());
            for (k, v) in pairs {
                let CborValue::Text(key) = k else {
                    return Err(format!("CBOR map key must be a text string, got: {:?}", k));
                };
                obj.insert(key.clone(), cbor_to_value(v)?);
            }
            Ok(Value::Object(obj))
        }
        CborValue::Tag(TAG_DATE_TEXT, inner) => match inner.as_ref() {
            CborValue::Text(s) => UtcDateTime::parse_rfc3339(s)
                .map(Value::Date)
                .map_err(|e| e.to_string()),
            other => Err(format!("CBOR tag 0 must wrap a text string, got: {:?}", other)),
        },
        CborValue::Tag(TAG_EPOCH, inner) => {
            let seconds = match inner.as_ref() {
                CborValue::Integer(i) => i128::from(*i).to_i64(),
                CborValue::Float(f) => f.floor().to_i64(),
                _ => None,
            }
            .ok_or_else(|| format!("CBOR tag 1 must wrap epoch seconds, got: {:?}", inner))?;
            UtcDateTime::from_unix_seconds(seconds)
                .map(Value::Date)
                .map_err(|e| e.to_string())
        }
        CborValue::Tag(tag, _) => Err(format!(
            "CBOR tagged value (tag {}) has no JSON equivalent",
            tag
        )),
        _ => Err(format!("CBOR value {:?} has no JSON equivalent", cbor)),
    }
}

fn cbor_integer_to_f64(i: ciborium::value::Integer) -> Result<f64, String> {
    let n = i128::from(i);
    n.to_f64()
        .ok_or_else(|| format!("CBOR integer {} has no JSON number", n))
}

// ---------------------------------------------------------------------------
// Encode (JSON -> CBOR)
//
// Written by hand rather than through ciborium's Value: ciborium shrinks
// float64 to float16/float32 whenever the value fits, and floats here must
// stay 8-byte IEEE 754.
// ---------------------------------------------------------------------------

/// Encode a JSON Value as CBOR bytes.
pub fn encode(value: &Value) -> Result<Vec<u8>, String> {
    let mut buf = Vec::new();
    write_value(&mut buf, value)?;
    Ok(buf)
}

fn write_value(buf: &mut Vec<u8>, value: &Value) -> Result<(), String> {
    match value {
        Value::Null | Value::Unsupported => buf.push(0xf6),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Number(n) => write_number(buf, *n),
        Value::String(s) => write_text(buf, s),
        Value::Date(d) => {
            write_head(buf, 6, TAG_DATE_TEXT);
            write_text(buf, &d.to_rfc3339());
        }
        Value::Array(arr) => {
            write_head(buf, 4, arr.len() as u64);
            for item in arr {
                write_value(buf, item)?;
            }
        }
        Value::Object(obj) => {
            let members: Vec<(&String, &Value)> =
                obj.iter().filter(|(_, v)| !v.is_unsupported()).collect();
            write_head(buf, 5, members.len() as u64);
            for (k, v) in members {
                write_text(buf, k);
                write_value(buf, v)?;
            }
        }
        Value::Foreign(obj) => {
            return Err(format!("{:?} values cannot be converted to CBOR", obj));
        }
    }
    Ok(())
}

fn write_text(buf: &mut Vec<u8>, s: &str) {
    write_head(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Integral numbers use major type 0 (n) or 1 (-1 - n).
fn write_number(buf: &mut Vec<u8>, n: f64) {
    let integral = n.fract() == 0.0 && !(n == 0.0 && n.is_sign_negative());
    match n.to_i64() {
        Some(i) if integral && i >= 0 => write_head(buf, 0, i as u64),
        Some(i) if integral => write_head(buf, 1, !(i as u64)),
        _ => {
            buf.push(0xfb);
            buf.extend_from_slice(&n.to_be_bytes());
        }
    }
}

/// Major type in the top three bits, argument in the low five plus up to
/// eight following bytes.
fn write_head(buf: &mut Vec<u8>, major: u8, arg: u64) {
    let high = major << 5;
    if arg < 24 {
        buf.push(high | arg as u8);
    } else if let Ok(a) = u8::try_from(arg) {
        buf.extend_from_slice(&[high | 24, a]);
    } else if let Ok(a) = u16::try_from(arg) {
        buf.push(high | 25);
        buf.extend_from_slice(&a.to_be_bytes());
    } else if let Ok(a) = u32::try_from(arg) {
        buf.push(high | 26);
        buf.extend_from_slice(&a.to_be_bytes());
    } else {
        buf.push(high | 27);
        buf.extend_from_slice(&arg.to_be_bytes());
    }
}

// ---------------------------------------------------------------------------
// Diagnostic Notation (RFC 8949 §8)
// ---------------------------------------------------------------------------

/// Render CBOR bytes as diagnostic notation.
///
/// Works from the binary rather than from a [`Value`], so what is shown is
/// what went over the wire.
pub fn diagnostic(input: &[u8]) -> Result<String, String> {
    let cbor_value: CborValue =
        ciborium::de::from_reader(input).map_err(|e| format!("CBOR decode error: {}", e))?;
    let mut out = String::new();
    diag_value(&mut out, &cbor_value, 0);
    out.push('\n');
    Ok(out)
}

fn diag_value(out: &mut String, val: &CborValue, depth: usize) {
    match val {
        CborValue::Null => out.push_str("null"),
        CborValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        CborValue::Integer(i) => {
            let _ = write!(out, "{}", i128::from(*i));
        }
        CborValue::Float(f) => diag_float(out, *f),
        CborValue::Text(s) => diag_text(out, s),
        CborValue::Bytes(b) => {
            out.push_str("h'");
            for byte in b {
                let _ = write!(out, "{:02x}", byte);
            }
            out.push('\'');
        }
        CborValue::Tag(tag, inner) => {
            let _ = write!(out, "{}(", tag);
            diag_value(out, inner, depth);
            out.push(')');
        }
        CborValue::Array(items) if items.iter().all(is_scalar) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                diag_value(out, item, depth);
            }
            out.push(']');
        }
        CborValue::Array(items) => {
            diag_block(out, '[', ']', depth, items.len(), |out, i| {
                diag_value(out, &items[i], depth + 1);
            });
        }
        CborValue::Map(pairs) if pairs.is_empty() => out.push_str("{}"),
        CborValue::Map(pairs) => {
            diag_block(out, '{', '}', depth, pairs.len(), |out, i| {
                let (k, v) = &pairs[i];
                diag_value(out, k, depth + 1);
                out.push_str(": ");
                diag_value(out, v, depth + 1);
            });
        }
        _ => {
            let _ = write!(out, "<?unknown {:?}>", val);
        }
    }
}

/// One entry per line, indented two spaces per level.
fn diag_block<F>(out: &mut String, open: char, close: char, depth: usize, len: usize, mut entry: F)
where
    F: FnMut(&mut String, usize),
{
    out.push(open);
    out.push('\n');
    for i in 0..len {
        out.push_str(&"  ".repeat(depth + 1));
        entry(out, i);
        if i + 1 < len {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&"  ".repeat(depth));
    out.push(close);
}

/// Floats always show a fraction or exponent so they never read as integers.
fn diag_float(out: &mut String, f: f64) {
    if f.is_nan() {
        out.push_str("NaN");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "Infinity" } else { "-Infinity" });
    } else {
        let s = format!("{:?}", f);
        out.push_str(&s);
    }
}

/// Text exactly as carried on the wire; unlike JSON output, CR is kept.
fn diag_text(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn is_scalar(val: &CborValue) -> bool {
    !matches!(val, CborValue::Array(_) | CborValue::Map(_) | CborValue::Tag(..))
}
