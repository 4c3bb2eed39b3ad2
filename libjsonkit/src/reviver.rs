//! Phase 3 (optional): Reviver Transform
//!
//! A depth-first pass over a parsed tree. The root is wrapped under a
//! synthetic empty-string key, then every container is visited bottom-up:
//! each child is revived first and then handed to the reviver together with
//! its key (array indices are passed as decimal strings). Returning
//! `Some(value)` replaces the child; returning `None` deletes it. Deletions
//! are applied after the container has been fully iterated, so the reviver
//! always sees the original key order. A deleted array element leaves a
//! hole: the slot becomes [`Value::Unsupported`], which encodes as `null`,
//! so later elements keep their indices.
//!
//! The reviver's answer for the synthetic root key is the final result;
//! `None` there yields [`Value::Unsupported`].

use crate::date::UtcDateTime;
use crate::value::Value;

const DATE_CLASS: &str = "sys.ISODate";
const CLASS_HINT: &str = "jsonclass";

/// Apply `reviver` to every value in the tree, children before parents.
pub fn revive<F>(root: Value, mut reviver: F) -> Value
where
    F: FnMut(&str, Value) -> Option<Value>,
{
    walk("", root, &mut reviver).unwrap_or(Value::Unsupported)
}

fn walk<F>(key: &str, mut value: Value, reviver: &mut F) -> Option<Value>
where
    F: FnMut(&str, Value) -> Option<Value>,
{
    match &mut value {
        Value::Array(arr) => {
            for (index, slot) in arr.iter_mut().enumerate() {
                let child = std::mem::replace(slot, Value::Null);
                *slot = walk(&index.to_string(), child, reviver).unwrap_or(Value::Unsupported);
            }
        }
        Value::Object(map) => {
            let mut doomed = Vec::new();
            for (k, slot) in map.iter_mut() {
                let child = std::mem::replace(slot, Value::Null);
                match walk(k, child, reviver) {
                    Some(revived) => *slot = revived,
                    None => doomed.push(k.clone()),
                }
            }
            for k in doomed {
                map.shift_remove(&k);
            }
        }
        _ => {}
    }
    reviver(key, value)
}

/// Reviver that turns `sys.ISODate` wrapper objects back into dates.
///
/// Recognizes exactly `{"jsonclass": ["sys.ISODate", ["YYYYMMDDTHH:MM:SS"]]}`
/// with a valid timestamp; every other value passes through untouched.
pub fn revive_dates(_key: &str, value: Value) -> Option<Value> {
    match decode_date_wrapper(&value) {
        Some(date) => Some(Value::Date(date)),
        None => Some(value),
    }
}

fn decode_date_wrapper(value: &Value) -> Option<UtcDateTime> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    let hint = obj.get(CLASS_HINT)?.as_array()?;
    let [class, args] = hint.as_slice() else {
        return None;
    };
    if class.as_str()? != DATE_CLASS {
        return None;
    }
    let [stamp] = args.as_array()?.as_slice() else {
        return None;
    };
    UtcDateTime::parse_compact(stamp.as_str()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseContext;
    use crate::parser::parse_str;

    fn parse(input: &str) -> Value {
        parse_str(input, &ParseContext::default()).unwrap()
    }

    #[test]
    fn test_identity_reviver() {
        let original = parse(r#"{"a": [1, {"b": null}], "c": "d", "": true}"#);
        let revived = revive(original.clone(), |_, v| Some(v));
        assert_eq!(revived, original);
    }

    #[test]
    fn test_delete_object_member() {
        let value = parse(r#"{"a": 1, "b": 2}"#);
        let revived = revive(value, |k, v| if k == "b" { None } else { Some(v) });
        assert_eq!(revived, parse(r#"{"a": 1}"#));
    }

    #[test]
    fn test_delete_array_elements_leaves_holes() {
        let value = parse("[1, 2, 3, 4]");
        let mut keys = Vec::new();
        let revived = revive(value, |k, v| {
            keys.push(k.to_string());
            match v.as_f64() {
                Some(n) if n as i64 % 2 == 0 => None,
                _ => Some(v),
            }
        });
        assert_eq!(keys, ["0", "1", "2", "3", ""]);
        assert_eq!(
            revived,
            Value::Array(vec![1.into(), Value::Unsupported, 3.into(), Value::Unsupported])
        );
        assert_eq!(crate::encode::stringify(&revived).unwrap(), "[1, null, 3, null]");
    }

    #[test]
    fn test_array_holes_keep_later_indices() {
        let value = parse(r#"["drop", "a", "b"]"#);
        let mut later = Vec::new();
        let revived = revive(value, |k, v| {
            if v.as_str() == Some("drop") {
                return None;
            }
            if let Some(s) = v.as_str() {
                later.push(format!("{}={}", k, s));
            }
            Some(v)
        });
        assert_eq!(later, ["1=a", "2=b"]);
        assert_eq!(revived.as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_replace_values() {
        let value = parse(r#"{"n": 2, "list": [3, 4]}"#);
        let revived = revive(value, |_, v| match v {
            Value::Number(n) => Some(Value::Number(n * 10.0)),
            other => Some(other),
        });
        assert_eq!(revived, parse(r#"{"n": 20, "list": [30, 40]}"#));
    }

    #[test]
    fn test_visit_order_is_bottom_up() {
        let value = parse(r#"{"a": {"x": 1, "y": [true]}, "b": 2}"#);
        let mut seen = Vec::new();
        revive(value, |k, v| {
            seen.push(k.to_string());
            Some(v)
        });
        assert_eq!(seen, ["x", "0", "y", "a", "b", ""]);
    }

    #[test]
    fn test_reviver_sees_revived_children() {
        let value = parse(r#"{"outer": {"drop": 1, "keep": 2}}"#);
        let mut outer_keys = Vec::new();
        revive(value, |k, v| {
            if k == "drop" {
                return None;
            }
            if k == "outer" {
                outer_keys = v.as_object().unwrap().keys().cloned().collect();
            }
            Some(v)
        });
        assert_eq!(outer_keys, ["keep"]);
    }

    #[test]
    fn test_deleting_root_yields_unsupported() {
        let value = parse("[1]");
        let revived = revive(value, |k, v| if k.is_empty() { None } else { Some(v) });
        assert!(revived.is_unsupported());
    }

    #[test]
    fn test_revive_dates() {
        let value = parse(
            r#"{"when": {"jsonclass":["sys.ISODate", ["20240305T07:08:09"]]}, "n": 1}"#,
        );
        let revived = revive(value, revive_dates);
        assert_eq!(
            revived.get("when").and_then(Value::as_date),
            Some(UtcDateTime::new(2024, 3, 5, 7, 8, 9).unwrap())
        );
        assert_eq!(revived.get("n").and_then(Value::as_f64), Some(1.0));
    }

    #[test]
    fn test_revive_dates_ignores_near_misses() {
        for text in [
            r#"{"jsonclass":["sys.ISODate", ["2024-03-05"]]}"#,
            r#"{"jsonclass":["sys.Other", ["20240305T07:08:09"]]}"#,
            r#"{"jsonclass":["sys.ISODate", "20240305T07:08:09"]}"#,
            r#"{"jsonclass":["sys.ISODate", ["20240305T07:08:09"]], "extra": 1}"#,
            r#"{"jsonclass":["sys.ISODate"]}"#,
        ] {
            let value = parse(text);
            let revived = revive(value.clone(), revive_dates);
            assert_eq!(revived, value, "{}", text);
        }
    }
}
