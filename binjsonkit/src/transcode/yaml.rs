//! YAML transcoding: convert between JSON values and YAML text.
//!
//! Mapping from YAML to JSON:
//!   - YAML null          -> Value::Null
//!   - YAML bool          -> Value::Bool
//!   - YAML number        -> Value::Number
//!   - YAML string        -> Value::String, whatever it looks like
//!   - YAML sequence      -> Value::Array
//!   - YAML mapping       -> Value::Object (scalar keys rendered as text)
//!   - !!timestamp string -> Value::Date (`YYYY-MM-DDTHH:MM:SSZ`), error otherwise
//!   - other tagged value -> the untagged value
//!
//! Mapping from JSON to YAML:
//!   - Value::Number      -> YAML integer when integral and within i64,
//!                           otherwise YAML float (.nan and .inf included)
//!   - Value::Date        -> !!timestamp tagged RFC 3339 string
//!   - Value::Unsupported -> null, or the member is dropped inside a mapping
//!   - Value::Foreign     -> error (its encoding is JSON-only)

use libjsonkit::{Map, UtcDateTime, Value};
use num_traits::ToPrimitive;

/// Decode a YAML string into a JSON Value.
pub fn decode(input: &str) -> Result<Value, String> {
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(input).map_err(|e| format!("YAML parse error: {}", e))?;
    yaml_to_value(&yaml_value)
}

/// Encode a JSON Value as a YAML string.
pub fn encode(value: &Value) -> Result<String, String> {
    let yaml_value = value_to_yaml(value)?;
    serde_yaml::to_string(&yaml_value).map_err(|e| format!("YAML encode error: {}", e))
}

fn yaml_to_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| format!("Unsupported YAML number: {}", n)),
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut obj = Map::with_capacity(mapping.len());
            for (k, v) in mapping {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    _ => return Err(format!("Unsupported YAML mapping key: {:?}", k)),
                };
                obj.insert(key, yaml_to_value(v)?);
            }
            Ok(Value::Object(obj))
        }
        serde_yaml::Value::Tagged(tagged) => {
            // serde_yaml normalizes the leading !'s
            let tag_str = tagged.tag.to_string();
            let bare_tag = tag_str.trim_start_matches('!');
            if bare_tag == "timestamp" {
                if let serde_yaml::Value::String(s) = &tagged.value {
                    return UtcDateTime::parse_rfc3339(s)
                        .map(Value::Date)
                        .map_err(|e| format!("Invalid !!timestamp {:?}: {}", s, e));
                }
            }
            yaml_to_value(&tagged.value)
        }
    }
}

fn value_to_yaml(value: &Value) -> Result<serde_yaml::Value, String> {
    match value {
        Value::Null | Value::Unsupported => Ok(serde_yaml::Value::Null),
        Value::Bool(b) => Ok(serde_yaml::Value::Bool(*b)),
        Value::Number(n) => Ok(serde_yaml::Value::Number(yaml_number(*n))),
        Value::String(s) => Ok(serde_yaml::Value::String(s.clone())),
        Value::Date(d) => Ok(serde_yaml::Value::Tagged(Box::new(
            serde_yaml::value::TaggedValue {
                tag: serde_yaml::value::Tag::new("!!timestamp"),
                value: serde_yaml::Value::String(d.to_rfc3339()),
            },
        ))),
        Value::Array(arr) => {
            let items: Result<Vec<serde_yaml::Value>, String> =
                arr.iter().map(value_to_yaml).collect();
            Ok(serde_yaml::Value::Sequence(items?))
        }
        Value::Object(obj) => {
            let mut mapping = serde_yaml::Mapping::new();
            for (k, v) in obj.iter().filter(|(_, v)| !v.is_unsupported()) {
                mapping.insert(serde_yaml::Value::String(k.clone()), value_to_yaml(v)?);
            }
            Ok(serde_yaml::Value::Mapping(mapping))
        }
        Value::Foreign(obj) => Err(format!("{:?} values cannot be converted to YAML", obj)),
    }
}

fn yaml_number(n: f64) -> serde_yaml::Number {
    match n.to_i64() {
        Some(i) if n.fract() == 0.0 && !(n == 0.0 && n.is_sign_negative()) => {
            serde_yaml::Number::from(i)
        }
        _ => serde_yaml::Number::from(n),
    }
}
