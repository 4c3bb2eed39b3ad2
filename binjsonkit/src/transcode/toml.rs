//! TOML transcoding: convert between JSON values and TOML text.
//!
//! Mapping from TOML to JSON:
//!   - TOML string / boolean / array / table map directly
//!   - TOML integer and float -> Value::Number
//!   - TOML offset datetime   -> Value::Date, normalized to UTC
//!   - TOML local date/time   -> Value::String (no zone to anchor it)
//!
//! Mapping from JSON to TOML:
//!   - Value::Number      -> TOML integer when integral and within i64,
//!                           otherwise TOML float
//!   - Value::Date        -> TOML offset datetime with a `Z` offset
//!   - Value::Object      -> TOML table; objects inside arrays become
//!                           inline tables
//!   - Value::Unsupported -> member dropped inside a table
//!
//! Lossy edges:
//!   - TOML has no null; null values (and unsupported values outside a
//!     table) cause an error.
//!   - Foreign values cause an error.
//!   - TOML requires the top-level value to be a table.
//!   - Sub-second precision and local datetimes do not survive as dates.

use libjsonkit::{Map, UtcDateTime, Value};
use num_traits::ToPrimitive;
use toml_edit::{DocumentMut, Formatted};

/// Decode a TOML string into a JSON Value.
pub fn decode(input: &str) -> Result<Value, String> {
    let doc: DocumentMut = input
        .parse::<DocumentMut>()
        .map_err(|e| format!("TOML parse error: {}", e))?;
    toml_table_to_value(doc.as_table())
}

/// Encode a JSON Value as a TOML string.
pub fn encode(value: &Value) -> Result<String, String> {
    let Value::Object(obj) = value else {
        return Err("TOML requires the top-level value to be a table/object".to_string());
    };
    let mut doc = DocumentMut::new();
    for (key, item) in obj.iter().filter(|(_, v)| !v.is_unsupported()) {
        doc[key.as_str()] = value_to_item(item)?;
    }
    Ok(doc.to_string())
}

fn toml_table_to_value(table: &toml_edit::Table) -> Result<Value, String> {
    let mut obj = Map::with_capacity(table.len());
    for (key, item) in table.iter() {
        obj.insert(key.to_string(), toml_item_to_value(item)?);
    }
    Ok(Value::Object(obj))
}

fn toml_item_to_value(item: &toml_edit::Item) -> Result<Value, String> {
    match item {
        toml_edit::Item::Value(v) => toml_value_to_json(v),
        toml_edit::Item::Table(t) => toml_table_to_value(t),
        toml_edit::Item::ArrayOfTables(arr) => {
            let items: Result<Vec<Value>, String> = arr.iter().map(toml_table_to_value).collect();
            Ok(Value::Array(items?))
        }
        toml_edit::Item::None => Ok(Value::Null),
    }
}

fn toml_value_to_json(v: &toml_edit::Value) -> Result<Value, String> {
    match v {
        toml_edit::Value::String(s) => Ok(Value::String(s.value().clone())),
        toml_edit::Value::Integer(i) => i
            .value()
            .to_f64()
            .map(Value::Number)
            .ok_or_else(|| format!("TOML integer {} has no JSON number", i.value())),
        toml_edit::Value::Float(f) => Ok(Value::Number(*f.value())),
        toml_edit::Value::Boolean(b) => Ok(Value::Bool(*b.value())),
        toml_edit::Value::Datetime(dt) => datetime_to_value(dt.value()),
        toml_edit::Value::Array(arr) => {
            let items: Result<Vec<Value>, String> = arr.iter().map(toml_value_to_json).collect();
            Ok(Value::Array(items?))
        }
        toml_edit::Value::InlineTable(table) => {
            let mut obj = Map::with_capacity(table.len());
            for (key, val) in table.iter() {
                obj.insert(key.to_string(), toml_value_to_json(val)?);
            }
            Ok(Value::Object(obj))
        }
    }
}

fn datetime_to_value(dt: &toml_edit::Datetime) -> Result<Value, String> {
    let (Some(date), Some(time), Some(offset)) = (dt.date, dt.time, dt.offset) else {
        return Ok(Value::String(dt.to_string()));
    };
    let offset_minutes = match offset {
        toml_edit::Offset::Z => 0,
        toml_edit::Offset::Custom { minutes } => i64::from(minutes),
    };
    let local = UtcDateTime::new(
        date.year,
        date.month,
        date.day,
        time.hour,
        time.minute,
        time.second,
    )
    .map_err(|e| e.to_string())?;
    let utc = UtcDateTime::from_unix_seconds(local.to_unix_seconds() - offset_minutes * 60)
        .map_err(|e| e.to_string())?;
    Ok(Value::Date(utc))
}

fn value_to_item(value: &Value) -> Result<toml_edit::Item, String> {
    match value {
        Value::Object(obj) => {
            let mut table = toml_edit::Table::new();
            for (k, v) in obj.iter().filter(|(_, v)| !v.is_unsupported()) {
                table.insert(k.as_str(), value_to_item(v)?);
            }
            Ok(toml_edit::Item::Table(table))
        }
        other => Ok(toml_edit::Item::Value(value_to_toml(other)?)),
    }
}

fn value_to_toml(value: &Value) -> Result<toml_edit::Value, String> {
    match value {
        Value::Null => Err("TOML has no null type".to_string()),
        Value::Unsupported => Err("unsupported value has no TOML form".to_string()),
        Value::Bool(b) => Ok(toml_edit::Value::Boolean(Formatted::new(*b))),
        Value::Number(n) => Ok(match n.to_i64() {
            Some(i) if n.fract() == 0.0 => toml_edit::Value::Integer(Formatted::new(i)),
            _ => toml_edit::Value::Float(Formatted::new(*n)),
        }),
        Value::String(s) => Ok(toml_edit::Value::String(Formatted::new(s.clone()))),
        Value::Date(d) => Ok(toml_edit::Value::Datetime(Formatted::new(utc_datetime(d)))),
        Value::Array(arr) => {
            let mut toml_arr = toml_edit::Array::new();
            for v in arr {
                toml_arr.push(value_to_toml(v)?);
            }
            Ok(toml_edit::Value::Array(toml_arr))
        }
        Value::Object(obj) => {
            let mut inline = toml_edit::InlineTable::new();
            for (k, v) in obj.iter().filter(|(_, v)| !v.is_unsupported()) {
                inline.insert(k.as_str(), value_to_toml(v)?);
            }
            Ok(toml_edit::Value::InlineTable(inline))
        }
        Value::Foreign(obj) => Err(format!("{:?} values cannot be converted to TOML", obj)),
    }
}

fn utc_datetime(d: &UtcDateTime) -> toml_edit::Datetime {
    toml_edit::Datetime {
        date: Some(toml_edit::Date {
            year: d.year(),
            month: d.month(),
            day: d.day(),
        }),
        time: Some(toml_edit::Time {
            hour: d.hour(),
            minute: d.minute(),
            second: d.second(),
            nanosecond: 0,
        }),
        offset: Some(toml_edit::Offset::Z),
    }
}
