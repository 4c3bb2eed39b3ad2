//! In-memory JSON value representation.

use crate::date::UtcDateTime;
use crate::foreign::ForeignObject;
use indexmap::IndexMap;
use std::fmt;
use std::mem;

/// Insertion-ordered object map.
pub type Map = IndexMap<String, Value>;

/// A JSON value, extended with dates, foreign objects, and a marker for
/// values that have no JSON form.
#[derive(Clone)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit floating-point number.
    Number(f64),
    /// UTF-8 string.
    String(String),
    /// Array of values.
    Array(Vec<Value>),
    /// Object with unique keys in insertion order.
    Object(Map),
    /// UTC instant, encoded with the `sys.ISODate` wrapper.
    Date(UtcDateTime),
    /// Opaque value with its own encoder.
    Foreign(ForeignObject),
    /// A value with no JSON form (callables and the like).
    Unsupported,
}

impl Value {
    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for the unsupported marker.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Value::Unsupported)
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number if this is a `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a reference to the array if this is an `Array`.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Returns a reference to the object if this is an `Object`.
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns the instant if this is a `Date`.
    pub fn as_date(&self) -> Option<UtcDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Look up an object member. Returns `None` for non-objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Nesting depth: 0 for scalars, 1 for an empty container.
    ///
    /// Walks with an explicit stack so very deep trees are safe.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(&Value, usize)> = vec![(self, 0)];
        while let Some((value, level)) = stack.pop() {
            match value {
                Value::Array(arr) => {
                    max = max.max(level + 1);
                    stack.extend(arr.iter().map(|v| (v, level + 1)));
                }
                Value::Object(obj) => {
                    max = max.max(level + 1);
                    stack.extend(obj.values().map(|v| (v, level + 1)));
                }
                _ => {}
            }
        }
        max
    }
}

/// Nested containers are torn down with a heap stack, so dropping a tree
/// never recurses once per nesting level.
impl Drop for Value {
    fn drop(&mut self) {
        let mut stack = match self {
            Value::Array(arr) if !arr.is_empty() => mem::take(arr),
            Value::Object(obj) if !obj.is_empty() => obj.drain(..).map(|(_, v)| v).collect(),
            _ => return,
        };
        while let Some(mut value) = stack.pop() {
            match &mut value {
                Value::Array(arr) => stack.append(arr),
                Value::Object(obj) => stack.extend(obj.drain(..).map(|(_, v)| v)),
                _ => {}
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            // Order-sensitive: two objects are equal only with the same key order.
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Foreign(a), Value::Foreign(b)) => a.same_object(b),
            (Value::Unsupported, Value::Unsupported) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.is_nan() {
                    write!(f, "NaN")
                } else if n.is_infinite() {
                    if *n > 0.0 {
                        write!(f, "Infinity")
                    } else {
                        write!(f, "-Infinity")
                    }
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(arr) => f.debug_list().entries(arr).finish(),
            Value::Object(obj) => f.debug_map().entries(obj).finish(),
            Value::Date(d) => write!(f, "Date({})", d),
            Value::Foreign(obj) => write!(f, "{:?}", obj),
            Value::Unsupported => write!(f, "undefined"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<Map> for Value {
    fn from(obj: Map) -> Self {
        Value::Object(obj)
    }
}

impl From<UtcDateTime> for Value {
    fn from(d: UtcDateTime) -> Self {
        Value::Date(d)
    }
}

impl From<ForeignObject> for Value {
    fn from(obj: ForeignObject) -> Self {
        Value::Foreign(obj)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Object(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
