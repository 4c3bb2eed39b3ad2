//! JSON codec with a date extension and a foreign-object hook.
//!
//! Values are the usual JSON kinds plus a UTC date, an opaque foreign object
//! that supplies its own encoding, and an "unsupported" marker for things
//! that have no JSON form.
//!
//! # Parsing Pipeline
//!
//! Decoding runs in up to three phases:
//!
//! 1. **Lexer**: Converts source text into a stream of tokens (brackets,
//!    string and number literals, keywords). Colons and commas are consumed
//!    here and never reach the parser.
//!
//! 2. **Stack-Machine Parser**: Builds the value tree with an explicit stack
//!    of open containers, so nesting depth never grows the call stack.
//!
//! 3. **Reviver** (optional): Walks the finished tree bottom-up and lets a
//!    callback replace or delete each value.
//!
//! Because separators are dropped by the lexer, the parser accepts some text
//! that is not strictly JSON (`["a" "b"]`). [`is_json`] and
//! [`Codec::with_strict`] apply the full grammar when that matters.
//!
//! Encoding is a single pass over the tree; see [`stringify`].

mod date;
mod encode;
mod error;
mod foreign;
mod lexer;
mod parser;
mod reviver;
pub mod rpc;
mod validate;
mod value;

pub use date::UtcDateTime;
pub use encode::{encode_string, stringify};
pub use error::{CodecError, ForeignError, ParseContext, Result};
pub use foreign::{CallWrapper, ForeignEncode, ForeignObject};
pub use lexer::{tokenize, Lexer, Token};
pub use parser::parse_tokens;
pub use reviver::{revive, revive_dates};
pub use rpc::RpcClient;
pub use validate::{is_json, validate};
pub use value::{Map, Value};

/// Decoding options.
///
/// A `Codec` is a plain value owned by the caller; there is no global
/// registry. The default is lenient parsing with no date revival.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    revive_dates: bool,
    strict: bool,
    filename: Option<String>,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn `sys.ISODate` wrapper objects back into [`Value::Date`] after parsing.
    pub fn with_date_revival(mut self, enabled: bool) -> Self {
        self.revive_dates = enabled;
        self
    }

    /// Check the full JSON grammar before parsing.
    pub fn with_strict(mut self, enabled: bool) -> Self {
        self.strict = enabled;
        self
    }

    /// Name the source in error messages.
    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }

    /// Parse JSON text into a value.
    ///
    /// The top level must be an object or an array. On failure nothing is
    /// returned but the error; there are no partial trees.
    ///
    /// # Example
    ///
    /// ```
    /// use libjsonkit::{Codec, Value};
    ///
    /// let value = Codec::new().parse(r#"{"a": [1, 2]}"#).unwrap();
    /// assert_eq!(value.get("a").and_then(Value::as_array).map(Vec::len), Some(2));
    /// ```
    pub fn parse(&self, input: &str) -> Result<Value> {
        let value = self.parse_plain(input)?;
        if self.revive_dates {
            Ok(revive(value, revive_dates))
        } else {
            Ok(value)
        }
    }

    /// Parse JSON text, then pass every value through `reviver`.
    ///
    /// When date revival is enabled, date wrappers are converted before the
    /// reviver sees them.
    pub fn parse_with_reviver<F>(&self, input: &str, mut reviver: F) -> Result<Value>
    where
        F: FnMut(&str, Value) -> Option<Value>,
    {
        let value = self.parse_plain(input)?;
        let dates = self.revive_dates;
        Ok(revive(value, |key, value| {
            let value = if dates {
                revive_dates(key, value)?
            } else {
                value
            };
            reviver(key, value)
        }))
    }

    /// Encode a value as JSON text.
    pub fn stringify(&self, value: &Value) -> Result<String> {
        encode::stringify(value)
    }

    fn parse_plain(&self, input: &str) -> Result<Value> {
        let ctx = ParseContext::new(self.filename.as_deref());
        if self.strict {
            validate::validate_with_context(input, &ctx)?;
        }
        parser::parse_str(input, &ctx)
    }
}

/// Parse JSON text with the default options.
///
/// # Example
///
/// ```
/// let value = libjsonkit::parse("[true, null]").unwrap();
/// assert_eq!(libjsonkit::stringify(&value).unwrap(), "[true, null]");
/// ```
pub fn parse(input: &str) -> Result<Value> {
    Codec::default().parse(input)
}

/// Parse JSON text and apply `reviver` to every value, children first.
pub fn parse_with_reviver<F>(input: &str, reviver: F) -> Result<Value>
where
    F: FnMut(&str, Value) -> Option<Value>,
{
    Codec::default().parse_with_reviver(input, reviver)
}

/// Same as [`stringify`].
pub fn serialize(value: &Value) -> Result<String> {
    stringify(value)
}

/// Same as [`parse`]: no reviver, no partial results.
pub fn unserialize(input: &str) -> Result<Value> {
    parse(input)
}
