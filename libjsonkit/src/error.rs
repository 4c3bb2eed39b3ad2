//! Error types for JSON encoding and decoding.

use thiserror::Error;

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Boxed error returned by foreign object encoders.
pub type ForeignError = Box<dyn std::error::Error + Send + Sync>;

/// Parse context carrying filename for error reporting.
#[derive(Clone, Debug, Default)]
pub struct ParseContext {
    pub filename: Option<String>,
}

impl ParseContext {
    /// Create a new parse context.
    pub fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(String::from),
        }
    }

    /// Format a location suffix for error messages.
    pub fn loc_suffix(&self, offset: Option<usize>) -> String {
        match (&self.filename, offset) {
            (Some(name), Some(offset)) => format!(" at byte {} of <{}>", offset, name),
            (None, Some(offset)) => format!(" at byte {}", offset),
            (Some(name), None) => format!(" in <{}>", name),
            (None, None) => String::new(),
        }
    }
}

/// Error type for the JSON codec.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Input text is not acceptable JSON.
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// A foreign object encoder failed.
    #[error("Foreign object encoder failed: {0}")]
    Foreign(#[source] ForeignError),

    /// A calendar field was out of range.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A JSON-RPC response reported a failure.
    #[error("JSON-RPC error: {0}")]
    Rpc(String),
}

impl CodecError {
    /// Shorthand for a malformed-input error without location.
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        CodecError::MalformedJson(detail.into())
    }

    /// Attach location information to a malformed-input error.
    ///
    /// Other variants are returned unchanged.
    pub fn with_location(self, ctx: &ParseContext, offset: Option<usize>) -> Self {
        match self {
            CodecError::MalformedJson(detail) => {
                CodecError::MalformedJson(format!("{}{}", detail, ctx.loc_suffix(offset)))
            }
            other => other,
        }
    }

    /// Returns `true` for [`CodecError::MalformedJson`].
    pub fn is_malformed(&self) -> bool {
        matches!(self, CodecError::MalformedJson(_))
    }
}
