//! Foreign objects: opaque values that bring their own JSON encoder.
//!
//! The serializer never looks inside a foreign object. It calls the
//! encoder and splices the returned text into the output verbatim, so the
//! encoder is responsible for producing valid JSON.

use crate::error::ForeignError;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied JSON encoder for an opaque value.
pub trait ForeignEncode: Send + Sync {
    /// Produce the JSON text that stands in for this object.
    fn encode(&self) -> Result<String, ForeignError>;

    /// Short label used by `Debug` output.
    fn describe(&self) -> String {
        "foreign".to_string()
    }
}

struct FnEncoder<F>(F);

impl<F> ForeignEncode for FnEncoder<F>
where
    F: Fn() -> Result<String, ForeignError> + Send + Sync,
{
    fn encode(&self) -> Result<String, ForeignError> {
        (self.0)()
    }
}

/// A shared handle to a foreign encoder.
///
/// Cloning is cheap; clones compare equal to each other.
#[derive(Clone)]
pub struct ForeignObject(Arc<dyn ForeignEncode>);

impl ForeignObject {
    pub fn new<E: ForeignEncode + 'static>(encoder: E) -> Self {
        ForeignObject(Arc::new(encoder))
    }

    /// Wrap a closure as the encoder.
    pub fn from_fn<F>(encode: F) -> Self
    where
        F: Fn() -> Result<String, ForeignError> + Send + Sync + 'static,
    {
        ForeignObject(Arc::new(FnEncoder(encode)))
    }

    /// Run the encoder.
    pub fn encode(&self) -> Result<String, ForeignError> {
        self.0.encode()
    }

    /// Identity comparison: two handles are the same object.
    pub fn same_object(&self, other: &ForeignObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ForeignObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0.describe())
    }
}

/// Embeds an externally serialized payload as a call-like JSON string.
///
/// Encodes to a JSON string literal whose content is
/// `function("payload")`, e.g. a markup tree reference such as
/// `"xmldb.getXml(\"<a:bar/>\")"`. The receiving side is expected to
/// recognize the call shape; plain consumers just see a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallWrapper {
    pub function: String,
    pub payload: String,
}

impl CallWrapper {
    pub fn new(function: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            payload: payload.into(),
        }
    }
}

impl ForeignEncode for CallWrapper {
    fn encode(&self) -> Result<String, ForeignError> {
        let call = format!(
            "{}({})",
            self.function,
            crate::encode::encode_string(&self.payload)
        );
        Ok(crate::encode::encode_string(&call))
    }

    fn describe(&self) -> String {
        format!("call {}", self.function)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_encoder() {
        let obj = ForeignObject::from_fn(|| Ok("[1, 2]".to_string()));
        assert_eq!(obj.encode().unwrap(), "[1, 2]");
        assert_eq!(format!("{:?}", obj), "<foreign>");
    }

    #[test]
    fn test_closure_encoder_failure() {
        let obj = ForeignObject::from_fn(|| Err("detached node".into()));
        let err = obj.encode().unwrap_err();
        assert_eq!(err.to_string(), "detached node");
    }

    #[test]
    fn test_same_object() {
        let a = ForeignObject::from_fn(|| Ok("null".to_string()));
        let b = a.clone();
        let c = ForeignObject::from_fn(|| Ok("null".to_string()));
        assert!(a.same_object(&b));
        assert!(!a.same_object(&c));
    }

    #[test]
    fn test_call_wrapper() {
        let wrapper = CallWrapper::new("xmldb.getXml", "<a:bar caption=\"x\"/>");
        assert_eq!(
            wrapper.encode().unwrap(),
            r#""xmldb.getXml(\"<a:bar caption=\\\"x\\\"/>\")""#
        );
        assert_eq!(
            format!("{:?}", ForeignObject::new(wrapper)),
            "<call xmldb.getXml>"
        );
    }
}
