//! JSON-RPC message envelope.
//!
//! Builds request bodies and unpacks response bodies; moving them over the
//! wire is the caller's business. Responses go through the stack-machine
//! parser like any other input.

use crate::error::{CodecError, Result};
use crate::value::{Map, Value};
use crate::Codec;

/// Request header naming the called method.
pub const METHOD_HEADER: &str = "X-JSON-RPC";

/// Per-connection request state: the id counter and the last method name.
#[derive(Debug, Default)]
pub struct RpcClient {
    codec: Codec,
    id: u64,
    last_method: Option<String>,
}

impl RpcClient {
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            id: 0,
            last_method: None,
        }
    }

    /// Encode a call as `{"method": ..., "params": [...], "id": N}`.
    ///
    /// Ids start at 1 and increase by one per call.
    pub fn encode_call(&mut self, method: &str, params: Vec<Value>) -> Result<String> {
        self.id += 1;
        self.last_method = Some(method.to_string());

        let mut message = Map::new();
        message.insert("method".to_string(), Value::from(method));
        message.insert("params".to_string(), Value::Array(params));
        message.insert("id".to_string(), Value::Number(self.id as f64));
        self.codec.stringify(&Value::Object(message))
    }

    /// Id of the most recently encoded call, 0 before the first.
    pub fn last_id(&self) -> u64 {
        self.id
    }

    /// Header to send with the most recent call, if any.
    pub fn header(&self) -> Option<(&'static str, &str)> {
        self.last_method
            .as_deref()
            .map(|method| (METHOD_HEADER, method))
    }

    /// Extract `result` from a response body.
    ///
    /// A missing `result` is null. A non-null `error` member is reported as
    /// [`CodecError::Rpc`] with the error encoded as JSON.
    pub fn decode_response(&self, body: &str) -> Result<Value> {
        let mut response = self.codec.parse(body)?;
        let Value::Object(members) = &mut response else {
            return Err(CodecError::Rpc("response is not an object".to_string()));
        };

        match members.get("error") {
            None | Some(Value::Null) => {}
            Some(error) => {
                let detail = match error.get("message").and_then(Value::as_str) {
                    Some(message) => message.to_string(),
                    None => self.codec.stringify(error)?,
                };
                return Err(CodecError::Rpc(detail));
            }
        }

        Ok(members.shift_remove("result").unwrap_or(Value::Null))
    }
}
