//! Incoming response envelope.

use crate::Error;
use serde::Deserialize;

/// Error object of a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl From<RpcErrorObject> for Error {
    fn from(e: RpcErrorObject) -> Self {
        Error::Rpc {
            code: e.code,
            message: e.message,
        }
    }
}

/// A JSON-RPC response.
///
/// A missing or `null` `result` is left as `None` at decode time, so an error
/// envelope decodes whatever `R` is. [`RpcResponse::into_result`] then decodes
/// `R` from `null`, which lets `()`, `Option<T>` or `serde_json::Value` accept
/// an empty envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "R: Deserialize<'de>"))]
pub struct RpcResponse<R> {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub result: Option<R>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

impl<R: for<'de> Deserialize<'de>> RpcResponse<R> {
    /// Decode an envelope from raw bytes.
    pub fn from_slice(body: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// The result, or the envelope's error.
    ///
    /// An absent result is produced by decoding `R` from `null`.
    pub fn into_result(self) -> crate::Result<R> {
        if let Some(error) = self.error {
            return Err(error.into());
        }
        match self.result {
            Some(result) => Ok(result),
            None => Ok(serde_json::from_value(serde_json::Value::Null)?),
        }
    }
}
