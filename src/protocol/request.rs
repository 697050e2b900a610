//! Outgoing request envelope.

use super::{DEFAULT_REQUEST_ID, JSONRPC_VERSION};
use serde::Serialize;

/// A JSON-RPC request. Field order is the wire order.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a P,
    pub id: &'a str,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    /// Build an envelope; an empty `id` falls back to `"1"`.
    pub fn new(method: &'a str, params: &'a P, id: &'a str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id: if id.is_empty() { DEFAULT_REQUEST_ID } else { id },
        }
    }

    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
