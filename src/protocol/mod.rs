//! JSON-RPC 2.0 envelope codec.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`request`] | Outgoing `{jsonrpc, method, params, id}` envelope |
//! | [`response`] | Incoming `{jsonrpc, result \| error, id}` envelope |

pub mod request;
pub mod response;

pub use request::RpcRequest;
pub use response::{RpcErrorObject, RpcResponse};

/// Protocol version carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Identifier used when the caller does not supply one.
pub const DEFAULT_REQUEST_ID: &str = "1";
