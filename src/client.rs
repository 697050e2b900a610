//! Signed JSON-RPC client.
//!
//! The public surface is [`RpcClient`] and its builder; the retrying send loop
//! lives in `execution`.

pub mod builder;
pub mod core;
mod execution;

pub use self::builder::RpcClientBuilder;
pub use self::core::RpcClient;
