//! Framed msgpack-RPC runtime.
//!
//! The wire protocol multiplexes calls by method name over a single byte
//! stream. Each message is a length-prefixed msgpack array; request
//! arguments ride as a one-element positional tuple. Servers register
//! [`Protocol`]s (a service name plus a method-name → handler table) in a
//! [`ProtocolRegistry`]; clients issue calls through the [`GenericClient`]
//! trait, implemented for real streams by [`RpcClient`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Client side: the `GenericClient` transport trait and a stream-backed
/// implementation with response routing and timeouts.
pub mod client;
/// Per-call payload compression for `CallCompressed` packets.
pub mod compress;
/// Error types for codec, dispatch, and transport failures.
pub mod error;
/// Wire packet types and the length-framed msgpack codec.
pub mod packet;
/// Service registration and name-based method dispatch.
pub mod protocol;
/// Accept loop and per-connection serving.
pub mod server;

pub use client::{GenericClient, RpcClient};
pub use compress::CompressionType;
pub use error::RpcError;
pub use packet::Packet;
pub use protocol::{Protocol, ProtocolRegistry};
