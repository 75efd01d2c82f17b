use std::time::Duration;

use thiserror::Error;

/// Errors produced by the RPC runtime.
///
/// Remote application errors arrive as [`RpcError::Remote`] and are passed
/// through untouched; this layer adds no retry or recovery semantics.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Msgpack value encoding failed.
    #[error("msgpack encode error: {0}")]
    Encode(#[from] rmpv::encode::Error),
    /// Msgpack value decoding failed.
    #[error("msgpack decode error: {0}")]
    Decode(#[from] rmpv::decode::Error),
    /// Converting between msgpack values and typed data failed.
    #[error("value conversion error: {0}")]
    Convert(#[from] rmpv::ext::Error),
    /// A packet body was not a msgpack array.
    #[error("malformed packet: expected array, got {0}")]
    NotAnArray(&'static str),
    /// The packet array was shorter than its type requires.
    #[error("packet too short: expected {expected} elements, got {actual}")]
    TooShort {
        /// Minimum element count for the packet type.
        expected: usize,
        /// Element count received.
        actual: usize,
    },
    /// The first array element does not name a known packet type.
    #[error("unknown packet type {0}")]
    UnknownPacketType(i64),
    /// A framed packet exceeded the maximum permitted size.
    #[error("packet too large: max {max}, got {actual}")]
    PacketTooLarge {
        /// Maximum permitted body size in bytes.
        max: usize,
        /// Declared body size in bytes.
        actual: usize,
    },
    /// An unrecognized compression type code appeared on the wire.
    #[error("unknown compression type {0}")]
    UnknownCompression(i64),
    /// Decoded arguments did not match the shape a handler expects.
    #[error("type error: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Rust type the handler decodes into.
        expected: &'static str,
        /// Description of the wire value actually received.
        actual: String,
    },
    /// No registered protocol owns the called method.
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),
    /// The protocol is registered but has no such method.
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    /// A protocol name was registered twice.
    #[error("protocol already registered: {0}")]
    AlreadyRegistered(String),
    /// The remote side answered with an application error.
    #[error("{name} ({code}): {desc}")]
    Remote {
        /// Application status code.
        code: i32,
        /// Application error name.
        name: String,
        /// Human-readable description.
        desc: String,
    },
    /// The call did not complete within its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    /// The connection closed while a call was outstanding.
    #[error("connection closed")]
    ConnectionClosed,
}

impl RpcError {
    /// Builds a remote application error.
    #[must_use]
    pub fn remote(code: i32, name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self::Remote {
            code,
            name: name.into(),
            desc: desc.into(),
        }
    }
}
