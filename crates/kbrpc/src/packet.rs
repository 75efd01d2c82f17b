//! Wire packets and the length-framed msgpack codec.
//!
//! Every message on the stream is a 4-byte big-endian length prefix
//! followed by a msgpack array. The first array element is the packet type;
//! remaining elements depend on the type. Call arguments are positional
//! tuples (always a one-element array wrapping the argument record), so the
//! argument payload of every packet is itself a msgpack array.

use rmpv::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::compress::CompressionType;
use crate::error::RpcError;

/// Call packet type: `[0, seq, method, args]`.
pub const TYPE_CALL: i64 = 0;
/// Response packet type: `[1, seq, error, result]`.
pub const TYPE_RESPONSE: i64 = 1;
/// Notify packet type: `[2, method, args]`. Fire-and-forget, no response.
pub const TYPE_NOTIFY: i64 = 2;
/// Cancel packet type: `[3, seq]`.
pub const TYPE_CANCEL: i64 = 3;
/// Compressed call packet type: `[4, seq, ctype, method, bin(args)]`.
pub const TYPE_CALL_COMPRESSED: i64 = 4;

/// Maximum framed packet body size (16 MiB).
pub const MAX_PACKET_SIZE: usize = 16 * 1024 * 1024;

/// Application error carried in a response packet.
///
/// Encoded on the wire as a `{code, name, desc}` map, or nil when the call
/// succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireError {
    /// Application status code.
    pub code: i32,
    /// Application error name.
    pub name: String,
    /// Human-readable description.
    pub desc: String,
}

impl From<WireError> for RpcError {
    fn from(e: WireError) -> Self {
        RpcError::Remote {
            code: e.code,
            name: e.name,
            desc: e.desc,
        }
    }
}

impl WireError {
    /// Flattens any runtime error into its wire representation.
    ///
    /// Remote errors keep their status; everything else maps to code -1
    /// with the error class as the name.
    #[must_use]
    pub fn from_rpc_error(err: &RpcError) -> Self {
        match err {
            RpcError::Remote { code, name, desc } => Self {
                code: *code,
                name: name.clone(),
                desc: desc.clone(),
            },
            RpcError::TypeMismatch { .. } => Self {
                code: -1,
                name: "TYPE_ERROR".to_owned(),
                desc: err.to_string(),
            },
            RpcError::UnknownProtocol(_) | RpcError::UnknownMethod(_) => Self {
                code: -1,
                name: "METHOD_NOT_FOUND".to_owned(),
                desc: err.to_string(),
            },
            other => Self {
                code: -1,
                name: "RPC_ERROR".to_owned(),
                desc: other.to_string(),
            },
        }
    }

    fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::from("code"), Value::from(self.code)),
            (Value::from("name"), Value::from(self.name.as_str())),
            (Value::from("desc"), Value::from(self.desc.as_str())),
        ])
    }

    fn from_value(v: &Value) -> Option<Self> {
        let map = v.as_map()?;
        let mut err = Self {
            code: 0,
            name: String::new(),
            desc: String::new(),
        };
        for (k, val) in map {
            match k.as_str() {
                Some("code") => err.code = i32::try_from(val.as_i64()?).ok()?,
                Some("name") => err.name = val.as_str()?.to_owned(),
                Some("desc") => err.desc = val.as_str()?.to_owned(),
                _ => {}
            }
        }
        Some(err)
    }
}

/// A parsed RPC packet.
///
/// Variants map 1:1 to the `TYPE_*` wire codes. `CallCompressed` holds its
/// arguments decoded; compression is applied and removed by the codec.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Request expecting a response with the same sequence number.
    Call {
        /// Caller-allocated sequence number.
        seq: u32,
        /// Full wire method name, e.g. `keybase.1.block.putBlock`.
        method: String,
        /// Positional argument tuple.
        args: Value,
    },
    /// Answer to a `Call` or `CallCompressed` with the same sequence number.
    Response {
        /// Sequence number of the call being answered.
        seq: u32,
        /// Application error, if the call failed.
        error: Option<WireError>,
        /// Call result; nil for void methods or failures.
        result: Value,
    },
    /// One-way notification; the server never answers.
    Notify {
        /// Full wire method name.
        method: String,
        /// Positional argument tuple.
        args: Value,
    },
    /// Cancels the in-flight call with the given sequence number.
    Cancel {
        /// Sequence number of the call to cancel.
        seq: u32,
    },
    /// Request whose argument tuple is compressed on the wire.
    CallCompressed {
        /// Caller-allocated sequence number.
        seq: u32,
        /// Compression applied to the encoded argument tuple.
        compression: CompressionType,
        /// Full wire method name.
        method: String,
        /// Positional argument tuple (already decompressed).
        args: Value,
    },
}

/// Returns a short description of a msgpack value's shape, for error
/// reporting.
#[must_use]
pub fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Nil => "nil",
        Value::Boolean(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::F32(_) | Value::F64(_) => "float",
        Value::String(_) => "string",
        Value::Binary(_) => "binary",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Ext(..) => "ext",
    }
}

fn expect_seq(v: &Value) -> Result<u32, RpcError> {
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| RpcError::TypeMismatch {
            expected: "u32 sequence number",
            actual: value_kind(v).to_owned(),
        })
}

fn expect_str(v: &Value) -> Result<String, RpcError> {
    v.as_str()
        .map(ToOwned::to_owned)
        .ok_or_else(|| RpcError::TypeMismatch {
            expected: "method name string",
            actual: value_kind(v).to_owned(),
        })
}

fn encode_value(v: &Value) -> Result<Vec<u8>, RpcError> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, v)?;
    Ok(buf)
}

fn decode_value(mut data: &[u8]) -> Result<Value, RpcError> {
    Ok(rmpv::decode::read_value(&mut data)?)
}

impl Packet {
    /// Creates a `Call` packet.
    #[must_use]
    pub fn call(seq: u32, method: impl Into<String>, args: Value) -> Self {
        Self::Call {
            seq,
            method: method.into(),
            args,
        }
    }

    /// Creates a successful `Response` packet.
    #[must_use]
    pub fn response_ok(seq: u32, result: Value) -> Self {
        Self::Response {
            seq,
            error: None,
            result,
        }
    }

    /// Creates a failed `Response` packet.
    #[must_use]
    pub fn response_err(seq: u32, error: WireError) -> Self {
        Self::Response {
            seq,
            error: Some(error),
            result: Value::Nil,
        }
    }

    /// Creates a `Notify` packet.
    #[must_use]
    pub fn notify(method: impl Into<String>, args: Value) -> Self {
        Self::Notify {
            method: method.into(),
            args,
        }
    }

    /// Creates a `CallCompressed` packet.
    #[must_use]
    pub fn call_compressed(
        seq: u32,
        compression: CompressionType,
        method: impl Into<String>,
        args: Value,
    ) -> Self {
        Self::CallCompressed {
            seq,
            compression,
            method: method.into(),
            args,
        }
    }

    /// Returns the wire type code for this packet.
    #[must_use]
    pub const fn packet_type(&self) -> i64 {
        match self {
            Self::Call { .. } => TYPE_CALL,
            Self::Response { .. } => TYPE_RESPONSE,
            Self::Notify { .. } => TYPE_NOTIFY,
            Self::Cancel { .. } => TYPE_CANCEL,
            Self::CallCompressed { .. } => TYPE_CALL_COMPRESSED,
        }
    }

    /// Serializes this packet into a msgpack byte vector (unframed).
    ///
    /// # Errors
    ///
    /// Returns an error if value encoding or argument compression fails.
    pub fn encode(&self) -> Result<Vec<u8>, RpcError> {
        let value = match self {
            Self::Call { seq, method, args } => Value::Array(vec![
                Value::from(TYPE_CALL),
                Value::from(*seq),
                Value::from(method.as_str()),
                args.clone(),
            ]),
            Self::Response { seq, error, result } => Value::Array(vec![
                Value::from(TYPE_RESPONSE),
                Value::from(*seq),
                error.as_ref().map_or(Value::Nil, WireError::to_value),
                result.clone(),
            ]),
            Self::Notify { method, args } => Value::Array(vec![
                Value::from(TYPE_NOTIFY),
                Value::from(method.as_str()),
                args.clone(),
            ]),
            Self::Cancel { seq } => {
                Value::Array(vec![Value::from(TYPE_CANCEL), Value::from(*seq)])
            }
            Self::CallCompressed {
                seq,
                compression,
                method,
                args,
            } => {
                let raw = encode_value(args)?;
                let packed = compression.compress(&raw)?;
                Value::Array(vec![
                    Value::from(TYPE_CALL_COMPRESSED),
                    Value::from(*seq),
                    Value::from(compression.code()),
                    Value::from(method.as_str()),
                    Value::Binary(packed),
                ])
            }
        };
        encode_value(&value)
    }

    /// Parses a msgpack byte slice into a typed packet.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not an array, is shorter than its
    /// declared type requires, carries an unknown type code, or fails
    /// argument decompression.
    pub fn decode(data: &[u8]) -> Result<Self, RpcError> {
        let value = decode_value(data)?;
        let Value::Array(items) = value else {
            return Err(RpcError::NotAnArray(value_kind(&value)));
        };
        let Some(ptype) = items.first().and_then(Value::as_i64) else {
            return Err(RpcError::TooShort {
                expected: 2,
                actual: items.len(),
            });
        };
        match ptype {
            TYPE_CALL => {
                if items.len() < 4 {
                    return Err(RpcError::TooShort {
                        expected: 4,
                        actual: items.len(),
                    });
                }
                Ok(Self::Call {
                    seq: expect_seq(&items[1])?,
                    method: expect_str(&items[2])?,
                    args: items[3].clone(),
                })
            }
            TYPE_RESPONSE => {
                if items.len() < 4 {
                    return Err(RpcError::TooShort {
                        expected: 4,
                        actual: items.len(),
                    });
                }
                let error = match &items[2] {
                    Value::Nil => None,
                    other => Some(WireError::from_value(other).ok_or_else(|| {
                        RpcError::TypeMismatch {
                            expected: "error map {code, name, desc}",
                            actual: value_kind(other).to_owned(),
                        }
                    })?),
                };
                Ok(Self::Response {
                    seq: expect_seq(&items[1])?,
                    error,
                    result: items[3].clone(),
                })
            }
            TYPE_NOTIFY => {
                if items.len() < 3 {
                    return Err(RpcError::TooShort {
                        expected: 3,
                        actual: items.len(),
                    });
                }
                Ok(Self::Notify {
                    method: expect_str(&items[1])?,
                    args: items[2].clone(),
                })
            }
            TYPE_CANCEL => {
                if items.len() < 2 {
                    return Err(RpcError::TooShort {
                        expected: 2,
                        actual: items.len(),
                    });
                }
                Ok(Self::Cancel {
                    seq: expect_seq(&items[1])?,
                })
            }
            TYPE_CALL_COMPRESSED => {
                if items.len() < 5 {
                    return Err(RpcError::TooShort {
                        expected: 5,
                        actual: items.len(),
                    });
                }
                let compression = CompressionType::from_code(
                    items[2].as_i64().ok_or_else(|| RpcError::TypeMismatch {
                        expected: "compression type code",
                        actual: value_kind(&items[2]).to_owned(),
                    })?,
                )?;
                let Value::Binary(packed) = &items[4] else {
                    return Err(RpcError::TypeMismatch {
                        expected: "binary compressed args",
                        actual: value_kind(&items[4]).to_owned(),
                    });
                };
                let raw = compression.decompress(packed)?;
                Ok(Self::CallCompressed {
                    seq: expect_seq(&items[1])?,
                    compression,
                    method: expect_str(&items[3])?,
                    args: decode_value(&raw)?,
                })
            }
            t => Err(RpcError::UnknownPacketType(t)),
        }
    }
}

/// Writes one length-framed packet to the stream and flushes.
///
/// # Errors
///
/// Returns an error on encoding failure or I/O failure.
pub async fn write_packet<W>(w: &mut W, packet: &Packet) -> Result<(), RpcError>
where
    W: AsyncWrite + Unpin,
{
    let body = packet.encode()?;
    if body.len() > MAX_PACKET_SIZE {
        return Err(RpcError::PacketTooLarge {
            max: MAX_PACKET_SIZE,
            actual: body.len(),
        });
    }
    w.write_u32(body.len() as u32).await?;
    w.write_all(&body).await?;
    w.flush().await?;
    Ok(())
}

/// Reads one length-framed packet from the stream.
///
/// Returns [`RpcError::ConnectionClosed`] on clean EOF at a frame boundary.
///
/// # Errors
///
/// Returns an error on I/O failure, an oversized frame, or a malformed body.
pub async fn read_packet<R>(r: &mut R) -> Result<Packet, RpcError>
where
    R: AsyncRead + Unpin,
{
    let len = match r.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(RpcError::ConnectionClosed);
        }
        Err(e) => return Err(e.into()),
    };
    if len > MAX_PACKET_SIZE {
        return Err(RpcError::PacketTooLarge {
            max: MAX_PACKET_SIZE,
            actual: len,
        });
    }
    let mut body = vec![0u8; len];
    r.read_exact(&mut body).await?;
    Packet::decode(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &str) -> Value {
        Value::Array(vec![Value::from(v)])
    }

    #[test]
    fn call_round_trip() {
        let packet = Packet::call(7, "keybase.1.block.putBlock", args("payload"));
        let bytes = packet.encode().unwrap();
        let parsed = Packet::decode(&bytes).unwrap();
        assert_eq!(parsed, packet);
        assert_eq!(parsed.packet_type(), TYPE_CALL);
    }

    #[test]
    fn response_ok_round_trip() {
        let packet = Packet::response_ok(7, Value::from(42));
        let parsed = Packet::decode(&packet.encode().unwrap()).unwrap();
        match parsed {
            Packet::Response { seq, error, result } => {
                assert_eq!(seq, 7);
                assert!(error.is_none());
                assert_eq!(result, Value::from(42));
            }
            other => panic!("expected Response, got {other:?}"),
        }
    }

    #[test]
    fn response_err_round_trip() {
        let err = WireError {
            code: 205,
            name: "SC_NOT_FOUND".to_owned(),
            desc: "no such block".to_owned(),
        };
        let packet = Packet::response_err(9, err.clone());
        let parsed = Packet::decode(&packet.encode().unwrap()).unwrap();
        match parsed {
            Packet::Response { error, .. } => assert_eq!(error, Some(err)),
            other => panic!("expected Response, got {other:?}"),
        }
    }

    #[test]
    fn notify_round_trip() {
        let packet = Packet::notify("keybase.1.NotifyFS.FSActivity", args("ev"));
        let parsed = Packet::decode(&packet.encode().unwrap()).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn cancel_round_trip() {
        let packet = Packet::Cancel { seq: 3 };
        let parsed = Packet::decode(&packet.encode().unwrap()).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn compressed_call_round_trip() {
        let big = Value::Array(vec![Value::Binary(vec![0u8; 8192])]);
        let packet = Packet::call_compressed(
            11,
            CompressionType::Gzip,
            "keybase.1.block.getBlockSizes",
            big.clone(),
        );
        let bytes = packet.encode().unwrap();
        // Wire body must be smaller than the raw args it carries.
        assert!(bytes.len() < 8192);
        let parsed = Packet::decode(&bytes).unwrap();
        match parsed {
            Packet::CallCompressed {
                seq,
                compression,
                method,
                args,
            } => {
                assert_eq!(seq, 11);
                assert_eq!(compression, CompressionType::Gzip);
                assert_eq!(method, "keybase.1.block.getBlockSizes");
                assert_eq!(args, big);
            }
            other => panic!("expected CallCompressed, got {other:?}"),
        }
    }

    #[test]
    fn non_array_body_is_error() {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &Value::from("hello")).unwrap();
        assert!(matches!(
            Packet::decode(&buf),
            Err(RpcError::NotAnArray("string"))
        ));
    }

    #[test]
    fn unknown_type_is_error() {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &Value::Array(vec![Value::from(99), Value::from(1)]))
            .unwrap();
        assert!(matches!(
            Packet::decode(&buf),
            Err(RpcError::UnknownPacketType(99))
        ));
    }

    #[test]
    fn short_call_is_error() {
        let mut buf = Vec::new();
        rmpv::encode::write_value(
            &mut buf,
            &Value::Array(vec![Value::from(TYPE_CALL), Value::from(1)]),
        )
        .unwrap();
        assert!(matches!(
            Packet::decode(&buf),
            Err(RpcError::TooShort {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn framed_stream_round_trip() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        let packet = Packet::call(1, "keybase.1.config.getConfig", args("x"));
        write_packet(&mut a, &packet).await.unwrap();
        let parsed = read_packet(&mut b).await.unwrap();
        assert_eq!(parsed, packet);
    }

    #[tokio::test]
    async fn eof_at_frame_boundary_is_connection_closed() {
        let (a, mut b) = tokio::io::duplex(64);
        drop(a);
        assert!(matches!(
            read_packet(&mut b).await,
            Err(RpcError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_u32(&mut a, u32::MAX)
            .await
            .unwrap();
        assert!(matches!(
            read_packet(&mut b).await,
            Err(RpcError::PacketTooLarge { .. })
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_method() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9.]{0,64}"
    }

    fn arb_args() -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(any::<u8>(), 0..512)
    }

    proptest! {
        #[test]
        fn call_encode_decode_roundtrip(seq in any::<u32>(), method in arb_method(), payload in arb_args()) {
            let args = rmpv::Value::Array(vec![rmpv::Value::Binary(payload)]);
            let packet = Packet::call(seq, method, args);
            let parsed = Packet::decode(&packet.encode().unwrap()).unwrap();
            prop_assert_eq!(parsed, packet);
        }

        #[test]
        fn compressed_call_roundtrip_preserves_args(seq in any::<u32>(), payload in arb_args()) {
            let args = rmpv::Value::Array(vec![rmpv::Value::Binary(payload)]);
            let packet = Packet::call_compressed(seq, CompressionType::Gzip, "keybase.1.block.blockPing", args.clone());
            match Packet::decode(&packet.encode().unwrap()).unwrap() {
                Packet::CallCompressed { args: parsed, .. } => prop_assert_eq!(parsed, args),
                other => prop_assert!(false, "expected CallCompressed, got {:?}", other),
            }
        }

        #[test]
        fn truncated_bodies_never_panic(data in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = Packet::decode(&data);
        }
    }
}
