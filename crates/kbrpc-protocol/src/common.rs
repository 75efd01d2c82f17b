//! Types shared across services: timestamps, ids, status records, and the
//! fixed-size cryptographic identifiers.

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Time = i64;
/// Seconds since the Unix epoch.
pub type UnixTime = i64;

string_id! {
    /// User id.
    Uid
}
string_id! {
    /// Key id.
    Kid
}
string_id! {
    /// Device id.
    DeviceId
}
string_id! {
    /// Signature id.
    SigId
}
string_id! {
    /// Team id.
    TeamId
}
string_id! {
    /// Either a user id or a team id; the charge target for quota.
    UserOrTeamId
}
string_id! {
    /// E.164-formatted phone number.
    PhoneNumber
}

fixed_bytes! {
    /// 32 bytes of key material.
    Bytes32, 32
}
fixed_bytes! {
    /// A boxed (encrypted) 32-byte secret: 32 bytes plus the box overhead.
    EncryptedBytes32, 48
}
fixed_bytes! {
    /// NaCl box nonce.
    BoxNonce, 24
}
fixed_bytes! {
    /// NaCl box public key.
    BoxPublicKey, 32
}
fixed_bytes! {
    /// Ed25519 public key.
    Ed25519PublicKey, 32
}
fixed_bytes! {
    /// Ed25519 signature.
    Ed25519Signature, 64
}

/// A single key/value attachment on a [`Status`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringKvPair {
    pub key: String,
    pub value: String,
}

/// Application-level status record carried by wire errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: i32,
    pub name: String,
    pub desc: String,
    pub fields: Vec<StringKvPair>,
}

/// A user reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: Uid,
    pub username: String,
}

/// A provisioned device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "type")]
    pub device_type: String,
    pub name: String,
    #[serde(rename = "deviceID")]
    pub device_id: DeviceId,
    #[serde(rename = "cTime")]
    pub c_time: Time,
    #[serde(rename = "mTime")]
    pub m_time: Time,
    #[serde(rename = "encryptKey")]
    pub encrypt_key: Kid,
    #[serde(rename = "verifyKey")]
    pub verify_key: Kid,
    pub status: i32,
}

/// Identifies a stored block: content hash plus the quota charge target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIdCombo {
    #[serde(rename = "blockHash")]
    pub block_hash: String,
    #[serde(rename = "chargedTo")]
    pub charged_to: UserOrTeamId,
}

/// Server challenge for session authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeInfo {
    pub now: i64,
    pub challenge: String,
}

/// Builds the decode error for a union whose discriminant names a case with
/// no payload present.
pub(crate) fn missing_case<E: serde::de::Error>(union: &str, case: &str) -> E {
    E::custom(format!("{union}: missing payload for case {case}"))
}

/// Byte buffers ride as msgpack bin, not arrays of integers.
pub(crate) mod serde_bytes_compat {
    use serde::de::{Error, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        struct BufVisitor;

        impl<'de> Visitor<'de> for BufVisitor {
            type Value = Vec<u8>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a byte buffer")
            }

            fn visit_bytes<E: Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(v.to_vec())
            }

            fn visit_byte_buf<E: Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(v)
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut out = Vec::new();
                while let Some(b) = seq.next_element::<u8>()? {
                    out.push(b);
                }
                Ok(out)
            }
        }

        d.deserialize_bytes(BufVisitor)
    }
}
