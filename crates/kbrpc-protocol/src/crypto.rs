//! `keybase.1.crypto` — signing and unboxing with device keys.
//!
//! Key material is plain fixed-size byte data here; the actual key
//! handling lives in the interface implementation.

use std::sync::Arc;

use async_trait::async_trait;
use kbrpc::client::{call_typed, GenericClient};
use kbrpc::error::RpcError;
use kbrpc::protocol::Protocol;
use serde::{Deserialize, Serialize};

use crate::common::{
    serde_bytes_compat, BoxNonce, BoxPublicKey, Bytes32, Ed25519PublicKey, Ed25519Signature,
    EncryptedBytes32, Kid,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ed25519SignatureInfo {
    pub sig: Ed25519Signature,
    #[serde(rename = "publicKey")]
    pub public_key: Ed25519PublicKey,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextBundle {
    pub kid: Kid,
    pub ciphertext: EncryptedBytes32,
    pub nonce: BoxNonce,
    #[serde(rename = "publicKey")]
    pub public_key: BoxPublicKey,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnboxAnyRes {
    pub kid: Kid,
    pub plaintext: Bytes32,
    pub index: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignEd25519Arg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    #[serde(with = "serde_bytes_compat")]
    pub msg: Vec<u8>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignToStringArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    #[serde(with = "serde_bytes_compat")]
    pub msg: Vec<u8>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnboxBytes32Arg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    #[serde(rename = "encryptedBytes32")]
    pub encrypted_bytes32: EncryptedBytes32,
    pub nonce: BoxNonce,
    #[serde(rename = "peersPublicKey")]
    pub peers_public_key: BoxPublicKey,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnboxBytes32AnyArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    pub bundles: Vec<CiphertextBundle>,
    pub reason: String,
    #[serde(rename = "promptPaper")]
    pub prompt_paper: bool,
}

/// Server-side handlers for the crypto service.
#[async_trait]
pub trait CryptoInterface: Send + Sync {
    /// Sign a message with the device Ed25519 key, prompting with `reason`.
    async fn sign_ed25519(&self, arg: SignEd25519Arg) -> Result<Ed25519SignatureInfo, RpcError>;
    /// Sign and return a compact armored string.
    async fn sign_to_string(&self, arg: SignToStringArg) -> Result<String, RpcError>;
    /// Unbox a 32-byte secret with the device encryption key.
    async fn unbox_bytes32(&self, arg: UnboxBytes32Arg) -> Result<Bytes32, RpcError>;
    /// Try each bundle against the keys available on this device.
    async fn unbox_bytes32_any(&self, arg: UnboxBytes32AnyArg) -> Result<UnboxAnyRes, RpcError>;
}

/// Builds the crypto dispatch table over an interface implementation.
pub fn crypto_protocol(i: Arc<dyn CryptoInterface>) -> Protocol {
    Protocol::new("keybase.1.crypto")
        .method("signED25519", dispatch!(i, sign_ed25519: SignEd25519Arg))
        .method("signToString", dispatch!(i, sign_to_string: SignToStringArg))
        .method("unboxBytes32", dispatch!(i, unbox_bytes32: UnboxBytes32Arg))
        .method(
            "unboxBytes32Any",
            dispatch!(i, unbox_bytes32_any: UnboxBytes32AnyArg),
        )
}

/// Client stub for the crypto service.
pub struct CryptoClient<C> {
    pub cli: C,
}

impl<C: GenericClient> CryptoClient<C> {
    pub async fn sign_ed25519(
        &self,
        arg: SignEd25519Arg,
    ) -> Result<Ed25519SignatureInfo, RpcError> {
        call_typed(&self.cli, "keybase.1.crypto.signED25519", &(arg,)).await
    }

    pub async fn sign_to_string(&self, arg: SignToStringArg) -> Result<String, RpcError> {
        call_typed(&self.cli, "keybase.1.crypto.signToString", &(arg,)).await
    }

    pub async fn unbox_bytes32(&self, arg: UnboxBytes32Arg) -> Result<Bytes32, RpcError> {
        call_typed(&self.cli, "keybase.1.crypto.unboxBytes32", &(arg,)).await
    }

    pub async fn unbox_bytes32_any(
        &self,
        arg: UnboxBytes32AnyArg,
    ) -> Result<UnboxAnyRes, RpcError> {
        call_typed(&self.cli, "keybase.1.crypto.unboxBytes32Any", &(arg,)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_info_round_trips() {
        let info = Ed25519SignatureInfo {
            sig: Ed25519Signature([9u8; 64]),
            public_key: Ed25519PublicKey([4u8; 32]),
        };
        let v = rmpv::ext::to_value(&info).unwrap();
        let back: Ed25519SignatureInfo = rmpv::ext::from_value(v).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn unbox_arg_tags_are_exact() {
        let v = rmpv::ext::to_value(UnboxBytes32Arg::default()).unwrap();
        let keys: Vec<_> = v
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str().unwrap().to_owned())
            .collect();
        assert_eq!(
            keys,
            vec![
                "sessionID",
                "encryptedBytes32",
                "nonce",
                "peersPublicKey",
                "reason"
            ]
        );
    }

    #[test]
    fn bundle_clone_is_independent() {
        let original = UnboxBytes32AnyArg {
            bundles: vec![CiphertextBundle::default()],
            ..UnboxBytes32AnyArg::default()
        };
        let mut copy = original.clone();
        copy.bundles[0].kid = "kid_changed".into();
        copy.bundles.push(CiphertextBundle::default());
        assert_eq!(original.bundles.len(), 1);
        assert_eq!(original.bundles[0].kid, Kid::default());
    }

    #[test]
    fn truncated_key_material_is_rejected() {
        // A 47-byte ciphertext must not decode as EncryptedBytes32.
        let mut arg = rmpv::ext::to_value(UnboxBytes32Arg::default()).unwrap();
        if let rmpv::Value::Map(entries) = &mut arg {
            entries[1].1 = rmpv::Value::Binary(vec![0u8; 47]);
        }
        let err = rmpv::ext::from_value::<UnboxBytes32Arg>(arg).unwrap_err();
        assert!(err.to_string().contains("expected 48 bytes, got 47"));
    }
}
