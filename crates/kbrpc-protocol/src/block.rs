//! `keybase.1.block` — the block-store service.
//!
//! Most operations request gzip payload compression, matching the original
//! surface; the raw block transfer calls (`putBlock`, `putBlockAgain`,
//! `getBlock`) go uncompressed since block payloads are already encrypted.

use std::sync::Arc;

use async_trait::async_trait;
use kbrpc::client::{call_compressed_typed, call_typed, GenericClient};
use kbrpc::compress::CompressionType;
use kbrpc::error::RpcError;
use kbrpc::protocol::Protocol;
use serde::{Deserialize, Serialize};

use crate::common::{serde_bytes_compat, BlockIdCombo, ChallengeInfo, TeamId, Time, UserOrTeamId};

wire_enum! {
    /// Lifecycle state of a stored block.
    BlockStatus {
        Unknown = 0 => "UNKNOWN",
        Live = 1 => "LIVE",
        Archived = 2 => "ARCHIVED",
    }
}

impl Default for BlockStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

fixed_bytes! {
    /// Per-reference nonce distinguishing multiple references to one block.
    BlockRefNonce, 8
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetBlockRes {
    #[serde(rename = "blockKey")]
    pub block_key: String,
    #[serde(with = "serde_bytes_compat")]
    pub buf: Vec<u8>,
    pub size: i32,
    pub status: BlockStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetBlockSizesRes {
    pub sizes: Vec<i32>,
    pub statuses: Vec<BlockStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReference {
    pub bid: BlockIdCombo,
    pub nonce: BlockRefNonce,
    #[serde(rename = "chargedTo")]
    pub charged_to: UserOrTeamId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReferenceCount {
    #[serde(rename = "ref")]
    pub reference: BlockReference,
    #[serde(rename = "liveCount")]
    pub live_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowngradeReferenceRes {
    pub completed: Vec<BlockReferenceCount>,
    pub failed: BlockReference,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIdCount {
    pub id: BlockIdCombo,
    #[serde(rename = "liveCount")]
    pub live_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCountRes {
    pub counts: Vec<BlockIdCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPingResponse {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatRecord {
    pub write: i64,
    pub archive: i64,
    pub read: i64,
    #[serde(rename = "mdWrite")]
    pub md_write: i64,
    #[serde(rename = "gitWrite")]
    pub git_write: i64,
    #[serde(rename = "gitArchive")]
    pub git_archive: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStat {
    pub bytes: UsageStatRecord,
    pub blocks: UsageStatRecord,
    pub mtime: Time,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderUsageStat {
    #[serde(rename = "folderID")]
    pub folder_id: String,
    pub stats: UsageStat,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockQuotaInfo {
    pub folders: Vec<FolderUsageStat>,
    pub total: UsageStat,
    pub limit: i64,
    #[serde(rename = "gitLimit")]
    pub git_limit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSessionChallengeArg {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticateSessionArg {
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PutBlockArg {
    pub bid: BlockIdCombo,
    pub folder: String,
    #[serde(rename = "blockKey")]
    pub block_key: String,
    #[serde(with = "serde_bytes_compat")]
    pub buf: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PutBlockAgainArg {
    pub folder: String,
    #[serde(rename = "ref")]
    pub reference: BlockReference,
    #[serde(rename = "blockKey")]
    pub block_key: String,
    #[serde(with = "serde_bytes_compat")]
    pub buf: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlockArg {
    pub bid: BlockIdCombo,
    pub folder: String,
    #[serde(rename = "sizeOnly")]
    pub size_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBlockSizesArg {
    pub bids: Vec<BlockIdCombo>,
    pub folder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddReferenceArg {
    pub folder: String,
    #[serde(rename = "ref")]
    pub reference: BlockReference,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelReferenceArg {
    pub folder: String,
    #[serde(rename = "ref")]
    pub reference: BlockReference,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveReferenceArg {
    pub folder: String,
    pub refs: Vec<BlockReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelReferenceWithCountArg {
    pub folder: String,
    pub refs: Vec<BlockReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveReferenceWithCountArg {
    pub folder: String,
    pub refs: Vec<BlockReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetReferenceCountArg {
    pub folder: String,
    pub ids: Vec<BlockIdCombo>,
    pub status: BlockStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserQuotaInfoArg {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTeamQuotaInfoArg {
    pub tid: TeamId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserQuotaInfo2Arg {
    #[serde(rename = "includeFolders")]
    pub include_folders: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTeamQuotaInfo2Arg {
    pub tid: TeamId,
    #[serde(rename = "includeFolders")]
    pub include_folders: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPingArg {}

/// Server-side handlers for the block service.
#[async_trait]
pub trait BlockInterface: Send + Sync {
    async fn get_session_challenge(&self) -> Result<ChallengeInfo, RpcError>;
    async fn authenticate_session(&self, arg: AuthenticateSessionArg) -> Result<(), RpcError>;
    async fn put_block(&self, arg: PutBlockArg) -> Result<(), RpcError>;
    /// Re-upload a block the server reported missing, under an existing
    /// reference.
    async fn put_block_again(&self, arg: PutBlockAgainArg) -> Result<(), RpcError>;
    async fn get_block(&self, arg: GetBlockArg) -> Result<GetBlockRes, RpcError>;
    async fn get_block_sizes(&self, arg: GetBlockSizesArg) -> Result<GetBlockSizesRes, RpcError>;
    async fn add_reference(&self, arg: AddReferenceArg) -> Result<(), RpcError>;
    async fn del_reference(&self, arg: DelReferenceArg) -> Result<(), RpcError>;
    async fn archive_reference(
        &self,
        arg: ArchiveReferenceArg,
    ) -> Result<Vec<BlockReference>, RpcError>;
    async fn del_reference_with_count(
        &self,
        arg: DelReferenceWithCountArg,
    ) -> Result<DowngradeReferenceRes, RpcError>;
    async fn archive_reference_with_count(
        &self,
        arg: ArchiveReferenceWithCountArg,
    ) -> Result<DowngradeReferenceRes, RpcError>;
    async fn get_reference_count(
        &self,
        arg: GetReferenceCountArg,
    ) -> Result<ReferenceCountRes, RpcError>;
    async fn get_user_quota_info(&self) -> Result<Vec<u8>, RpcError>;
    async fn get_team_quota_info(&self, arg: GetTeamQuotaInfoArg) -> Result<Vec<u8>, RpcError>;
    async fn get_user_quota_info2(
        &self,
        arg: GetUserQuotaInfo2Arg,
    ) -> Result<BlockQuotaInfo, RpcError>;
    async fn get_team_quota_info2(
        &self,
        arg: GetTeamQuotaInfo2Arg,
    ) -> Result<BlockQuotaInfo, RpcError>;
    async fn block_ping(&self) -> Result<BlockPingResponse, RpcError>;
}

/// Builds the block dispatch table over an interface implementation.
pub fn block_protocol(i: Arc<dyn BlockInterface>) -> Protocol {
    Protocol::new("keybase.1.block")
        .method(
            "getSessionChallenge",
            dispatch!(i, get_session_challenge(): GetSessionChallengeArg),
        )
        .method(
            "authenticateSession",
            dispatch!(i, authenticate_session: AuthenticateSessionArg),
        )
        .method("putBlock", dispatch!(i, put_block: PutBlockArg))
        .method("putBlockAgain", dispatch!(i, put_block_again: PutBlockAgainArg))
        .method("getBlock", dispatch!(i, get_block: GetBlockArg))
        .method("getBlockSizes", dispatch!(i, get_block_sizes: GetBlockSizesArg))
        .method("addReference", dispatch!(i, add_reference: AddReferenceArg))
        .method("delReference", dispatch!(i, del_reference: DelReferenceArg))
        .method(
            "archiveReference",
            dispatch!(i, archive_reference: ArchiveReferenceArg),
        )
        .method(
            "delReferenceWithCount",
            dispatch!(i, del_reference_with_count: DelReferenceWithCountArg),
        )
        .method(
            "archiveReferenceWithCount",
            dispatch!(i, archive_reference_with_count: ArchiveReferenceWithCountArg),
        )
        .method(
            "getReferenceCount",
            dispatch!(i, get_reference_count: GetReferenceCountArg),
        )
        .method(
            "getUserQuotaInfo",
            dispatch!(i, get_user_quota_info(): GetUserQuotaInfoArg),
        )
        .method(
            "getTeamQuotaInfo",
            dispatch!(i, get_team_quota_info: GetTeamQuotaInfoArg),
        )
        .method(
            "getUserQuotaInfo2",
            dispatch!(i, get_user_quota_info2: GetUserQuotaInfo2Arg),
        )
        .method(
            "getTeamQuotaInfo2",
            dispatch!(i, get_team_quota_info2: GetTeamQuotaInfo2Arg),
        )
        .method("blockPing", dispatch!(i, block_ping(): BlockPingArg))
}

/// Client stub for the block service.
pub struct BlockClient<C> {
    pub cli: C,
}

impl<C: GenericClient> BlockClient<C> {
    pub async fn get_session_challenge(&self) -> Result<ChallengeInfo, RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.getSessionChallenge",
            &(GetSessionChallengeArg {},),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn authenticate_session(
        &self,
        arg: AuthenticateSessionArg,
    ) -> Result<(), RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.authenticateSession",
            &(arg,),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn put_block(&self, arg: PutBlockArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.block.putBlock", &(arg,)).await
    }

    pub async fn put_block_again(&self, arg: PutBlockAgainArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.block.putBlockAgain", &(arg,)).await
    }

    pub async fn get_block(&self, arg: GetBlockArg) -> Result<GetBlockRes, RpcError> {
        call_typed(&self.cli, "keybase.1.block.getBlock", &(arg,)).await
    }

    pub async fn get_block_sizes(
        &self,
        arg: GetBlockSizesArg,
    ) -> Result<GetBlockSizesRes, RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.getBlockSizes",
            &(arg,),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn add_reference(&self, arg: AddReferenceArg) -> Result<(), RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.addReference",
            &(arg,),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn del_reference(&self, arg: DelReferenceArg) -> Result<(), RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.delReference",
            &(arg,),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn archive_reference(
        &self,
        arg: ArchiveReferenceArg,
    ) -> Result<Vec<BlockReference>, RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.archiveReference",
            &(arg,),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn del_reference_with_count(
        &self,
        arg: DelReferenceWithCountArg,
    ) -> Result<DowngradeReferenceRes, RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.delReferenceWithCount",
            &(arg,),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn archive_reference_with_count(
        &self,
        arg: ArchiveReferenceWithCountArg,
    ) -> Result<DowngradeReferenceRes, RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.archiveReferenceWithCount",
            &(arg,),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn get_reference_count(
        &self,
        arg: GetReferenceCountArg,
    ) -> Result<ReferenceCountRes, RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.getReferenceCount",
            &(arg,),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn get_user_quota_info(&self) -> Result<Vec<u8>, RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.getUserQuotaInfo",
            &(GetUserQuotaInfoArg {},),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn get_team_quota_info(
        &self,
        arg: GetTeamQuotaInfoArg,
    ) -> Result<Vec<u8>, RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.getTeamQuotaInfo",
            &(arg,),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn get_user_quota_info2(
        &self,
        arg: GetUserQuotaInfo2Arg,
    ) -> Result<BlockQuotaInfo, RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.getUserQuotaInfo2",
            &(arg,),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn get_team_quota_info2(
        &self,
        arg: GetTeamQuotaInfo2Arg,
    ) -> Result<BlockQuotaInfo, RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.getTeamQuotaInfo2",
            &(arg,),
            CompressionType::Gzip,
        )
        .await
    }

    pub async fn block_ping(&self) -> Result<BlockPingResponse, RpcError> {
        call_compressed_typed(
            &self.cli,
            "keybase.1.block.blockPing",
            &(BlockPingArg {},),
            CompressionType::Gzip,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_keys(v: &rmpv::Value) -> Vec<String> {
        v.as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str().unwrap().to_owned())
            .collect()
    }

    #[test]
    fn block_status_codes_and_names() {
        assert_eq!(BlockStatus::Unknown.code(), 0);
        assert_eq!(BlockStatus::Live.code(), 1);
        assert_eq!(BlockStatus::Archived.code(), 2);
        assert_eq!(BlockStatus::Archived.to_string(), "ARCHIVED");
        assert_eq!(BlockStatus::from_code(1), Some(BlockStatus::Live));
        assert_eq!(BlockStatus::from_code(3), None);
    }

    #[test]
    fn unknown_block_status_fails_decode_with_raw_value() {
        let err = rmpv::ext::from_value::<BlockStatus>(rmpv::Value::from(7)).unwrap_err();
        assert!(err.to_string().contains('7'), "err: {err}");
    }

    #[test]
    fn block_status_encodes_as_integer() {
        let v = rmpv::ext::to_value(BlockStatus::Archived).unwrap();
        assert_eq!(v.as_i64(), Some(2));
    }

    #[test]
    fn put_block_arg_tags_and_bin_buf() {
        let arg = PutBlockArg {
            bid: BlockIdCombo::default(),
            folder: "private/alice".to_owned(),
            block_key: "key".to_owned(),
            buf: vec![1, 2, 3],
        };
        let v = rmpv::ext::to_value(&arg).unwrap();
        assert_eq!(map_keys(&v), vec!["bid", "folder", "blockKey", "buf"]);
        let buf = &v.as_map().unwrap()[3].1;
        assert!(matches!(buf, rmpv::Value::Binary(b) if b == &[1, 2, 3]));
    }

    #[test]
    fn block_reference_nonce_is_eight_bytes() {
        assert_eq!(BlockRefNonce::LEN, 8);
        assert!(BlockRefNonce::from_slice(&[0u8; 8]).is_some());
        assert!(BlockRefNonce::from_slice(&[0u8; 9]).is_none());
    }

    #[test]
    fn quota_info_clone_is_independent() {
        let original = BlockQuotaInfo {
            folders: vec![FolderUsageStat {
                folder_id: "tlf1".to_owned(),
                stats: UsageStat::default(),
            }],
            ..BlockQuotaInfo::default()
        };
        let mut copy = original.clone();
        copy.folders[0].folder_id.push('x');
        copy.folders.clear();
        assert_eq!(original.folders.len(), 1);
        assert_eq!(original.folders[0].folder_id, "tlf1");
    }
}
