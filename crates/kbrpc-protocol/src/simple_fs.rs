//! `keybase.1.SimpleFS` — the user-facing filesystem service.
//!
//! Operations are opID-centred: callers mint an operation id with
//! `simpleFSMakeOpid`, start an async operation under it, then
//! check/wait/read against that id and close it when done. Paths, in-flight
//! operation descriptions, and folder conflict states are tagged unions.

use std::sync::Arc;

use async_trait::async_trait;
use kbrpc::client::{call_typed, GenericClient};
use kbrpc::error::RpcError;
use kbrpc::protocol::Protocol;
use serde::{Deserialize, Serialize};

use crate::common::{serde_bytes_compat, Time, User};

fixed_bytes! {
    /// Handle for one in-flight async operation.
    OpId, 16
}

/// KBFS revision number.
pub type KbfsRevision = i64;

/// Progress cursor reported by streaming results.
pub type Progress = i32;

wire_enum! {
    /// How an archived KBFS view is addressed.
    KbfsArchivedType {
        Revision = 0 => "REVISION",
        Time = 1 => "TIME",
        TimeString = 2 => "TIME_STRING",
        RelTimeString = 3 => "REL_TIME_STRING",
    }
}

wire_enum! {
    /// Which case a [`Path`] carries.
    PathType {
        Local = 0 => "LOCAL",
        Kbfs = 1 => "KBFS",
        KbfsArchived = 2 => "KBFS_ARCHIVED",
    }
}

wire_enum! {
    /// Kind of a directory entry.
    DirentType {
        File = 0 => "FILE",
        Dir = 1 => "DIR",
        Sym = 2 => "SYM",
        Exec = 3 => "EXEC",
    }
}

impl Default for DirentType {
    fn default() -> Self {
        Self::File
    }
}

wire_enum! {
    /// Prefetch state of an entry's blocks.
    PrefetchStatus {
        NotStarted = 0 => "NOT_STARTED",
        InProgress = 1 => "IN_PROGRESS",
        Complete = 2 => "COMPLETE",
    }
}

impl Default for PrefetchStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

wire_enum! {
    /// Which span of revisions to fetch.
    RevisionSpanType {
        Default = 0 => "DEFAULT",
        LastFive = 1 => "LAST_FIVE",
    }
}

impl Default for RevisionSpanType {
    fn default() -> Self {
        Self::Default
    }
}

wire_enum! {
    /// Kind of async operation running under an opID.
    AsyncOps {
        List = 0 => "LIST",
        ListRecursive = 1 => "LIST_RECURSIVE",
        Read = 2 => "READ",
        Write = 3 => "WRITE",
        Copy = 4 => "COPY",
        Move = 5 => "MOVE",
        Remove = 6 => "REMOVE",
        ListRecursiveToDepth = 7 => "LIST_RECURSIVE_TO_DEPTH",
        GetRevisions = 8 => "GET_REVISIONS",
    }
}

impl Default for AsyncOps {
    fn default() -> Self {
        Self::List
    }
}

wire_enum! {
    /// Directory listing filter.
    ListFilter {
        NoFilter = 0 => "NO_FILTER",
        FilterAllHidden = 1 => "FILTER_ALL_HIDDEN",
        FilterSystemHidden = 2 => "FILTER_SYSTEM_HIDDEN",
    }
}

impl Default for ListFilter {
    fn default() -> Self {
        Self::NoFilter
    }
}

wire_enum! {
    /// Open disposition bits for `simpleFSOpen`.
    OpenFlags {
        Read = 0 => "READ",
        Replace = 1 => "REPLACE",
        Existing = 2 => "EXISTING",
        Write = 4 => "WRITE",
        Append = 8 => "APPEND",
        Directory = 16 => "DIRECTORY",
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self::Read
    }
}

wire_enum! {
    /// Which case a folder's [`ConflictState`] carries.
    ConflictStateType {
        NormalView = 1 => "NormalView",
        ManualResolvingLocalView = 2 => "ManualResolvingLocalView",
    }
}

/// KBFS path at the current revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KbfsPath {
    pub path: String,
}

wire_union! {
    /// Where in history an archived KBFS path points.
    KbfsArchivedParam[KbfsArchivedType @ "KBFSArchivedType", kbfs_archived_type] {
        Revision(KbfsRevision) @ "revision", revision,
        Time(Time) @ "time", time,
        TimeString(String) @ "timeString", time_string,
        RelTimeString(String) @ "relTimeString", rel_time_string,
    }
}

/// KBFS path pinned to an archived view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbfsArchivedPath {
    pub path: String,
    #[serde(rename = "archivedParam")]
    pub archived_param: KbfsArchivedParam,
}

wire_union! {
    /// Filesystem location: local disk, KBFS, or an archived KBFS view.
    Path[PathType @ "PathType", path_type] {
        Local(String) @ "local", local,
        Kbfs(KbfsPath) @ "kbfs", kbfs,
        KbfsArchived(KbfsArchivedPath) @ "kbfsArchived", kbfs_archived,
    }
}

/// Block prefetch progress for an entry still being synced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetchProgress {
    pub start: Time,
    #[serde(rename = "endEstimate")]
    pub end_estimate: Time,
    #[serde(rename = "bytesTotal")]
    pub bytes_total: i64,
    #[serde(rename = "bytesFetched")]
    pub bytes_fetched: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dirent {
    pub time: Time,
    pub size: i32,
    pub name: String,
    #[serde(rename = "direntType")]
    pub dirent_type: DirentType,
    #[serde(rename = "lastWriterUnverified")]
    pub last_writer_unverified: User,
    pub writable: bool,
    #[serde(rename = "prefetchStatus")]
    pub prefetch_status: PrefetchStatus,
    #[serde(rename = "prefetchProgress")]
    pub prefetch_progress: PrefetchProgress,
    #[serde(rename = "symlinkTarget")]
    pub symlink_target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirentWithRevision {
    pub entry: Dirent,
    pub revision: KbfsRevision,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsListResult {
    pub entries: Vec<Dirent>,
    pub progress: Progress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    #[serde(with = "serde_bytes_compat")]
    pub data: Vec<u8>,
    pub progress: Progress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListArgs {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub path: Path,
    pub filter: ListFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListToDepthArgs {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub path: Path,
    pub filter: ListFilter,
    pub depth: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveArgs {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub path: Path,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadArgs {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub path: Path,
    pub offset: i64,
    pub size: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteArgs {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub path: Path,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyArgs {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub src: Path,
    pub dest: Path,
    #[serde(rename = "overwriteExistingFiles")]
    pub overwrite_existing_files: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveArgs {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub src: Path,
    pub dest: Path,
    #[serde(rename = "overwriteExistingFiles")]
    pub overwrite_existing_files: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetRevisionsArgs {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub path: Path,
    #[serde(rename = "spanType")]
    pub span_type: RevisionSpanType,
}

wire_union! {
    /// Description of one outstanding async operation.
    OpDescription[AsyncOps @ "asyncOp", async_op] {
        List(ListArgs) @ "list", list,
        ListRecursive(ListArgs) @ "listRecursive", list_recursive,
        ListRecursiveToDepth(ListToDepthArgs) @ "listRecursiveToDepth", list_recursive_to_depth,
        Read(ReadArgs) @ "read", read,
        Write(WriteArgs) @ "write", write,
        Copy(CopyArgs) @ "copy", copy,
        Move(MoveArgs) @ "move", move_,
        Remove(RemoveArgs) @ "remove", remove,
        GetRevisions(GetRevisionsArgs) @ "getRevisions", get_revisions,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpProgress {
    pub start: Time,
    #[serde(rename = "endEstimate")]
    pub end_estimate: Time,
    #[serde(rename = "opType")]
    pub op_type: AsyncOps,
    #[serde(rename = "bytesTotal")]
    pub bytes_total: i64,
    #[serde(rename = "bytesRead")]
    pub bytes_read: i64,
    #[serde(rename = "bytesWritten")]
    pub bytes_written: i64,
    #[serde(rename = "filesTotal")]
    pub files_total: i64,
    #[serde(rename = "filesRead")]
    pub files_read: i64,
    #[serde(rename = "filesWritten")]
    pub files_written: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsQuotaUsage {
    #[serde(rename = "usageBytes")]
    pub usage_bytes: i64,
    #[serde(rename = "archiveBytes")]
    pub archive_bytes: i64,
    #[serde(rename = "limitBytes")]
    pub limit_bytes: i64,
    #[serde(rename = "gitUsageBytes")]
    pub git_usage_bytes: i64,
    #[serde(rename = "gitArchiveBytes")]
    pub git_archive_bytes: i64,
    #[serde(rename = "gitLimitBytes")]
    pub git_limit_bytes: i64,
}

/// Journal sync status for the folders selected by a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsSyncStatus {
    #[serde(rename = "totalSyncingBytes")]
    pub total_syncing_bytes: i64,
    #[serde(rename = "syncingPaths")]
    pub syncing_paths: Vec<String>,
    #[serde(rename = "endEstimate", default, skip_serializing_if = "Option::is_none")]
    pub end_estimate: Option<Time>,
}

/// Merged view of a folder, with any conflict bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderNormalView {
    #[serde(rename = "resolvingConflict")]
    pub resolving_conflict: bool,
    #[serde(rename = "stuckInConflict")]
    pub stuck_in_conflict: bool,
    #[serde(rename = "localViews")]
    pub local_views: Vec<Path>,
}

/// A local conflict branch the user is resolving by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderConflictManualResolvingLocalView {
    #[serde(rename = "normalView")]
    pub normal_view: Path,
}

wire_union! {
    /// Conflict state of a favorite folder.
    ConflictState[ConflictStateType @ "conflictStateType", conflict_state_type] {
        NormalView(FolderNormalView) @ "normalview", normal_view,
        ManualResolvingLocalView(FolderConflictManualResolvingLocalView)
            @ "manualresolvinglocalview", manual_resolving_local_view,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsListArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub path: Path,
    pub filter: ListFilter,
    #[serde(rename = "refreshSubscription")]
    pub refresh_subscription: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsListRecursiveArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub path: Path,
    pub filter: ListFilter,
    #[serde(rename = "refreshSubscription")]
    pub refresh_subscription: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsListRecursiveToDepthArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub path: Path,
    pub filter: ListFilter,
    #[serde(rename = "refreshSubscription")]
    pub refresh_subscription: bool,
    pub depth: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsReadListArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsCopyArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub src: Path,
    pub dest: Path,
    #[serde(rename = "overwriteExistingFiles")]
    pub overwrite_existing_files: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsCopyRecursiveArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub src: Path,
    pub dest: Path,
    #[serde(rename = "overwriteExistingFiles")]
    pub overwrite_existing_files: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsMoveArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub src: Path,
    pub dest: Path,
    #[serde(rename = "overwriteExistingFiles")]
    pub overwrite_existing_files: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsRenameArg {
    pub src: Path,
    pub dest: Path,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsOpenArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub dest: Path,
    pub flags: OpenFlags,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsSetStatArg {
    pub dest: Path,
    pub flag: DirentType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsReadArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub offset: i64,
    pub size: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsWriteArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub offset: i64,
    #[serde(with = "serde_bytes_compat")]
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsRemoveArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
    pub path: Path,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsStatArg {
    pub path: Path,
    #[serde(rename = "refreshSubscription")]
    pub refresh_subscription: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsMakeOpidArg {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsCloseArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsCancelArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsCheckArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsGetOpsArg {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsWaitArg {
    #[serde(rename = "opID")]
    pub op_id: OpId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsDumpDebuggingInfoArg {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsClearConflictStateArg {
    pub path: Path,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsFinishResolvingConflictArg {
    pub path: Path,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFsForceStuckConflictArg {
    pub path: Path,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsSyncStatusArg {
    pub filter: ListFilter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleFsGetUserQuotaUsageArg {}

/// Server-side handlers for the SimpleFS service.
#[async_trait]
pub trait SimpleFsInterface: Send + Sync {
    /// Start listing a directory under the given opID; results come back
    /// through `simple_fs_read_list`.
    async fn simple_fs_list(&self, arg: SimpleFsListArg) -> Result<(), RpcError>;
    async fn simple_fs_list_recursive(
        &self,
        arg: SimpleFsListRecursiveArg,
    ) -> Result<(), RpcError>;
    async fn simple_fs_list_recursive_to_depth(
        &self,
        arg: SimpleFsListRecursiveToDepthArg,
    ) -> Result<(), RpcError>;
    /// Drain accumulated listing entries; the progress cursor signals
    /// whether more are pending.
    async fn simple_fs_read_list(
        &self,
        arg: SimpleFsReadListArg,
    ) -> Result<SimpleFsListResult, RpcError>;
    async fn simple_fs_copy(&self, arg: SimpleFsCopyArg) -> Result<(), RpcError>;
    async fn simple_fs_copy_recursive(
        &self,
        arg: SimpleFsCopyRecursiveArg,
    ) -> Result<(), RpcError>;
    async fn simple_fs_move(&self, arg: SimpleFsMoveArg) -> Result<(), RpcError>;
    async fn simple_fs_rename(&self, arg: SimpleFsRenameArg) -> Result<(), RpcError>;
    /// Create or open a file, or create a directory; the opID stays valid
    /// for read/write until closed.
    async fn simple_fs_open(&self, arg: SimpleFsOpenArg) -> Result<(), RpcError>;
    async fn simple_fs_set_stat(&self, arg: SimpleFsSetStatArg) -> Result<(), RpcError>;
    async fn simple_fs_read(&self, arg: SimpleFsReadArg) -> Result<FileContent, RpcError>;
    async fn simple_fs_write(&self, arg: SimpleFsWriteArg) -> Result<(), RpcError>;
    async fn simple_fs_remove(&self, arg: SimpleFsRemoveArg) -> Result<(), RpcError>;
    async fn simple_fs_stat(&self, arg: SimpleFsStatArg) -> Result<Dirent, RpcError>;
    /// Mint a fresh random operation id.
    async fn simple_fs_make_opid(&self) -> Result<OpId, RpcError>;
    async fn simple_fs_close(&self, arg: SimpleFsCloseArg) -> Result<(), RpcError>;
    async fn simple_fs_cancel(&self, arg: SimpleFsCancelArg) -> Result<(), RpcError>;
    async fn simple_fs_check(&self, arg: SimpleFsCheckArg) -> Result<OpProgress, RpcError>;
    async fn simple_fs_get_ops(&self) -> Result<Vec<OpDescription>, RpcError>;
    /// Block until the operation under the opID finishes.
    async fn simple_fs_wait(&self, arg: SimpleFsWaitArg) -> Result<(), RpcError>;
    async fn simple_fs_dump_debugging_info(&self) -> Result<(), RpcError>;
    async fn simple_fs_sync_status(
        &self,
        arg: SimpleFsSyncStatusArg,
    ) -> Result<FsSyncStatus, RpcError>;
    async fn simple_fs_clear_conflict_state(
        &self,
        arg: SimpleFsClearConflictStateArg,
    ) -> Result<(), RpcError>;
    async fn simple_fs_finish_resolving_conflict(
        &self,
        arg: SimpleFsFinishResolvingConflictArg,
    ) -> Result<(), RpcError>;
    /// Wedge a folder into a stuck conflict, for testing conflict handling.
    async fn simple_fs_force_stuck_conflict(
        &self,
        arg: SimpleFsForceStuckConflictArg,
    ) -> Result<(), RpcError>;
    async fn simple_fs_get_user_quota_usage(&self) -> Result<SimpleFsQuotaUsage, RpcError>;
}

/// Builds the SimpleFS dispatch table over an interface implementation.
pub fn simple_fs_protocol(i: Arc<dyn SimpleFsInterface>) -> Protocol {
    Protocol::new("keybase.1.SimpleFS")
        .method("simpleFSList", dispatch!(i, simple_fs_list: SimpleFsListArg))
        .method(
            "simpleFSListRecursive",
            dispatch!(i, simple_fs_list_recursive: SimpleFsListRecursiveArg),
        )
        .method(
            "simpleFSListRecursiveToDepth",
            dispatch!(i, simple_fs_list_recursive_to_depth: SimpleFsListRecursiveToDepthArg),
        )
        .method(
            "simpleFSReadList",
            dispatch!(i, simple_fs_read_list: SimpleFsReadListArg),
        )
        .method("simpleFSCopy", dispatch!(i, simple_fs_copy: SimpleFsCopyArg))
        .method(
            "simpleFSCopyRecursive",
            dispatch!(i, simple_fs_copy_recursive: SimpleFsCopyRecursiveArg),
        )
        .method("simpleFSMove", dispatch!(i, simple_fs_move: SimpleFsMoveArg))
        .method("simpleFSRename", dispatch!(i, simple_fs_rename: SimpleFsRenameArg))
        .method("simpleFSOpen", dispatch!(i, simple_fs_open: SimpleFsOpenArg))
        .method(
            "simpleFSSetStat",
            dispatch!(i, simple_fs_set_stat: SimpleFsSetStatArg),
        )
        .method("simpleFSRead", dispatch!(i, simple_fs_read: SimpleFsReadArg))
        .method("simpleFSWrite", dispatch!(i, simple_fs_write: SimpleFsWriteArg))
        .method("simpleFSRemove", dispatch!(i, simple_fs_remove: SimpleFsRemoveArg))
        .method("simpleFSStat", dispatch!(i, simple_fs_stat: SimpleFsStatArg))
        .method(
            "simpleFSMakeOpid",
            dispatch!(i, simple_fs_make_opid(): SimpleFsMakeOpidArg),
        )
        .method("simpleFSClose", dispatch!(i, simple_fs_close: SimpleFsCloseArg))
        .method("simpleFSCancel", dispatch!(i, simple_fs_cancel: SimpleFsCancelArg))
        .method("simpleFSCheck", dispatch!(i, simple_fs_check: SimpleFsCheckArg))
        .method(
            "simpleFSGetOps",
            dispatch!(i, simple_fs_get_ops(): SimpleFsGetOpsArg),
        )
        .method("simpleFSWait", dispatch!(i, simple_fs_wait: SimpleFsWaitArg))
        .method(
            "simpleFSDumpDebuggingInfo",
            dispatch!(i, simple_fs_dump_debugging_info(): SimpleFsDumpDebuggingInfoArg),
        )
        .method(
            "simpleFSSyncStatus",
            dispatch!(i, simple_fs_sync_status: SimpleFsSyncStatusArg),
        )
        .method(
            "simpleFSClearConflictState",
            dispatch!(i, simple_fs_clear_conflict_state: SimpleFsClearConflictStateArg),
        )
        .method(
            "simpleFSFinishResolvingConflict",
            dispatch!(i, simple_fs_finish_resolving_conflict: SimpleFsFinishResolvingConflictArg),
        )
        .method(
            "simpleFSForceStuckConflict",
            dispatch!(i, simple_fs_force_stuck_conflict: SimpleFsForceStuckConflictArg),
        )
        .method(
            "simpleFSGetUserQuotaUsage",
            dispatch!(i, simple_fs_get_user_quota_usage(): SimpleFsGetUserQuotaUsageArg),
        )
}

/// Client stub for the SimpleFS service.
pub struct SimpleFsClient<C> {
    pub cli: C,
}

impl<C: GenericClient> SimpleFsClient<C> {
    pub async fn simple_fs_list(&self, arg: SimpleFsListArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSList", &(arg,)).await
    }

    pub async fn simple_fs_list_recursive(
        &self,
        arg: SimpleFsListRecursiveArg,
    ) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSListRecursive", &(arg,)).await
    }

    pub async fn simple_fs_list_recursive_to_depth(
        &self,
        arg: SimpleFsListRecursiveToDepthArg,
    ) -> Result<(), RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.SimpleFS.simpleFSListRecursiveToDepth",
            &(arg,),
        )
        .await
    }

    pub async fn simple_fs_read_list(
        &self,
        arg: SimpleFsReadListArg,
    ) -> Result<SimpleFsListResult, RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSReadList", &(arg,)).await
    }

    pub async fn simple_fs_copy(&self, arg: SimpleFsCopyArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSCopy", &(arg,)).await
    }

    pub async fn simple_fs_copy_recursive(
        &self,
        arg: SimpleFsCopyRecursiveArg,
    ) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSCopyRecursive", &(arg,)).await
    }

    pub async fn simple_fs_move(&self, arg: SimpleFsMoveArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSMove", &(arg,)).await
    }

    pub async fn simple_fs_rename(&self, arg: SimpleFsRenameArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSRename", &(arg,)).await
    }

    pub async fn simple_fs_open(&self, arg: SimpleFsOpenArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSOpen", &(arg,)).await
    }

    pub async fn simple_fs_set_stat(&self, arg: SimpleFsSetStatArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSSetStat", &(arg,)).await
    }

    pub async fn simple_fs_read(&self, arg: SimpleFsReadArg) -> Result<FileContent, RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSRead", &(arg,)).await
    }

    pub async fn simple_fs_write(&self, arg: SimpleFsWriteArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSWrite", &(arg,)).await
    }

    pub async fn simple_fs_remove(&self, arg: SimpleFsRemoveArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSRemove", &(arg,)).await
    }

    pub async fn simple_fs_stat(&self, arg: SimpleFsStatArg) -> Result<Dirent, RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSStat", &(arg,)).await
    }

    pub async fn simple_fs_make_opid(&self) -> Result<OpId, RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.SimpleFS.simpleFSMakeOpid",
            &(SimpleFsMakeOpidArg {},),
        )
        .await
    }

    pub async fn simple_fs_close(&self, arg: SimpleFsCloseArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSClose", &(arg,)).await
    }

    pub async fn simple_fs_cancel(&self, arg: SimpleFsCancelArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSCancel", &(arg,)).await
    }

    pub async fn simple_fs_check(&self, arg: SimpleFsCheckArg) -> Result<OpProgress, RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSCheck", &(arg,)).await
    }

    pub async fn simple_fs_get_ops(&self) -> Result<Vec<OpDescription>, RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.SimpleFS.simpleFSGetOps",
            &(SimpleFsGetOpsArg {},),
        )
        .await
    }

    pub async fn simple_fs_wait(&self, arg: SimpleFsWaitArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSWait", &(arg,)).await
    }

    pub async fn simple_fs_dump_debugging_info(&self) -> Result<(), RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.SimpleFS.simpleFSDumpDebuggingInfo",
            &(SimpleFsDumpDebuggingInfoArg {},),
        )
        .await
    }

    pub async fn simple_fs_sync_status(
        &self,
        arg: SimpleFsSyncStatusArg,
    ) -> Result<FsSyncStatus, RpcError> {
        call_typed(&self.cli, "keybase.1.SimpleFS.simpleFSSyncStatus", &(arg,)).await
    }

    pub async fn simple_fs_clear_conflict_state(
        &self,
        arg: SimpleFsClearConflictStateArg,
    ) -> Result<(), RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.SimpleFS.simpleFSClearConflictState",
            &(arg,),
        )
        .await
    }

    pub async fn simple_fs_finish_resolving_conflict(
        &self,
        arg: SimpleFsFinishResolvingConflictArg,
    ) -> Result<(), RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.SimpleFS.simpleFSFinishResolvingConflict",
            &(arg,),
        )
        .await
    }

    pub async fn simple_fs_force_stuck_conflict(
        &self,
        arg: SimpleFsForceStuckConflictArg,
    ) -> Result<(), RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.SimpleFS.simpleFSForceStuckConflict",
            &(arg,),
        )
        .await
    }

    pub async fn simple_fs_get_user_quota_usage(&self) -> Result<SimpleFsQuotaUsage, RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.SimpleFS.simpleFSGetUserQuotaUsage",
            &(SimpleFsGetUserQuotaUsageArg {},),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_value<T: Serialize>(v: &T) -> rmpv::Value {
        rmpv::ext::to_value(v).unwrap()
    }

    fn map_keys(v: &rmpv::Value) -> Vec<String> {
        v.as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str().unwrap().to_owned())
            .collect()
    }

    fn kbfs_path(s: &str) -> Path {
        Path::Kbfs(KbfsPath { path: s.to_owned() })
    }

    #[test]
    fn path_union_round_trips_every_case() {
        let local = Path::Local("/tmp/x".to_owned());
        assert_eq!(local.path_type(), PathType::Local);
        assert_eq!(local.local(), "/tmp/x");

        let kbfs = kbfs_path("/keybase/private/alice");
        assert_eq!(kbfs.path_type(), PathType::Kbfs);
        assert_eq!(kbfs.kbfs().path, "/keybase/private/alice");

        let archived = Path::KbfsArchived(KbfsArchivedPath {
            path: "/keybase/private/alice".to_owned(),
            archived_param: KbfsArchivedParam::Revision(12),
        });
        assert_eq!(archived.path_type(), PathType::KbfsArchived);
        assert_eq!(archived.kbfs_archived().archived_param.revision(), &12);

        for p in [local, kbfs, archived] {
            let back: Path = rmpv::ext::from_value(to_value(&p)).unwrap();
            assert_eq!(back, p);
        }
    }

    #[test]
    fn path_wire_shape_omits_absent_cases() {
        let v = to_value(&kbfs_path("/keybase/public/bob"));
        assert_eq!(map_keys(&v), vec!["PathType", "kbfs"]);
        let disc = &v.as_map().unwrap()[0].1;
        assert_eq!(disc.as_i64(), Some(1));
    }

    #[test]
    #[should_panic(expected = "wrong case accessed")]
    fn path_cross_case_access_is_fatal() {
        let p = Path::Local("/tmp/x".to_owned());
        let _ = p.kbfs();
    }

    #[test]
    fn union_with_missing_payload_fails_decode() {
        // Discriminant says KBFS but no kbfs payload field is present.
        let v = rmpv::Value::Map(vec![(
            rmpv::Value::from("PathType"),
            rmpv::Value::from(1),
        )]);
        let err = rmpv::ext::from_value::<Path>(v).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing payload for case kbfs"), "msg: {msg}");
    }

    #[test]
    fn union_with_unknown_discriminant_reports_raw_value() {
        let v = rmpv::Value::Map(vec![
            (rmpv::Value::from("PathType"), rmpv::Value::from(9)),
            (rmpv::Value::from("local"), rmpv::Value::from("/tmp/x")),
        ]);
        let err = rmpv::ext::from_value::<Path>(v).unwrap_err();
        assert!(err.to_string().contains('9'), "err: {err}");
    }

    #[test]
    fn union_decodes_regardless_of_tag_order() {
        let v = rmpv::Value::Map(vec![
            (rmpv::Value::from("local"), rmpv::Value::from("/tmp/x")),
            (rmpv::Value::from("PathType"), rmpv::Value::from(0)),
        ]);
        let p: Path = rmpv::ext::from_value(v).unwrap();
        assert_eq!(p, Path::Local("/tmp/x".to_owned()));
    }

    #[test]
    fn archived_param_tags_are_exact() {
        let v = to_value(&KbfsArchivedParam::TimeString("2026-01-02".to_owned()));
        assert_eq!(map_keys(&v), vec!["KBFSArchivedType", "timeString"]);
        let v = to_value(&KbfsArchivedParam::RelTimeString("5m".to_owned()));
        assert_eq!(map_keys(&v), vec!["KBFSArchivedType", "relTimeString"]);
    }

    #[test]
    fn op_description_round_trips() {
        let op = OpDescription::Write(WriteArgs {
            op_id: OpId([3u8; 16]),
            path: kbfs_path("/keybase/private/alice/notes.txt"),
            offset: 4096,
        });
        assert_eq!(op.async_op(), AsyncOps::Write);
        assert_eq!(op.write().offset, 4096);
        let back: OpDescription = rmpv::ext::from_value(to_value(&op)).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn normal_view_conflict_state_example() {
        let view = FolderNormalView {
            resolving_conflict: true,
            stuck_in_conflict: false,
            local_views: vec![],
        };
        let state = ConflictState::NormalView(view.clone());
        assert_eq!(state.conflict_state_type(), ConflictStateType::NormalView);
        assert_eq!(state.normal_view(), &view);
    }

    #[test]
    #[should_panic(expected = "wrong case accessed")]
    fn normal_view_manual_resolving_accessor_is_fatal() {
        let state = ConflictState::NormalView(FolderNormalView::default());
        let _ = state.manual_resolving_local_view();
    }

    #[test]
    fn conflict_state_codes_start_at_one() {
        assert_eq!(ConflictStateType::NormalView.code(), 1);
        assert_eq!(ConflictStateType::ManualResolvingLocalView.code(), 2);
        assert_eq!(ConflictStateType::from_code(0), None);
    }

    #[test]
    fn open_flags_keep_the_non_contiguous_values() {
        assert_eq!(OpenFlags::Read.code(), 0);
        assert_eq!(OpenFlags::Replace.code(), 1);
        assert_eq!(OpenFlags::Existing.code(), 2);
        assert_eq!(OpenFlags::Write.code(), 4);
        assert_eq!(OpenFlags::Append.code(), 8);
        assert_eq!(OpenFlags::Directory.code(), 16);
        assert_eq!(OpenFlags::from_code(3), None);
    }

    #[test]
    fn op_id_is_sixteen_bytes() {
        assert_eq!(OpId::LEN, 16);
        assert!(OpId::from_slice(&[0u8; 16]).is_some());
        assert!(OpId::from_slice(&[0u8; 32]).is_none());
    }

    #[test]
    fn list_arg_tags_are_exact() {
        let arg = SimpleFsListArg {
            op_id: OpId::default(),
            path: kbfs_path("/keybase/team/acme"),
            filter: ListFilter::FilterAllHidden,
            refresh_subscription: false,
        };
        assert_eq!(
            map_keys(&to_value(&arg)),
            vec!["opID", "path", "filter", "refreshSubscription"]
        );
    }

    #[test]
    fn sync_status_omits_absent_estimate() {
        let status = FsSyncStatus {
            total_syncing_bytes: 1024,
            syncing_paths: vec!["/keybase/private/alice".to_owned()],
            end_estimate: None,
        };
        assert_eq!(
            map_keys(&to_value(&status)),
            vec!["totalSyncingBytes", "syncingPaths"]
        );

        let with_estimate = FsSyncStatus {
            end_estimate: Some(1_700_000_000_000),
            ..status
        };
        assert_eq!(
            map_keys(&to_value(&with_estimate)),
            vec!["totalSyncingBytes", "syncingPaths", "endEstimate"]
        );
        let back: FsSyncStatus = rmpv::ext::from_value(to_value(&with_estimate)).unwrap();
        assert_eq!(back, with_estimate);
    }

    #[test]
    fn normal_view_clone_is_independent() {
        let original = FolderNormalView {
            resolving_conflict: false,
            stuck_in_conflict: false,
            local_views: vec![kbfs_path("/keybase/private/alice (local conflicted copy)")],
        };
        let mut copy = original.clone();
        copy.local_views.push(kbfs_path("/keybase/private/bob"));
        copy.local_views[0] = Path::Local("elsewhere".to_owned());
        assert_eq!(original.local_views.len(), 1);
        assert_eq!(
            original.local_views[0].kbfs().path,
            "/keybase/private/alice (local conflicted copy)"
        );
    }

    #[test]
    fn write_arg_content_rides_as_bin() {
        let arg = SimpleFsWriteArg {
            op_id: OpId::default(),
            offset: 0,
            content: vec![9, 8, 7],
        };
        let v = to_value(&arg);
        let content = &v.as_map().unwrap()[2].1;
        assert!(matches!(content, rmpv::Value::Binary(b) if b == &[9, 8, 7]));
    }
}
