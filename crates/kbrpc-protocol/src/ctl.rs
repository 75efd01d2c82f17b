//! `keybase.1.ctl` — service process control.

use std::sync::Arc;

use async_trait::async_trait;
use kbrpc::client::{call_typed, GenericClient};
use kbrpc::error::RpcError;
use kbrpc::protocol::Protocol;
use serde::{Deserialize, Serialize};

wire_enum! {
    /// Process exit codes requested via `stop`.
    ///
    /// The values are observed by service managers; 2 and 4 are
    /// deliberately distinct from ordinary failure exits.
    ExitCode {
        Ok = 0 => "OK",
        NotOk = 2 => "NOTOK",
        Restart = 4 => "RESTART",
    }
}

impl Default for ExitCode {
    fn default() -> Self {
        Self::Ok
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    #[serde(rename = "exitCode")]
    pub exit_code: ExitCode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRotateArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbNukeArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
}

/// Server-side handlers for the ctl service.
#[async_trait]
pub trait CtlInterface: Send + Sync {
    /// Stop the service process with the given exit code.
    async fn stop(&self, arg: StopArg) -> Result<(), RpcError>;
    async fn log_rotate(&self, arg: LogRotateArg) -> Result<(), RpcError>;
    async fn reload(&self, arg: ReloadArg) -> Result<(), RpcError>;
    /// Wipe the local database. Destructive; callers confirm first.
    async fn db_nuke(&self, arg: DbNukeArg) -> Result<(), RpcError>;
}

/// Builds the ctl dispatch table over an interface implementation.
pub fn ctl_protocol(i: Arc<dyn CtlInterface>) -> Protocol {
    Protocol::new("keybase.1.ctl")
        .method("stop", dispatch!(i, stop: StopArg))
        .method("logRotate", dispatch!(i, log_rotate: LogRotateArg))
        .method("reload", dispatch!(i, reload: ReloadArg))
        .method("dbNuke", dispatch!(i, db_nuke: DbNukeArg))
}

/// Client stub for the ctl service.
pub struct CtlClient<C> {
    pub cli: C,
}

impl<C: GenericClient> CtlClient<C> {
    pub async fn stop(&self, arg: StopArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.ctl.stop", &(arg,)).await
    }

    pub async fn log_rotate(&self, arg: LogRotateArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.ctl.logRotate", &(arg,)).await
    }

    pub async fn reload(&self, arg: ReloadArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.ctl.reload", &(arg,)).await
    }

    pub async fn db_nuke(&self, arg: DbNukeArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.ctl.dbNuke", &(arg,)).await
    }
}
