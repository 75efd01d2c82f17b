//! `keybase.1.kbfs` and `keybase.1.NotifyFS` — filesystem activity events.
//!
//! The kbfs service receives events as ordinary calls; NotifyFS fans the
//! same record out to observers via the fire-and-forget notify primitive.

use std::sync::Arc;

use async_trait::async_trait;
use kbrpc::client::{call_typed, notify_typed, GenericClient};
use kbrpc::error::RpcError;
use kbrpc::protocol::Protocol;
use serde::{Deserialize, Serialize};

wire_enum! {
    /// Position of an event within an operation.
    FsStatusCode {
        Start = 0 => "START",
        Finish = 1 => "FINISH",
        Error = 2 => "ERROR",
    }
}

impl Default for FsStatusCode {
    fn default() -> Self {
        Self::Start
    }
}

wire_enum! {
    /// What kind of filesystem work the event describes.
    FsNotificationType {
        Encrypting = 0 => "ENCRYPTING",
        Decrypting = 1 => "DECRYPTING",
        Signing = 2 => "SIGNING",
        Verifying = 3 => "VERIFYING",
        Rekeying = 4 => "REKEYING",
    }
}

impl Default for FsNotificationType {
    fn default() -> Self {
        Self::Encrypting
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsNotification {
    #[serde(rename = "publicTopLevelFolder")]
    pub public_top_level_folder: bool,
    pub filename: String,
    pub status: String,
    #[serde(rename = "statusCode")]
    pub status_code: FsStatusCode,
    #[serde(rename = "notificationType")]
    pub notification_type: FsNotificationType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsEventArg {
    pub event: FsNotification,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsActivityArg {
    pub notification: FsNotification,
}

/// Server-side handlers for the kbfs service.
#[async_trait]
pub trait KbfsInterface: Send + Sync {
    /// Report a filesystem event to the service.
    async fn fs_event(&self, arg: FsEventArg) -> Result<(), RpcError>;
}

/// Builds the kbfs dispatch table over an interface implementation.
pub fn kbfs_protocol(i: Arc<dyn KbfsInterface>) -> Protocol {
    Protocol::new("keybase.1.kbfs").method("FSEvent", dispatch!(i, fs_event: FsEventArg))
}

/// Client stub for the kbfs service.
pub struct KbfsClient<C> {
    pub cli: C,
}

impl<C: GenericClient> KbfsClient<C> {
    pub async fn fs_event(&self, arg: FsEventArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.kbfs.FSEvent", &(arg,)).await
    }
}

/// Observer-side handlers for NotifyFS.
#[async_trait]
pub trait NotifyFsInterface: Send + Sync {
    /// Observe filesystem activity. Delivered as a notification; any error
    /// is dropped on the floor.
    async fn fs_activity(&self, arg: FsActivityArg) -> Result<(), RpcError>;
}

/// Builds the NotifyFS dispatch table over an interface implementation.
pub fn notify_fs_protocol(i: Arc<dyn NotifyFsInterface>) -> Protocol {
    Protocol::new("keybase.1.NotifyFS").method("FSActivity", dispatch!(i, fs_activity: FsActivityArg))
}

/// Client stub for NotifyFS; `fs_activity` is fire-and-forget.
pub struct NotifyFsClient<C> {
    pub cli: C,
}

impl<C: GenericClient> NotifyFsClient<C> {
    pub async fn fs_activity(&self, arg: FsActivityArg) -> Result<(), RpcError> {
        notify_typed(&self.cli, "keybase.1.NotifyFS.FSActivity", &(arg,)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_round_trips() {
        let notification = FsNotification {
            public_top_level_folder: false,
            filename: "/keybase/private/alice/notes.txt".to_owned(),
            status: "encrypting".to_owned(),
            status_code: FsStatusCode::Start,
            notification_type: FsNotificationType::Encrypting,
        };
        let v = rmpv::ext::to_value(&notification).unwrap();
        let back: FsNotification = rmpv::ext::from_value(v).unwrap();
        assert_eq!(back, notification);
    }

    #[test]
    fn notification_tags_are_exact() {
        let v = rmpv::ext::to_value(FsNotification::default()).unwrap();
        let keys: Vec<_> = v
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str().unwrap().to_owned())
            .collect();
        assert_eq!(
            keys,
            vec![
                "publicTopLevelFolder",
                "filename",
                "status",
                "statusCode",
                "notificationType"
            ]
        );
    }

    #[test]
    fn rekeying_code_is_four() {
        assert_eq!(FsNotificationType::Rekeying.code(), 4);
        assert_eq!(FsNotificationType::Rekeying.to_string(), "REKEYING");
    }
}
