//! `keybase.1.config` — service status, configuration, and client
//! registration.

use std::sync::Arc;

use async_trait::async_trait;
use kbrpc::client::{call_typed, GenericClient};
use kbrpc::error::RpcError;
use kbrpc::protocol::Protocol;
use serde::{Deserialize, Serialize};

use crate::common::{Device, User};

wire_enum! {
    /// How the background service process was started.
    ForkType {
        None = 0 => "NONE",
        Auto = 1 => "AUTO",
        Watchdog = 2 => "WATCHDOG",
        Launchd = 3 => "LAUNCHD",
    }
}

impl Default for ForkType {
    fn default() -> Self {
        Self::None
    }
}

wire_enum! {
    /// Kind of client attached to the service.
    ClientType {
        None = 0 => "NONE",
        Cli = 1 => "CLI",
        Gui = 2 => "GUI",
        Kbfs = 3 => "KBFS",
    }
}

impl Default for ClientType {
    fn default() -> Self {
        Self::None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCurrentStatusRes {
    pub configured: bool,
    pub registered: bool,
    #[serde(rename = "loggedIn")]
    pub logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    #[serde(rename = "SessionFor")]
    pub session_for: String,
    #[serde(rename = "Loaded")]
    pub loaded: bool,
    #[serde(rename = "Cleared")]
    pub cleared: bool,
    #[serde(rename = "SaltOnly")]
    pub salt_only: bool,
    #[serde(rename = "Expired")]
    pub expired: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetails {
    pub pid: i32,
    #[serde(rename = "clientType")]
    pub client_type: ClientType,
    pub argv: Vec<String>,
    pub desc: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
    #[serde(rename = "goVersion")]
    pub go_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedStatus {
    pub standalone: bool,
    #[serde(rename = "passphraseStreamCached")]
    pub passphrase_stream_cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<Device>,
    #[serde(rename = "logDir")]
    pub log_dir: String,
    #[serde(rename = "desktopUIConnected")]
    pub desktop_ui_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionStatus>,
    #[serde(rename = "defaultUsername")]
    pub default_username: String,
    #[serde(rename = "provisionedUsernames")]
    pub provisioned_usernames: Vec<String>,
    #[serde(rename = "Clients")]
    pub clients: Vec<ClientDetails>,
    #[serde(rename = "platformInfo")]
    pub platform_info: PlatformInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "serverURI")]
    pub server_uri: String,
    #[serde(rename = "socketFile")]
    pub socket_file: String,
    pub label: String,
    #[serde(rename = "runMode")]
    pub run_mode: String,
    #[serde(rename = "gpgExists")]
    pub gpg_exists: bool,
    #[serde(rename = "gpgPath")]
    pub gpg_path: String,
    pub version: String,
    pub path: String,
    #[serde(rename = "configPath")]
    pub config_path: String,
    #[serde(rename = "versionShort")]
    pub version_short: String,
    #[serde(rename = "versionFull")]
    pub version_full: String,
    #[serde(rename = "isAutoForked")]
    pub is_auto_forked: bool,
    #[serde(rename = "forkType")]
    pub fork_type: ForkType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetCurrentStatusArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetExtendedStatusArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetConfigArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetUserConfigArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    pub username: String,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPathArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloIAmArg {
    pub details: ClientDetails,
}

/// Server-side handlers for the config service.
#[async_trait]
pub trait ConfigInterface: Send + Sync {
    async fn get_current_status(
        &self,
        arg: GetCurrentStatusArg,
    ) -> Result<GetCurrentStatusRes, RpcError>;
    async fn get_extended_status(
        &self,
        arg: GetExtendedStatusArg,
    ) -> Result<ExtendedStatus, RpcError>;
    async fn get_config(&self, arg: GetConfigArg) -> Result<Config, RpcError>;
    /// Change a per-user config value in the service's config file.
    async fn set_user_config(&self, arg: SetUserConfigArg) -> Result<(), RpcError>;
    async fn set_path(&self, arg: SetPathArg) -> Result<(), RpcError>;
    /// Announce client details to the service on connect.
    async fn hello_i_am(&self, arg: HelloIAmArg) -> Result<(), RpcError>;
}

/// Builds the config dispatch table over an interface implementation.
pub fn config_protocol(i: Arc<dyn ConfigInterface>) -> Protocol {
    Protocol::new("keybase.1.config")
        .method(
            "getCurrentStatus",
            dispatch!(i, get_current_status: GetCurrentStatusArg),
        )
        .method(
            "getExtendedStatus",
            dispatch!(i, get_extended_status: GetExtendedStatusArg),
        )
        .method("getConfig", dispatch!(i, get_config: GetConfigArg))
        .method("setUserConfig", dispatch!(i, set_user_config: SetUserConfigArg))
        .method("setPath", dispatch!(i, set_path: SetPathArg))
        .method("helloIAm", dispatch!(i, hello_i_am: HelloIAmArg))
}

/// Client stub for the config service.
pub struct ConfigClient<C> {
    pub cli: C,
}

impl<C: GenericClient> ConfigClient<C> {
    pub async fn get_current_status(
        &self,
        arg: GetCurrentStatusArg,
    ) -> Result<GetCurrentStatusRes, RpcError> {
        call_typed(&self.cli, "keybase.1.config.getCurrentStatus", &(arg,)).await
    }

    pub async fn get_extended_status(
        &self,
        arg: GetExtendedStatusArg,
    ) -> Result<ExtendedStatus, RpcError> {
        call_typed(&self.cli, "keybase.1.config.getExtendedStatus", &(arg,)).await
    }

    pub async fn get_config(&self, arg: GetConfigArg) -> Result<Config, RpcError> {
        call_typed(&self.cli, "keybase.1.config.getConfig", &(arg,)).await
    }

    pub async fn set_user_config(&self, arg: SetUserConfigArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.config.setUserConfig", &(arg,)).await
    }

    pub async fn set_path(&self, arg: SetPathArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.config.setPath", &(arg,)).await
    }

    pub async fn hello_i_am(&self, arg: HelloIAmArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.config.helloIAm", &(arg,)).await
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
    fn session_status_keeps_pascal_case_tags() {
        let keys = map_keys(&rmpv::ext::to_value(SessionStatus::default()).unwrap());
        assert_eq!(
            keys,
            vec!["SessionFor", "Loaded", "Cleared", "SaltOnly", "Expired"]
        );
    }

    #[test]
    fn extended_status_omits_absent_optionals() {
        let keys = map_keys(&rmpv::ext::to_value(ExtendedStatus::default()).unwrap());
        assert!(!keys.contains(&"device".to_owned()));
        assert!(!keys.contains(&"session".to_owned()));
        assert!(keys.contains(&"Clients".to_owned()));
    }

    #[test]
    fn current_status_round_trips_with_user() {
        let status = GetCurrentStatusRes {
            configured: true,
            registered: true,
            logged_in: true,
            user: Some(User {
                uid: "19fe".into(),
                username: "alice".to_owned(),
            }),
        };
        let v = rmpv::ext::to_value(&status).unwrap();
        let back: GetCurrentStatusRes = rmpv::ext::from_value(v).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn fork_type_values() {
        assert_eq!(ForkType::None.code(), 0);
        assert_eq!(ForkType::Watchdog.code(), 2);
        assert_eq!(ForkType::Launchd.code(), 3);
        assert_eq!(ForkType::Launchd.to_string(), "LAUNCHD");
    }
}
