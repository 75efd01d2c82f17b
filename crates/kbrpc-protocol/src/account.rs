//! `keybase.1.account` — passphrase, account-reset, and lockdown
//! operations.

use std::sync::Arc;

use async_trait::async_trait;
use kbrpc::client::{call_typed, GenericClient};
use kbrpc::error::RpcError;
use kbrpc::protocol::Protocol;
use serde::{Deserialize, Serialize};

use crate::common::{DeviceId, PhoneNumber, TeamId, Time};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasServerKeysRes {
    #[serde(rename = "hasServerKeys")]
    pub has_server_keys: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockdownHistory {
    pub status: bool,
    #[serde(rename = "creationTime")]
    pub creation_time: Time,
    #[serde(rename = "deviceID")]
    pub device_id: DeviceId,
    #[serde(rename = "deviceName")]
    pub device_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetLockdownResponse {
    pub history: Vec<LockdownHistory>,
    pub status: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamContactSettings {
    #[serde(rename = "teamID")]
    pub team_id: TeamId,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(rename = "allowFolloweeDegrees")]
    pub allow_followee_degrees: i32,
    #[serde(rename = "allowGoodTeams")]
    pub allow_good_teams: bool,
    pub enabled: bool,
    pub teams: Vec<TeamContactSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassphraseChangeArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    #[serde(rename = "oldPassphrase")]
    pub old_passphrase: String,
    pub passphrase: String,
    pub force: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassphraseCheckArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    pub passphrase: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailChangeArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    #[serde(rename = "newEmail")]
    pub new_email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasServerKeysArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetAccountArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    pub passphrase: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetLockdownModeArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetLockdownModeArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverUsernameWithEmailArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverUsernameWithPhoneArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    pub phone: PhoneNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterResetPipelineArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    #[serde(rename = "usernameOrEmail")]
    pub username_or_email: String,
    pub passphrase: String,
    pub interactive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelResetArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessCurrentLocationArg {
    #[serde(rename = "sessionID")]
    pub session_id: i32,
    #[serde(rename = "defaultCountry")]
    pub default_country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGetContactSettingsArg {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSetContactSettingsArg {
    pub settings: ContactSettings,
}

/// Server-side handlers for the account service.
#[async_trait]
pub trait AccountInterface: Send + Sync {
    /// Change the passphrase from an old one or via a signing-key proof.
    async fn passphrase_change(&self, arg: PassphraseChangeArg) -> Result<(), RpcError>;
    /// Check the given passphrase against the logged-in account.
    async fn passphrase_check(&self, arg: PassphraseCheckArg) -> Result<bool, RpcError>;
    async fn email_change(&self, arg: EmailChangeArg) -> Result<(), RpcError>;
    /// Whether the server has stored keys for this account.
    async fn has_server_keys(&self, arg: HasServerKeysArg) -> Result<HasServerKeysRes, RpcError>;
    async fn reset_account(&self, arg: ResetAccountArg) -> Result<(), RpcError>;
    async fn get_lockdown_mode(
        &self,
        arg: GetLockdownModeArg,
    ) -> Result<GetLockdownResponse, RpcError>;
    async fn set_lockdown_mode(&self, arg: SetLockdownModeArg) -> Result<(), RpcError>;
    async fn recover_username_with_email(
        &self,
        arg: RecoverUsernameWithEmailArg,
    ) -> Result<(), RpcError>;
    async fn recover_username_with_phone(
        &self,
        arg: RecoverUsernameWithPhoneArg,
    ) -> Result<(), RpcError>;
    /// Start the reset pipeline for an account.
    async fn enter_reset_pipeline(&self, arg: EnterResetPipelineArg) -> Result<(), RpcError>;
    /// Aborts the reset process for the logged-in user.
    async fn cancel_reset(&self, arg: CancelResetArg) -> Result<(), RpcError>;
    async fn guess_current_location(
        &self,
        arg: GuessCurrentLocationArg,
    ) -> Result<String, RpcError>;
    async fn user_get_contact_settings(&self) -> Result<ContactSettings, RpcError>;
    async fn user_set_contact_settings(
        &self,
        arg: UserSetContactSettingsArg,
    ) -> Result<(), RpcError>;
}

/// Builds the account dispatch table over an interface implementation.
pub fn account_protocol(i: Arc<dyn AccountInterface>) -> Protocol {
    Protocol::new("keybase.1.account")
        .method(
            "passphraseChange",
            dispatch!(i, passphrase_change: PassphraseChangeArg),
        )
        .method(
            "passphraseCheck",
            dispatch!(i, passphrase_check: PassphraseCheckArg),
        )
        .method("emailChange", dispatch!(i, email_change: EmailChangeArg))
        .method(
            "hasServerKeys",
            dispatch!(i, has_server_keys: HasServerKeysArg),
        )
        .method("resetAccount", dispatch!(i, reset_account: ResetAccountArg))
        .method(
            "getLockdownMode",
            dispatch!(i, get_lockdown_mode: GetLockdownModeArg),
        )
        .method(
            "setLockdownMode",
            dispatch!(i, set_lockdown_mode: SetLockdownModeArg),
        )
        .method(
            "recoverUsernameWithEmail",
            dispatch!(i, recover_username_with_email: RecoverUsernameWithEmailArg),
        )
        .method(
            "recoverUsernameWithPhone",
            dispatch!(i, recover_username_with_phone: RecoverUsernameWithPhoneArg),
        )
        .method(
            "enterResetPipeline",
            dispatch!(i, enter_reset_pipeline: EnterResetPipelineArg),
        )
        .method("cancelReset", dispatch!(i, cancel_reset: CancelResetArg))
        .method(
            "guessCurrentLocation",
            dispatch!(i, guess_current_location: GuessCurrentLocationArg),
        )
        .method(
            "userGetContactSettings",
            dispatch!(i, user_get_contact_settings(): UserGetContactSettingsArg),
        )
        .method(
            "userSetContactSettings",
            dispatch!(i, user_set_contact_settings: UserSetContactSettingsArg),
        )
}

/// Client stub for the account service.
pub struct AccountClient<C> {
    pub cli: C,
}

impl<C: GenericClient> AccountClient<C> {
    pub async fn passphrase_change(&self, arg: PassphraseChangeArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.account.passphraseChange", &(arg,)).await
    }

    pub async fn passphrase_check(&self, arg: PassphraseCheckArg) -> Result<bool, RpcError> {
        call_typed(&self.cli, "keybase.1.account.passphraseCheck", &(arg,)).await
    }

    pub async fn email_change(&self, arg: EmailChangeArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.account.emailChange", &(arg,)).await
    }

    pub async fn has_server_keys(
        &self,
        arg: HasServerKeysArg,
    ) -> Result<HasServerKeysRes, RpcError> {
        call_typed(&self.cli, "keybase.1.account.hasServerKeys", &(arg,)).await
    }

    pub async fn reset_account(&self, arg: ResetAccountArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.account.resetAccount", &(arg,)).await
    }

    pub async fn get_lockdown_mode(
        &self,
        arg: GetLockdownModeArg,
    ) -> Result<GetLockdownResponse, RpcError> {
        call_typed(&self.cli, "keybase.1.account.getLockdownMode", &(arg,)).await
    }

    pub async fn set_lockdown_mode(&self, arg: SetLockdownModeArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.account.setLockdownMode", &(arg,)).await
    }

    pub async fn recover_username_with_email(
        &self,
        arg: RecoverUsernameWithEmailArg,
    ) -> Result<(), RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.account.recoverUsernameWithEmail",
            &(arg,),
        )
        .await
    }

    pub async fn recover_username_with_phone(
        &self,
        arg: RecoverUsernameWithPhoneArg,
    ) -> Result<(), RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.account.recoverUsernameWithPhone",
            &(arg,),
        )
        .await
    }

    pub async fn enter_reset_pipeline(&self, arg: EnterResetPipelineArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.account.enterResetPipeline", &(arg,)).await
    }

    pub async fn cancel_reset(&self, arg: CancelResetArg) -> Result<(), RpcError> {
        call_typed(&self.cli, "keybase.1.account.cancelReset", &(arg,)).await
    }

    pub async fn guess_current_location(
        &self,
        arg: GuessCurrentLocationArg,
    ) -> Result<String, RpcError> {
        call_typed(&self.cli, "keybase.1.account.guessCurrentLocation", &(arg,)).await
    }

    pub async fn user_get_contact_settings(&self) -> Result<ContactSettings, RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.account.userGetContactSettings",
            &(UserGetContactSettingsArg {},),
        )
        .await
    }

    pub async fn user_set_contact_settings(
        &self,
        arg: UserSetContactSettingsArg,
    ) -> Result<(), RpcError> {
        call_typed(
            &self.cli,
            "keybase.1.account.userSetContactSettings",
            &(arg,),
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
    fn passphrase_change_tags_are_exact() {
        let v = rmpv::ext::to_value(PassphraseChangeArg::default()).unwrap();
        assert_eq!(
            map_keys(&v),
            vec!["sessionID", "oldPassphrase", "passphrase", "force"]
        );
    }

    #[test]
    fn optional_version_is_omitted_when_absent() {
        let settings = ContactSettings::default();
        let v = rmpv::ext::to_value(&settings).unwrap();
        assert!(!map_keys(&v).contains(&"version".to_owned()));

        let with_version = ContactSettings {
            version: Some(3),
            ..ContactSettings::default()
        };
        let v = rmpv::ext::to_value(&with_version).unwrap();
        assert!(map_keys(&v).contains(&"version".to_owned()));
    }

    #[test]
    fn missing_optional_decodes_as_none() {
        let settings = ContactSettings::default();
        let v = rmpv::ext::to_value(&settings).unwrap();
        let back: ContactSettings = rmpv::ext::from_value(v).unwrap();
        assert_eq!(back.version, None);
    }

    #[test]
    fn contact_settings_clone_is_independent() {
        let original = ContactSettings {
            version: Some(1),
            teams: vec![TeamContactSettings {
                team_id: TeamId::from("t_aabb"),
                enabled: true,
            }],
            ..ContactSettings::default()
        };
        let mut copy = original.clone();
        copy.teams[0].enabled = false;
        copy.teams.push(TeamContactSettings::default());
        assert!(original.teams[0].enabled);
        assert_eq!(original.teams.len(), 1);
    }
}
