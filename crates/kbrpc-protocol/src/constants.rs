//! `keybase.1.constants` — the application status-code table.
//!
//! The service itself has no methods; registering it reserves the name and
//! ships the code table to both sides.

use kbrpc::protocol::Protocol;

wire_enum! {
    /// Application status codes carried by wire errors.
    ///
    /// The integer values are externally meaningful and non-contiguous;
    /// they must never be renumbered.
    StatusCode {
        ScOk = 0 => "SC_OK",
        ScLoginRequired = 201 => "SC_LOGIN_REQUIRED",
        ScBadSession = 202 => "SC_BAD_SESSION",
        ScBadLoginUserNotFound = 203 => "SC_BAD_LOGIN_USER_NOT_FOUND",
        ScBadLoginPassword = 204 => "SC_BAD_LOGIN_PASSWORD",
        ScNotFound = 205 => "SC_NOT_FOUND",
        ScGeneric = 218 => "SC_GENERIC",
        ScAlreadyLoggedIn = 235 => "SC_ALREADY_LOGGED_IN",
        ScCanceled = 237 => "SC_CANCELED",
        ScInputCanceled = 239 => "SC_INPUT_CANCELED",
        ScReloginRequired = 274 => "SC_RELOGIN_REQUIRED",
        ScResolutionFailed = 275 => "SC_RESOLUTION_FAILED",
        ScProfileNotPublic = 276 => "SC_PROFILE_NOT_PUBLIC",
        ScIdentifyFailed = 277 => "SC_IDENTIFY_FAILED",
        ScTrackingBroke = 278 => "SC_TRACKING_BROKE",
        ScWrongCryptoFormat = 279 => "SC_WRONG_CRYPTO_FORMAT",
        ScBadSignupUsernameTaken = 701 => "SC_BAD_SIGNUP_USERNAME_TAKEN",
        ScMissingResult = 801 => "SC_MISSING_RESULT",
        ScKeyNotFound = 901 => "SC_KEY_NOT_FOUND",
        ScKeyInUse = 907 => "SC_KEY_IN_USE",
        ScKeyBadGen = 913 => "SC_KEY_BAD_GEN",
        ScKeyNoSecret = 914 => "SC_KEY_NO_SECRET",
        ScKeyBadUids = 915 => "SC_KEY_BAD_UIDS",
        ScKeyNoActive = 916 => "SC_KEY_NO_ACTIVE",
        ScKeyNoSig = 917 => "SC_KEY_NO_SIG",
        ScKeyBadSig = 918 => "SC_KEY_BAD_SIG",
        ScKeyBadEldest = 919 => "SC_KEY_BAD_ELDEST",
        ScKeyNoEldest = 920 => "SC_KEY_NO_ELDEST",
        ScKeyDuplicateUpdate = 921 => "SC_KEY_DUPLICATE_UPDATE",
        ScSibkeyAlreadyExists = 922 => "SC_SIBKEY_ALREADY_EXISTS",
        ScDecryptionKeyNotFound = 924 => "SC_DECRYPTION_KEY_NOT_FOUND",
        ScKeyNoPgpEncryption = 927 => "SC_KEY_NO_PGP_ENCRYPTION",
        ScKeyNoNaclEncryption = 928 => "SC_KEY_NO_NACL_ENCRYPTION",
        ScKeySyncedPgpNotFound = 929 => "SC_KEY_SYNCED_PGP_NOT_FOUND",
        ScBadTrackSession = 1301 => "SC_BAD_TRACK_SESSION",
        ScDeviceNotFound = 1409 => "SC_DEVICE_NOT_FOUND",
        ScDeviceMismatch = 1410 => "SC_DEVICE_MISMATCH",
        ScDeviceRequired = 1411 => "SC_DEVICE_REQUIRED",
        ScStreamExists = 1501 => "SC_STREAM_EXISTS",
        ScStreamNotFound = 1502 => "SC_STREAM_NOT_FOUND",
        ScStreamWrongKind = 1503 => "SC_STREAM_WRONG_KIND",
        ScStreamEof = 1504 => "SC_STREAM_EOF",
        ScApiNetworkError = 1601 => "SC_API_NETWORK_ERROR",
        ScTimeout = 1602 => "SC_TIMEOUT",
        ScProofError = 1701 => "SC_PROOF_ERROR",
        ScIdentificationExpired = 1702 => "SC_IDENTIFICATION_EXPIRED",
        ScSelfNotFound = 1703 => "SC_SELF_NOT_FOUND",
        ScBadKexPhrase = 1704 => "SC_BAD_KEX_PHRASE",
        ScNoUiDelegation = 1705 => "SC_NO_UI_DELEGATION",
        ScNoUi = 1706 => "SC_NO_UI",
        ScInvalidVersionError = 1800 => "SC_INVALID_VERSION_ERROR",
        ScOldVersionError = 1801 => "SC_OLD_VERSION_ERROR",
        ScInvalidLocationError = 1802 => "SC_INVALID_LOCATION_ERROR",
        ScServiceStatusError = 1803 => "SC_SERVICE_STATUS_ERROR",
        ScInstallError = 1804 => "SC_INSTALL_ERROR",
    }
}

/// Builds the (empty) constants dispatch table.
pub fn constants_protocol() -> Protocol {
    Protocol::new("keybase.1.constants")
}
