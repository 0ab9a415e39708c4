use serde::Serialize;
use std::fmt;

/// Trust verdict for a remote user.
///
/// Variants are listed in trust-chain order: each failure variant names the
/// first link of the chain that did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserTrust {
    /// Every link of the chain holds
    Trusted,
    /// Their master key is absent or not signed by our user-signing key
    UserNotSigned,
    /// Our user-signing key's signature on their master key is invalid
    UserSignatureMismatch,
    /// Some device is not signed by their self-signing key
    UserDeviceNotSigned,
    /// Some device carries an invalid self-signing signature
    UserDeviceSignatureMismatch,
    /// Their self-signing key is absent or not signed by their master key
    UserSetupError,
    /// Our own cross-signing keys are not in a usable state
    OwnSetupError,
}

impl UserTrust {
    pub fn is_trusted(&self) -> bool {
        matches!(self, UserTrust::Trusted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserTrust::Trusted => "trusted",
            UserTrust::UserNotSigned => "user_not_signed",
            UserTrust::UserSignatureMismatch => "user_signature_mismatch",
            UserTrust::UserDeviceNotSigned => "user_device_not_signed",
            UserTrust::UserDeviceSignatureMismatch => "user_device_signature_mismatch",
            UserTrust::UserSetupError => "user_setup_error",
            UserTrust::OwnSetupError => "own_setup_error",
        }
    }
}

impl fmt::Display for UserTrust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking our own master key against its private seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MskVerification {
    /// No usable master seed in secret storage
    NoPrivKey,
    /// No well-formed master key published for our user
    NoPubKey,
    /// The seed derives a different public key than the published one
    DerivedPubKeyMismatch,
    Valid,
}

impl MskVerification {
    pub fn is_valid(&self) -> bool {
        matches!(self, MskVerification::Valid)
    }
}

impl fmt::Display for MskVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MskVerification::NoPrivKey => "no_priv_key",
            MskVerification::NoPubKey => "no_pub_key",
            MskVerification::DerivedPubKeyMismatch => "derived_pub_key_mismatch",
            MskVerification::Valid => "valid",
        };
        f.write_str(name)
    }
}
