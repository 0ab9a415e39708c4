use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a cross-signing key within an identity's key hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyUsage {
    /// Root of the hierarchy (MSK)
    Master,
    /// Signs the identity's own devices (SSK)
    SelfSigning,
    /// Signs other users' master keys (USK)
    UserSigning,
}

impl KeyUsage {
    pub const ALL: [KeyUsage; 3] = [
        KeyUsage::Master,
        KeyUsage::SelfSigning,
        KeyUsage::UserSigning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyUsage::Master => "master",
            KeyUsage::SelfSigning => "self_signing",
            KeyUsage::UserSigning => "user_signing",
        }
    }

    /// Logical secret name holding this key's private seed.
    pub fn secret_name(&self) -> String {
        format!("m.cross_signing.{}", self.as_str())
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_names() {
        assert_eq!(KeyUsage::Master.secret_name(), "m.cross_signing.master");
        assert_eq!(
            KeyUsage::SelfSigning.secret_name(),
            "m.cross_signing.self_signing"
        );
        assert_eq!(
            KeyUsage::UserSigning.secret_name(),
            "m.cross_signing.user_signing"
        );
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_string(&KeyUsage::SelfSigning).unwrap();
        assert_eq!(json, "\"self_signing\"");

        let parsed: KeyUsage = serde_json::from_str("\"user_signing\"").unwrap();
        assert_eq!(parsed, KeyUsage::UserSigning);
    }
}
