//! Detached Ed25519 signatures over key objects
//!
//! Signatures live in the object's own `signatures` map, keyed by signer user
//! id and then by `ed25519:<signer public key>`.

use super::{canonical_json, SigningError, SigningSeed, BASE64};
use crate::keys::{ed25519_key_id, Signable};
use base64::Engine;
use ring::signature::{UnparsedPublicKey, ED25519};
use tracing::debug;

/// Outcome of checking one signature.
///
/// Ordered by severity so that the worst outcome over a set of signatures is
/// simply the maximum: `Valid < NotSigned < Invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignatureStatus {
    /// Signature present and cryptographically valid
    Valid,
    /// No signature entry for that signer and key id
    NotSigned,
    /// Signature present but verification failed
    Invalid,
}

impl SignatureStatus {
    pub fn worst(self, other: SignatureStatus) -> SignatureStatus {
        self.max(other)
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, SignatureStatus::Valid)
    }
}

/// Reduce a set of outcomes to the worst one; an empty set is `Valid`.
pub fn worst_status<I>(statuses: I) -> SignatureStatus
where
    I: IntoIterator<Item = SignatureStatus>,
{
    statuses
        .into_iter()
        .fold(SignatureStatus::Valid, SignatureStatus::worst)
}

/// Sign `object` with `seed` on behalf of `signer_user_id`.
///
/// Returns a new object with the signature added under
/// `signatures[signer_user_id]["ed25519:" + public key of seed]`. Existing
/// signatures are kept; use `Signable::without_signatures` first to replace
/// them.
pub fn sign_object<T: Signable>(
    object: &T,
    seed: &SigningSeed,
    signer_user_id: &str,
) -> Result<T, SigningError> {
    let message = canonical_json(object)?;
    let (public_key, signature) = seed.sign(message.as_bytes())?;

    let mut signed = object.clone();
    signed
        .signatures_mut()
        .entry(signer_user_id.to_string())
        .or_default()
        .insert(ed25519_key_id(&public_key), signature);
    Ok(signed)
}

/// Check the signature made on `signed` by `key_owner_user_id`'s key
/// `signer_public_key`.
pub fn verify_signature<T: Signable>(
    signed: &T,
    key_owner_user_id: &str,
    signer_public_key: &str,
) -> SignatureStatus {
    let key_id = ed25519_key_id(signer_public_key);
    let Some(signature) = signed.signature(key_owner_user_id, &key_id) else {
        return SignatureStatus::NotSigned;
    };

    let message = match canonical_json(signed) {
        Ok(message) => message,
        Err(e) => {
            debug!(error = %e, "could not build signable form");
            return SignatureStatus::Invalid;
        }
    };

    let (Ok(public_key), Ok(signature)) = (
        BASE64.decode(signer_public_key),
        BASE64.decode(signature),
    ) else {
        debug!(signer = %key_owner_user_id, %key_id, "signature or key is not valid base64");
        return SignatureStatus::Invalid;
    };

    match UnparsedPublicKey::new(&ED25519, &public_key).verify(message.as_bytes(), &signature) {
        Ok(()) => SignatureStatus::Valid,
        Err(_) => {
            debug!(signer = %key_owner_user_id, %key_id, "signature mismatch");
            SignatureStatus::Invalid
        }
    }
}
