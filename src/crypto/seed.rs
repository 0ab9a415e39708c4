//! Private signing seeds
//!
//! A seed is the 32-byte Ed25519 private key material read from secret
//! storage. It is held only for the duration of one derivation or signing
//! call and zeroized when dropped. The Ed25519 key pair built from it is
//! scoped to the function that needs it, so it is released on every exit
//! path.

use super::{SigningError, BASE64};
use base64::Engine;
use ring::signature::{Ed25519KeyPair, KeyPair};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Raw private seed bytes, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SigningSeed(Vec<u8>);

impl SigningSeed {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decode a base64 seed as returned by secret storage.
    pub fn from_base64(encoded: &str) -> Result<Self, SigningError> {
        Ok(Self(BASE64.decode(encoded.trim())?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn key_pair(&self) -> Result<Ed25519KeyPair, SigningError> {
        Ed25519KeyPair::from_seed_unchecked(&self.0)
            .map_err(|e| SigningError::InvalidSeed(e.to_string()))
    }

    /// Unpadded base64 Ed25519 public key for this seed.
    pub fn public_key(&self) -> Result<String, SigningError> {
        let key_pair = self.key_pair()?;
        Ok(BASE64.encode(key_pair.public_key().as_ref()))
    }

    /// Sign `message`, returning `(public key, signature)` in base64.
    pub(crate) fn sign(&self, message: &[u8]) -> Result<(String, String), SigningError> {
        let key_pair = self.key_pair()?;
        let signature = key_pair.sign(message);
        Ok((
            BASE64.encode(key_pair.public_key().as_ref()),
            BASE64.encode(signature.as_ref()),
        ))
    }
}

impl fmt::Debug for SigningSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSeed")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// Derive the unpadded base64 Ed25519 public key for `seed`.
///
/// Pure function of the seed bytes.
pub fn derive_public_key(seed: &[u8]) -> Result<String, SigningError> {
    let key_pair = Ed25519KeyPair::from_seed_unchecked(seed)
        .map_err(|e| SigningError::InvalidSeed(e.to_string()))?;
    Ok(BASE64.encode(key_pair.public_key().as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let seed = [7u8; 32];
        let first = derive_public_key(&seed).unwrap();
        let second = derive_public_key(&seed).unwrap();
        assert_eq!(first, second);
        // 32-byte key, unpadded base64
        assert_eq!(first.len(), 43);
        assert!(!first.ends_with('='));
    }

    #[test]
    fn test_different_seeds_different_keys() {
        let a = derive_public_key(&[1u8; 32]).unwrap();
        let b = derive_public_key(&[2u8; 32]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_length_seed_rejected() {
        assert!(matches!(
            derive_public_key(&[1u8; 16]),
            Err(SigningError::InvalidSeed(_))
        ));
        assert!(SigningSeed::from_bytes(vec![0u8; 31]).public_key().is_err());
    }

    #[test]
    fn test_seed_from_padded_and_unpadded_base64() {
        let bytes = [9u8; 32];
        let padded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let unpadded = BASE64.encode(bytes);
        assert!(padded.ends_with('='));

        let from_padded = SigningSeed::from_base64(&padded).unwrap();
        let from_unpadded = SigningSeed::from_base64(&unpadded).unwrap();
        assert_eq!(from_padded.as_bytes(), &bytes);
        assert_eq!(
            from_padded.public_key().unwrap(),
            from_unpadded.public_key().unwrap()
        );
    }

    #[test]
    fn test_debug_does_not_leak_seed() {
        let seed = SigningSeed::from_bytes(vec![0x2a; 32]);
        let debug = format!("{seed:?}");
        assert!(debug.contains("SigningSeed"));
        assert!(!debug.contains("42"));
    }
}
