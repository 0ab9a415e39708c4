//! Key derivation and detached signatures for cross-signing
//!
//! - `seed`: private seed wrapper (zeroized on drop) and Ed25519 public key
//!   derivation
//! - `canonical`: the signable form of a key object
//! - `signing`: pure `sign_object` and tri-state `verify_signature`
//!
//! All public keys and signatures are unpadded standard base64.

pub mod canonical;
pub mod seed;
pub mod signing;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use thiserror::Error;

pub use canonical::canonical_json;
pub use seed::{derive_public_key, SigningSeed};
pub use signing::{sign_object, verify_signature, worst_status, SignatureStatus};

/// Unpadded standard base64; decoding also accepts padded input.
pub const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors raised while deriving keys or producing signatures
#[derive(Debug, Error)]
pub enum SigningError {
    /// Seed rejected by Ed25519 key construction (usually wrong length)
    #[error("Invalid signing seed: {0}")]
    InvalidSeed(String),

    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
