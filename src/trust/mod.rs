//! Cross-signing trust engine
//!
//! - `engine`: the `CrossSigning` component and its self-trust flag
//! - `verifier`: own master key check and remote user trust chain
//! - `signing`: device and user signing operations
//! - `status`: own setup report
//! - `fixtures`: deterministic identities for tests and benchmarks

mod engine;
pub mod fixtures;
mod signing;
mod status;
mod verdict;
mod verifier;

#[cfg(test)]
mod proptests;

pub use engine::{CrossSigning, OwnIdentity};
pub use fixtures::IdentityFixture;
pub use signing::CrossSigningError;
pub use status::{KeyStatus, OwnStatus};
pub use verdict::{MskVerification, UserTrust};
