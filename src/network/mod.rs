//! Key directory and network collaborators
//!
//! The trust engine talks to the outside world only through these traits:
//! - `KeyDirectory`: published cross-signing keys and device keys
//! - `SignatureUploader`: the signature upload API
//! - `LocalDevice`: this device's own key bundle
//!
//! `mock` provides in-memory implementations with call tracking for tests.

pub mod mock;
pub mod traits;

pub use mock::{KeyLookup, MockKeyServer, StaticDevice};
pub use traits::{
    KeyDirectory, KeyFetch, LocalDevice, NetworkError, NetworkResult, SignatureUpload,
    SignatureUploader,
};
