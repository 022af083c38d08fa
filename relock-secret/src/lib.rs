//! Platform secure-secret storage for relock vault keys.
//!
//! On desktop platforms the backing store is the OS keyring; on platforms
//! without a supported backend the crate still compiles and reports the
//! storage as unavailable, so the caller can fall back to PIN-only unlock.

#[cfg(not(any(target_os = "android", target_os = "ios")))]
mod desktop;

mod error;
mod models;

#[cfg(not(any(target_os = "android", target_os = "ios")))]
pub use desktop::KeyringStore;

pub use error::{Error, Result};
pub use models::{SecretStorageMethod, SecretStorageStatus};
