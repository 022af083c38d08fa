//! Biometric factor: capability adapter over platform user verification.
//!
//! The factor never decrypts anything itself. Enrollment parks the vault key
//! in platform-backed secure storage; a successful `authenticate` hands the
//! same key material back, so both the PIN path and the biometric path open
//! the one ciphertext through the one mechanism. Every error here is
//! answered by falling back to PIN entry.

#[cfg(test)]
pub(crate) mod mock;
#[cfg(not(any(target_os = "android", target_os = "ios")))]
mod platform;
mod unavailable;

#[cfg(not(any(target_os = "android", target_os = "ios")))]
pub use platform::PlatformFactor;
pub use unavailable::UnavailableFactor;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::BiometricError;
use crate::kdf::VaultKey;

/// Raw key material produced by a biometric factor, erased on drop.
pub type KeyMaterial = Zeroizing<Vec<u8>>;

/// Opaque identifier of an enrolled platform credential.
///
/// Stored in the clear on the credential record; carries no secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricCredentialId(String);

impl BiometricCredentialId {
    /// Mint a fresh identifier for a new enrollment.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BiometricCredentialId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for BiometricCredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a biometric factor can be offered, and what to call it in UI copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiometricAvailability {
    pub supported: bool,
    /// Human label ("fingerprint", "face/touch factor"); empty when
    /// unsupported.
    pub label: String,
}

impl BiometricAvailability {
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            label: String::new(),
        }
    }
}

/// Platform biometric capability: availability, enrollment, authentication.
#[async_trait]
pub trait BiometricFactor: Send + Sync {
    /// Report availability. Infallible by contract: platforms without a
    /// factor report `supported = false` instead of raising.
    fn availability(&self) -> BiometricAvailability;

    /// Register a platform-backed credential holding the vault key for this
    /// user; returns the opaque identifier to store on the record.
    async fn enroll(&self, user_id: &str, key: &VaultKey)
        -> Result<BiometricCredentialId, BiometricError>;

    /// Run platform verification and return the enrolled key material.
    async fn authenticate(
        &self,
        credential_id: &BiometricCredentialId,
    ) -> Result<KeyMaterial, BiometricError>;

    /// Remove an enrollment. Idempotent; called on record removal and before
    /// re-enrollment.
    async fn revoke(&self, credential_id: &BiometricCredentialId) -> Result<(), BiometricError>;
}
