//! Stub factor for platforms with no secure-storage backend.

use async_trait::async_trait;

use crate::error::BiometricError;
use crate::kdf::VaultKey;

use super::{BiometricAvailability, BiometricCredentialId, BiometricFactor, KeyMaterial};

/// A factor that is never available. Enrollment and authentication fail with
/// [`BiometricError::Unavailable`], which the unlock flow answers with the
/// PIN path; revocation is a no-op so record removal stays clean.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableFactor;

#[async_trait]
impl BiometricFactor for UnavailableFactor {
    fn availability(&self) -> BiometricAvailability {
        BiometricAvailability::unsupported()
    }

    async fn enroll(
        &self,
        _user_id: &str,
        _key: &VaultKey,
    ) -> Result<BiometricCredentialId, BiometricError> {
        Err(BiometricError::Unavailable(
            "no biometric factor on this platform".into(),
        ))
    }

    async fn authenticate(
        &self,
        _credential_id: &BiometricCredentialId,
    ) -> Result<KeyMaterial, BiometricError> {
        Err(BiometricError::Unavailable(
            "no biometric factor on this platform".into(),
        ))
    }

    async fn revoke(&self, _credential_id: &BiometricCredentialId) -> Result<(), BiometricError> {
        Ok(())
    }
}
