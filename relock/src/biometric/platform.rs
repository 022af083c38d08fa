//! Desktop adapter backed by the OS keyring via `relock-secret`.
//!
//! Keyring reads may trigger the platform's own verification prompt (macOS
//! Keychain asks for Touch ID/password when the item is access-controlled);
//! the adapter itself only moves key material in and out.

use async_trait::async_trait;
use relock_secret::{KeyringStore, SecretStorageStatus};
use tracing::{debug, warn};

use crate::error::BiometricError;
use crate::kdf::VaultKey;

use super::{BiometricAvailability, BiometricCredentialId, BiometricFactor, KeyMaterial};

/// Keyring-backed biometric factor for desktop platforms.
#[derive(Debug, Clone)]
pub struct PlatformFactor {
    store: KeyringStore,
    availability: BiometricAvailability,
}

impl PlatformFactor {
    /// Probe the keyring off the executor and build the adapter with the
    /// result cached. The probe itself is blocking D-Bus/Keychain I/O, and
    /// `availability` is consulted on every flow transition; keyring
    /// availability does not change within a process lifetime.
    pub async fn detect() -> Self {
        let store = KeyringStore::new();
        let probe = store.clone();
        let status = tokio::task::spawn_blocking(move || probe.check_availability())
            .await
            .unwrap_or_else(|e| {
                SecretStorageStatus::unavailable(format!("availability probe failed: {e}"))
            });
        Self {
            availability: availability_from_status(&status),
            store,
        }
    }
}

fn availability_from_status(status: &SecretStorageStatus) -> BiometricAvailability {
    match &status.method {
        Some(method) if status.available => BiometricAvailability {
            supported: true,
            label: method.label().to_string(),
        },
        _ => {
            debug!(
                reason = status.unavailable_reason.as_deref().unwrap_or("unknown"),
                "platform secure storage unavailable"
            );
            BiometricAvailability::unsupported()
        }
    }
}

/// Keyring calls are blocking I/O (D-Bus, Keychain); run them off the
/// executor.
async fn run_blocking<T, F>(f: F) -> Result<T, BiometricError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, relock_secret::Error> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BiometricError::Failed(format!("secure storage task failed: {e}")))?
        .map_err(BiometricError::from)
}

#[async_trait]
impl BiometricFactor for PlatformFactor {
    fn availability(&self) -> BiometricAvailability {
        self.availability.clone()
    }

    async fn enroll(
        &self,
        user_id: &str,
        key: &VaultKey,
    ) -> Result<BiometricCredentialId, BiometricError> {
        let credential_id = BiometricCredentialId::generate();
        let store = self.store.clone();
        let account = credential_id.as_str().to_string();
        let secret = key.as_bytes().to_vec();

        run_blocking(move || store.store_secret(&account, &secret)).await?;

        debug!(user_id = %user_id, credential_id = %credential_id, "biometric credential enrolled");
        Ok(credential_id)
    }

    async fn authenticate(
        &self,
        credential_id: &BiometricCredentialId,
    ) -> Result<KeyMaterial, BiometricError> {
        let store = self.store.clone();
        let account = credential_id.as_str().to_string();

        let material = run_blocking(move || store.retrieve_secret(&account)).await?;
        debug!(credential_id = %credential_id, "biometric key material retrieved");
        Ok(material)
    }

    async fn revoke(&self, credential_id: &BiometricCredentialId) -> Result<(), BiometricError> {
        let store = self.store.clone();
        let account = credential_id.as_str().to_string();

        match run_blocking(move || store.delete_secret(&account)).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(credential_id = %credential_id, "failed to revoke platform credential: {e}");
                Err(e)
            }
        }
    }
}
