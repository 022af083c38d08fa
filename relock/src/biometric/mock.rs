//! Scripted in-memory factor for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::BiometricError;
use crate::kdf::VaultKey;

use super::{BiometricAvailability, BiometricCredentialId, BiometricFactor, KeyMaterial};

/// Test factor holding enrolled keys in memory. `fail_next` scripts the next
/// `authenticate` outcome so fallback paths can be driven deterministically.
#[derive(Default)]
pub(crate) struct MockFactor {
    pub supported: bool,
    secrets: Mutex<HashMap<String, Vec<u8>>>,
    fail_next: Mutex<Option<BiometricError>>,
}

impl MockFactor {
    pub fn supported() -> Self {
        Self {
            supported: true,
            ..Self::default()
        }
    }

    pub fn script_failure(&self, err: BiometricError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn enrolled_count(&self) -> usize {
        self.secrets.lock().unwrap().len()
    }

    /// Flip a byte in every enrolled secret. `authenticate` then succeeds
    /// with key material that no longer opens any record, which is how a
    /// stale enrollment presents.
    pub fn corrupt_enrolled_secrets(&self) {
        for secret in self.secrets.lock().unwrap().values_mut() {
            if let Some(byte) = secret.first_mut() {
                *byte ^= 0xFF;
            }
        }
    }
}

#[async_trait]
impl BiometricFactor for MockFactor {
    fn availability(&self) -> BiometricAvailability {
        if self.supported {
            BiometricAvailability {
                supported: true,
                label: "test factor".into(),
            }
        } else {
            BiometricAvailability::unsupported()
        }
    }

    async fn enroll(
        &self,
        _user_id: &str,
        key: &VaultKey,
    ) -> Result<BiometricCredentialId, BiometricError> {
        if !self.supported {
            return Err(BiometricError::Unavailable("mock unsupported".into()));
        }
        let id = BiometricCredentialId::generate();
        self.secrets
            .lock()
            .unwrap()
            .insert(id.as_str().to_string(), key.as_bytes().to_vec());
        Ok(id)
    }

    async fn authenticate(
        &self,
        credential_id: &BiometricCredentialId,
    ) -> Result<KeyMaterial, BiometricError> {
        if let Some(err) = self.fail_next.lock().unwrap().take() {
            return Err(err);
        }
        self.secrets
            .lock()
            .unwrap()
            .get(credential_id.as_str())
            .map(|bytes| KeyMaterial::new(bytes.clone()))
            .ok_or_else(|| BiometricError::Failed("no enrolled secret".into()))
    }

    async fn revoke(&self, credential_id: &BiometricCredentialId) -> Result<(), BiometricError> {
        self.secrets.lock().unwrap().remove(credential_id.as_str());
        Ok(())
    }
}
